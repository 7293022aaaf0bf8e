//! History command - lists the transitions recorded at one object of the scene.

use objectsync::Server;

use crate::cli::HistoryArgs;
use crate::dom;
use crate::output::{OutputFormat, print_table, transition_rows};

/// Run the history command
pub fn run(
    server: &mut Server,
    args: &HistoryArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = dom::populate(server)?;
    let id = scene.resolve(&args.object);
    let history = server.history(&id)?;

    match format {
        OutputFormat::Human => {
            if history.is_empty() {
                println!("No transitions recorded at {id}.");
                return Ok(());
            }
            let rows = transition_rows(
                history
                    .iter()
                    .map(|item| (item.transition(), item.is_done())),
            );
            print_table(&["ID", "TIME", "CHANGES", "STATE", "TOPICS"], &rows);
            println!();
            println!(
                "{} of {} entries applied, depth limit {}",
                history.cursor(),
                history.len(),
                history.max_depth()
            );
        }
        OutputFormat::Json => {
            let entries: Vec<_> = history
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "transition": item.transition(),
                        "done": item.is_done(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    Ok(())
}
