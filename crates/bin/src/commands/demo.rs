//! Demo command - builds the document scene, undoes part of it and redoes it.

use objectsync::{ObjectId, Server};

use crate::cli::DemoArgs;
use crate::dom;
use crate::output::{OutputFormat, print_table, print_tree, transition_rows};

const TRANSITION_HEADERS: [&str; 5] = ["ID", "TIME", "CHANGES", "STATE", "TOPICS"];

/// Run the demo command
pub fn run(
    server: &mut Server,
    args: &DemoArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    dom::populate(server)?;
    let root = ObjectId::root();
    let built = server.serialize(&root)?;

    let mut undone = Vec::with_capacity(args.undo);
    for _ in 0..args.undo {
        match server.undo(None)? {
            Some(transition) => undone.push(transition),
            None => break,
        }
    }
    let after_undo = server.serialize(&root)?;

    let mut redone = Vec::with_capacity(undone.len());
    for _ in 0..undone.len() {
        match server.redo(None)? {
            Some(transition) => redone.push(transition),
            None => break,
        }
    }
    // compare as JSON so child and key order count
    let restored = server.serialize(&root)?.to_json()? == built.to_json()?;
    tracing::info!(undone = undone.len(), redone = redone.len(), restored, "demo finished");

    match format {
        OutputFormat::Human => {
            println!("Scene:");
            print_tree(server, &root)?;
            println!();
            println!("Undid {} transition(s):", undone.len());
            print_table(
                &TRANSITION_HEADERS,
                &transition_rows(undone.iter().map(|transition| (transition, false))),
            );
            println!();
            println!("Redid {} transition(s):", redone.len());
            print_table(
                &TRANSITION_HEADERS,
                &transition_rows(redone.iter().map(|transition| (transition, true))),
            );
            println!();
            println!("Scene restored: {restored}");
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "scene": built,
                "after_undo": after_undo,
                "undone": undone,
                "redone": redone,
                "restored": restored,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}
