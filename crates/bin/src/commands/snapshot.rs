//! Snapshot command - prints the serialized form of one subtree of the scene.

use objectsync::Server;

use crate::cli::SnapshotArgs;
use crate::dom;
use crate::output::{OutputFormat, print_tree};

/// Run the snapshot command
pub fn run(
    server: &mut Server,
    args: &SnapshotArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = dom::populate(server)?;
    let id = scene.resolve(&args.object);
    let snapshot = server.serialize(&id)?;

    match format {
        OutputFormat::Human => {
            print_tree(server, &id)?;
            println!();
            println!("{}", snapshot.to_json_pretty()?);
        }
        OutputFormat::Json => println!("{}", snapshot.to_json()?),
    }

    Ok(())
}
