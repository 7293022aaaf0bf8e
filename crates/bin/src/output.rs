//! Output formatting helpers for human-readable and JSON output.

use objectsync::{Change, ObjectId, Result, Server, Transition, clock::format_millis};

use crate::cli::Format;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  "));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  "));
    }
}

/// Print the live subtree under `id`, one object per line, with its attribute values.
pub fn print_tree(server: &Server, id: &ObjectId) -> Result<()> {
    print_node(server, id, 0)
}

fn print_node(server: &Server, id: &ObjectId, depth: usize) -> Result<()> {
    let object = server.get_object(id)?;
    let attributes: Vec<String> = object
        .attributes()
        .map(|attribute| Ok(format!("{}={}", attribute.name(), attribute.get(server)?)))
        .collect::<Result<_>>()?;
    println!(
        "{:indent$}{} ({}) {}",
        "",
        object.id(),
        object.type_name(),
        attributes.join(" "),
        indent = depth * 2
    );
    for child in object.children() {
        print_node(server, child, depth + 1)?;
    }
    Ok(())
}

/// Table rows for a list of transitions: id, time, change count, state, changed names.
pub fn transition_rows<'a>(
    transitions: impl IntoIterator<Item = (&'a Transition, bool)>,
) -> Vec<Vec<String>> {
    transitions
        .into_iter()
        .map(|(transition, done)| {
            let targets: Vec<String> = transition.changes.iter().map(change_target).collect();
            vec![
                transition.id.to_string(),
                format_millis(transition.timestamp),
                transition.len().to_string(),
                if done { "applied" } else { "undone" }.to_string(),
                targets.join(", "),
            ]
        })
        .collect()
}

fn change_target(change: &Change) -> String {
    match change {
        Change::Event { event, .. } => event.to_string(),
        other => other
            .topic()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}
