//! Notes stored as plain files in the scoped data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::plugins::{Api, Output, Plugin, PluginDescriptor, PluginError, PluginResult};

pub(super) fn descriptor() -> PluginDescriptor {
    super::bundled(
        "mem",
        "com.flench04.mem",
        "Basic note management: list, new, recall, delete, edit.",
    )
}

const USAGE: [&str; 7] = [
    "Usage: mem:<command> [args]",
    "Commands:",
    "  list               - List all notes",
    "  new <name> <body>  - Create a new note",
    "  recall <name>      - Read a note",
    "  delete <name>      - Delete a note",
    "  edit <name> <body> - Edit (overwrite) a note",
];

pub struct MemPlugin;

#[async_trait]
impl Plugin for MemPlugin {
    fn commands(&self) -> Vec<String> {
        ["list", "new", "recall", "delete", "edit", "help"]
            .map(String::from)
            .to_vec()
    }

    async fn dispatch(&self, command: &str, api: &Api, args: &[String]) -> PluginResult<Output> {
        let dir = api.local_data_dir()?;
        match command {
            "list" => list(&dir),
            "new" => new(&dir, args),
            "recall" => recall(&dir, args),
            "delete" => delete(&dir, args),
            "edit" => edit(&dir, args),
            "help" => Ok(Output::lines(USAGE)),
            other => Err(PluginError::CommandNotFound {
                plugin: "mem".into(),
                command: other.into(),
            }),
        }
    }
}

/// Note names are file names inside the data directory and nothing else.
fn note_path(dir: &Path, name: &str) -> PluginResult<PathBuf> {
    let bad = name == "." || name == ".." || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(PluginError::execution(format!("Invalid note name '{name}'.")));
    }
    Ok(dir.join(name))
}

fn list(dir: &Path) -> PluginResult<Output> {
    let mut notes = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            notes.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    notes.sort();
    Ok(Output::Lines(notes))
}

fn new(dir: &Path, args: &[String]) -> PluginResult<Output> {
    let [name, body @ ..] = args else {
        return Ok(Output::text("Please provide the name and content of the note."));
    };
    if body.is_empty() {
        return Ok(Output::text("Please provide the name and content of the note."));
    }
    std::fs::write(note_path(dir, name)?, body.join(" "))?;
    Ok(Output::text(format!("Note '{name}' created.")))
}

fn recall(dir: &Path, args: &[String]) -> PluginResult<Output> {
    let Some(name) = super::first_arg(args) else {
        return Ok(Output::text("Please provide the name of the note to recall."));
    };
    let path = note_path(dir, name)?;
    if !path.is_file() {
        return Ok(Output::text(format!("Note '{name}' does not exist.")));
    }
    Ok(Output::Text(std::fs::read_to_string(path)?))
}

fn delete(dir: &Path, args: &[String]) -> PluginResult<Output> {
    let Some(name) = super::first_arg(args) else {
        return Ok(Output::text("Please provide the name of the note to delete."));
    };
    let path = note_path(dir, name)?;
    if !path.is_file() {
        return Ok(Output::text(format!("Note '{name}' does not exist.")));
    }
    std::fs::remove_file(path)?;
    Ok(Output::text(format!("Note '{name}' deleted.")))
}

/// Overwrite a note. Unlike `new`, refuses to run without a body so a
/// missing argument cannot wipe the note.
fn edit(dir: &Path, args: &[String]) -> PluginResult<Output> {
    if args.len() < 2 {
        return Ok(Output::text("Please provide the name and new content of the note."));
    }
    let name = &args[0];
    let path = note_path(dir, name)?;
    let existed = path.is_file();
    std::fs::write(&path, args[1..].join(" "))?;

    Ok(Output::text(if existed {
        format!("Note '{name}' updated.")
    } else {
        format!("Note '{name}' created.")
    }))
}
