//! Constraint and bulk-load scripts written next to the tables.

use std::fmt::Write as _;

use crate::config::LoaderConfig;
use crate::entity::EntityKind;

/// One uniqueness constraint on `_id` per kind.
#[must_use]
pub fn constraint_script(kinds: &[EntityKind]) -> String {
    let mut script = String::new();
    for kind in kinds {
        let _ = writeln!(script, "create constraint on (p:{kind}) assert p._id is unique;");
    }
    script
}

fn admin_path(loader: &LoaderConfig) -> String {
    loader.bin_path.join("neo4j-admin").display().to_string()
}

/// Single-quotes `word` for a POSIX shell.
fn sh_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Double-quotes `word` for cmd.exe; Windows paths cannot contain `"`.
fn bat_quote(word: &str) -> String {
    format!("\"{word}\"")
}

fn import_command(admin: &str, loader: &LoaderConfig, node_file: &str, relationship_files: &[String]) -> String {
    let mut command = format!("{admin} import");
    if let Some(database) = &loader.database {
        let _ = write!(command, " --database={database}");
    }
    let _ = write!(command, " --nodes {node_file}");
    for file in relationship_files {
        let _ = write!(command, " --relationships {file}");
    }
    command.push_str(" > import.log\n");
    command
}

/// POSIX shell load script.
#[must_use]
pub fn shell_script(loader: &LoaderConfig, node_file: &str, relationship_files: &[String]) -> String {
    let admin = sh_quote(&admin_path(loader));
    import_command(&admin, loader, node_file, relationship_files)
}

/// Windows batch load script.
#[must_use]
pub fn batch_script(loader: &LoaderConfig, node_file: &str, relationship_files: &[String]) -> String {
    let admin = bat_quote(&admin_path(loader));
    format!(
        "@echo off\n{}",
        import_command(&admin, loader, node_file, relationship_files)
    )
}
