//! Command-history persistence (`util/terminal_history.c` in the original
//! implementation). Navigation (up/down through history) is handled by the
//! shell frontend's `rustyline` editor; this module is just the bounded
//! on-disk ring the shell loads at startup and appends to as commands run.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Maximum number of commands retained on disk.
pub const HISTORY_SIZE: usize = 500;

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored commands in the order they were entered, oldest
    /// first, truncated to the most recent [`HISTORY_SIZE`] entries.
    pub fn load(&self) -> io::Result<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut lines: Vec<String> = BufReader::new(file).lines().collect::<Result<_, _>>()?;
        if lines.len() > HISTORY_SIZE {
            let drop_count = lines.len() - HISTORY_SIZE;
            lines.drain(..drop_count);
        }
        Ok(lines)
    }

    /// Append one command to the history file.
    pub fn append(&self, command: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{command}")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_commands_in_order() {
        let dir = std::env::temp_dir().join(format!("pennos-history-test-{}", std::process::id()));
        let store = HistoryStore::new(dir.join("history.txt"));
        store.append("ls").unwrap();
        store.append("cat foo").unwrap();
        assert_eq!(store.load().unwrap(), vec!["ls".to_string(), "cat foo".to_string()]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = HistoryStore::new("/nonexistent/path/to/history.txt");
        assert!(store.load().unwrap().is_empty());
    }
}
