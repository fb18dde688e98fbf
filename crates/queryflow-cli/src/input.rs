//! Input handling for file reading and stdin support.

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::PathBuf;

/// One SQL text to compile as a batch, with the name reported on its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSource {
    pub name: String,
    pub content: String,
}

/// Read SQL input from files or stdin.
///
/// If no files are provided, reads from stdin.
pub fn read_input(files: &[PathBuf]) -> Result<Vec<SqlSource>> {
    if files.is_empty() {
        read_from(io::stdin().lock(), "<stdin>").map(|source| vec![source])
    } else {
        read_from_files(files)
    }
}

fn read_from(mut reader: impl Read, name: &str) -> Result<SqlSource> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read from {name}"))?;

    Ok(SqlSource {
        name: name.to_string(),
        content,
    })
}

/// Read SQL from multiple files
fn read_from_files(files: &[PathBuf]) -> Result<Vec<SqlSource>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            Ok(SqlSource {
                name: path.display().to_string(),
                content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SELECT * FROM users").unwrap();

        let sources = read_input(&[file.path().to_path_buf()]).unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].content.contains("SELECT * FROM users"));
        assert_eq!(sources[0].name, file.path().display().to_string());
    }

    #[test]
    fn test_read_multiple_files_in_order() {
        let mut file1 = NamedTempFile::new().unwrap();
        let mut file2 = NamedTempFile::new().unwrap();
        writeln!(file1, "SELECT * FROM users").unwrap();
        writeln!(file2, "SELECT * FROM orders").unwrap();

        let sources =
            read_from_files(&[file1.path().to_path_buf(), file2.path().to_path_buf()]).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[1].content.contains("orders"));
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_from_files(&[PathBuf::from("/nonexistent/file.sql")]);
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("/nonexistent/file.sql"));
    }

    #[test]
    fn test_reader_source_is_named() {
        let source = read_from("SELECT 1".as_bytes(), "<stdin>").unwrap();
        assert_eq!(source.name, "<stdin>");
        assert_eq!(source.content, "SELECT 1");
    }
}
