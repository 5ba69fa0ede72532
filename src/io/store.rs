use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::io::board_io::BoardIoError;
use crate::model::task::Task;

/// On-disk shape of tasks.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Read tasks.json. A missing file is an empty board.
pub fn read_task_file(path: &Path) -> Result<TaskFile, BoardIoError> {
    if !path.exists() {
        return Ok(TaskFile::default());
    }
    let text = fs::read_to_string(path).map_err(|e| BoardIoError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| BoardIoError::TaskParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write tasks.json atomically: temp file in the same directory, then rename.
pub fn write_task_file(path: &Path, file: &TaskFile) -> Result<(), BoardIoError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let content = serde_json::to_vec_pretty(file).map_err(|e| BoardIoError::TaskParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&content)?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskId;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let file = TaskFile {
            tasks: vec![Task::new(TaskId(1), "Plan", "to_do")],
        };
        write_task_file(&path, &file).unwrap();
        assert_eq!(read_task_file(&path).unwrap(), file);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = read_task_file(&dir.path().join("tasks.json")).unwrap();
        assert!(file.tasks.is_empty());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "not json {{{").unwrap();
        assert!(matches!(
            read_task_file(&path),
            Err(BoardIoError::TaskParseError { .. })
        ));
    }
}
