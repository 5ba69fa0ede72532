use std::fs;
use std::path::{Path, PathBuf};

use crate::io::config_io;
use crate::io::store::{self, TaskFile};
use crate::model::config::BoardConfig;

/// Name of the directory holding a board's files
pub const BOARD_DIR: &str = ".taskboard";

const BOARD_TOML_TEMPLATE: &str = include_str!("../templates/board.toml");

/// Error type for board directory I/O
#[derive(Debug, thiserror::Error)]
pub enum BoardIoError {
    #[error("not a task board: no .taskboard/ directory found")]
    NotABoard,
    #[error("a board already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse board.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit board.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("could not parse {path}: {source}")]
    TaskParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Paths of one board on disk
#[derive(Debug, Clone)]
pub struct BoardPaths {
    /// Directory containing `.taskboard/`
    pub root: PathBuf,
    /// The `.taskboard/` directory itself
    pub board_dir: PathBuf,
}

impl BoardPaths {
    pub fn new(root: &Path) -> Self {
        BoardPaths {
            root: root.to_path_buf(),
            board_dir: root.join(BOARD_DIR),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.board_dir.join("board.toml")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.board_dir.join("tasks.json")
    }
}

/// Find the board by walking up from `start`, looking for a `.taskboard/`
/// directory with a board.toml in it.
pub fn discover_board(start: &Path) -> Result<BoardPaths, BoardIoError> {
    let mut current = start.to_path_buf();
    loop {
        let paths = BoardPaths::new(&current);
        if paths.board_dir.is_dir() && paths.config_file().exists() {
            return Ok(paths);
        }
        if !current.pop() {
            return Err(BoardIoError::NotABoard);
        }
    }
}

/// Load the board configuration
pub fn load_config(paths: &BoardPaths) -> Result<BoardConfig, BoardIoError> {
    let (config, _) = config_io::read_config(&paths.board_dir)?;
    Ok(config)
}

/// Create `.taskboard/` under `root` with a fresh config and an empty task
/// store.
pub fn init_board(root: &Path, name: &str, template: &str, force: bool) -> Result<BoardPaths, BoardIoError> {
    let paths = BoardPaths::new(root);
    if paths.config_file().exists() && !force {
        return Err(BoardIoError::AlreadyExists(paths.board_dir));
    }
    fs::create_dir_all(&paths.board_dir)?;

    let config_text = BOARD_TOML_TEMPLATE
        .replace("{name}", &escape_toml(name))
        .replace("{template}", &escape_toml(template));
    fs::write(paths.config_file(), config_text)?;

    if !paths.tasks_file().exists() || force {
        store::write_task_file(&paths.tasks_file(), &TaskFile::default())?;
    }
    Ok(paths)
}

fn escape_toml(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
