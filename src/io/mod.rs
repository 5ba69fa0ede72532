pub mod board_io;
pub mod config_io;
pub mod lock;
pub mod repository;
pub mod store;
pub mod watcher;
