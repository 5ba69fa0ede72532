pub mod controller;
pub mod events;
pub mod guard;
pub mod refresh;

pub use controller::{BoardController, BoardError, CycleOutcome};
pub use events::{BoardEvent, CycleReason};
pub use refresh::{AutoRefresh, RefreshOutcome};
