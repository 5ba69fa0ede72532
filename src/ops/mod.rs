pub mod columns;
pub mod moves;
pub mod reconcile;
pub mod task_ops;
pub mod templates;
pub mod timeline;
