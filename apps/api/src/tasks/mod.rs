// Task CRUD around the evaluation engine. Writes commit the task first and
// then score it; scoring failures never undo a write.

pub mod handlers;
pub mod service;
pub mod store;
pub mod text;
