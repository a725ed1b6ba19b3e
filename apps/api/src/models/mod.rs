pub mod clarification;
pub mod evaluation;
pub mod goal;
pub mod task;
