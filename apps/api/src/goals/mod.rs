// Goal collaborator: the single active goal tasks are scored against.

pub mod handlers;
pub mod store;
