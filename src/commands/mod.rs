pub mod connections;
pub mod processes;
pub mod tree;
