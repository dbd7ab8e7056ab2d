pub mod cli;
pub mod delete;
pub mod upload;
