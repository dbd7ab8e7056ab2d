pub mod cli;
pub mod config;
pub mod error;
pub mod local;
pub mod manager;
pub mod storage;
pub mod tracker;
pub mod view;
