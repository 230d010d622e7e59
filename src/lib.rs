pub mod cli;
pub mod commands;
pub mod config;
pub mod editor;
pub mod import;
pub mod store;
pub mod ui;
