pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod tasks;
pub mod webhook;
