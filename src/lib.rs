//! alertr: probe HTTP(S) endpoints once and alert a chat webhook on failure.

pub mod cli;
pub mod config;
pub mod core;
