pub mod browser;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod services;
pub mod state;
