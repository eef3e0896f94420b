pub mod activate;
pub mod commands;
pub mod config;
pub mod deactivate;
pub mod env;
pub mod error;
pub mod logging;
pub mod paths;
pub mod prompt;
pub mod settings;
pub mod shell;
pub mod state;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
