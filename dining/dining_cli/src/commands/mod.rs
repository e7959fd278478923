//! Subcommands of the dining CLI

pub mod config;
pub mod run;
pub mod table;
