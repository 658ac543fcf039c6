//! CLI subcommands.

pub mod connection;
pub mod export;
pub mod migrate;
pub mod setup;
