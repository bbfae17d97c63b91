//! CLI commands

pub mod serve;
