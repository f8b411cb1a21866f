//! Subcommand handlers, one module per command group.

pub(crate) mod audit;
pub(crate) mod breaker;
pub(crate) mod config;
pub(crate) mod gate;
pub(crate) mod rate;
pub(crate) mod sessions;
