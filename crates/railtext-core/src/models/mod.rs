//! Configuration and record types.

pub mod config;
pub mod record;
