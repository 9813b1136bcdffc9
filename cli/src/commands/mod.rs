//! CLI command implementations

pub mod negotiate;

pub use negotiate::negotiate_command;
