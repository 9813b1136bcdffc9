//! CLI-specific output implementations
//!
//! Concrete implementation of the core output abstraction for the terminal.

pub mod console;

pub use console::ConsoleOutput;
