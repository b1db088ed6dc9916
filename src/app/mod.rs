// Command-line front-end: dispatch and terminal rendering.

pub mod commands;
pub mod render;

pub use commands::run;
