pub mod action;
pub mod backend;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod find;
pub mod geometry;
pub mod grabs;
pub mod handlers;
pub mod input;
pub mod render;
pub mod state;
pub mod status;
pub mod taskbar;
pub mod view;
pub mod workspace;

pub use errors::{Result, ShellError};
pub use state::Shell;
