use std::fmt;

#[derive(Debug)]
pub enum ShellError {
    Config(String),
    Backend(String),
    EventLoop(String),
    Render(String),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Config(msg) => write!(f, "config error: {msg}"),
            ShellError::Backend(msg) => write!(f, "backend error: {msg}"),
            ShellError::EventLoop(msg) => write!(f, "event loop error: {msg}"),
            ShellError::Render(msg) => write!(f, "render error: {msg}"),
        }
    }
}

impl std::error::Error for ShellError {}

pub type Result<T, E = ShellError> = std::result::Result<T, E>;
