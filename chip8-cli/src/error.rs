//! Application errors
use std::fmt;

#[derive(Debug)]
pub struct CliError {
    pub kind: ErrorKind,
}

impl std::error::Error for CliError {}

#[derive(Debug)]
pub enum ErrorKind {
    Chip8(chip8::prelude::Chip8Error),
    Io(std::io::Error),
    Config(serde_yaml::Error),
    Fmt(fmt::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "application error: {}", self.kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chip8(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "invalid config: {err}"),
            Self::Fmt(err) => write!(f, "{err}"),
        }
    }
}

impl From<chip8::prelude::Chip8Error> for CliError {
    fn from(err: chip8::prelude::Chip8Error) -> Self {
        Self {
            kind: ErrorKind::Chip8(err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(err),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self {
            kind: ErrorKind::Config(err),
        }
    }
}

impl From<fmt::Error> for CliError {
    fn from(err: fmt::Error) -> Self {
        Self {
            kind: ErrorKind::Fmt(err),
        }
    }
}
