use crate::mreg::history::Method;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{method} {url} failed with status {code}: {body}")]
    Status {
        method: Method,
        url: String,
        code: u16,
        body: String,
    },
    #[error("{method} {url} failed: {message}")]
    Request {
        method: Method,
        url: String,
        message: String,
    },
    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { code: 404, .. })
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no history entry with number {0}")]
    InvalidArgument(usize),
    #[error("history entry {0} cannot be undone")]
    NotUndoable(usize),
    #[error("history entry {0} cannot be redone")]
    NotRedoable(usize),
    #[error("history entry {0} is already applied")]
    AlreadyApplied(usize),
    #[error("history entry {0} is already undone")]
    AlreadyUndone(usize),
    #[error("history entry {seq}: {source}")]
    UpstreamFailure {
        seq: usize,
        #[source]
        source: TransportError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required config field \"{0}\"")]
    MissingField(&'static str),
}

/// Everything a command can fail with. None of these end the session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Warning(String),
    #[error("usage: {0}")]
    Usage(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("unknown option \"{option}\" for {command}")]
    UnknownOption { command: String, option: String },
    #[error("host not found: {0}")]
    HostNotFound(String),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CliError {
    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }
}

pub type Result<T> = core::result::Result<T, CliError>;
