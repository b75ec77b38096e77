use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_state(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidState {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn not_found(what: impl Into<String>) -> Error {
        Error(ErrorKind::NotFound { what: what.into() }.into())
    }

    pub fn corrupt(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Corrupt {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn unsupported(name: impl Into<String>) -> Error {
        Error(ErrorKind::Unsupported { name: name.into() }.into())
    }

    pub fn busy(name: impl Into<String>) -> Error {
        Error(ErrorKind::Busy { name: name.into() }.into())
    }

    pub fn cancelled() -> Error {
        Error(ErrorKind::Cancelled.into())
    }

    pub fn task_failure(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::TaskFailure {
                message: message.into(),
            }
            .into(),
        )
    }

    /// True for errors produced by [`Error::cancelled`]; task handles use this
    /// to distinguish cancellation from ordinary failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cancelled)
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid state: {message}")]
    InvalidState { message: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("corrupt input for '{element}': {message}")]
    Corrupt { element: String, message: String },

    #[error("unsupported operation {name}")]
    Unsupported { name: String },

    #[error("worker busy: {name}")]
    Busy { name: String },

    #[error("task cancelled")]
    Cancelled,

    #[error("task failed: {message}")]
    TaskFailure { message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
