use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

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

    pub fn canceled() -> Error {
        Error(ErrorKind::Canceled.into())
    }

    pub fn operation(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Operation {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn external<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::External {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }

    /// Builds the aggregate failure surfaced by the join barrier.
    ///
    /// `failures` must be non-empty. The entries are sorted by source
    /// position, which makes the lowest-position failure the representative
    /// one regardless of completion order.
    pub(crate) fn batch(mut failures: Vec<(usize, Error)>) -> Error {
        debug_assert!(!failures.is_empty());
        failures.sort_by_key(|(position, _)| *position);
        Error(ErrorKind::Batch { failures }.into())
    }

    /// Returns `true` if this error reports a fired cancellation signal.
    pub fn is_canceled(&self) -> bool {
        matches!(self.kind(), ErrorKind::Canceled)
    }

    /// The individual `(position, error)` failures carried by a batch
    /// aggregate, or an empty slice for any other error.
    pub fn failures(&self) -> &[(usize, Error)] {
        match self.kind() {
            ErrorKind::Batch { failures } => failures,
            _ => &[],
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("batch processing canceled")]
    Canceled,

    #[error("operation failed: {message}")]
    Operation { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        source: StdErrorBoxed,
    },

    /// Aggregate of every failed work unit in a batch, sorted by position.
    /// Never constructed with an empty failure list.
    #[error(
        "{} of the batch operations failed, first at position {}: {}",
        failures.len(),
        failures[0].0,
        failures[0].1
    )]
    Batch { failures: Vec<(usize, Error)> },
}
