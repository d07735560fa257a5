use winnow::error::{ContextError, ErrMode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum NdefParseError {
    /// The data ended before the message did
    #[error("incomplete NDEF data")]
    Incomplete,

    #[error("malformed NDEF data: {0}")]
    Malformed(String),
}

impl NdefParseError {
    pub(crate) fn from_parse_error(error: ErrMode<ContextError>) -> Self {
        match error {
            ErrMode::Incomplete(_) => Self::Incomplete,
            error => Self::Malformed(error.to_string()),
        }
    }
}
