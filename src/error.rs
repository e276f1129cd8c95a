use nom::error::{VerboseError, VerboseErrorKind};
use thiserror::Error;

/// Failures surfaced by the public API.
///
/// All failures are synchronous and final: a malformed challenge is not
/// partially decoded and nothing is retried at this layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller handed us something unusable before any bytes were parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The message bytes do not form a valid NTLM message.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
}

impl<'a> From<nom::Err<VerboseError<&'a [u8]>>> for Error {
    fn from(err: nom::Err<VerboseError<&'a [u8]>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => Self::MalformedMessage("truncated message".into()),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let context = e
                    .errors
                    .iter()
                    .rev()
                    .find_map(|(_, kind)| match kind {
                        VerboseErrorKind::Context(c) => Some(*c),
                        _ => None,
                    })
                    .unwrap_or("parse error");
                Self::MalformedMessage(context.into())
            }
        }
    }
}
