use std::fmt;
use thiserror::Error;

/// Errors recorded in an effect's observable state or raised by its accessors.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AsyncError {
    /// The producer failed with a genuine error.
    #[error("{0}")]
    Error(String),

    /// No fresh value and no error are committed yet.
    #[error("Result is not available.")]
    Unavailable,
}

impl AsyncError {
    pub fn error(message: impl Into<String>) -> Self {
        AsyncError::Error(message.into())
    }

    /// Returns true if this error came from the producer.
    pub fn is_error(&self) -> bool {
        matches!(self, AsyncError::Error(_))
    }

    /// Returns true if this error only says that no result is available.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AsyncError::Unavailable)
    }
}

/// The failure side of a producer's return value.
///
/// `Skip` is the voluntary skip signal: the producer declines to change the
/// displayed state and only asks to stop refreshing. Everything else is a
/// genuine failure. Any [`std::error::Error`] converts into `Failed`, so
/// producers can use `?` freely:
///
/// ```
/// use effectrx::EffectError;
///
/// fn parse(input: &str) -> Result<u32, EffectError> {
///     if input.is_empty() {
///         return Err(EffectError::Skip);
///     }
///     Ok(input.parse::<u32>()?)
/// }
///
/// assert!(parse("").unwrap_err().is_skip());
/// assert!(!parse("x").unwrap_err().is_skip());
/// assert_eq!(parse("7").unwrap(), 7);
/// ```
///
/// The conversion keeps only the error's `Display` text, as
/// [`AsyncError::Error`]. The original value, its type and its `source()`
/// chain are gone by the time the error reaches the stored state or the error
/// callback. Producers that need more must put it in the message.
///
/// `EffectError` must not implement `std::error::Error`, or the blanket
/// conversion would overlap with `From<T> for T`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EffectError {
    Skip,
    Failed(AsyncError),
}

impl EffectError {
    /// A genuine failure carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        EffectError::Failed(AsyncError::error(message))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, EffectError::Skip)
    }
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectError::Skip => f.write_str("effect skipped"),
            EffectError::Failed(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl<E> From<E> for EffectError
where
    E: std::error::Error,
{
    fn from(error: E) -> Self {
        EffectError::Failed(AsyncError::Error(error.to_string()))
    }
}
