use crate::{AsyncError, EffectError};

/// How a producer's future finished, before liveness is taken into account.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Settlement<T> {
    Value(T),
    Skip,
    Error(AsyncError),
}

impl<T> Settlement<T> {
    pub fn is_skip(&self) -> bool {
        matches!(self, Settlement::Skip)
    }
}

/// Values a producer may return.
///
/// `Result<T, E>` maps `Ok` to a value and `Err` through [`EffectError`], so
/// `Err(EffectError::Skip)` is a skip and every other error is genuine.
/// `Option<T>` treats `None` as a skip.
pub trait ExecutionResult<T> {
    fn into_settlement(self) -> Settlement<T>;
}

impl<T, E> ExecutionResult<T> for Result<T, E>
where
    E: Into<EffectError>,
{
    fn into_settlement(self) -> Settlement<T> {
        match self {
            Ok(value) => Settlement::Value(value),
            Err(error) => match error.into() {
                EffectError::Skip => Settlement::Skip,
                EffectError::Failed(error) => Settlement::Error(error),
            },
        }
    }
}

impl<T> ExecutionResult<T> for Option<T> {
    fn into_settlement(self) -> Settlement<T> {
        match self {
            Some(value) => Settlement::Value(value),
            None => Settlement::Skip,
        }
    }
}
