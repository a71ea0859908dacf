use crate::{AsyncError, Settlement};

/// Observable outcome of an async effect.
///
/// | variant | ready | initialized |
/// |---|---|---|
/// | `Uninitialized` | no | no |
/// | `Loading(None)` | no | no |
/// | `Loading(Some(_))` | no | yes (stale value) |
/// | `Success { .. }` | yes | yes |
/// | `Fail { .. }` | no | no |
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Async<T> {
    Uninitialized,
    Loading(Option<T>),
    Success { value: T },
    Fail { error: AsyncError },
}

/// What happens to the last good value while a new activation is running.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum RefreshPolicy {
    /// Keep it around as `Loading(Some(value))`.
    #[default]
    Retain,
    /// Drop it; the state becomes `Loading(None)`.
    Discard,
}

impl<T> Async<T> {
    pub fn loading(value: Option<T>) -> Self {
        Async::Loading(value)
    }

    pub fn success(value: T) -> Self {
        Async::Success { value }
    }

    pub fn fail(error: AsyncError) -> Self {
        Async::Fail { error }
    }

    pub fn fail_with_message(message: impl Into<String>) -> Self {
        Async::Fail {
            error: AsyncError::error(message),
        }
    }

    /// A fresh value is present.
    pub fn is_ready(&self) -> bool {
        matches!(self, Async::Success { .. })
    }

    /// A value is present, fresh or not.
    pub fn is_initialized(&self) -> bool {
        matches!(self, Async::Success { .. } | Async::Loading(Some(_)))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Async::Loading(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Async::Fail { .. })
    }

    /// The last activation has settled one way or the other.
    pub fn is_complete(&self) -> bool {
        matches!(self, Async::Success { .. } | Async::Fail { .. })
    }

    /// The last recorded value, even if a refresh is in progress.
    pub fn result(&self) -> Option<&T> {
        match self {
            Async::Loading(Some(value)) => Some(value),
            Async::Success { value } => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AsyncError> {
        match self {
            Async::Fail { error } => Some(error),
            _ => None,
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            Async::Loading(value) => value,
            Async::Success { value } => Some(value),
            Async::Uninitialized | Async::Fail { .. } => None,
        }
    }

    /// Borrowing form of [`Async::ensure_result`].
    pub fn ensure_result_ref(&self) -> Result<&T, AsyncError> {
        match self {
            Async::Success { value } => Ok(value),
            Async::Fail { error } => Err(error.clone()),
            _ => Err(AsyncError::Unavailable),
        }
    }

    /// Returns the fresh value, the committed error, or
    /// [`AsyncError::Unavailable`] when neither exists.
    pub fn ensure_result(&self) -> Result<T, AsyncError>
    where
        T: Clone,
    {
        self.ensure_result_ref().cloned()
    }

    /// State to show while a new activation runs.
    ///
    /// A committed error stays in place under either policy: it is already
    /// not ready, and it must keep surfacing through [`Async::ensure_result`]
    /// until a later settlement replaces it.
    pub fn begin_refresh(self, policy: RefreshPolicy) -> Self {
        match (self, policy) {
            (fail @ Async::Fail { .. }, _) => fail,
            (state, RefreshPolicy::Retain) => Async::Loading(state.value()),
            (_, RefreshPolicy::Discard) => Async::Loading(None),
        }
    }

    /// Applies a live settlement. The returned error, if any, is the one the
    /// error callback must receive.
    pub fn settle(self, settlement: Settlement<T>) -> (Self, Option<AsyncError>) {
        match settlement {
            Settlement::Value(value) => (Async::success(value), None),
            Settlement::Error(error) => (Async::fail(error.clone()), Some(error)),
            Settlement::Skip => {
                let next = match self {
                    Async::Loading(Some(value)) | Async::Success { value } => Async::success(value),
                    Async::Loading(None) | Async::Uninitialized => Async::Uninitialized,
                    fail @ Async::Fail { .. } => fail,
                };
                (next, None)
            }
        }
    }
}

impl<T> Default for Async<T> {
    fn default() -> Self {
        Async::Uninitialized
    }
}

impl<T: Clone> From<&Async<T>> for Option<T> {
    fn from(value: &Async<T>) -> Self {
        value.result().cloned()
    }
}
