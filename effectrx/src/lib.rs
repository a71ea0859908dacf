//! Race-free async effects for reactive UIs.
//!
//! An [`AsyncEffect`] runs an async producer every time its dependencies
//! change and publishes the outcome as an observable [`Async`] state. Only
//! the latest activation of a mounted component may write to that state;
//! everything that settles after being superseded or unmounted is dropped.

mod async_error;
mod async_state;
mod effect;
mod execution_result;
mod lifecycle;
mod stream_ext;


pub use async_error::*;
pub use async_state::*;
pub use effect::*;
pub use execution_result::*;
pub use lifecycle::*;
pub use stream_ext::*;
