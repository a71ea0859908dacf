#![allow(dead_code)]

use effectrx::{Async, AsyncEffect, EffectStreamExt};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Waits for the first state matching `test`, starting with the current one.
pub async fn wait_for<T, D, F>(effect: &AsyncEffect<T, D>, test: F) -> Async<T>
where
    T: Clone + std::fmt::Debug + Send + Sync + 'static,
    D: PartialEq + Clone + Send + 'static,
    F: Fn(&Async<T>) -> bool,
{
    let last = effect
        .to_stream()
        .stop_if(&test)
        .fold(None, |_, state| async move { Some(state) });
    match tokio::time::timeout(Duration::from_secs(2), last).await {
        Ok(Some(state)) if test(&state) => state,
        Ok(_) => panic!("effect state stream ended"),
        Err(_) => panic!("timed out waiting for effect state, last: {:?}", effect.state()),
    }
}

/// Counts producer invocations.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Records every error handed to an effect's error callback.
#[derive(Clone, Default)]
pub struct ErrorLog(Arc<Mutex<Vec<String>>>);

impl ErrorLog {
    pub fn push(&self, message: String) {
        self.0.lock().unwrap().push(message);
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
