use crate::tracing_setup::tracing_init;
use effectrx::{Async, AsyncEffect, EffectError, EffectStreamExt, Liveness};
use futures::StreamExt;
use futures_signals::signal::SignalExt;
use std::fmt::Debug;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

mod tracing_setup;

/// Pretends to look up a user; ids below 10 are slow.
async fn fetch_user(id: u32, live: Liveness) -> Result<String, EffectError> {
    let delay = if id < 10 { 300 } else { 50 };
    for _ in 0..(delay / 50) {
        if !live.is_live() {
            info!("Worker | user {} no longer wanted, stopping early", id);
            return Err(EffectError::Skip);
        }
        sleep(Duration::from_millis(50)).await;
    }
    if id == 0 {
        return Err(EffectError::msg("user 0 does not exist"));
    }
    Ok(format!("user #{id}"))
}

fn observe<T, D>(label: &'static str, effect: &AsyncEffect<T, D>) -> JoinHandle<()>
where
    T: Clone + Debug + Send + Sync + 'static,
    D: PartialEq + Clone + Send + 'static,
{
    tokio::spawn(effect.to_signal().for_each(move |state| {
        info!("  {} | state: {:?}", label, state);
        async {}
    }))
}

#[tokio::main]
async fn main() {
    tracing_init();

    info!("==========================================");
    warn!("A. A slow lookup is overtaken by a fast one");

    let mut effect = AsyncEffect::builder(fetch_user)
        .on_error(|error| warn!("  Main | lookup failed: {}", error))
        .build();

    effect.mount();
    effect.render(1);
    sleep(Duration::from_millis(100)).await;
    effect.render(42);
    effect
        .to_stream()
        .until_settled()
        .for_each(|state| {
            info!("  Main | state: {:?}", state);
            async {}
        })
        .await;
    effect.settled().await;
    info!("  Main | final: {:?}", effect.ensure_result());

    info!("==========================================");
    warn!("B. A skip keeps the previous value");

    let mut effect = AsyncEffect::builder(|id: u32, _live: Liveness| async move {
        (id % 2 == 0).then(|| format!("even #{id}"))
    })
    .build();
    let observer = observe("Main", &effect);

    effect.mount();
    effect.render(2);
    effect.settled().await;
    effect.render(3);
    effect.settled().await;
    info!("  Main | after skip: {:?}", effect.state());
    observer.abort();

    info!("==========================================");
    warn!("C. Unmounting mid-flight freezes the state");

    let mut effect = AsyncEffect::builder(fetch_user)
        .on_error(|error| warn!("  Main | never reported: {}", error))
        .build();
    let observer = observe("Main", &effect);

    effect.mount();
    effect.render(0);
    sleep(Duration::from_millis(60)).await;
    effect.unmount();
    effect.settled().await;
    let frozen: Async<String> = effect.state();
    info!("  Main | frozen: {:?}", frozen);
    observer.abort();
}
