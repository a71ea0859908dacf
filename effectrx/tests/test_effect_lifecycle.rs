mod common;

use common::{wait_for, Calls, ErrorLog};
use effectrx::{Async, AsyncEffect, AsyncError, EffectError, Lifecycle, Liveness};
use std::future::{self, Ready};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

fn counted(calls: &Calls) -> impl Fn(u32, Liveness) -> Ready<Option<u32>> + Send + Sync + 'static {
    let calls = calls.clone();
    move |deps: u32, _live: Liveness| {
        calls.hit();
        future::ready(Some(deps))
    }
}

// Unmount while the producer is still running, then let it fail
#[tokio::test]
async fn test_unmount_before_settle_discards_error() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let errors = ErrorLog::default();
    let mut effect = AsyncEffect::builder({
        let started = started.clone();
        let release = release.clone();
        move |_deps: u32, _live: Liveness| {
            let started = started.clone();
            let release = release.clone();
            async move {
                started.notify_one();
                release.notified().await;
                Err::<String, _>(EffectError::msg("late failure"))
            }
        }
    })
    .on_error({
        let errors = errors.clone();
        move |error: &AsyncError| errors.push(error.to_string())
    })
    .build();

    effect.mount();
    effect.render(1);
    started.notified().await;
    assert_eq!(effect.state(), Async::Loading(None));

    effect.unmount();
    release.notify_one();
    effect.settled().await;

    assert_eq!(effect.state(), Async::Loading(None));
    assert!(errors.messages().is_empty());
}

// Same, but the producer succeeds
#[tokio::test]
async fn test_unmount_before_settle_discards_value() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let mut effect = AsyncEffect::builder({
        let started = started.clone();
        let release = release.clone();
        move |_deps: u32, _live: Liveness| {
            let started = started.clone();
            let release = release.clone();
            async move {
                started.notify_one();
                release.notified().await;
                Some("too late")
            }
        }
    })
    .build();

    effect.mount();
    effect.render(1);
    started.notified().await;
    effect.unmount();
    release.notify_one();
    effect.settled().await;

    assert!(!effect.lifecycle().is_mounted());
    assert_eq!(effect.state(), Async::Loading(None));
}

#[tokio::test]
async fn test_state_is_frozen_after_unmount() {
    let calls = Calls::default();
    let mut effect = AsyncEffect::builder(counted(&calls)).build();

    effect.mount();
    effect.render(1);
    effect.settled().await;
    effect.unmount();

    effect.render(2);
    effect.settled().await;
    assert_eq!(calls.count(), 1);
    assert_eq!(effect.state(), Async::success(1));
}

// Strict lifecycle checking: activate, tear down, activate in one tick
#[tokio::test]
async fn test_double_invocation_runs_producer_once() {
    let calls = Calls::default();
    let mut effect = AsyncEffect::builder(counted(&calls)).build();

    effect.mount();
    assert!(effect.render(1));
    effect.deactivate();
    assert!(effect.activate());
    effect.settled().await;

    assert_eq!(calls.count(), 1);
    assert_eq!(effect.generation(), 2);
    assert_eq!(effect.state(), Async::success(1));
}

// Strict lifecycle checking also replays mount itself
#[tokio::test]
async fn test_double_mount_runs_producer_once() {
    let calls = Calls::default();
    let mut effect = AsyncEffect::builder(counted(&calls)).build();

    effect.mount();
    effect.render(1);
    effect.unmount();
    effect.mount();
    assert!(effect.render(1));
    effect.settled().await;

    assert_eq!(calls.count(), 1);
    assert_eq!(effect.state(), Async::success(1));
}

#[tokio::test]
async fn test_remount_reruns_with_same_deps() {
    let calls = Calls::default();
    let mut effect = AsyncEffect::builder(counted(&calls)).build();

    effect.mount();
    effect.render(1);
    effect.settled().await;
    effect.unmount();

    effect.mount();
    assert!(effect.render(1));
    effect.settled().await;

    assert_eq!(calls.count(), 2);
    assert_eq!(effect.generation(), 2);
    assert_eq!(effect.state(), Async::success(1));
}

#[tokio::test]
async fn test_render_before_mount_in_same_tick() {
    let calls = Calls::default();
    let mut effect = AsyncEffect::builder(counted(&calls)).build();

    effect.render(7);
    effect.mount();
    effect.settled().await;

    assert_eq!(calls.count(), 1);
    assert_eq!(effect.state(), Async::success(7));
}

#[tokio::test]
async fn test_never_mounted_effect_does_nothing() {
    let calls = Calls::default();
    let mut effect = AsyncEffect::builder(counted(&calls)).build();

    effect.render(7);
    effect.settled().await;

    assert_eq!(calls.count(), 0);
    assert_eq!(effect.state(), Async::Uninitialized);
}

#[tokio::test]
async fn test_shared_lifecycle_unmount_stales_all_effects() {
    let lifecycle = Lifecycle::new();
    let gate = Arc::new(Semaphore::new(0));
    let producer = {
        let gate = gate.clone();
        move |deps: u32, _live: Liveness| {
            let gate = gate.clone();
            async move {
                let _permit = gate.acquire().await;
                Ok::<_, EffectError>(deps)
            }
        }
    };
    let mut first = AsyncEffect::builder(producer.clone())
        .lifecycle(&lifecycle)
        .build();
    let mut second = AsyncEffect::builder(producer).lifecycle(&lifecycle).build();

    lifecycle.mount();
    first.render(1);
    second.render(2);
    wait_for(&first, Async::is_loading).await;
    wait_for(&second, Async::is_loading).await;

    lifecycle.unmount();
    gate.add_permits(2);
    first.settled().await;
    second.settled().await;

    assert_eq!(first.state(), Async::Loading(None));
    assert_eq!(second.state(), Async::Loading(None));
}

// Activations commit on worker threads while the shared lifecycle unmounts
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_lifecycle_unmount_freezes_every_state() {
    let lifecycle = Lifecycle::new();
    let mut effects: Vec<AsyncEffect<u32, u32>> = (0..32)
        .map(|_| {
            AsyncEffect::builder(|deps: u32, _live: Liveness| async move { Some(deps) })
                .lifecycle(&lifecycle)
                .build()
        })
        .collect();

    lifecycle.mount();
    for (deps, effect) in (0u32..).zip(effects.iter_mut()) {
        effect.render(deps);
    }
    tokio::task::yield_now().await;
    lifecycle.unmount();

    let frozen: Vec<Async<u32>> = effects.iter().map(AsyncEffect::state).collect();
    for effect in effects.iter_mut() {
        effect.settled().await;
    }
    let settled: Vec<Async<u32>> = effects.iter().map(AsyncEffect::state).collect();
    assert_eq!(settled, frozen);
}

#[tokio::test]
async fn test_dropping_effect_stales_activation() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let effect_done = Arc::new(Notify::new());
    let mut effect = AsyncEffect::builder({
        let started = started.clone();
        let release = release.clone();
        move |_deps: u32, live: Liveness| {
            let started = started.clone();
            let release = release.clone();
            async move {
                started.notify_one();
                release.notified().await;
                live.is_live()
                    .then_some("still live")
                    .ok_or(EffectError::msg("stale"))
            }
        }
    })
    .on_error({
        let effect_done = effect_done.clone();
        move |_error: &AsyncError| effect_done.notify_one()
    })
    .build();

    effect.mount();
    effect.render(1);
    started.notified().await;
    drop(effect);
    release.notify_one();

    // the error path would only run if the dropped effect's activation were live
    let waited =
        tokio::time::timeout(std::time::Duration::from_millis(50), effect_done.notified()).await;
    assert!(waited.is_err());
}
