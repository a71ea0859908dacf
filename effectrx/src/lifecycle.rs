use futures_signals::signal::{Mutable, MutableLockMut, MutableLockRef};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Mount state of a component, shared by all of its effects.
///
/// Every mount opens an *epoch*; each effect activation takes a child token
/// of the current epoch, so unmounting stales every in-flight activation of
/// every effect at once. A later `mount` opens a fresh epoch and leaves the
/// old generations stale.
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
}

#[derive(Debug, Default)]
struct LifecycleInner {
    mounted: AtomicBool,
    epoch: Mutable<CancellationToken>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run once per mount, before or in the same tick as the first activation.
    pub fn mount(&self) {
        let _epoch = self.open_epoch();
        self.inner.mounted.store(true, Ordering::SeqCst);
    }

    /// Run once on teardown.
    ///
    /// Waits for commits already in progress on any effect of this lifecycle;
    /// once it returns, no activation of the closed epoch writes again.
    pub fn unmount(&self) {
        let epoch = self.inner.epoch.lock_mut();
        self.inner.mounted.store(false, Ordering::SeqCst);
        epoch.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// A token for a new activation. An activation issued while unmounted
    /// belongs to the next mount.
    pub(crate) fn generation_token(&self) -> CancellationToken {
        self.open_epoch().child_token()
    }

    /// Held by a commit across its liveness check and its write, so `unmount`
    /// cannot land in between.
    pub(crate) fn hold_epoch(&self) -> MutableLockRef<'_, CancellationToken> {
        self.inner.epoch.lock_ref()
    }

    fn open_epoch(&self) -> MutableLockMut<'_, CancellationToken> {
        let mut epoch = self.inner.epoch.lock_mut();
        if epoch.is_cancelled() {
            *epoch = CancellationToken::new();
        }
        epoch
    }
}

/// The liveness predicate handed to a producer.
///
/// Live while the component is mounted and the activation it was created for
/// has not been superseded. Purely advisory: nothing stops a producer that
/// ignores it, its result is just never applied.
#[derive(Clone, Debug)]
pub struct Liveness {
    lifecycle: Lifecycle,
    token: CancellationToken,
    generation: u64,
}

impl Liveness {
    pub(crate) fn new(lifecycle: Lifecycle, token: CancellationToken, generation: u64) -> Self {
        Self {
            lifecycle,
            token,
            generation,
        }
    }

    pub fn is_live(&self) -> bool {
        self.lifecycle.is_mounted() && !self.token.is_cancelled()
    }

    /// Resolves once this activation is superseded or the component unmounts.
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }

    /// Sequence number of the activation, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub(crate) fn stale(&self) {
        self.token.cancel();
    }
}
