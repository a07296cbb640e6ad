//! Scoped ownership of the active player handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::provider::PlayerHandle;

/// Exclusive ownership of one player handle.
///
/// The handle is destroyed exactly once: through [`release_after`], or, if
/// the lease is dropped without being released, by a task spawned from
/// `Drop`. Only the former hands back a [`JoinHandle`] to wait on, so
/// owners release explicitly and treat `Drop` as a last resort.
///
/// [`release_after`]: PlayerLease::release_after
pub(crate) struct PlayerLease {
    handle: Arc<dyn PlayerHandle>,
    released: bool,
}

impl PlayerLease {
    pub(crate) fn new(handle: Box<dyn PlayerHandle>) -> Self {
        Self {
            handle: Arc::from(handle),
            released: false,
        }
    }

    /// A second reference to the handle for issuing calls while the lease
    /// is parked elsewhere. Only the lease destroys it.
    pub(crate) fn shared(&self) -> Arc<dyn PlayerHandle> {
        Arc::clone(&self.handle)
    }

    /// Destroy the handle after `grace`, without blocking the caller.
    pub(crate) fn release_after(mut self, grace: Duration) -> JoinHandle<()> {
        self.released = true;
        let handle = Arc::clone(&self.handle);
        tokio::spawn(async move {
            if !grace.is_zero() {
                tokio::time::sleep(grace).await;
            }
            destroy_quietly(handle.as_ref()).await;
        })
    }
}

impl Drop for PlayerLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!("Player lease dropped, releasing in background");
                let handle = Arc::clone(&self.handle);
                runtime.spawn(async move {
                    destroy_quietly(handle.as_ref()).await;
                });
            }
            Err(_) => warn!("No runtime available, player handle leaked"),
        }
    }
}

async fn destroy_quietly(handle: &dyn PlayerHandle) {
    if let Err(e) = handle.destroy().await {
        debug!(error = %e, "Ignoring player destroy failure");
    }
}
