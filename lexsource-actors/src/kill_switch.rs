use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A cancellation token shared by every actor in a pipeline run.
///
/// Cloning a `KillSwitch` shares the same underlying flag: killing any clone
/// kills all of them. The Coordinator's `Cancel` handler and the Rate
/// Limiter's `acquire` both observe the same switch (§5 Cancellation).
#[derive(Clone)]
pub struct KillSwitch(Arc<Inner>);

struct Inner {
    dead: AtomicBool,
    notify: Notify,
}

impl Default for KillSwitch {
    fn default() -> Self {
        KillSwitch(Arc::new(Inner {
            dead: AtomicBool::new(false),
            notify: Notify::new(),
        }))
    }
}

impl KillSwitch {
    pub fn kill(&self) {
        if !self.0.dead.swap(true, Ordering::SeqCst) {
            self.0.notify.notify_waiters();
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.0.dead.load(Ordering::SeqCst)
    }

    pub fn is_dead(&self) -> bool {
        self.0.dead.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already dead, otherwise waits for `kill()`.
    pub async fn wait(&self) {
        if self.is_dead() {
            return;
        }
        self.0.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn kill_wakes_waiters() {
        let switch = KillSwitch::default();
        assert!(switch.is_alive());
        let waiter = switch.clone();
        let handle = tokio::spawn(async move {
            waiter.wait().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        switch.kill();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("wait should resolve after kill")
            .unwrap();
        assert!(switch.is_dead());
    }
}
