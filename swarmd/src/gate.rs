//! Pause gate shared by the tick loop and the command router.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

struct GateState {
    paused: Mutex<bool>,
    /// Last committed value, readable without waiting for a tick to finish.
    mirror: AtomicBool,
}

/// A toggle and a tick body are serialized on the same lock, so a pause can
/// never land halfway through a generation.
#[derive(Clone)]
pub struct PauseGate {
    state: Arc<GateState>,
}

impl PauseGate {
    pub fn new(paused: bool) -> Self {
        Self {
            state: Arc::new(GateState {
                paused: Mutex::new(paused),
                mirror: AtomicBool::new(paused),
            }),
        }
    }

    /// Flip the flag; waits for any tick in progress. Returns the new value.
    pub async fn toggle(&self) -> bool {
        let mut paused = self.state.paused.lock().await;
        *paused = !*paused;
        self.state.mirror.store(*paused, Ordering::Release);
        *paused
    }

    /// Hold the gate for a whole tick body (or a wholesale replace).
    pub async fn exclusive(&self) -> TickGuard<'_> {
        TickGuard {
            paused: self.state.paused.lock().await,
        }
    }

    /// Non-blocking read for display and status.
    pub fn peek(&self) -> bool {
        self.state.mirror.load(Ordering::Acquire)
    }
}

pub struct TickGuard<'a> {
    paused: MutexGuard<'a, bool>,
}

impl TickGuard<'_> {
    pub fn is_paused(&self) -> bool {
        *self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn toggle_flips() {
        let gate = PauseGate::new(false);
        assert!(gate.toggle().await);
        assert!(gate.peek());
        assert!(!gate.toggle().await);
        assert!(!gate.exclusive().await.is_paused());
    }

    #[tokio::test]
    async fn toggle_waits_for_tick_body() {
        let gate = PauseGate::new(false);
        let guard = gate.exclusive().await;

        let other = gate.clone();
        let toggler = tokio::spawn(async move { other.toggle().await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!toggler.is_finished());
        assert!(!guard.is_paused());
        assert!(!gate.peek());

        drop(guard);
        assert!(toggler.await.unwrap());
        assert!(gate.peek());
        assert!(gate.exclusive().await.is_paused());
    }
}
