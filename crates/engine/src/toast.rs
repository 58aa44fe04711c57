//! Bounded, self-expiring notification board.
//!
//! Each toast schedules its own removal on the ambient tokio runtime; manual
//! dismissal or eviction aborts the pending timer. Outside a runtime toasts
//! only leave through dismissal or eviction.

use crate::types::{ToastKind, ToastMessage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_TOAST_CAPACITY: usize = 5;
pub const DEFAULT_TOAST_LIFETIME: Duration = Duration::from_secs(5);

struct ActiveToast {
    toast: ToastMessage,
    timer: Option<JoinHandle<()>>,
}

impl ActiveToast {
    fn cancel(self) -> ToastMessage {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        self.toast
    }
}

#[derive(Default)]
struct BoardState {
    next_id: u64,
    entries: VecDeque<ActiveToast>,
}

#[derive(Clone)]
pub struct ToastBoard {
    state: Arc<Mutex<BoardState>>,
    capacity: usize,
    lifetime: Duration,
}

impl ToastBoard {
    pub fn new(capacity: usize, lifetime: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::default())),
            capacity: capacity.max(1),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Add a toast, evicting the oldest when full. Returns the new toast id.
    pub fn push(&self, kind: ToastKind, title: impl Into<String>, message: impl Into<String>) -> u64 {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;

        while state.entries.len() >= self.capacity {
            if let Some(evicted) = state.entries.pop_front() {
                let evicted = evicted.cancel();
                tracing::debug!(toast_id = evicted.id, "toast evicted");
            }
        }

        let toast = ToastMessage {
            id,
            kind,
            title: title.into(),
            message: message.into(),
        };
        let timer = self.schedule_expiry(id);
        state.entries.push_back(ActiveToast { toast, timer });
        id
    }

    /// Remove a toast before it expires. Returns false for unknown ids.
    pub fn dismiss(&self, id: u64) -> bool {
        let removed = {
            let mut state = lock(&self.state);
            let pos = state.entries.iter().position(|t| t.toast.id == id);
            pos.and_then(|p| state.entries.remove(p))
        };
        match removed {
            Some(active) => {
                active.cancel();
                true
            }
            None => false,
        }
    }

    /// Visible toasts, oldest first.
    pub fn list(&self) -> Vec<ToastMessage> {
        lock(&self.state)
            .entries
            .iter()
            .map(|t| t.toast.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn schedule_expiry(&self, id: u64) -> Option<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let state: Weak<Mutex<BoardState>> = Arc::downgrade(&self.state);
        let lifetime = self.lifetime;
        Some(handle.spawn(async move {
            tokio::time::sleep(lifetime).await;
            if let Some(state) = state.upgrade() {
                let mut state = lock(&state);
                state.entries.retain(|t| t.toast.id != id);
            }
        }))
    }
}

impl Default for ToastBoard {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_CAPACITY, DEFAULT_TOAST_LIFETIME)
    }
}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
