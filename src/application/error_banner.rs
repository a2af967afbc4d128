// Transient error banner with auto-hide
use super::lock_unpoisoned;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct BannerState {
    message: Option<String>,
    generation: u64,
}

/// Error banner that hides itself after a fixed duration.
///
/// Every `show` bumps the generation; a hide task only clears the banner if
/// no newer message was shown in the meantime.
#[derive(Debug, Clone)]
pub struct ErrorBanner {
    state: Arc<Mutex<BannerState>>,
    duration: Duration,
}

impl ErrorBanner {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BannerState::default())),
            duration,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, message: impl Into<String>) -> u64 {
        let generation = {
            let mut state = lock_unpoisoned(&self.state);
            state.generation += 1;
            state.message = Some(message.into());
            state.generation
        };

        let state = Arc::clone(&self.state);
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut state = lock_unpoisoned(&state);
            if state.generation == generation {
                state.message = None;
            }
        });

        generation
    }

    pub fn message(&self) -> Option<String> {
        lock_unpoisoned(&self.state).message.clone()
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        lock_unpoisoned(&self.state).message.is_some()
    }
}
