use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 需要记住滚动位置的界面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    Read,
    Learn,
}

#[derive(Debug, Default)]
struct ScrollState {
    committed: HashMap<Screen, usize>,
    pending: HashMap<Screen, (u64, usize)>,
    generation: u64,
}

/// 各界面的滚动位置，后写覆盖先写。
///
/// 写入先进入待定状态，在防抖时间内没有新的写入才会生效。
/// `record` 需要在 tokio 运行时中调用。
#[derive(Debug, Clone)]
pub struct ScrollPositions {
    state: Arc<Mutex<ScrollState>>,
    debounce: Duration,
}

impl ScrollPositions {
    pub fn new(debounce: Duration) -> Self {
        ScrollPositions { state: Arc::new(Mutex::new(ScrollState::default())), debounce }
    }

    pub fn from_millis(debounce_ms: u64) -> Self {
        Self::new(Duration::from_millis(debounce_ms))
    }

    /// 已生效的位置，从未写过时为 0
    pub fn get(&self, screen: Screen) -> usize {
        self.lock().committed.get(&screen).copied().unwrap_or(0)
    }

    pub fn record(&self, screen: Screen, index: usize) {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            let generation = state.generation;
            state.pending.insert(screen, (generation, index));
            generation
        };

        let state = Arc::clone(&self.state);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(&(latest, index)) = state.pending.get(&screen) {
                if latest == generation {
                    state.pending.remove(&screen);
                    state.committed.insert(screen, index);
                    debug!(?screen, index, "scroll position committed");
                }
            }
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScrollState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
