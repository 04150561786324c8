//! Page location and hard navigation
//!
//! A hard navigation replaces the current page. Everything that was started
//! by the old page is stale afterwards, so every navigation bumps an epoch
//! that in-flight work compares against before touching the new page.

use parking_lot::RwLock;
use std::sync::Arc;

/// Navigations kept in `Location::visited`
pub const VISITED_LIMIT: usize = 32;

pub trait Navigator: Send + Sync {
    /// Replace the current page with `path`
    fn navigate(&self, path: &str);

    fn current_path(&self) -> String;

    /// Number of hard navigations performed so far
    fn epoch(&self) -> u64;

    /// Navigate only while the page is still the one identified by `epoch`.
    /// Returns whether this call performed the navigation.
    fn navigate_if_current(&self, epoch: u64, path: &str) -> bool;
}

#[derive(Debug)]
struct LocationState {
    path: String,
    epoch: u64,
    visited: Vec<String>,
}

/// In-process page location
#[derive(Debug, Clone)]
pub struct Location {
    state: Arc<RwLock<LocationState>>,
}

impl Location {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(LocationState {
                path: initial_path.into(),
                epoch: 0,
                visited: Vec::new(),
            })),
        }
    }

    /// Most recent paths navigated to, oldest first, at most `VISITED_LIMIT`.
    /// The initial path is not included.
    pub fn visited(&self) -> Vec<String> {
        self.state.read().visited.clone()
    }

    /// Change the path without a hard navigation (e.g. the user opened a page)
    pub fn set_path(&self, path: impl Into<String>) {
        self.state.write().path = path.into();
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/admin/dashboard")
    }
}

impl Navigator for Location {
    fn navigate(&self, path: &str) {
        let mut state = self.state.write();
        navigate_locked(&mut state, path);
    }

    fn current_path(&self) -> String {
        self.state.read().path.clone()
    }

    fn epoch(&self) -> u64 {
        self.state.read().epoch
    }

    fn navigate_if_current(&self, epoch: u64, path: &str) -> bool {
        let mut state = self.state.write();
        if state.epoch != epoch {
            return false;
        }
        navigate_locked(&mut state, path);
        true
    }
}

fn navigate_locked(state: &mut LocationState, path: &str) {
    let from = std::mem::replace(&mut state.path, path.to_string());
    state.epoch += 1;
    if state.visited.len() == VISITED_LIMIT {
        state.visited.remove(0);
    }
    state.visited.push(path.to_string());

    tracing::info!(from = %from, to = %path, epoch = state.epoch, "Navigated");
}
