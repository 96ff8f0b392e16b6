use crate::error::StateError;
use core_types::SyncState;
use std::sync::Arc;
use tokio::sync::watch;

/// Owner of the hover index shared by the charts of one view.
///
/// Kept apart from the filters so pointer movement never wakes filter subscribers.
/// Writes are last-write-wins; writing the current value notifies nobody.
#[derive(Debug, Clone)]
pub struct SyncStore {
    tx: Arc<watch::Sender<SyncState>>,
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SyncState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Records the hovered index; returns whether it changed.
    pub fn set_active_index(&self, index: Option<usize>) -> bool {
        self.tx.send_if_modified(|state| {
            if state.active_index == index {
                return false;
            }
            state.active_index = index;
            true
        })
    }

    pub fn clear(&self) -> bool {
        self.set_active_index(None)
    }

    pub fn snapshot(&self) -> SyncState {
        *self.tx.borrow()
    }

    pub fn view(&self) -> SyncView {
        SyncView { rx: self.tx.subscribe() }
    }
}

/// Read side of the hover state, handed to every chart.
#[derive(Debug, Clone)]
pub struct SyncView {
    rx: watch::Receiver<SyncState>,
}

impl SyncView {
    pub fn snapshot(&self) -> SyncState {
        *self.rx.borrow()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.snapshot().active_index
    }

    /// Waits for the next change and returns the state it produced.
    pub async fn changed(&mut self) -> Result<SyncState, StateError> {
        self.rx.changed().await.map_err(|_| StateError::StoreClosed("sync"))?;
        Ok(*self.rx.borrow_and_update())
    }
}
