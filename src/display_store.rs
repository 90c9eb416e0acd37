use crate::bus::{Bus, DISPLAY_CHANGES};
use crate::domain::DisplaySettings;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, instrument};

#[derive(Debug, Default)]
struct DisplayState {
    by_device: HashMap<String, DisplaySettings>,
    latest: Option<DisplaySettings>,
}

/// Last known display settings, published on `display-changes` whenever they are replaced.
#[derive(Debug)]
pub struct DisplayStateStore {
    state: Mutex<DisplayState>,
    changes: Bus<DisplaySettings>,
}

impl DisplayStateStore {
    pub fn new() -> Self {
        DisplayStateStore {
            state: Mutex::new(DisplayState::default()),
            changes: Bus::new(DISPLAY_CHANGES),
        }
    }

    #[instrument(skip_all, fields(device_id = settings.device))]
    pub fn update(&self, settings: DisplaySettings) {
        info!("🖥️ Changing display settings to {:?}", settings);

        // Publishing under the state lock keeps the publish order equal to the write order.
        let mut state = self.lock();
        state.by_device.insert(settings.device.clone(), settings.clone());
        state.latest = Some(settings.clone());
        let subscribers = self.changes.publish(settings);

        debug!(subscribers, "🖥️ Published display settings");
    }

    /// The most recently written settings, regardless of device.
    pub fn current(&self) -> Option<DisplaySettings> {
        self.lock().latest.clone()
    }

    pub fn current_for(&self, device: &str) -> Option<DisplaySettings> {
        self.lock().by_device.get(device).cloned()
    }

    pub fn subscribe(&self) -> UnboundedReceiver<DisplaySettings> {
        self.changes.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DisplayStateStore {
    fn default() -> Self {
        DisplayStateStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use test_log::test;

    #[test]
    fn current_is_absent_until_the_first_update() {
        let store = DisplayStateStore::new();

        assert_eq!(store.current(), None);
        assert_eq!(store.current_for("dev-1"), None);
    }

    #[test]
    fn update_replaces_the_current_value() {
        let store = DisplayStateStore::new();

        store.update(DisplaySettings::new("dev-1", true));
        store.update(DisplaySettings::new("dev-1", false));

        assert_eq!(store.current(), Some(DisplaySettings::new("dev-1", false)));
        assert_eq!(store.current_for("dev-1"), Some(DisplaySettings::new("dev-1", false)));
    }

    #[test]
    fn keeps_one_value_per_device() {
        let store = DisplayStateStore::new();

        store.update(DisplaySettings::new("dev-1", true));
        store.update(DisplaySettings::new("dev-2", false));

        assert_eq!(store.current(), Some(DisplaySettings::new("dev-2", false)));
        assert_eq!(store.current_for("dev-1"), Some(DisplaySettings::new("dev-1", true)));
        assert_eq!(store.current_for("dev-2"), Some(DisplaySettings::new("dev-2", false)));
    }

    #[test]
    fn publishes_every_update_in_write_order() {
        let store = DisplayStateStore::new();
        let mut rx = store.subscribe();

        store.update(DisplaySettings::new("dev-1", true));
        store.update(DisplaySettings::new("dev-1", true));
        store.update(DisplaySettings::new("dev-1", false));

        assert_eq!(rx.try_recv().ok(), Some(DisplaySettings::new("dev-1", true)));
        assert_eq!(rx.try_recv().ok(), Some(DisplaySettings::new("dev-1", true)));
        assert_eq!(rx.try_recv().ok(), Some(DisplaySettings::new("dev-1", false)));
        assert!(rx.try_recv().is_err());
    }

    #[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn concurrent_updates_are_published_in_the_order_they_are_stored() {
        let store = Arc::new(DisplayStateStore::new());
        let mut rx = store.subscribe();

        let handles = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.update(DisplaySettings::new(format!("dev-{i}"), i % 2 == 0)) })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut last = None;
        let mut received = 0;
        while let Ok(settings) = rx.try_recv() {
            received += 1;
            last = Some(settings);
        }

        assert_eq!(received, 32);
        assert_eq!(last, store.current());
    }
}
