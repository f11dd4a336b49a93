//! In-process host: keeps placed instances, the last committed view of each,
//! and queues refresh broadcasts until they are dispatched to a provider.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc;

use super::{
    HostError, RefreshChannel, WidgetInstanceId, WidgetProvider, WidgetRegistry, WidgetType,
    WidgetUpdateSurface,
};
use crate::orchestrator::RefreshCycle;
use crate::render::RenderPayload;

#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    pub id: WidgetInstanceId,
    pub committed_at: DateTime<Utc>,
    pub payload: RenderPayload,
}

#[derive(Debug, Clone)]
struct RefreshBroadcast {
    widget_type: WidgetType,
    ids: Vec<WidgetInstanceId>,
}

#[derive(Debug)]
pub struct LocalHost {
    widget_type: WidgetType,
    instances: RwLock<BTreeSet<WidgetInstanceId>>,
    views: Mutex<HashMap<WidgetInstanceId, RenderPayload>>,
    history: Mutex<Vec<CommitRecord>>,
    outbox: mpsc::UnboundedSender<RefreshBroadcast>,
    inbox: Mutex<mpsc::UnboundedReceiver<RefreshBroadcast>>,
}

impl LocalHost {
    pub fn new(widget_type: WidgetType) -> Self {
        let (outbox, inbox) = mpsc::unbounded_channel();
        Self {
            widget_type,
            instances: RwLock::new(BTreeSet::new()),
            views: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
            outbox,
            inbox: Mutex::new(inbox),
        }
    }

    pub fn with_instances(self, ids: impl IntoIterator<Item = WidgetInstanceId>) -> Self {
        self.instances.write().extend(ids);
        self
    }

    pub fn widget_type(&self) -> &WidgetType {
        &self.widget_type
    }

    pub fn place(&self, id: WidgetInstanceId) {
        self.instances.write().insert(id);
    }

    /// Remove an instance and forget its view. Later commits to it are rejected.
    pub fn remove(&self, id: WidgetInstanceId) {
        self.instances.write().remove(&id);
        self.views.lock().remove(&id);
    }

    /// Latest view committed for `id`.
    pub fn view(&self, id: WidgetInstanceId) -> Option<RenderPayload> {
        self.views.lock().get(&id).cloned()
    }

    /// Every accepted commit, oldest first.
    pub fn history(&self) -> Vec<CommitRecord> {
        self.history.lock().clone()
    }

    /// Hand queued refresh broadcasts to `provider`. Broadcasts addressed to a
    /// different widget type are dropped.
    pub fn dispatch_pending(&self, provider: &dyn WidgetProvider) -> RefreshCycle {
        let mut cycle = RefreshCycle::default();
        let mut inbox = self.inbox.lock();

        while let Ok(broadcast) = inbox.try_recv() {
            if broadcast.widget_type != self.widget_type {
                tracing::debug!(
                    widget_type = %broadcast.widget_type,
                    "ignoring broadcast for other widget type"
                );
                continue;
            }

            tracing::info!(count = broadcast.ids.len(), "dispatching widget update");
            cycle.extend(provider.on_update(&broadcast.ids));
        }

        cycle
    }
}

impl WidgetRegistry for LocalHost {
    fn list_instance_ids(&self, widget_type: &WidgetType) -> Vec<WidgetInstanceId> {
        if *widget_type != self.widget_type {
            return Vec::new();
        }
        self.instances.read().iter().copied().collect()
    }
}

impl WidgetUpdateSurface for LocalHost {
    fn commit(&self, id: WidgetInstanceId, payload: &RenderPayload) -> Result<(), HostError> {
        // Held across the inserts: a view never outlives its instance.
        let instances = self.instances.read();
        if !instances.contains(&id) {
            return Err(HostError::UnknownInstance(id));
        }

        self.views.lock().insert(id, payload.clone());
        self.history.lock().push(CommitRecord {
            id,
            committed_at: Utc::now(),
            payload: payload.clone(),
        });
        drop(instances);

        Ok(())
    }
}

impl RefreshChannel for LocalHost {
    fn deliver(&self, widget_type: &WidgetType, ids: &[WidgetInstanceId]) -> Result<(), HostError> {
        self.outbox
            .send(RefreshBroadcast {
                widget_type: widget_type.clone(),
                ids: ids.to_vec(),
            })
            .map_err(|_| HostError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PreferenceSnapshot;
    use crate::render::render_base;

    #[derive(Default)]
    struct CountingProvider {
        calls: Mutex<Vec<Vec<WidgetInstanceId>>>,
    }

    impl WidgetProvider for CountingProvider {
        fn on_update(&self, ids: &[WidgetInstanceId]) -> RefreshCycle {
            self.calls.lock().push(ids.to_vec());
            RefreshCycle::default()
        }
    }

    fn host() -> LocalHost {
        LocalHost::new(WidgetType::new("WeatherWidget"))
            .with_instances([WidgetInstanceId(1), WidgetInstanceId(2)])
    }

    fn payload() -> RenderPayload {
        render_base(&PreferenceSnapshot::default(), "MainActivity")
    }

    #[test]
    fn registry_lists_only_own_widget_type() {
        let host = host();

        assert_eq!(
            host.list_instance_ids(&WidgetType::new("WeatherWidget")),
            vec![WidgetInstanceId(1), WidgetInstanceId(2)]
        );
        assert!(host.list_instance_ids(&WidgetType::new("ClockWidget")).is_empty());
    }

    #[test]
    fn commit_updates_view_and_history() {
        let host = host();

        host.commit(WidgetInstanceId(1), &payload()).unwrap();
        host.commit(WidgetInstanceId(1), &payload()).unwrap();

        assert_eq!(host.view(WidgetInstanceId(1)), Some(payload()));
        assert_eq!(host.history().len(), 2);
        assert!(host.view(WidgetInstanceId(2)).is_none());
    }

    #[test]
    fn commit_to_removed_instance_is_rejected() {
        let host = host();
        host.commit(WidgetInstanceId(2), &payload()).unwrap();
        host.remove(WidgetInstanceId(2));

        let err = host.commit(WidgetInstanceId(2), &payload()).unwrap_err();

        assert!(matches!(err, HostError::UnknownInstance(WidgetInstanceId(2))));
        assert!(host.view(WidgetInstanceId(2)).is_none());
    }

    #[test]
    fn commit_racing_remove_never_leaves_a_view() {
        use std::sync::Barrier;

        let id = WidgetInstanceId(3);
        let host = host();

        for _ in 0..2_000 {
            host.place(id);
            let barrier = Barrier::new(2);

            std::thread::scope(|s| {
                s.spawn(|| {
                    barrier.wait();
                    let _ = host.commit(id, &payload());
                });
                s.spawn(|| {
                    barrier.wait();
                    host.remove(id);
                });
            });

            assert!(host.view(id).is_none());
            assert_eq!(host.list_instance_ids(host.widget_type()).len(), 2);
        }
    }

    #[test]
    fn delivered_broadcasts_reach_provider_once() {
        let host = host();
        let provider = CountingProvider::default();
        let own = WidgetType::new("WeatherWidget");

        host.deliver(&own, &[WidgetInstanceId(1), WidgetInstanceId(2)]).unwrap();
        host.deliver(&WidgetType::new("ClockWidget"), &[WidgetInstanceId(5)]).unwrap();

        host.dispatch_pending(&provider);
        host.dispatch_pending(&provider);

        assert_eq!(
            *provider.calls.lock(),
            vec![vec![WidgetInstanceId(1), WidgetInstanceId(2)]]
        );
    }

    #[test]
    fn placed_instance_becomes_listed() {
        let host = host();
        host.place(WidgetInstanceId(7));

        assert_eq!(host.list_instance_ids(host.widget_type()).len(), 3);
    }
}
