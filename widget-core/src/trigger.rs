use std::sync::Arc;

use crate::host::{HostError, RefreshChannel, WidgetRegistry, WidgetType};

/// Asks the host to redeliver an update event to every live instance of one widget type.
///
/// Fire-and-forget: it does not wait for any instance to render.
#[derive(Debug, Clone)]
pub struct UpdateTrigger {
    widget_type: WidgetType,
    registry: Arc<dyn WidgetRegistry>,
    channel: Arc<dyn RefreshChannel>,
}

impl UpdateTrigger {
    pub fn new(
        widget_type: WidgetType,
        registry: Arc<dyn WidgetRegistry>,
        channel: Arc<dyn RefreshChannel>,
    ) -> Self {
        Self {
            widget_type,
            registry,
            channel,
        }
    }

    /// Returns how many instances the refresh was addressed to.
    pub fn request_refresh(&self) -> Result<usize, HostError> {
        let ids = self.registry.list_instance_ids(&self.widget_type);
        self.channel.deliver(&self.widget_type, &ids)?;

        tracing::info!(widget_type = %self.widget_type, count = ids.len(), "refresh requested");
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WidgetInstanceId;
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct FixedRegistry(Vec<WidgetInstanceId>);

    impl WidgetRegistry for FixedRegistry {
        fn list_instance_ids(&self, _widget_type: &WidgetType) -> Vec<WidgetInstanceId> {
            self.0.clone()
        }
    }

    #[derive(Debug, Default)]
    struct RecordingChannel {
        delivered: Mutex<Vec<(WidgetType, Vec<WidgetInstanceId>)>>,
        closed: bool,
    }

    impl RefreshChannel for RecordingChannel {
        fn deliver(
            &self,
            widget_type: &WidgetType,
            ids: &[WidgetInstanceId],
        ) -> Result<(), HostError> {
            if self.closed {
                return Err(HostError::ChannelClosed);
            }
            self.delivered.lock().push((widget_type.clone(), ids.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn three_instances_are_signaled() {
        let ids: Vec<_> = [11, 12, 13].into_iter().map(WidgetInstanceId).collect();
        let channel = Arc::new(RecordingChannel::default());
        let trigger = UpdateTrigger::new(
            WidgetType::new("WeatherWidget"),
            Arc::new(FixedRegistry(ids.clone())),
            channel.clone(),
        );

        assert_eq!(trigger.request_refresh().unwrap(), 3);

        let delivered = channel.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0.as_str(), "WeatherWidget");
        assert_eq!(delivered[0].1, ids);
    }

    #[test]
    fn no_instances_returns_zero() {
        let channel = Arc::new(RecordingChannel::default());
        let trigger = UpdateTrigger::new(
            WidgetType::new("WeatherWidget"),
            Arc::new(FixedRegistry(Vec::new())),
            channel,
        );

        assert_eq!(trigger.request_refresh().unwrap(), 0);
    }

    #[test]
    fn closed_channel_is_reported() {
        let channel = Arc::new(RecordingChannel {
            closed: true,
            ..RecordingChannel::default()
        });
        let trigger = UpdateTrigger::new(
            WidgetType::new("WeatherWidget"),
            Arc::new(FixedRegistry(vec![WidgetInstanceId(1)])),
            channel,
        );

        assert!(matches!(trigger.request_refresh(), Err(HostError::ChannelClosed)));
    }
}
