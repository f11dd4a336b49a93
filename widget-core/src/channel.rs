use serde::Serialize;

use crate::trigger::UpdateTrigger;

pub const CHANNEL_NAME: &str = "widget_channel";
pub const UPDATE_WIDGET: &str = "updateWidget";

/// Reply to one method call from the host app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResult {
    Success { value: usize },
    Error { code: String, message: String },
    NotImplemented,
}

/// Command channel the host app uses to ask for a widget refresh.
#[derive(Debug, Clone)]
pub struct WidgetChannel {
    trigger: UpdateTrigger,
}

impl WidgetChannel {
    pub fn new(trigger: UpdateTrigger) -> Self {
        Self { trigger }
    }

    pub fn handle(&self, method: &str) -> MethodResult {
        match method {
            UPDATE_WIDGET => match self.trigger.request_refresh() {
                Ok(count) => MethodResult::Success { value: count },
                Err(e) => MethodResult::Error {
                    code: "UPDATE_FAILED".to_string(),
                    message: e.to_string(),
                },
            },
            other => {
                tracing::debug!(channel = CHANNEL_NAME, method = other, "unknown method");
                MethodResult::NotImplemented
            }
        }
    }
}
