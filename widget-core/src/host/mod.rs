//! Boundary between the widget core and the environment that hosts widgets.
//!
//! The host owns instance ids, the display surface and the broadcast channel.
//! The core only consumes these through the traits below.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use thiserror::Error;

use crate::orchestrator::RefreshCycle;
use crate::render::RenderPayload;

pub mod local;

pub use local::{CommitRecord, LocalHost};

/// Opaque id the host assigns to one placed widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetInstanceId(pub i32);

impl fmt::Display for WidgetInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i32> for WidgetInstanceId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Name of a widget provider class registered with the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetType(String);

impl WidgetType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    /// The instance was removed from the host before the commit arrived.
    #[error("widget instance {0} is not placed on the host")]
    UnknownInstance(WidgetInstanceId),

    #[error("refresh broadcast channel is closed")]
    ChannelClosed,
}

/// Lists the live instances of a widget type.
pub trait WidgetRegistry: Send + Sync + Debug {
    fn list_instance_ids(&self, widget_type: &WidgetType) -> Vec<WidgetInstanceId>;
}

/// Display surface that accepts rendered views. Commits are idempotent.
pub trait WidgetUpdateSurface: Send + Sync + Debug {
    fn commit(&self, id: WidgetInstanceId, payload: &RenderPayload) -> Result<(), HostError>;
}

/// Asks the host to redeliver an update event for the given instances.
pub trait RefreshChannel: Send + Sync + Debug {
    fn deliver(&self, widget_type: &WidgetType, ids: &[WidgetInstanceId]) -> Result<(), HostError>;
}

/// Lifecycle hook the host drives when widget instances need redrawing.
pub trait WidgetProvider: Send + Sync {
    fn on_update(&self, ids: &[WidgetInstanceId]) -> RefreshCycle;
}
