//! Core library for the home-screen weather widget.
//!
//! This crate defines:
//! - Typed reads over the host's shared preferences
//! - Two-phase rendering: an immediate base view, then an icon-enriched one
//! - The refresh orchestrator and the trigger that asks the host to run it
//! - The host boundary, plus an in-process host used by the CLI and tests
//!
//! It is used by `widget-cli`, but can also be embedded by other hosts.

pub mod channel;
pub mod config;
pub mod host;
pub mod icon;
pub mod model;
pub mod orchestrator;
pub mod prefs;
pub mod render;
pub mod trigger;

pub use channel::{MethodResult, WidgetChannel};
pub use config::{Config, IconConfig};
pub use host::{
    HostError, LocalHost, RefreshChannel, WidgetInstanceId, WidgetProvider, WidgetRegistry,
    WidgetType, WidgetUpdateSurface,
};
pub use icon::{HttpIconFetcher, IconError, IconFetcher};
pub use model::PreferenceSnapshot;
pub use orchestrator::{RefreshCycle, RefreshOrchestrator, RefreshPhase};
pub use prefs::{PreferenceStore, SharedPreferences};
pub use render::{ClickAction, DecodedIcon, RenderPayload, apply_icon, render_base};
pub use trigger::UpdateTrigger;
