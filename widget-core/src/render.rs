//! Pure transforms from cached state to a widget view.
//!
//! Rendering is split in two so the base view never waits on the network:
//! [`render_base`] fills every text field from the snapshot, and
//! [`apply_icon`] layers a decoded icon on top once one is available.

use image::RgbaImage;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;

use crate::model::PreferenceSnapshot;

/// A decoded icon bitmap. Cloning shares the pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedIcon(Arc<RgbaImage>);

impl DecodedIcon {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }
}

impl From<RgbaImage> for DecodedIcon {
    fn from(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }
}

impl Serialize for DecodedIcon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("DecodedIcon", 2)?;
        s.serialize_field("width", &self.width())?;
        s.serialize_field("height", &self.height())?;
        s.end()
    }
}

/// Launch behaviour attached to a tap on the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaunchFlags {
    /// Start the target as a new top-level task.
    pub new_task: bool,
    pub immutable: bool,
}

/// What the host opens when the widget is tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickAction {
    pub target: String,
    pub flags: LaunchFlags,
}

impl ClickAction {
    /// Open `target` (the app's entry view) in a new task.
    pub fn launch(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            flags: LaunchFlags {
                new_task: true,
                immutable: true,
            },
        }
    }
}

/// One version of the view for one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPayload {
    pub city: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
    pub wind: String,
    /// `None` means the host shows its placeholder icon.
    pub icon: Option<DecodedIcon>,
    pub click_action: ClickAction,
}

impl RenderPayload {
    pub fn has_icon(&self) -> bool {
        self.icon.is_some()
    }
}

/// Map every text field of the snapshot onto a fresh payload. The icon is left unset.
pub fn render_base(snapshot: &PreferenceSnapshot, click_target: &str) -> RenderPayload {
    RenderPayload {
        city: snapshot.city.clone(),
        temperature: snapshot.temperature.clone(),
        condition: snapshot.condition.clone(),
        humidity: snapshot.humidity.clone(),
        wind: snapshot.wind.clone(),
        icon: None,
        click_action: ClickAction::launch(click_target),
    }
}

/// Set the icon when one was decoded. Absence keeps whatever icon the payload had.
pub fn apply_icon(mut payload: RenderPayload, icon: Option<DecodedIcon>) -> RenderPayload {
    if let Some(icon) = icon {
        payload.icon = Some(icon);
    }
    payload
}
