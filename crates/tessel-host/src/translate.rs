//! Pointer clicks, from window pixels to guest coordinates.

use tessel_engine::coords::{CanvasScale, Vec2};
use tessel_engine::input::{InputEvent, MouseButton, MouseButtonState, PointerButtonEvent};

use crate::guest::{Guest, GuestError};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClickKind {
    Primary,
    /// Context-menu click.
    Secondary,
}

/// A click in the guest's logical coordinate space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClickEvent {
    pub x: f32,
    pub y: f32,
    pub secondary: bool,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TranslatedClick {
    pub click: ClickEvent,
    /// The host's default handling (context menu) must not run for this event.
    pub suppress_default: bool,
}

/// Maps an on-screen offset to a guest click. Offsets outside the canvas are
/// forwarded as-is.
pub fn translate(kind: ClickKind, offset: Vec2, scale: CanvasScale) -> TranslatedClick {
    let logical = scale.to_logical(offset);
    let secondary = kind == ClickKind::Secondary;
    TranslatedClick {
        click: ClickEvent {
            x: logical.x,
            y: logical.y,
            secondary,
        },
        suppress_default: secondary,
    }
}

/// Which button transitions count as clicks.
///
/// Primary fires on left-button release, secondary on right-button press.
pub fn click_kind(ev: &PointerButtonEvent) -> Option<ClickKind> {
    match (ev.button, ev.state) {
        (MouseButton::Left, MouseButtonState::Released) => Some(ClickKind::Primary),
        (MouseButton::Right, MouseButtonState::Pressed) => Some(ClickKind::Secondary),
        _ => None,
    }
}

/// Turns runtime input events into guest clicks at a fixed scale.
#[derive(Debug, Copy, Clone)]
pub struct ClickTranslator {
    scale: CanvasScale,
}

impl ClickTranslator {
    pub fn new(scale: CanvasScale) -> Self {
        Self { scale }
    }

    #[inline]
    pub fn scale(&self) -> CanvasScale {
        self.scale
    }

    /// At most one click per event.
    pub fn translate_input(&self, ev: &InputEvent) -> Option<TranslatedClick> {
        let InputEvent::PointerButton(button) = ev else {
            return None;
        };
        let kind = click_kind(button)?;
        Some(translate(kind, Vec2::new(button.x, button.y), self.scale))
    }
}

/// Delivers one click to the guest. No retry.
pub fn forward<G: Guest + ?Sized>(guest: &mut G, click: ClickEvent) -> Result<(), GuestError> {
    guest.on_mouse_click(click.x, click.y, click.secondary)
}
