use super::{Vec2, Viewport};

/// Fixed mapping between physical window pixels and logical canvas pixels.
///
/// `factor` is on-screen size divided by logical size. It is derived once when
/// the canvas window is created and never changes afterwards; the horizontal
/// axis is authoritative and the same factor is applied to both axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasScale {
    logical: Viewport,
    factor: f32,
}

impl CanvasScale {
    /// Derives the scale from the canvas' on-screen width.
    ///
    /// Returns `None` for a non-positive or non-finite factor, or an invalid
    /// logical size.
    pub fn from_on_screen_width(on_screen_width: f32, logical: Viewport) -> Option<Self> {
        if !logical.is_valid() {
            return None;
        }
        Self::new(on_screen_width / logical.width, logical)
    }

    pub fn new(factor: f32, logical: Viewport) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self { logical, factor })
    }

    #[inline]
    pub fn factor(self) -> f32 {
        self.factor
    }

    #[inline]
    pub fn logical(self) -> Viewport {
        self.logical
    }

    /// Maps an on-screen pixel offset to logical canvas coordinates.
    ///
    /// No clamping: offsets outside the canvas map outside the logical rect.
    #[inline]
    pub fn to_logical(self, offset: Vec2) -> Vec2 {
        offset / self.factor
    }

    /// On-screen size of the canvas, rounded to whole pixels.
    pub fn on_screen_size(self) -> (u32, u32) {
        let w = (self.logical.width * self.factor).round().max(1.0) as u32;
        let h = (self.logical.height * self.factor).round().max(1.0) as u32;
        (w, h)
    }
}
