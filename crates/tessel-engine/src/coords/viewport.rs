/// Canvas resolution in logical pixels.
///
/// This is the coordinate basis guests draw in; the stream shader converts it to
/// NDC through the `resolution` uniform.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.width, self.height]
    }
}
