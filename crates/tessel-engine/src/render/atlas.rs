use anyhow::{ensure, Result};

/// CPU-side RGBA8 image uploaded once as a sampling atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl AtlasImage {
    /// Wraps tightly packed RGBA8 pixels (row-major, top row first).
    pub fn from_rgba8(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "atlas has zero size ({width}x{height})");
        let expected = width as usize * height as usize * 4;
        ensure!(
            rgba.len() == expected,
            "atlas pixel data is {} bytes, expected {expected} for {width}x{height}",
            rgba.len()
        );
        Ok(Self { width, height, rgba })
    }

    /// 1x1 opaque white: sampling it leaves vertex colors untouched.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![0xff; 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}
