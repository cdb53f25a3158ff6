//! Camera frames.
//!
//! - `Frame`: owned, tightly packed RGB24 image. Single owner per tick; there
//!   is intentionally no `Clone`, a frame moves from the capture device to the
//!   detector and on to the preview panel.
//!
//! Drivers normalize whatever the device produces into RGB before building a
//! `Frame`, so every consumer sees one pixel layout.

use anyhow::{anyhow, Result};

use crate::capture::normalize::{normalize_to_rgb, PixelFormat};

/// Bytes per RGB pixel.
pub const RGB_CHANNELS: usize = 3;

pub struct Frame {
    /// Packed RGB rows, `width * height * 3` bytes.
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap an RGB24 buffer. The length must match the dimensions.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Convert a device buffer in `format` into an RGB frame.
    pub fn from_pixels(pixels: &[u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let rgb = normalize_to_rgb(pixels, width, height, format)?;
        Self::from_rgb(rgb, width, height)
    }

    /// Solid-colour frame.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let len = rgb_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / RGB_CHANNELS {
            data.extend_from_slice(&rgb);
        }
        Self::from_rgb(data, width, height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let offset = self.offset(x, y)?;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    /// Write one pixel. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x > u32::MAX as i64 || y > u32::MAX as i64 {
            return;
        }
        if let Some(offset) = self.offset(x as u32, y as u32) {
            self.data[offset..offset + RGB_CHANNELS].copy_from_slice(&rgb);
        }
    }

    /// Flip left/right in place so the preview behaves like a mirror.
    pub fn mirror_horizontal(&mut self) {
        let row_bytes = self.width as usize * RGB_CHANNELS;
        if row_bytes == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(row_bytes) {
            let (mut left, mut right) = (0usize, self.width as usize - 1);
            while left < right {
                for c in 0..RGB_CHANNELS {
                    row.swap(left * RGB_CHANNELS + c, right * RGB_CHANNELS + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }

    /// Nearest-neighbour resize, used for the HUD camera panel.
    pub fn resized(&self, width: u32, height: u32) -> Result<Frame> {
        if width == self.width && height == self.height {
            return Frame::from_rgb(self.data.clone(), width, height);
        }
        let len = rgb_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height as u64 {
            let src_y = (y * self.height as u64 / height.max(1) as u64) as u32;
            for x in 0..width as u64 {
                let src_x = (x * self.width as u64 / width.max(1) as u64) as u32;
                match self.pixel(src_x, src_y) {
                    Some(rgb) => data.extend_from_slice(&rgb),
                    None => data.extend_from_slice(&[0, 0, 0]),
                }
            }
        }
        Frame::from_rgb(data, width, height)
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * RGB_CHANNELS)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn rgb_len(width: u32, height: u32) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(RGB_CHANNELS as u32))
        .map(|v| v as usize)
        .ok_or_else(|| anyhow!("RGB frame dimensions overflow"))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
