use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, try_alloc};

/// Bytes per pixel. Pixels are 8-bit, stored blue, green, red.
pub const CHANNELS: usize = 3;

/// Image dimensions shared with every worker before it sizes its buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
}

impl ImageGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one tightly packed row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn byte_len(&self) -> usize {
        self.stride() * self.height as usize
    }
}

/// Row-major 24-bit pixel buffer with no row padding.
///
/// Row `y` occupies `data[y * stride .. (y + 1) * stride]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-filled buffer. Fails with `AllocationFailure` rather than aborting.
    pub fn new(width: u32, height: u32) -> Result<Self, PipelineError> {
        check_dimensions(width, height)?;
        let len = ImageGeometry::new(width, height).byte_len();
        Ok(Self {
            width,
            height,
            data: try_alloc(len)?,
        })
    }

    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PipelineError> {
        check_dimensions(width, height)?;
        let expected = ImageGeometry::new(width, height).byte_len();
        if data.len() != expected {
            return Err(PipelineError::invalid(format!(
                "expected {expected} bytes for {width}x{height} RGB, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer where every pixel is `bgr`.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Result<Self, PipelineError> {
        let mut buf = Self::new(width, height)?;
        for pixel in buf.data.chunks_exact_mut(CHANNELS) {
            pixel.copy_from_slice(&bgr);
        }
        Ok(buf)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn geometry(&self) -> ImageGeometry {
        ImageGeometry::new(self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Contiguous bytes of `rows`.
    pub fn rows(&self, rows: Range<u32>) -> &[u8] {
        let stride = self.stride();
        &self.data[rows.start as usize * stride..rows.end as usize * stride]
    }

    /// Pixel at `(x, y)` in stored (B, G, R) order, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * CHANNELS;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Writes the pixel at `(x, y)`. Returns false when out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.stride() + x as usize * CHANNELS;
        self.data[idx..idx + CHANNELS].copy_from_slice(&bgr);
        true
    }

    /// Owned copy of `rows` as a standalone buffer.
    pub fn copy_rows(&self, rows: Range<u32>) -> Result<Self, PipelineError> {
        let src = self.rows(rows.clone());
        let mut data = try_alloc(src.len())?;
        data.copy_from_slice(src);
        Ok(Self {
            width: self.width,
            height: rows.end - rows.start,
            data,
        })
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}
