// Core frame types shared by the sensor, the tracking pipeline and the renderer.

use crate::error::{Error, Result};

/// Body-index value meaning "no tracked player owns this pixel".
pub const NO_PLAYER: u8 = 255;

/// Width/height of the depth image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
}

impl FrameSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A black buffer of the given size.
    pub fn new(size: FrameSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![0u32; size.len()],
        }
    }
}

/// One sensor frame: depth in millimetres (0 = no return) plus the parallel
/// body-index labels, both row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    size: FrameSize,
    depth: Vec<u16>,
    body_index: Vec<u8>,
}

impl DepthFrame {
    pub fn new(size: FrameSize, depth: Vec<u16>, body_index: Vec<u8>) -> Result<Self> {
        if depth.len() != size.len() || body_index.len() != size.len() {
            return Err(Error::FrameShape {
                expected: size.len(),
                depth: depth.len(),
                body_index: body_index.len(),
            });
        }
        Ok(Self { size, depth, body_index })
    }

    /// A frame with no samples at all; the pipeline treats it as "no input".
    pub fn empty() -> Self {
        Self {
            size: FrameSize::new(0, 0),
            depth: Vec::new(),
            body_index: Vec::new(),
        }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn depth(&self) -> &[u16] {
        &self.depth
    }

    pub fn body_index(&self) -> &[u8] {
        &self.body_index
    }

    #[inline]
    pub fn depth_at(&self, x: usize, y: usize) -> u16 {
        self.depth[y * self.size.width + x]
    }
}
