// Hand segmentation: depth + body-index → binary foreground mask.
// Visual expectation: when the mask is drawn, the player's hands (held in
// front of the torso) show up white and everything else is black.
//
// Hands are usually closer to the sensor than the torso, so we take the
// player's mean depth, pull the cut-off `offset_mm` towards the camera and
// keep player pixels nearer than that. If the whole body is closer than the
// offset, most of the player ends up foreground; that is accepted as is.

use image::{GrayImage, Luma};

use crate::types::{DepthFrame, FrameSize, NO_PLAYER};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Binary per-frame mask (255 = hand candidate, 0 = everything else).
/// Built fresh every frame and dropped once the contours are out.
#[derive(Debug, Clone, PartialEq)]
pub struct ForegroundMask {
    image: GrayImage,
}

impl ForegroundMask {
    /// All-background mask of the given size.
    pub fn blank(size: FrameSize) -> Self {
        Self { image: GrayImage::new(size.width as u32, size.height as u32) }
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.image.width() as usize, self.image.height() as usize)
    }

    #[inline]
    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        self.image.get_pixel(x as u32, y as u32)[0] == FOREGROUND
    }

    /// Number of white pixels.
    pub fn foreground_count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    /// The underlying image, for the contour finder.
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

/// Splits a player's near-camera pixels (hands/arms) from the rest of the body.
#[derive(Debug, Clone, Copy)]
pub struct HandSegmenter {
    offset_mm: f32,
}

impl HandSegmenter {
    pub fn new(offset_mm: f32) -> Self {
        Self { offset_mm }
    }

    pub fn offset_mm(&self) -> f32 {
        self.offset_mm
    }

    /// Depth below which a player pixel counts as foreground.
    pub fn threshold(&self, frame: &DepthFrame) -> f32 {
        body_average_depth(frame) - self.offset_mm
    }

    /// Classify every pixel of `frame`.
    pub fn segment(&self, frame: &DepthFrame) -> ForegroundMask {
        let size = frame.size();
        let threshold = self.threshold(frame);
        let depth = frame.depth();
        let body = frame.body_index();

        let image = GrayImage::from_fn(size.width as u32, size.height as u32, |x, y| {
            let i = y as usize * size.width + x as usize;
            // Player pixel AND nearer than (body mean - offset) → hand candidate.
            if body[i] != NO_PLAYER && (depth[i] as f32) < threshold {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });

        log::trace!("segment: threshold={threshold:.1}mm");
        ForegroundMask { image }
    }
}

/// Mean depth (mm) over every pixel labelled as belonging to a player.
/// Returns 0 when nobody is in view.
pub fn body_average_depth(frame: &DepthFrame) -> f32 {
    let mut sum = 0u64;
    let mut count = 0u64;
    for (&d, &b) in frame.depth().iter().zip(frame.body_index()) {
        if b != NO_PLAYER {
            sum += d as u64;
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { (sum as f64 / count as f64) as f32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(size: FrameSize, depth: Vec<u16>, body: Vec<u8>) -> DepthFrame {
        DepthFrame::new(size, depth, body).unwrap()
    }

    #[test]
    fn test_no_player_means_all_background() {
        let size = FrameSize::new(16, 8);
        // Depths vary wildly but nobody is labelled: nothing may light up.
        let depth: Vec<u16> = (0..size.len()).map(|i| (i * 37 % 4000) as u16).collect();
        let mask = HandSegmenter::new(150.0).segment(&frame(size, depth, vec![NO_PLAYER; size.len()]));
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn test_body_average_ignores_background() {
        let size = FrameSize::new(4, 1);
        let f = frame(size, vec![1000, 2000, 9000, 9000], vec![0, 1, NO_PLAYER, NO_PLAYER]);
        assert_eq!(body_average_depth(&f), 1500.0);
    }

    #[test]
    fn test_body_average_empty_is_zero() {
        let size = FrameSize::new(2, 2);
        let f = frame(size, vec![500; 4], vec![NO_PLAYER; 4]);
        assert_eq!(body_average_depth(&f), 0.0);
    }

    #[test]
    fn test_hand_in_front_of_torso() {
        // 10x1 strip: torso at 1000mm, two "hand" pixels at 700mm.
        let size = FrameSize::new(10, 1);
        let mut depth = vec![1000u16; 10];
        depth[3] = 700;
        depth[4] = 700;
        let f = frame(size, depth, vec![0; 10]);

        let seg = HandSegmenter::new(150.0);
        // mean = (8*1000 + 2*700)/10 = 940 → threshold 790
        assert!((seg.threshold(&f) - 790.0).abs() < 1e-3);

        let mask = seg.segment(&f);
        assert_eq!(mask.foreground_count(), 2);
        assert!(mask.is_foreground(3, 0));
        assert!(mask.is_foreground(4, 0));
        assert!(!mask.is_foreground(5, 0));
    }

    #[test]
    fn test_near_pixel_without_player_label_is_background() {
        let size = FrameSize::new(3, 1);
        let f = frame(size, vec![1000, 200, 1000], vec![0, NO_PLAYER, 0]);
        let mask = HandSegmenter::new(150.0).segment(&f);
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn test_offset_is_tunable() {
        let size = FrameSize::new(2, 1);
        let f = frame(size, vec![1000, 900], vec![0, 0]);
        // mean 950; offset 10 → threshold 940 → the 900 pixel is in
        assert_eq!(HandSegmenter::new(10.0).segment(&f).foreground_count(), 1);
        // offset 150 → threshold 800 → nothing
        assert_eq!(HandSegmenter::new(150.0).segment(&f).foreground_count(), 0);
    }
}
