// Contour analysis: mask → hand-sized blobs → centre + average depth.
//
// The heavy lifting (border following, min-area rectangles) lives behind
// `ContourBackend`; the default backend is imageproc. Everything else here
// is plain arithmetic over the mask and the depth buffer.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;

use crate::segment::{ForegroundMask, BACKGROUND};
use crate::types::DepthFrame;

/// Closed outer boundary of one connected foreground region, in pixel coords.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
}

impl Contour {
    pub fn new(points: Vec<(i32, i32)>) -> Self {
        Self { points }
    }

    /// Axis-aligned box around every point. `right`/`bottom` are exclusive.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox { left: i32::MAX, top: i32::MAX, right: i32::MIN, bottom: i32::MIN };
        for &(x, y) in &self.points {
            bb.left = bb.left.min(x);
            bb.top = bb.top.min(y);
            bb.right = bb.right.max(x + 1);
            bb.bottom = bb.bottom.max(y + 1);
        }
        if self.points.is_empty() {
            return BoundingBox::default();
        }
        bb
    }
}

/// Integer pixel box, half-open on the right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Smallest-area rectangle (any rotation) around a contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f32, f32),
    pub size: (f32, f32),
    /// Direction of the first edge, degrees.
    pub angle_deg: f32,
}

impl RotatedRect {
    /// Build from four corners given in boundary order.
    pub fn from_corners(c: [(f32, f32); 4]) -> Self {
        let cx = (c[0].0 + c[1].0 + c[2].0 + c[3].0) / 4.0;
        let cy = (c[0].1 + c[1].1 + c[2].1 + c[3].1) / 4.0;
        let edge = |a: (f32, f32), b: (f32, f32)| ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        let angle = (c[1].1 - c[0].1).atan2(c[1].0 - c[0].0).to_degrees();
        Self {
            center: (cx, cy),
            size: (edge(c[0], c[1]), edge(c[1], c[2])),
            angle_deg: angle,
        }
    }
}

/// Contour-finding and moment primitives the analyzer relies on.
pub trait ContourBackend {
    /// Outer boundaries only; holes and anything nested inside them are skipped.
    fn outer_contours(&self, mask: &ForegroundMask) -> Vec<Contour>;

    /// Enclosed polygon area (shoelace), in px².
    fn area(&self, contour: &Contour) -> f64 {
        polygon_area(&contour.points)
    }

    fn min_area_rect(&self, contour: &Contour) -> RotatedRect;
}

/// Default backend built on `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocContours;

impl ContourBackend for ImageprocContours {
    fn outer_contours(&self, mask: &ForegroundMask) -> Vec<Contour> {
        // find_contours treats the image edge as foreground-adjacent, so a blob
        // touching it would come back as a hole. Trace on a 1px background frame.
        let padded = padded(mask.as_image());
        find_contours::<i32>(&padded)
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .map(|c| Contour::new(c.points.iter().map(|p| (p.x - 1, p.y - 1)).collect()))
            .collect()
    }

    fn min_area_rect(&self, contour: &Contour) -> RotatedRect {
        let pts: Vec<Point<i32>> = contour.points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let corners = min_area_rect(pts.as_slice());
        RotatedRect::from_corners(corners.map(|p| (p.x as f32, p.y as f32)))
    }
}

/// Copy of `image` with a one-pixel background border on every side.
fn padded(image: &GrayImage) -> GrayImage {
    let (w, h) = image.dimensions();
    GrayImage::from_fn(w + 2, h + 2, |x, y| {
        if x == 0 || y == 0 || x > w || y > h {
            Luma([BACKGROUND])
        } else {
            *image.get_pixel(x - 1, y - 1)
        }
    })
}

/// Shoelace area of a closed polygon; orientation-independent.
pub fn polygon_area(points: &[(i32, i32)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, &(x0, y0)) in points.iter().enumerate() {
        let (x1, y1) = points[(i + 1) % points.len()];
        twice += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    (twice.abs() as f64) / 2.0
}

/// What one surviving contour says about the hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedHand {
    /// Min-area rectangle centre, pixel space.
    pub center: (f32, f32),
    /// Mean depth of the foreground pixels inside the contour's box, metres.
    pub average_depth_m: f32,
    /// Contour area in px².
    pub area: f64,
}

/// A surviving contour together with the geometry derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub hand: TrackedHand,
    pub contour: Contour,
    pub rect: RotatedRect,
    pub bounds: BoundingBox,
}

/// Mean depth (metres) of foreground pixels inside `bounds`. 0 if there are none.
pub fn average_depth_in_box(mask: &ForegroundMask, frame: &DepthFrame, bounds: BoundingBox) -> f32 {
    let (size, mask_size) = (frame.size(), mask.size());
    // Clip to both buffers so a bogus box or a mismatched mask can't index out of range.
    let left = bounds.left.max(0) as usize;
    let top = bounds.top.max(0) as usize;
    let right = (bounds.right.max(0) as usize).min(size.width).min(mask_size.width);
    let bottom = (bounds.bottom.max(0) as usize).min(size.height).min(mask_size.height);

    let mut sum = 0u64;
    let mut count = 0u64;
    for y in top..bottom {
        for x in left..right {
            if mask.is_foreground(x, y) {
                sum += frame.depth_at(x, y) as u64;
                count += 1;
            }
        }
    }
    if count == 0 {
        return 0.0;
    }
    (sum as f64 / count as f64 / 1000.0) as f32
}

/// Filters contours by area and summarises each survivor.
pub struct ContourAnalyzer<B = ImageprocContours> {
    min_area: f64,
    backend: B,
}

impl ContourAnalyzer<ImageprocContours> {
    pub fn new(min_area: f64) -> Self {
        Self::with_backend(min_area, ImageprocContours)
    }
}

impl<B: ContourBackend> ContourAnalyzer<B> {
    pub fn with_backend(min_area: f64, backend: B) -> Self {
        Self { min_area, backend }
    }

    pub fn min_area(&self) -> f64 {
        self.min_area
    }

    /// Every contour with area >= `min_area`, in the backend's enumeration order.
    pub fn detect(&self, mask: &ForegroundMask, frame: &DepthFrame) -> Vec<Detection> {
        let mut out = Vec::new();
        for contour in self.backend.outer_contours(mask) {
            let area = self.backend.area(&contour);
            if area < self.min_area {
                log::trace!("contour rejected: area={area:.0}px²");
                continue;
            }
            let rect = self.backend.min_area_rect(&contour);
            let bounds = contour.bounding_box();
            let average_depth_m = average_depth_in_box(mask, frame, bounds);
            out.push(Detection {
                hand: TrackedHand { center: rect.center, average_depth_m, area },
                contour,
                rect,
                bounds,
            });
        }
        out
    }

    /// Just the hand summaries, same order as [`detect`](Self::detect).
    pub fn analyze(&self, mask: &ForegroundMask, frame: &DepthFrame) -> Vec<TrackedHand> {
        self.detect(mask, frame).into_iter().map(|d| d.hand).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::HandSegmenter;
    use crate::types::{FrameSize, NO_PLAYER};

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    /// Torso at `body_mm` everywhere, one square "hand" at `hand_mm`.
    fn scene(size: FrameSize, x0: usize, y0: usize, side: usize, body_mm: u16, hand_mm: u16) -> DepthFrame {
        let mut depth = vec![body_mm; size.len()];
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                depth[y * size.width + x] = hand_mm;
            }
        }
        DepthFrame::new(size, depth, vec![0; size.len()]).unwrap()
    }

    #[test]
    fn test_polygon_area_square() {
        let sq = [(0, 0), (10, 0), (10, 10), (0, 10)];
        assert_eq!(polygon_area(&sq), 100.0);
        let rev: Vec<_> = sq.iter().rev().copied().collect();
        assert_eq!(polygon_area(&rev), 100.0);
        assert_eq!(polygon_area(&[(0, 0), (5, 5)]), 0.0);
    }

    #[test]
    fn test_bounding_box_exclusive_edges() {
        let c = Contour::new(vec![(2, 3), (5, 3), (5, 7), (2, 7)]);
        let bb = c.bounding_box();
        assert_eq!(bb, BoundingBox { left: 2, top: 3, right: 6, bottom: 8 });
        assert_eq!(bb.width(), 4);
        assert_eq!(bb.height(), 5);
    }

    #[test]
    fn test_rotated_rect_from_axis_aligned_corners() {
        let r = RotatedRect::from_corners([(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)]);
        assert!(approx_eq(r.center.0, 2.0, 1e-6));
        assert!(approx_eq(r.center.1, 1.0, 1e-6));
        assert!(approx_eq(r.size.0, 4.0, 1e-6));
        assert!(approx_eq(r.size.1, 2.0, 1e-6));
        assert!(approx_eq(r.angle_deg, 0.0, 1e-6));
    }

    #[test]
    fn test_small_blob_is_rejected() {
        // 10x10 hand: boundary polygon is 9x9 = 81px², well under 400.
        let size = FrameSize::new(100, 100);
        let frame = scene(size, 45, 45, 10, 1000, 700);
        let mask = HandSegmenter::new(150.0).segment(&frame);
        assert_eq!(mask.foreground_count(), 100);
        assert!(ContourAnalyzer::new(400.0).analyze(&mask, &frame).is_empty());
    }

    #[test]
    fn test_hand_blob_is_tracked() {
        // 30x30 hand at (20,30): boundary polygon 29x29 = 841px².
        let size = FrameSize::new(100, 100);
        let frame = scene(size, 20, 30, 30, 1000, 600);
        let mask = HandSegmenter::new(150.0).segment(&frame);

        let hands = ContourAnalyzer::new(400.0).analyze(&mask, &frame);
        assert_eq!(hands.len(), 1);
        let hand = hands[0];
        assert!(approx_eq(hand.center.0, 34.5, 1.0), "center x {}", hand.center.0);
        assert!(approx_eq(hand.center.1, 44.5, 1.0), "center y {}", hand.center.1);
        assert!(approx_eq(hand.average_depth_m, 0.6, 1e-4));
        assert!((hand.area - 841.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_depth_only_counts_foreground() {
        let size = FrameSize::new(4, 1);
        let frame = DepthFrame::new(size, vec![500, 1500, 9000, 9000], vec![0, 0, 0, 0]).unwrap();
        // mean 5000, threshold 4850: the first two are foreground
        let mask = HandSegmenter::new(150.0).segment(&frame);
        let all = BoundingBox { left: 0, top: 0, right: 4, bottom: 1 };
        assert!(approx_eq(average_depth_in_box(&mask, &frame, all), 1.0, 1e-6));
    }

    #[test]
    fn test_blobs_on_the_frame_edge_are_tracked() {
        let size = FrameSize::new(100, 100);
        for (x0, y0) in [(0, 0), (70, 0), (0, 70), (70, 70), (0, 35)] {
            let frame = scene(size, x0, y0, 30, 1000, 600);
            let mask = HandSegmenter::new(150.0).segment(&frame);
            let found = ContourAnalyzer::new(400.0).detect(&mask, &frame);
            assert_eq!(found.len(), 1, "blob at ({x0},{y0})");
            assert!((found[0].hand.area - 841.0).abs() < 1e-6, "blob at ({x0},{y0})");
            let bb = found[0].bounds;
            assert_eq!((bb.left, bb.top), (x0 as i32, y0 as i32));
            assert_eq!((bb.width(), bb.height()), (30, 30));
        }
    }

    #[test]
    fn test_average_depth_clips_to_a_smaller_mask() {
        let frame = DepthFrame::new(FrameSize::new(4, 4), vec![700; 16], vec![0; 16]).unwrap();
        let mask = HandSegmenter::new(150.0).segment(
            &DepthFrame::new(FrameSize::new(2, 2), vec![500, 500, 500, 1500], vec![0; 4]).unwrap(),
        );
        let whole = BoundingBox { left: 0, top: 0, right: 4, bottom: 4 };
        assert!(approx_eq(average_depth_in_box(&mask, &frame, whole), 0.7, 1e-6));
    }

    #[test]
    fn test_average_depth_without_foreground_is_zero() {
        let size = FrameSize::new(3, 3);
        let frame = DepthFrame::new(size, vec![800; 9], vec![NO_PLAYER; 9]).unwrap();
        let mask = ForegroundMask::blank(size);
        let bb = BoundingBox { left: 0, top: 0, right: 3, bottom: 3 };
        assert_eq!(average_depth_in_box(&mask, &frame, bb), 0.0);
    }

    #[test]
    fn test_analyze_is_pure() {
        let size = FrameSize::new(80, 60);
        let frame = scene(size, 10, 10, 25, 1200, 800);
        let mask = HandSegmenter::new(150.0).segment(&frame);
        let analyzer = ContourAnalyzer::new(400.0);
        assert_eq!(analyzer.analyze(&mask, &frame), analyzer.analyze(&mask, &frame));
    }

    struct FixedContours(Vec<Contour>);

    impl ContourBackend for FixedContours {
        fn outer_contours(&self, _mask: &ForegroundMask) -> Vec<Contour> {
            self.0.clone()
        }

        fn min_area_rect(&self, contour: &Contour) -> RotatedRect {
            let bb = contour.bounding_box();
            RotatedRect::from_corners([
                (bb.left as f32, bb.top as f32),
                ((bb.right - 1) as f32, bb.top as f32),
                ((bb.right - 1) as f32, (bb.bottom - 1) as f32),
                (bb.left as f32, (bb.bottom - 1) as f32),
            ])
        }
    }

    #[test]
    fn test_survivors_keep_enumeration_order() {
        let square = |x: i32, y: i32, s: i32| Contour::new(vec![(x, y), (x + s, y), (x + s, y + s), (x, y + s)]);
        let backend = FixedContours(vec![square(0, 0, 30), square(40, 0, 5), square(50, 50, 25)]);
        let size = FrameSize::new(100, 100);
        let frame = DepthFrame::new(size, vec![1000; size.len()], vec![0; size.len()]).unwrap();
        let mask = ForegroundMask::blank(size);

        let hands = ContourAnalyzer::with_backend(400.0, backend).analyze(&mask, &frame);
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].area, 900.0);
        assert_eq!(hands[1].area, 625.0);
        assert!(approx_eq(hands[1].center.0, 62.5, 1e-6));
        // blank mask → nothing foreground in any box
        assert_eq!(hands[0].average_depth_m, 0.0);
    }
}
