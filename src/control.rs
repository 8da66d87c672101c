// Hand → avatar mapping.
// Visual expectation: holding the hand right of centre pushes the circle
// right (faster the further right), left of centre pushes it left; the same
// for up/down. Bringing the hand closer grows the circle, pulling it back
// shrinks it.

use crate::contour::TrackedHand;
use crate::types::FrameSize;

/// The player-controlled circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub center: (f32, f32),
    pub radius: f32,
}

impl Avatar {
    pub fn new(center: (f32, f32), radius: f32) -> Self {
        Self { center, radius: radius.max(0.0) }
    }
}

/// Circle colour channels derived from the hand (0..=255 each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AvatarColor {
    pub depth: u8,
    pub x: u8,
    pub y: u8,
}

impl AvatarColor {
    /// Pack as 0x00RRGGBB: blue carries x, green carries depth, red carries y.
    pub fn to_rgb(self) -> u32 {
        ((self.y as u32) << 16) | ((self.depth as u32) << 8) | self.x as u32
    }
}

/// Linear interpolation between `a` (w=0) and `b` (w=1).
#[inline]
pub fn lerp(a: f32, b: f32, w: f32) -> f32 {
    a * (1.0 - w) + b * w
}

/// Signed step along one axis: away from the midpoint, proportional to the
/// coordinate itself. Exactly on the midpoint → no movement.
pub fn velocity_for(coord: f32, extent: usize) -> f32 {
    let mid = (extent / 2) as f32;
    if coord > mid {
        (coord / 100.0) * 2.0
    } else if coord < mid {
        -(coord / 100.0) * 2.0
    } else {
        0.0
    }
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Turns tracked hands into avatar motion, size and colour.
#[derive(Debug, Clone, Copy)]
pub struct ControlMapper {
    frame: FrameSize,
    radius_near: f32,
    radius_far: f32,
}

impl ControlMapper {
    pub fn new(frame: FrameSize, radius_near: f32, radius_far: f32) -> Self {
        Self { frame, radius_near, radius_far }
    }

    /// Radius for a hand at `depth_m` metres: `radius_near` at 0 m, `radius_far`
    /// from 0.5 m on. Never negative.
    pub fn radius_for_depth(&self, depth_m: f32) -> f32 {
        let w = (depth_m * 2.0).clamp(0.0, 1.0);
        lerp(self.radius_near, self.radius_far, w).max(0.0)
    }

    pub fn color_for(&self, hand: &TrackedHand) -> AvatarColor {
        AvatarColor {
            depth: to_channel(hand.average_depth_m * 255.0),
            x: to_channel(hand.center.0 / self.frame.width as f32 * 255.0),
            y: to_channel(hand.center.1 / self.frame.height as f32 * 255.0),
        }
    }

    /// Next avatar state for one tracked hand.
    pub fn update(&self, hand: &TrackedHand, avatar: &Avatar) -> Avatar {
        let vx = velocity_for(hand.center.0, self.frame.width);
        let vy = velocity_for(hand.center.1, self.frame.height);

        // Keep the circle centre on screen.
        let x = (avatar.center.0 + vx).clamp(0.0, self.frame.width as f32);
        let y = (avatar.center.1 + vy).clamp(0.0, self.frame.height as f32);

        Avatar { center: (x, y), radius: self.radius_for_depth(hand.average_depth_m) }
    }
}
