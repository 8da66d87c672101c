// The moving square the player has to dodge.
// Visual expectation: a red square slides down (or right) across the view;
// once it leaves through the bottom/right edge it reappears on the top/left
// edge a little faster than before.

use rand::Rng;

use crate::types::FrameSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Travels along +y, spawns on the top edge.
    Vertical,
    /// Travels along +x, spawns on the left edge.
    Horizontal,
}

/// Result of one [`Obstacle::advance`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved,
    /// Left the frame and was put back on an edge (caller plays the edge cue).
    Respawned,
}

/// Axis-aligned square with a top-left corner, a travel axis and a speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub axis: Axis,
    /// Pixels per frame; bumped by one on every respawn.
    pub acceleration: i32,
}

impl Obstacle {
    pub fn new(x: i32, y: i32, size: i32, axis: Axis, acceleration: i32) -> Self {
        Self { x, y, size, axis, acceleration }
    }

    pub fn left(&self) -> f32 {
        self.x as f32
    }

    pub fn right(&self) -> f32 {
        (self.x + self.size) as f32
    }

    pub fn top(&self) -> f32 {
        self.y as f32
    }

    pub fn bottom(&self) -> f32 {
        (self.y + self.size) as f32
    }

    /// Only the far edges count; spawns sit on the near ones.
    pub fn is_out_of_bounds(&self, frame: FrameSize) -> bool {
        self.x > frame.width as i32 || self.y > frame.height as i32
    }

    /// Step once along the active axis, respawning on an edge if we left the frame.
    pub fn advance<R: Rng + ?Sized>(&mut self, frame: FrameSize, rng: &mut R) -> Advance {
        match self.axis {
            Axis::Vertical => self.y += self.acceleration,
            Axis::Horizontal => self.x += self.acceleration,
        }

        if !self.is_out_of_bounds(frame) {
            return Advance::Moved;
        }

        self.respawn(frame, rng);
        Advance::Respawned
    }

    fn respawn<R: Rng + ?Sized>(&mut self, frame: FrameSize, rng: &mut R) {
        // 50/50 between the two axes.
        if rng.gen_bool(0.5) {
            self.axis = Axis::Horizontal;
            self.x = 0;
            self.y = random_coord(rng, frame.height);
        } else {
            self.axis = Axis::Vertical;
            self.x = random_coord(rng, frame.width);
            self.y = 0;
        }
        self.acceleration += 1;
        log::info!(
            "obstacle respawned at ({}, {}) moving {:?}, speed {}",
            self.x, self.y, self.axis, self.acceleration
        );
    }
}

fn random_coord<R: Rng + ?Sized>(rng: &mut R, extent: usize) -> i32 {
    if extent == 0 { 0 } else { rng.gen_range(0..extent as u32) as i32 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;

    const FRAME: FrameSize = FrameSize { width: 512, height: 424 };

    #[test]
    fn test_moves_along_active_axis() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut v = Obstacle::new(200, 0, 50, Axis::Vertical, 5);
        assert_eq!(v.advance(FRAME, &mut rng), Advance::Moved);
        assert_eq!((v.x, v.y), (200, 5));

        let mut h = Obstacle::new(0, 100, 50, Axis::Horizontal, 7);
        assert_eq!(h.advance(FRAME, &mut rng), Advance::Moved);
        assert_eq!((h.x, h.y), (7, 100));
    }

    #[test]
    fn test_exactly_on_edge_is_still_inside() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut o = Obstacle::new(507, 100, 50, Axis::Horizontal, 5);
        assert_eq!(o.advance(FRAME, &mut rng), Advance::Moved);
        assert_eq!(o.x, 512);
    }

    #[test]
    fn test_respawn_after_leaving_right_edge() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut o = Obstacle::new(510, 100, 50, Axis::Horizontal, 5);
        assert_eq!(o.advance(FRAME, &mut rng), Advance::Respawned);
        assert_eq!(o.acceleration, 6);
        match o.axis {
            Axis::Horizontal => {
                assert_eq!(o.x, 0);
                assert!((0..424).contains(&o.y));
            }
            Axis::Vertical => {
                assert_eq!(o.y, 0);
                assert!((0..512).contains(&o.x));
            }
        }
    }

    #[test]
    fn test_respawn_with_zero_rng_goes_horizontal() {
        // All-zero randomness: gen_bool(0.5) is true, coordinate draws are 0.
        let mut rng = StepRng::new(0, 0);
        let mut o = Obstacle::new(100, 420, 50, Axis::Vertical, 5);
        assert_eq!(o.advance(FRAME, &mut rng), Advance::Respawned);
        assert_eq!(o.axis, Axis::Horizontal);
        assert_eq!((o.x, o.y), (0, 0));
        assert_eq!(o.acceleration, 6);
    }

    #[test]
    fn test_speed_only_ramps_up() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut o = Obstacle::new(200, 0, 50, Axis::Vertical, 5);
        let mut last = o.acceleration;
        let mut respawns = 0;
        for _ in 0..2000 {
            if o.advance(FRAME, &mut rng) == Advance::Respawned {
                respawns += 1;
                assert_eq!(o.acceleration, last + 1);
                assert!(!o.is_out_of_bounds(FRAME));
            }
            assert!(o.acceleration >= last);
            last = o.acceleration;
        }
        assert!(respawns > 0);
    }
}
