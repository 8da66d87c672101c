// Per-frame game loop: segment → contours → avatar → obstacle → collision.
//
// `GameSession` owns every piece of state that survives between frames
// (avatar, obstacle, score, rng). One call to `process_frame` is one full
// pipeline pass; nothing is carried over besides those fields.

use rand::Rng;
use serde::Deserialize;

use crate::config::Config;
use crate::contour::{ContourAnalyzer, ContourBackend, Detection, ImageprocContours};
use crate::control::{Avatar, AvatarColor, ControlMapper};
use crate::error::{Error, Result};
use crate::obstacle::{Advance, Obstacle};
use crate::segment::{ForegroundMask, HandSegmenter};
use crate::types::{DepthFrame, FrameSize};

/// Which surviving contours drive the avatar when more than one passes the area filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContourPolicy {
    /// Only the biggest blob (earliest one on ties).
    #[default]
    Largest,
    /// Every survivor in order; each one moves the avatar and scores.
    Each,
}

/// Score and whether the game is still on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub score: u64,
    pub running: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self { score: 0, running: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Running { score: u64 },
    Over { final_score: u64 },
}

/// Everything one frame produced, for the renderer and the HUD.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// `None` when the frame carried no usable data and was skipped.
    pub mask: Option<ForegroundMask>,
    /// Contours that passed the area filter, in enumeration order.
    pub detections: Vec<Detection>,
    /// How many of them were applied to the avatar.
    pub applied: usize,
    /// The obstacle left the frame and respawned this tick.
    pub edge_hit: bool,
    pub status: GameStatus,
}

impl FrameReport {
    pub fn skipped(&self) -> bool {
        self.mask.is_none()
    }
}

/// Approximate circle/rectangle hit test: the four cardinal points of the
/// circle, each checked for strict containment in the obstacle. A circle
/// that only clips a corner is not detected.
pub fn check_collision(avatar: &Avatar, obstacle: &Obstacle) -> bool {
    let (cx, cy) = avatar.center;
    let r = avatar.radius;
    let inside_x = |x: f32| x > obstacle.left() && x < obstacle.right();
    let inside_y = |y: f32| y > obstacle.top() && y < obstacle.bottom();

    (inside_x(cx - r) && inside_y(cy))
        || (inside_x(cx + r) && inside_y(cy))
        || (inside_x(cx) && inside_y(cy - r))
        || (inside_x(cx) && inside_y(cy + r))
}

pub struct GameSession<R, B = ImageprocContours> {
    frame: FrameSize,
    segmenter: HandSegmenter,
    analyzer: ContourAnalyzer<B>,
    mapper: ControlMapper,
    policy: ContourPolicy,
    avatar: Avatar,
    color: AvatarColor,
    obstacle: Obstacle,
    state: GameState,
    rng: R,
}

impl<R: Rng> GameSession<R, ImageprocContours> {
    pub fn new(config: &Config, rng: R) -> Self {
        Self::with_backend(config, rng, ImageprocContours)
    }
}

impl<R: Rng, B: ContourBackend> GameSession<R, B> {
    pub fn with_backend(config: &Config, rng: R, backend: B) -> Self {
        let frame = config.sensor.frame_size();
        Self {
            frame,
            segmenter: HandSegmenter::new(config.tracking.offset_mm),
            analyzer: ContourAnalyzer::with_backend(config.tracking.min_contour_area_px2, backend),
            mapper: ControlMapper::new(frame, config.avatar.radius_near, config.avatar.radius_far),
            policy: config.tracking.contour_policy,
            avatar: config.avatar.initial(),
            color: AvatarColor::default(),
            obstacle: config.obstacle.initial(),
            state: GameState::default(),
            rng,
        }
    }

    pub fn frame_size(&self) -> FrameSize {
        self.frame
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_color(&self) -> AvatarColor {
        self.color
    }

    pub fn obstacle(&self) -> &Obstacle {
        &self.obstacle
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn status(&self) -> GameStatus {
        if self.state.running {
            GameStatus::Running { score: self.state.score }
        } else {
            GameStatus::Over { final_score: self.state.score }
        }
    }

    /// Run the full pipeline for one sensor frame.
    ///
    /// Frames whose size doesn't match the configured geometry (including
    /// empty ones) are skipped without touching any state. Once a collision
    /// has ended the game every further call is an error.
    pub fn process_frame(&mut self, frame: &DepthFrame) -> Result<FrameReport> {
        if !self.state.running {
            return Err(Error::SessionOver { final_score: self.state.score });
        }

        if frame.size() != self.frame || frame.size().is_empty() {
            log::warn!(
                "skipping frame: got {}x{}, expected {}x{}",
                frame.size().width, frame.size().height, self.frame.width, self.frame.height
            );
            return Ok(FrameReport {
                mask: None,
                detections: Vec::new(),
                applied: 0,
                edge_hit: false,
                status: self.status(),
            });
        }

        let mask = self.segmenter.segment(frame);
        let detections = self.analyzer.detect(&mask, frame);

        let chosen: Vec<&Detection> = match self.policy {
            ContourPolicy::Largest => largest(&detections).into_iter().collect(),
            ContourPolicy::Each => detections.iter().collect(),
        };
        for d in &chosen {
            self.avatar = self.mapper.update(&d.hand, &self.avatar);
            self.color = self.mapper.color_for(&d.hand);
            self.state.score += self.avatar.radius.round() as u64;
        }
        let applied = chosen.len();
        if applied == 0 {
            log::debug!("no hand this frame");
        }

        // The obstacle moves every frame, hand or not.
        let edge_hit = self.obstacle.advance(self.frame, &mut self.rng) == Advance::Respawned;

        if check_collision(&self.avatar, &self.obstacle) {
            self.state.running = false;
            log::info!("collision: game over, final score {}", self.state.score);
        }

        Ok(FrameReport {
            mask: Some(mask),
            detections,
            applied,
            edge_hit,
            status: self.status(),
        })
    }
}

/// Biggest detection; the first one wins ties.
fn largest(detections: &[Detection]) -> Option<&Detection> {
    detections.iter().fold(None, |best: Option<&Detection>, d| match best {
        Some(b) if b.hand.area >= d.hand.area => Some(b),
        _ => Some(d),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::{Contour, RotatedRect, TrackedHand, BoundingBox};
    use crate::obstacle::Axis;

    fn detection(area: f64, x: f32) -> Detection {
        Detection {
            hand: TrackedHand { center: (x, 0.0), average_depth_m: 0.0, area },
            contour: Contour::new(Vec::new()),
            rect: RotatedRect { center: (x, 0.0), size: (0.0, 0.0), angle_deg: 0.0 },
            bounds: BoundingBox::default(),
        }
    }

    #[test]
    fn test_largest_prefers_first_on_ties() {
        let ds = vec![detection(500.0, 1.0), detection(900.0, 2.0), detection(900.0, 3.0)];
        assert_eq!(largest(&ds).unwrap().hand.center.0, 2.0);
        assert!(largest(&[]).is_none());
    }

    #[test]
    fn test_collision_boundary_points_are_not_inside() {
        // Square spans x (70,120), y (90,140). Left point x=70 is on the edge, so that
        // check misses; the bottom point (100,130) is strictly inside → hit.
        let avatar = Avatar::new((100.0, 100.0), 30.0);
        let obstacle = Obstacle::new(70, 90, 50, Axis::Vertical, 5);
        assert!(check_collision(&avatar, &obstacle));

        // Shift the square up 10px: the bottom point now lands on y=130, the edge.
        let obstacle = Obstacle::new(70, 80, 50, Axis::Vertical, 5);
        assert!(!check_collision(&avatar, &obstacle));
    }

    #[test]
    fn test_collision_each_cardinal_point() {
        let o = Obstacle::new(100, 100, 50, Axis::Vertical, 5);
        // right point enters from the left
        assert!(check_collision(&Avatar::new((90.0, 125.0), 20.0), &o));
        // left point enters from the right
        assert!(check_collision(&Avatar::new((160.0, 125.0), 20.0), &o));
        // bottom point enters from above
        assert!(check_collision(&Avatar::new((125.0, 90.0), 20.0), &o));
        // top point enters from below
        assert!(check_collision(&Avatar::new((125.0, 160.0), 20.0), &o));
        // far away
        assert!(!check_collision(&Avatar::new((300.0, 300.0), 20.0), &o));
    }

    #[test]
    fn test_corner_overlap_is_not_detected() {
        let o = Obstacle::new(100, 100, 50, Axis::Vertical, 5);
        // Circle centred just off the top-left corner, overlapping it diagonally.
        let a = Avatar::new((92.0, 92.0), 15.0);
        assert!(!check_collision(&a, &o));
    }

    #[test]
    fn test_game_state_starts_running() {
        let s = GameState::default();
        assert!(s.running);
        assert_eq!(s.score, 0);
    }
}
