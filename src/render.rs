// Composites one game frame into a FrameBuffer.
// Visual expectation: the hand mask in white on black, red outlines around
// detected hands, the red obstacle square and the avatar circle on top.

use crate::contour::Detection;
use crate::control::{Avatar, AvatarColor};
use crate::draw::{draw_closed_polyline, draw_text_5x7, draw_text_scaled, fill_circle, fill_rect, text_width};
use crate::game::GameStatus;
use crate::obstacle::Obstacle;
use crate::segment::{ForegroundMask, FOREGROUND};
use crate::types::FrameBuffer;

pub const MASK_ON: u32 = 0x00_FF_FF_FF;
pub const MASK_OFF: u32 = 0x00_00_00_00;
pub const CONTOUR_COLOR: u32 = 0x00_FF_00_00;
pub const OBSTACLE_COLOR: u32 = 0x00_FF_00_00;
const HUD_COLOR: u32 = 0x00_FF_FF_33;
const GAME_OVER_COLOR: u32 = 0x00_FF_40_40;

/// Everything the compositor needs for one frame.
pub struct Scene<'a> {
    /// `None` keeps whatever background is already in the buffer.
    pub mask: Option<&'a ForegroundMask>,
    pub detections: &'a [Detection],
    pub show_contours: bool,
    pub obstacle: &'a Obstacle,
    pub avatar: &'a Avatar,
    pub color: AvatarColor,
}

pub fn compose(fb: &mut FrameBuffer, scene: &Scene<'_>) {
    // 1) Mask as the background.
    if let Some(mask) = scene.mask {
        let size = mask.size();
        if size.width == fb.width && size.height == fb.height {
            for (px, out) in mask.as_image().pixels().zip(fb.pixels.iter_mut()) {
                *out = if px[0] == FOREGROUND { MASK_ON } else { MASK_OFF };
            }
        }
    }

    // 2) Outlines of the surviving contours.
    if scene.show_contours {
        for d in scene.detections {
            draw_closed_polyline(fb, &d.contour.points, 2, CONTOUR_COLOR);
        }
    }

    // 3) Obstacle, then the avatar over it.
    let o = scene.obstacle;
    fill_rect(fb, o.x, o.y, o.size, o.size, OBSTACLE_COLOR);
    fill_circle(fb, scene.avatar.center.0, scene.avatar.center.1, scene.avatar.radius, scene.color.to_rgb());
}

/// Score line in the top-left corner, plus a banner once the game is over.
pub fn draw_hud(fb: &mut FrameBuffer, status: GameStatus, extra: &str) {
    match status {
        GameStatus::Running { score } => {
            let line = format!("SCORE: {score} | {extra}");
            draw_text_5x7(fb, 8, 8, &line, HUD_COLOR);
        }
        GameStatus::Over { final_score } => {
            let title = "GAME OVER!";
            let score = format!("YOUR SCORE IS: {final_score}");
            let cx = fb.width as i32 / 2;
            let cy = fb.height as i32 / 2;
            draw_text_scaled(fb, cx - text_width(title, 3) / 2, cy - 30, title, GAME_OVER_COLOR, 3);
            draw_text_scaled(fb, cx - text_width(&score, 2) / 2, cy + 5, &score, HUD_COLOR, 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::Axis;
    use crate::types::FrameSize;

    #[test]
    fn test_compose_draws_obstacle_and_avatar() {
        let size = FrameSize::new(200, 150);
        let mut fb = FrameBuffer::new(size);
        let mask = ForegroundMask::blank(size);
        let obstacle = Obstacle::new(10, 10, 50, Axis::Vertical, 5);
        let avatar = Avatar::new((150.0, 100.0), 20.0);
        let color = AvatarColor { depth: 0x22, x: 0x33, y: 0x11 };

        compose(
            &mut fb,
            &Scene { mask: Some(&mask), detections: &[], show_contours: true, obstacle: &obstacle, avatar: &avatar, color },
        );

        assert_eq!(fb.pixels[30 * 200 + 30], OBSTACLE_COLOR);
        assert_eq!(fb.pixels[100 * 200 + 150], 0x00_11_22_33);
        assert_eq!(fb.pixels[140 * 200 + 5], MASK_OFF);
    }

    #[test]
    fn test_compose_without_mask_keeps_background() {
        let size = FrameSize::new(40, 40);
        let mut fb = FrameBuffer::new(size);
        fb.pixels.iter_mut().for_each(|p| *p = 0x00_12_34_56);
        let obstacle = Obstacle::new(100, 100, 5, Axis::Vertical, 5);
        let avatar = Avatar::new((0.0, 0.0), 0.0);
        compose(
            &mut fb,
            &Scene { mask: None, detections: &[], show_contours: false, obstacle: &obstacle, avatar: &avatar, color: AvatarColor::default() },
        );
        assert!(fb.pixels.iter().all(|&p| p == 0x00_12_34_56));
    }
}
