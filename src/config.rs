use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::control::Avatar;
use crate::error::{Error, Result};
use crate::game::ContourPolicy;
use crate::obstacle::{Axis, Obstacle};
use crate::types::FrameSize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub obstacle: ObstacleConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// Depth image width (px)
    #[serde(default = "default_sensor_width")]
    pub width: usize,
    /// Depth image height (px)
    #[serde(default = "default_sensor_height")]
    pub height: usize,
    /// Frames per second the synthetic sensor delivers
    #[serde(default = "default_sensor_fps")]
    pub fps: u32,
    /// Synthetic torso distance (mm)
    #[serde(default = "default_body_depth_mm")]
    pub body_depth_mm: u16,
    /// Synthetic hand distance at start (mm)
    #[serde(default = "default_hand_depth_mm")]
    pub hand_depth_mm: u16,
    /// Synthetic hand radius (px)
    #[serde(default = "default_hand_radius_px")]
    pub hand_radius_px: u32,
}

fn default_sensor_width() -> usize { 512 }
fn default_sensor_height() -> usize { 424 }
fn default_sensor_fps() -> u32 { 30 }
fn default_body_depth_mm() -> u16 { 1500 }
fn default_hand_depth_mm() -> u16 { 1100 }
fn default_hand_radius_px() -> u32 { 22 }

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            width: default_sensor_width(),
            height: default_sensor_height(),
            fps: default_sensor_fps(),
            body_depth_mm: default_body_depth_mm(),
            hand_depth_mm: default_hand_depth_mm(),
            hand_radius_px: default_hand_radius_px(),
        }
    }
}

impl SensorConfig {
    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// How far in front of the body mean a pixel must be to count as hand (mm)
    #[serde(default = "default_offset_mm")]
    pub offset_mm: f32,
    /// Contours smaller than this are noise (px²)
    #[serde(default = "default_min_contour_area")]
    pub min_contour_area_px2: f64,
    #[serde(default)]
    pub contour_policy: ContourPolicy,
}

fn default_offset_mm() -> f32 { 150.0 }
fn default_min_contour_area() -> f64 { 20.0 * 20.0 }

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            offset_mm: default_offset_mm(),
            min_contour_area_px2: default_min_contour_area(),
            contour_policy: ContourPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvatarConfig {
    #[serde(default = "default_avatar_start")]
    pub start: (f32, f32),
    #[serde(default = "default_avatar_start_radius")]
    pub start_radius: f32,
    /// Radius with the hand right at the sensor
    #[serde(default = "default_radius_near")]
    pub radius_near: f32,
    /// Radius with the hand 0.5 m or further away
    #[serde(default = "default_radius_far")]
    pub radius_far: f32,
}

fn default_avatar_start() -> (f32, f32) { (100.0, 100.0) }
fn default_avatar_start_radius() -> f32 { 10.0 }
fn default_radius_near() -> f32 { 70.0 }
fn default_radius_far() -> f32 { 20.0 }

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            start: default_avatar_start(),
            start_radius: default_avatar_start_radius(),
            radius_near: default_radius_near(),
            radius_far: default_radius_far(),
        }
    }
}

impl AvatarConfig {
    pub fn initial(&self) -> Avatar {
        Avatar::new(self.start, self.start_radius)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleConfig {
    /// Side length of the square (px)
    #[serde(default = "default_obstacle_size")]
    pub size: i32,
    /// Starting speed (px/frame)
    #[serde(default = "default_initial_acceleration")]
    pub initial_acceleration: i32,
    #[serde(default = "default_obstacle_start")]
    pub start: (i32, i32),
    #[serde(default = "default_obstacle_axis")]
    pub start_axis: StartAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartAxis {
    Vertical,
    Horizontal,
}

fn default_obstacle_size() -> i32 { 50 }
fn default_initial_acceleration() -> i32 { 5 }
fn default_obstacle_start() -> (i32, i32) { (200, 0) }
fn default_obstacle_axis() -> StartAxis { StartAxis::Vertical }

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            size: default_obstacle_size(),
            initial_acceleration: default_initial_acceleration(),
            start: default_obstacle_start(),
            start_axis: default_obstacle_axis(),
        }
    }
}

impl ObstacleConfig {
    pub fn initial(&self) -> Obstacle {
        let axis = match self.start_axis {
            StartAxis::Vertical => Axis::Vertical,
            StartAxis::Horizontal => Axis::Horizontal,
        };
        Obstacle::new(self.start.0, self.start.1, self.size, axis, self.initial_acceleration)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Outline surviving contours in red
    #[serde(default = "default_true")]
    pub show_contours: bool,
}

fn default_title() -> String { "Dodge Square".to_string() }
fn default_true() -> bool { true }

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: default_title(), show_contours: default_true() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Open the colour preview window (needs the `camera` feature)
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub index: u32,
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
}

fn default_camera_width() -> u32 { 640 }
fn default_camera_height() -> u32 { 480 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            index: 0,
            width: default_camera_width(),
            height: default_camera_height(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file just means defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("{} not found, using default config", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(Error::InvalidConfig(msg));
        if self.sensor.width == 0 || self.sensor.height == 0 {
            return bad(format!("sensor size {}x{} is empty", self.sensor.width, self.sensor.height));
        }
        if self.sensor.fps == 0 {
            return bad("sensor.fps must be > 0".into());
        }
        if !(self.tracking.offset_mm.is_finite() && self.tracking.min_contour_area_px2 >= 0.0) {
            return bad("tracking values must be finite and non-negative".into());
        }
        let a = &self.avatar;
        if a.radius_far < 0.0 || a.radius_near < 0.0 || a.start_radius < 0.0 {
            return bad("avatar radii must be >= 0".into());
        }
        if a.radius_far > a.radius_near {
            return bad(format!("avatar.radius_far ({}) > avatar.radius_near ({})", a.radius_far, a.radius_near));
        }
        if self.obstacle.size <= 0 {
            return bad("obstacle.size must be > 0".into());
        }
        if self.obstacle.initial_acceleration <= 0 {
            return bad("obstacle.initial_acceleration must be > 0".into());
        }
        Ok(())
    }
}
