// What you SEE now:
// • The depth view: your hand (the mouse, in the simulated sensor) shows up
//   white, outlined in red, on a black background.
// • Hand right/left/up/down of centre steers the circle that way.
// • Up/Down arrows move the hand nearer/farther: nearer = bigger circle.
// • A red square sweeps across the view; every respawn it gets faster.
// • Touch it and it's GAME OVER. C toggles outlines. ESC quits.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use dodge_square::config::Config;
use dodge_square::cue::{EdgeCue, TerminalBell};
use dodge_square::draw::Drawer;
use dodge_square::game::{ContourPolicy, GameSession, GameStatus};
use dodge_square::render::{compose, draw_hud, Scene};
use dodge_square::sensor::{SyntheticSensor, ThreadedSensor};
use dodge_square::types::FrameBuffer;

/// Depth-camera hand tracking dodge game.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML config file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "dodge.toml")]
    config: PathBuf,

    /// Seed for obstacle respawns; random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Sensor frame rate override
    #[arg(long)]
    fps: Option<u32>,

    /// Which contours drive the avatar when several pass the area filter
    #[arg(long, value_enum)]
    policy: Option<ContourPolicy>,

    /// Also open the webcam colour preview (needs the `camera` feature)
    #[arg(long)]
    camera: bool,
}

/// Millimetres the hand moves per frame while an arrow key is held.
const DEPTH_STEP_MM: i32 = 10;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = Config::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(fps) = args.fps {
        config.sensor.fps = fps;
    }
    if let Some(policy) = args.policy {
        config.tracking.contour_policy = policy;
    }
    config.camera.enabled |= args.camera;
    config.validate().context("config overrides")?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    /* --- Sensor + window setup ---
       Visual: window opens with the (empty) depth mask. */
    let synthetic = SyntheticSensor::new(&config.sensor);
    let hand = synthetic.control();
    let sensor = ThreadedSensor::start(synthetic);
    let size = sensor.frame_size();
    log::info!("depth sensor {}x{} @ {} fps", size.width, size.height, config.sensor.fps);

    let mut drawer = Drawer::new(&config.window.title, size.width, size.height)?;
    let mut screen = FrameBuffer::new(size);
    let mut session = GameSession::new(&config, rng);
    let mut cue = TerminalBell;
    let mut show_contours = config.window.show_contours;

    let mut preview = open_preview(&config)?;

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        // 1) Steer the simulated hand from the mouse / arrow keys.
        hand.set_position(drawer.mouse_pos());
        hand.nudge_depth(drawer.depth_direction() * DEPTH_STEP_MM);
        if drawer.c_pressed_once() {
            show_contours = !show_contours;
        }

        // 2) Newest depth frame, if any. Older ones were dropped by the sensor thread.
        let Some(frame) = sensor.wait_latest(Duration::from_millis(50))? else {
            drawer.pump();
            continue;
        };

        // 3) One full pipeline pass.
        let report = session.process_frame(&frame)?;
        if report.edge_hit {
            cue.edge_hit();
        }

        // 4) Composite and present.
        compose(
            &mut screen,
            &Scene {
                mask: report.mask.as_ref(),
                detections: &report.detections,
                show_contours,
                obstacle: session.obstacle(),
                avatar: session.avatar(),
                color: session.avatar_color(),
            },
        );
        let depth_text = format!("HAND: {}MM | {}", hand.get().depth_mm, hud_fps_text);
        draw_hud(&mut screen, report.status, &depth_text);
        drawer.present(&screen)?;

        show_preview(&mut preview)?;

        // 5) FPS counter (terminal + HUD once per second)
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::debug!("FPS: {fps:.1}, sensor frames dropped so far: {}", sensor.dropped());
            hud_fps_text = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }

        // 6) Game over: report, keep the last frame up until the window is closed.
        if let GameStatus::Over { final_score } = report.status {
            println!("GAME OVER! Your score is: {final_score}");
            while drawer.is_open() && !drawer.esc_pressed() {
                drawer.present(&screen)?;
                std::thread::sleep(Duration::from_millis(16));
            }
            return Ok(());
        }
    }

    log::info!("stopped with score {}", session.state().score);
    Ok(())
}

#[cfg(feature = "camera")]
type Preview = Option<(dodge_square::camera::ColorCamera, Drawer)>;
#[cfg(not(feature = "camera"))]
type Preview = ();

#[cfg(feature = "camera")]
fn open_preview(config: &Config) -> Result<Preview> {
    if !config.camera.enabled {
        return Ok(None);
    }
    let cam = dodge_square::camera::ColorCamera::open(&config.camera)?;
    let (w, h) = cam.resolution();
    let window = Drawer::new("Dodge Square - colour", w as usize, h as usize)?;
    Ok(Some((cam, window)))
}

#[cfg(not(feature = "camera"))]
fn open_preview(config: &Config) -> Result<Preview> {
    if config.camera.enabled {
        log::warn!("colour preview requested but built without the `camera` feature");
    }
    Ok(())
}

#[cfg(feature = "camera")]
fn show_preview(preview: &mut Preview) -> Result<()> {
    if let Some((cam, window)) = preview.as_mut() {
        let color = cam.next_frame()?;
        window.present(&color)?;
    }
    Ok(())
}

#[cfg(not(feature = "camera"))]
fn show_preview(_preview: &mut Preview) -> Result<()> {
    Ok(())
}
