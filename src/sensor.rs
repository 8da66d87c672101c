// Depth sensor side of the pipeline: where DepthFrames come from.
// Visual expectation: with the synthetic sensor, a torso and head sit in the
// middle of the view and a round "hand" follows the mouse in front of them.
//
// `ThreadedSensor` reads any `DepthSource` on its own thread and keeps only
// the newest frame. The main loop takes frames one at a time, so a single
// pipeline pass is ever in flight; stale frames are dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SensorConfig;
use crate::error::{Error, Result};
use crate::types::{DepthFrame, FrameSize, NO_PLAYER};

/// Depth reported where nothing is in range of the synthetic scene (mm).
const FAR_WALL_MM: u16 = 3500;
const MIN_HAND_DEPTH_MM: u16 = 300;

/// Anything that can produce depth + body-index frames.
pub trait DepthSource: Send + 'static {
    fn frame_size(&self) -> FrameSize;

    /// Block until the next frame is available.
    fn read_frame(&mut self) -> Result<DepthFrame>;
}

/* ---------- Synthetic sensor: mouse-driven player + hand ---------- */

/// Where the simulated hand is and how far from the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimHand {
    /// `None` → hand lowered, nothing in front of the torso.
    pub position: Option<(f32, f32)>,
    pub depth_mm: u16,
}

/// Shared handle the window loop uses to steer the synthetic hand.
#[derive(Debug, Clone)]
pub struct HandControl(Arc<Mutex<SimHand>>);

impl HandControl {
    fn new(hand: SimHand) -> Self {
        Self(Arc::new(Mutex::new(hand)))
    }

    fn lock(&self) -> MutexGuard<'_, SimHand> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self) -> SimHand {
        *self.lock()
    }

    pub fn set_position(&self, position: Option<(f32, f32)>) {
        self.lock().position = position;
    }

    /// Move the hand towards (negative) or away from (positive) the sensor.
    pub fn nudge_depth(&self, delta_mm: i32) {
        let mut hand = self.lock();
        let next = (hand.depth_mm as i32 + delta_mm).clamp(MIN_HAND_DEPTH_MM as i32, FAR_WALL_MM as i32);
        hand.depth_mm = next as u16;
    }
}

/// Renders a torso + head at `body_depth_mm` and, when placed, a round hand
/// in front of it. Paced to `fps`.
pub struct SyntheticSensor {
    size: FrameSize,
    body_depth_mm: u16,
    hand_radius: f32,
    control: HandControl,
    period: Duration,
    next_due: Option<Instant>,
}

impl SyntheticSensor {
    pub fn new(config: &SensorConfig) -> Self {
        let control = HandControl::new(SimHand { position: None, depth_mm: config.hand_depth_mm });
        Self {
            size: config.frame_size(),
            body_depth_mm: config.body_depth_mm,
            hand_radius: config.hand_radius_px as f32,
            control,
            period: Duration::from_secs_f64(1.0 / config.fps.max(1) as f64),
            next_due: None,
        }
    }

    /// No pacing: every `read_frame` returns immediately.
    pub fn unpaced(mut self) -> Self {
        self.period = Duration::ZERO;
        self
    }

    pub fn control(&self) -> HandControl {
        self.control.clone()
    }

    /// Build one frame for the current hand state.
    pub fn render(&self) -> DepthFrame {
        let (w, h) = (self.size.width, self.size.height);
        let mut depth = vec![FAR_WALL_MM; self.size.len()];
        let mut body = vec![NO_PLAYER; self.size.len()];
        let hand = self.control.get();

        let (wf, hf) = (w as f32, h as f32);
        let (torso_c, torso_r) = ((wf * 0.5, hf * 0.65), (wf * 0.16, hf * 0.35));
        let (head_c, head_r) = ((wf * 0.5, hf * 0.2), hf * 0.1);

        for y in 0..h {
            for x in 0..w {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let i = y * w + x;

                let in_torso =
                    ((px - torso_c.0) / torso_r.0).powi(2) + ((py - torso_c.1) / torso_r.1).powi(2) <= 1.0;
                let in_head = (px - head_c.0).powi(2) + (py - head_c.1).powi(2) <= head_r * head_r;
                if in_torso || in_head {
                    depth[i] = self.body_depth_mm;
                    body[i] = 0;
                }

                if let Some((hx, hy)) = hand.position {
                    if (px - hx).powi(2) + (py - hy).powi(2) <= self.hand_radius * self.hand_radius {
                        depth[i] = hand.depth_mm;
                        body[i] = 0;
                    }
                }
            }
        }

        // Sizes are ours, so the shape check can't fail; fall back to "no input" anyway.
        DepthFrame::new(self.size, depth, body).unwrap_or_else(|_| DepthFrame::empty())
    }
}

impl DepthSource for SyntheticSensor {
    fn frame_size(&self) -> FrameSize {
        self.size
    }

    fn read_frame(&mut self) -> Result<DepthFrame> {
        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + self.period);
        Ok(self.render())
    }
}

/* ---------- Threaded wrapper: latest frame wins ---------- */

type Slot = Arc<Mutex<Option<DepthFrame>>>;
type Failure = Arc<Mutex<Option<String>>>;

/// Reads a [`DepthSource`] on a worker thread; keeps only the latest frame.
pub struct ThreadedSensor {
    size: FrameSize,
    latest: Slot,
    failure: Failure,
    frame_id: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ThreadedSensor {
    pub fn start<S: DepthSource>(mut source: S) -> Self {
        let size = source.frame_size();
        let latest: Slot = Arc::new(Mutex::new(None));
        let failure: Failure = Arc::new(Mutex::new(None));
        let frame_id = Arc::new(AtomicU64::new(0));
        let dropped = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let (latest_ref, failure_ref) = (latest.clone(), failure.clone());
        let (frame_id_ref, dropped_ref, stop_ref) = (frame_id.clone(), dropped.clone(), stop.clone());

        let handle = thread::spawn(move || {
            while !stop_ref.load(Ordering::Acquire) {
                match source.read_frame() {
                    Ok(frame) => {
                        if lock(&latest_ref).replace(frame).is_some() {
                            dropped_ref.fetch_add(1, Ordering::Relaxed);
                        }
                        frame_id_ref.fetch_add(1, Ordering::Release);
                    }
                    Err(e) => {
                        log::error!("depth source failed: {e}");
                        *lock(&failure_ref) = Some(e.to_string());
                        break;
                    }
                }
            }
        });

        Self {
            size,
            latest,
            failure,
            frame_id,
            dropped,
            stop,
            handle: Some(handle),
        }
    }

    pub fn frame_size(&self) -> FrameSize {
        self.size
    }

    /// Incremented for every frame the source delivered.
    pub fn frame_id(&self) -> u64 {
        self.frame_id.load(Ordering::Acquire)
    }

    /// Frames overwritten before anyone took them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Take the newest frame if one arrived since the last call.
    pub fn take_latest(&self) -> Result<Option<DepthFrame>> {
        if let Some(frame) = lock(&self.latest).take() {
            return Ok(Some(frame));
        }
        match lock(&self.failure).as_ref() {
            Some(msg) => Err(Error::SensorStopped(msg.clone())),
            None => Ok(None),
        }
    }

    /// Wait (polling) up to `timeout` for a new frame.
    pub fn wait_latest(&self, timeout: Duration) -> Result<Option<DepthFrame>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(frame) = self.take_latest()? {
                return Ok(Some(frame));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Drop for ThreadedSensor {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
