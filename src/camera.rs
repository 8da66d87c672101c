// Optional colour preview: opens a webcam and converts frames into a buffer
// for a second window, next to the depth view.
// Visual expectation: `next_frame()` gives 0x00RRGGBB pixels of what the
// camera sees, ready to push to the preview window.

use crate::config::CameraConfig;
use crate::error::Error;
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

/// Open webcam stream plus the resolution it actually settled on.
pub struct ColorCamera {
    cam: Camera,
    width: u32,
    height: u32,
}

impl ColorCamera {
    /// Open the configured camera, asking for the closest format to the requested size.
    pub fn open(config: &CameraConfig) -> Result<Self, Error> {
        let fmt = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(config.index), req)
            .map_err(|e| Error::CameraInit(format!("create camera {}: {e}", config.index)))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream: {e}")))?;

        let actual = cam.resolution();
        log::info!("colour camera {} streaming at {}x{}", config.index, actual.width(), actual.height());

        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }

    /// Grab one frame (blocks until the camera has one) as 0x00RRGGBB pixels.
    pub fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;
        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;

        let (w, h) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();

        Ok(FrameBuffer { width: w as usize, height: h as usize, pixels })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
