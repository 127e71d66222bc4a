//! Webcam capture via OpenCV, with detection delegated to the MediaPipe
//! helper.  Only compiled with the `camera` feature.

use image::RgbImage;
use log::info;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::config::SourceConfig;
use crate::detector::HandDetector;
use crate::error::{Error, Result};
use crate::frame;
use crate::source::{Capture, HandCapture};

pub struct CameraCapture {
    cap:      VideoCapture,
    detector: HandDetector,
    mirror:   bool,
    size:     (u32, u32),
    bgr:      Mat,
    rgb:      Mat,
}

impl CameraCapture {
    pub fn open(config: &SourceConfig) -> Result<Self> {
        let cam = &config.camera;
        let mut cap = VideoCapture::new(cam.device, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(Error::Capture(format!("could not open camera {}", cam.device)));
        }
        cap.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(cam.width))?;
        cap.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(cam.height))?;
        let w = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let h = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        info!("camera {} opened at {}x{}", cam.device, w, h);

        let detector = HandDetector::spawn(&cam.python, &cam.helper, cam.min_confidence)?;

        Ok(CameraCapture {
            cap,
            detector,
            mirror: config.mirror,
            size:   (w.max(1), h.max(1)),
            bgr:    Mat::default(),
            rgb:    Mat::default(),
        })
    }

    fn grab(&mut self) -> Result<RgbImage> {
        if !self.cap.read(&mut self.bgr)? || self.bgr.empty() {
            return Err(Error::Capture("camera returned no frame".into()));
        }
        imgproc::cvt_color(&self.bgr, &mut self.rgb, imgproc::COLOR_BGR2RGB, 0)?;
        let (w, h) = (self.rgb.cols() as u32, self.rgb.rows() as u32);
        let bytes = self.rgb.data_bytes()?.to_vec();
        RgbImage::from_raw(w, h, bytes)
            .ok_or_else(|| Error::Capture(format!("frame buffer does not match {}x{}", w, h)))
    }
}

impl HandCapture for CameraCapture {
    fn capture_and_detect(&mut self) -> Result<Capture> {
        let mut image = self.grab()?;
        if self.mirror {
            frame::mirror(&mut image);
        }
        let hands = self.detector.detect(&image)?;
        Ok(Capture { frame: image, hands })
    }

    fn frame_size(&self) -> (u32, u32) { self.size }

    fn name(&self) -> &str { "camera" }
}
