//! V4L2 capture driver.
//!
//! This module provides `V4l2Driver` for opening local webcams through V4L2.
//!
//! The driver is responsible for:
//! - Mapping candidate index `n` to the device node `/dev/video<n>`
//! - Negotiating an RGB-friendly format, frame size and rate
//! - Honouring the requested buffer depth when the mmap stream is created
//! - Normalizing RGB3/BGR3/YUYV/NV12 buffers into RGB `Frame`s
//!
//! The mmap stream is created lazily on the first read, so the buffer depth set
//! right after opening takes effect without tearing a stream down.

use anyhow::{anyhow, bail, Context, Result};
use ouroboros::self_referencing;

use super::{BackendHint, CameraCandidate, CameraDriver, CaptureDevice, PixelFormat};
use crate::frame::Frame;

/// Configuration for a V4L2 driver.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Requested frame rate. Zero leaves the device default.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

pub struct V4l2Driver {
    config: V4l2Config,
}

impl V4l2Driver {
    pub fn new(config: V4l2Config) -> Self {
        Self { config }
    }
}

impl CameraDriver for V4l2Driver {
    fn name(&self) -> &'static str {
        "v4l2"
    }

    fn open(&mut self, candidate: CameraCandidate) -> Result<Box<dyn CaptureDevice>> {
        use v4l::video::Capture;

        if !matches!(candidate.backend, BackendHint::Any | BackendHint::V4l2) {
            bail!("v4l2 driver cannot honour backend {}", candidate.backend);
        }
        let path = format!("/dev/video{}", candidate.index);

        let device = v4l::Device::with_path(&path)
            .with_context(|| format!("open v4l2 device {}", path))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("V4l2Driver: failed to set format on {}: {}", path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        let pixel_format = pixel_format_for(format.fourcc)
            .with_context(|| format!("unsupported pixel format on {}", path))?;

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("V4l2Driver: failed to set fps on {}: {}", path, err);
            }
        }

        log::info!(
            "V4l2Driver: opened {} ({}x{} {:?})",
            path,
            format.width,
            format.height,
            pixel_format
        );

        Ok(Box::new(V4l2Device {
            path,
            idle: Some(device),
            stream: None,
            buffer_depth: 4,
            width: format.width,
            height: format.height,
            pixel_format,
        }))
    }
}

fn pixel_format_for(fourcc: v4l::FourCC) -> Result<PixelFormat> {
    match &fourcc.repr {
        b"RGB3" => Ok(PixelFormat::Rgb24),
        b"BGR3" => Ok(PixelFormat::Bgr24),
        b"YUYV" => Ok(PixelFormat::Yuyv),
        b"NV12" => Ok(PixelFormat::Nv12),
        other => Err(anyhow!("fourcc {:?}", String::from_utf8_lossy(other))),
    }
}

#[self_referencing]
struct V4l2Stream {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

struct V4l2Device {
    path: String,
    /// Device before the stream is started (or after it was torn down).
    idle: Option<v4l::Device>,
    stream: Option<V4l2Stream>,
    buffer_depth: u32,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
}

impl V4l2Device {
    fn start_stream(&mut self) -> Result<&mut V4l2Stream> {
        use v4l::buffer::Type;

        if self.stream.is_none() {
            let device = self
                .idle
                .take()
                .with_context(|| format!("v4l2 device {} released", self.path))?;
            let depth = self.buffer_depth;
            let stream = V4l2StreamTryBuilder {
                device,
                stream_builder: |device| {
                    v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, depth)
                        .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
                },
            }
            .try_build()?;
            self.stream = Some(stream);
        }
        self.stream
            .as_mut()
            .context("v4l2 stream missing after start")
    }
}

impl CaptureDevice for V4l2Device {
    fn set_buffer_depth(&mut self, frames: u32) -> Result<()> {
        let frames = frames.max(1);
        if frames == self.buffer_depth {
            return Ok(());
        }
        self.buffer_depth = frames;
        if let Some(stream) = self.stream.take() {
            // Restart so the new depth applies.
            self.idle = Some(stream.into_heads().device);
        }
        Ok(())
    }

    fn read(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let (width, height, format) = (self.width, self.height, self.pixel_format);
        let stream = self.start_stream()?;
        stream.with_stream_mut(|stream| {
            let (buf, meta) = stream.next().context("capture v4l2 frame")?;
            let used = (meta.bytesused as usize).min(buf.len());
            let used = if used == 0 { buf.len() } else { used };
            Frame::from_pixels(&buf[..used], width, height, format)
        })
    }

    fn release(&mut self) {
        if self.stream.is_some() || self.idle.is_some() {
            log::info!("V4l2Driver: released {}", self.path);
        }
        self.stream = None;
        self.idle = None;
    }
}
