//! Frame-indexed video reading.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ffmpeg_next as ffmpeg;
use image::RgbImage;

/// Random access to decoded video frames by zero-based index.
pub trait FrameSource {
    fn read_frame(&mut self, index: u64) -> Result<RgbImage>;
}

/// Opens a [`FrameSource`] for a video file.
pub trait VideoOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>>;
}

/// FFmpeg-backed video opener.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegOpener;

impl VideoOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegFrameSource::open(path)?))
    }
}

/// Sequential FFmpeg decoder with rewind-on-backward-seek.
///
/// Frames are decoded in stream order and counted; asking for an index
/// before the current position rewinds the demuxer and decodes forward
/// again. Callers that read indices in ascending order pay a single pass
/// over the stream.
pub struct FfmpegFrameSource {
    ictx: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    next_index: u64,
    eof_sent: bool,
}

impl FfmpegFrameSource {
    pub fn open(path: &Path) -> Result<Self> {
        ffmpeg::init().context("initializing ffmpeg")?;

        let ictx = ffmpeg::format::input(&path)
            .with_context(|| format!("opening video {}", path.display()))?;

        let input = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .with_context(|| format!("no video stream in {}", path.display()))?;
        let stream_index = input.index();

        let context = ffmpeg::codec::context::Context::from_parameters(input.parameters())
            .context("reading codec parameters")?;
        let decoder = context.decoder().video().context("opening video decoder")?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .context("initializing pixel-format scaler")?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            next_index: 0,
            eof_sent: false,
        })
    }

    fn rewind(&mut self) -> Result<()> {
        self.ictx.seek(0, ..=0).context("seeking to stream start")?;
        self.decoder.flush();
        self.next_index = 0;
        self.eof_sent = false;
        Ok(())
    }

    fn next_stream_packet(&mut self) -> Option<ffmpeg::Packet> {
        loop {
            match self.ictx.packets().next() {
                Some((stream, packet)) if stream.index() == self.stream_index => {
                    return Some(packet)
                }
                Some(_) => continue,
                None => return None,
            }
        }
    }

    fn next_decoded(&mut self) -> Result<ffmpeg::util::frame::Video> {
        loop {
            let mut decoded = ffmpeg::util::frame::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return Ok(decoded);
            }
            if self.eof_sent {
                bail!("frame index past end of stream");
            }
            match self.next_stream_packet() {
                Some(packet) => self
                    .decoder
                    .send_packet(&packet)
                    .context("sending packet to decoder")?,
                None => {
                    self.decoder.send_eof().context("flushing decoder")?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn to_rgb(&mut self, decoded: &ffmpeg::util::frame::Video) -> Result<RgbImage> {
        let mut rgb = ffmpeg::util::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb)
            .context("converting frame to RGB")?;

        let stride = rgb.stride(0);
        let data = rgb.data(0);
        let row_bytes = self.width as usize * 3;
        let mut buf = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            buf.extend_from_slice(&data[start..start + row_bytes]);
        }
        RgbImage::from_raw(self.width, self.height, buf)
            .context("assembling RGB frame buffer")
    }
}

impl FrameSource for FfmpegFrameSource {
    fn read_frame(&mut self, index: u64) -> Result<RgbImage> {
        if index < self.next_index {
            self.rewind()?;
        }
        loop {
            let decoded = self
                .next_decoded()
                .with_context(|| format!("decoding frame {index}"))?;
            let current = self.next_index;
            self.next_index += 1;
            if current == index {
                return self.to_rgb(&decoded);
            }
        }
    }
}
