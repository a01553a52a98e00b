//! Writing rendered frames to an animated GIF or a PNG sequence.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{info, warn};

use crate::util::{Error, Result};

/// Output used when the user does not pick one.
pub const DEFAULT_RECORDING: &str = "simview_recording.gif";

/// Largest recording side. GIF stores sizes as `u16`; the cap also bounds
/// the CPU rasterizer's buffers.
pub const MAX_RECORD_SIZE: u32 = 4096;

/// NeuQuant sampling factor, 1 (best) to 30 (fastest)
const GIF_QUANTIZE_SPEED: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordOptions {
    pub width: u32,
    pub height: u32,
    /// Playback rate of the written animation.
    pub fps: f32,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fps: 10.0,
        }
    }
}

enum Target {
    Gif {
        encoder: gif::Encoder<BufWriter<File>>,
        size: (u16, u16),
        /// Frame delay in hundredths of a second
        delay: u16,
    },
    /// `frame_00000.png`, `frame_00001.png`, ... in a directory
    Png(PathBuf),
}

/// An open recording. Frames must match the size it was opened with.
pub struct Recorder {
    path: PathBuf,
    options: RecordOptions,
    target: Target,
    frames: usize,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("frames", &self.frames)
            .finish()
    }
}

fn is_gif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
}

impl Recorder {
    /// Open `path` for writing. A `.gif` path gets an animated GIF that loops
    /// forever; anything else is used as a directory of numbered PNGs and
    /// created if missing.
    pub fn open(path: impl Into<PathBuf>, options: RecordOptions) -> Result<Self> {
        let path = path.into();
        let valid = 1..=MAX_RECORD_SIZE;
        if !valid.contains(&options.width) || !valid.contains(&options.height) {
            return Err(Error::recording(format!(
                "invalid recording size {}x{} (at most {} per side)",
                options.width, options.height, MAX_RECORD_SIZE
            )));
        }
        let open_err = |e: &dyn std::fmt::Display| {
            Error::recording(format!("cannot open {}: {}", path.display(), e))
        };

        let target = if is_gif(&path) {
            // within MAX_RECORD_SIZE
            let size = (options.width as u16, options.height as u16);
            let file = File::create(&path).map_err(|e| open_err(&e))?;
            let mut encoder = gif::Encoder::new(BufWriter::new(file), size.0, size.1, &[])
                .map_err(|e| open_err(&e))?;
            encoder
                .set_repeat(gif::Repeat::Infinite)
                .map_err(|e| open_err(&e))?;
            let fps = if options.fps.is_finite() && options.fps > 0.0 {
                options.fps
            } else {
                RecordOptions::default().fps
            };
            Target::Gif {
                encoder,
                size,
                delay: (100.0 / fps).round().clamp(1.0, f32::from(u16::MAX)) as u16,
            }
        } else {
            std::fs::create_dir_all(&path).map_err(|e| open_err(&e))?;
            Target::Png(path.clone())
        };

        info!(
            "Recording {}x{} to {}",
            options.width,
            options.height,
            path.display()
        );
        Ok(Self {
            path,
            options,
            target,
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> RecordOptions {
        self.options
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    pub fn append(&mut self, image: &RgbaImage) -> Result<()> {
        if image.dimensions() != (self.options.width, self.options.height) {
            return Err(Error::recording(format!(
                "frame is {}x{}, recording is {}x{}",
                image.width(),
                image.height(),
                self.options.width,
                self.options.height
            )));
        }
        match &mut self.target {
            Target::Gif {
                encoder,
                size,
                delay,
            } => {
                let mut pixels = image.as_raw().clone();
                let mut frame =
                    gif::Frame::from_rgba_speed(size.0, size.1, &mut pixels, GIF_QUANTIZE_SPEED);
                frame.delay = *delay;
                encoder
                    .write_frame(&frame)
                    .map_err(|e| Error::recording(e.to_string()))?;
            }
            Target::Png(dir) => {
                let file = dir.join(format!("frame_{:05}.png", self.frames));
                image.save_with_format(&file, ImageFormat::Png)?;
            }
        }
        self.frames += 1;
        Ok(())
    }

    /// Close the output and return the number of frames written.
    ///
    /// For a GIF this writes the trailer and flushes the file, so a full disk
    /// shows up here rather than being lost.
    pub fn finish(self) -> Result<usize> {
        let Self {
            path,
            target,
            frames,
            ..
        } = self;
        let finish_err = |e: &dyn std::fmt::Display| {
            Error::recording(format!("cannot finish {}: {}", path.display(), e))
        };
        if let Target::Gif { encoder, .. } = target {
            let mut file = encoder.into_inner().map_err(|e| finish_err(&e))?;
            file.flush().map_err(|e| finish_err(&e))?;
        }
        if frames == 0 {
            warn!("Recording {} has no frames", path.display());
        } else {
            info!("Wrote {} frames to {}", frames, path.display());
        }
        Ok(frames)
    }
}
