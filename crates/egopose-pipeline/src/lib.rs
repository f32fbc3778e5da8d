//! Ground-truth preparation pipeline for ego-camera hand-pose data.
//!
//! The pipeline turns raw capture-session data (takes registry, sensor
//! calibration containers, frame-aligned videos, raw per-take annotations)
//! into the artifacts consumed by training and evaluation:
//!
//! 1. [`export_calib`]: per-take calibration JSON with corrected intrinsics,
//! 2. [`gt_anno`]: per-frame ground-truth annotation JSON per split,
//! 3. [`extract_frames`]: distorted JPEG frames for annotated indices,
//! 4. [`undistort`]: fisheye-to-pinhole remapped JPEG frames.
//!
//! Stages communicate only through the filesystem and are individually
//! re-runnable; [`driver::run_pipeline`] sequences them in a requested
//! order. External collaborators (annotation storage, calibration
//! containers, video decoding) enter through the seams in [`annotation`],
//! [`device_calib`] and [`video`].

pub mod annotation;
pub mod config;
pub mod device_calib;
pub mod driver;
pub mod export_calib;
pub mod extract_frames;
pub mod gt_anno;
pub mod io;
pub mod paths;
pub mod takes;
pub mod undistort;
pub mod video;

pub use annotation::{AnnotationSource, FileAnnotationSource, GtAnnotationDb};
pub use config::{AnnoType, PipelineConfig, Split, Step};
pub use device_calib::{CalibrationSource, DeviceCalibration, JsonCalibrationSource};
pub use driver::{run_pipeline, run_pipeline_with};
pub use paths::{DatasetPaths, GtPaths, ImageKind};
pub use takes::{Take, TakesRegistry};
pub use video::{FfmpegOpener, FrameSource, VideoOpener};
