//! Pipeline driver.

use anyhow::Result;

use crate::annotation::{AnnotationSource, FileAnnotationSource};
use crate::config::{PipelineConfig, Step};
use crate::device_calib::{CalibrationSource, JsonCalibrationSource};
use crate::video::{FfmpegOpener, VideoOpener};
use crate::{export_calib, extract_frames, gt_anno, undistort};

/// Run the configured steps in order with the default collaborators.
pub fn run_pipeline(config: &PipelineConfig) -> Result<()> {
    let annotations = FileAnnotationSource::new(&config.data_dir);
    run_pipeline_with(config, &annotations, &JsonCalibrationSource, &FfmpegOpener)
}

/// Run the configured steps in order.
///
/// Steps carry no shared in-memory state; every step reads its inputs from
/// the filesystem, so any subset can be re-run as long as the filesystem
/// prerequisites exist.
pub fn run_pipeline_with(
    config: &PipelineConfig,
    annotations: &dyn AnnotationSource,
    calibrations: &dyn CalibrationSource,
    videos: &dyn VideoOpener,
) -> Result<()> {
    for &step in &config.steps {
        match step {
            Step::AriaCalib => export_calib::run_aria_calib(config, annotations, calibrations)?,
            Step::GtAnno => gt_anno::run_gt_anno(config, annotations)?,
            Step::RawImage => extract_frames::run_raw_image(config, videos)?,
            Step::UndistortedImage => undistort::run_undistorted_image(config)?,
        }
    }
    Ok(())
}
