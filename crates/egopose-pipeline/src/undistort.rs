//! Stage 4: remap distorted frames to the pinhole target model.

use std::fs;

use anyhow::{ensure, Context, Result};
use image::imageops;
use indicatif::ProgressBar;

use egopose_core::{remap_between, FisheyeRadTanThinPrism, LinearCamera, Real};

use crate::annotation::{frame_indices, GtAnnotationDb};
use crate::config::PipelineConfig;
use crate::device_calib::{DeviceCalibration, RGB_CAMERA_LABEL};
use crate::io::{read_json, write_jpeg_atomic};
use crate::paths::{frame_file, DatasetPaths, GtPaths, ImageKind};
use crate::takes::TakesRegistry;

/// Output resolution of the undistortion target.
pub const TARGET_SIZE: u32 = 512;
/// Focal length of the undistortion target in pixels.
pub const TARGET_FOCAL: Real = 150.0;

/// Remap every previously extracted distorted frame from its fisheye model
/// to the fixed pinhole target.
///
/// The remapping operates in the sensor's native orientation; portrait
/// inputs are rotated 90° counter-clockwise before and 90° clockwise after.
/// Existing outputs are skipped. A distorted frame that is annotated but
/// absent on disk means the extraction stage has not run and is fatal.
pub fn run_undistorted_image(config: &PipelineConfig) -> Result<()> {
    let dataset = DatasetPaths::new(&config.data_dir);
    let gt = GtPaths::new(config);
    let registry = TakesRegistry::load(&dataset.takes_file())?;

    for &anno_type in &config.anno_types {
        for &split in &config.splits {
            let gt_anno_path = gt.public_anno_file(split, anno_type);
            if !gt_anno_path.exists() {
                log::warn!(
                    "undistortion skipped for split={split} ({anno_type}): no ground-truth annotation at {}",
                    gt_anno_path.display()
                );
                continue;
            }
            let db: GtAnnotationDb = read_json(&gt_anno_path)?;

            log::info!("undistorting ego-camera frames for split={split} ({anno_type})");
            for (i, (take_uid, frames)) in db.takes().enumerate() {
                let take = registry.require_uid(take_uid)?;
                log::info!("[{}/{}] processing {}", i + 1, db.len(), take.take_name);

                let calib_path = gt.calib_json_file(&take.take_name);
                if !calib_path.exists() {
                    log::warn!(
                        "no device calibration JSON for {}; skipped",
                        take.take_name
                    );
                    continue;
                }
                let device: DeviceCalibration = read_json(&calib_path)?;
                let rgb = device
                    .camera_by_label(RGB_CAMERA_LABEL)
                    .with_context(|| format!("calibration {}", calib_path.display()))?;
                let fisheye = FisheyeRadTanThinPrism::from_params(&rgb.projection.params)
                    .with_context(|| {
                        format!(
                            "'{RGB_CAMERA_LABEL}' projection of {} has {} parameters",
                            calib_path.display(),
                            rgb.projection.params.len()
                        )
                    })?;
                let pinhole = LinearCamera::centered(TARGET_SIZE, TARGET_SIZE, TARGET_FOCAL);

                let dist_dir = gt.take_image_dir(ImageKind::Distorted, split, &take.take_name);
                if !dist_dir.is_dir() {
                    log::warn!(
                        "no extracted frames at {}; skipped take {}",
                        dist_dir.display(),
                        take.take_name
                    );
                    continue;
                }
                let undist_dir =
                    gt.take_image_dir(ImageKind::Undistorted, split, &take.take_name);
                fs::create_dir_all(&undist_dir)
                    .with_context(|| format!("creating {}", undist_dir.display()))?;

                let bar = ProgressBar::new(frames.len() as u64);
                for index in frame_indices(frames)? {
                    bar.inc(1);
                    let out_path = frame_file(&undist_dir, index);
                    if out_path.exists() {
                        continue;
                    }
                    let dist_path = frame_file(&dist_dir, index);
                    ensure!(
                        dist_path.exists(),
                        "no distorted frame at {}; run the raw_image step first",
                        dist_path.display()
                    );
                    let img = image::open(&dist_path)
                        .with_context(|| format!("reading {}", dist_path.display()))?
                        .to_rgb8();
                    let img = if config.portrait_view {
                        imageops::rotate270(&img)
                    } else {
                        img
                    };
                    let out_img = remap_between(&img, &fisheye, &pinhole, TARGET_SIZE, TARGET_SIZE);
                    let out_img = if config.portrait_view {
                        imageops::rotate90(&out_img)
                    } else {
                        out_img
                    };
                    write_jpeg_atomic(&out_path, &out_img)?;
                }
                bar.finish();
            }
        }
    }
    Ok(())
}
