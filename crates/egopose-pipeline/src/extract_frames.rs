//! Stage 3: extract distorted frames for annotated indices.

use std::fs;

use anyhow::{bail, Context, Result};
use image::imageops;
use indicatif::ProgressBar;

use crate::annotation::{frame_indices, GtAnnotationDb};
use crate::config::PipelineConfig;
use crate::io::{read_json, write_jpeg_atomic};
use crate::paths::{frame_file, DatasetPaths, GtPaths, ImageKind};
use crate::takes::TakesRegistry;
use crate::video::VideoOpener;

/// Decode and store every annotated frame of every take as a distorted
/// JPEG.
///
/// Frames whose output file already exists are skipped, which makes the
/// stage resumable after a partial run. In landscape mode frames are
/// rotated 90° counter-clockwise out of the sensor's native orientation;
/// portrait mode keeps them as decoded.
pub fn run_raw_image(config: &PipelineConfig, videos: &dyn VideoOpener) -> Result<()> {
    let dataset = DatasetPaths::new(&config.data_dir);
    let gt = GtPaths::new(config);
    let registry = TakesRegistry::load(&dataset.takes_file())?;

    for &anno_type in &config.anno_types {
        for &split in &config.splits {
            let gt_anno_path = gt.public_anno_file(split, anno_type);
            if !gt_anno_path.exists() {
                log::warn!(
                    "raw-image extraction skipped for split={split} ({anno_type}): no ground-truth annotation at {}",
                    gt_anno_path.display()
                );
                continue;
            }
            let db: GtAnnotationDb = read_json(&gt_anno_path)?;
            let img_root = gt.image_dir(ImageKind::Distorted, split);
            fs::create_dir_all(&img_root)
                .with_context(|| format!("creating {}", img_root.display()))?;

            log::info!("extracting ego-camera frames for split={split} ({anno_type})");
            for (i, (take_uid, frames)) in db.takes().enumerate() {
                let take = registry.require_uid(take_uid)?;
                log::info!("[{}/{}] processing {}", i + 1, db.len(), take.take_name);

                let Some(ego_cam) = take.ego_camera_name() else {
                    bail!(
                        "take {} has no ego camera in the takes registry",
                        take.take_name
                    );
                };
                let video_path = dataset.video_file(&take.take_name, ego_cam);
                if !video_path.exists() {
                    log::warn!(
                        "no frame-aligned video at {}; skipped take {}",
                        video_path.display(),
                        take.take_name
                    );
                    continue;
                }
                let take_dir = gt.take_image_dir(ImageKind::Distorted, split, &take.take_name);
                fs::create_dir_all(&take_dir)
                    .with_context(|| format!("creating {}", take_dir.display()))?;

                let mut source = videos.open(&video_path)?;
                let bar = ProgressBar::new(frames.len() as u64);
                for index in frame_indices(frames)? {
                    bar.inc(1);
                    let out_path = frame_file(&take_dir, index);
                    if out_path.exists() {
                        continue;
                    }
                    let frame = source
                        .read_frame(index)
                        .with_context(|| format!("take {}", take.take_name))?;
                    let frame = if config.portrait_view {
                        frame
                    } else {
                        imageops::rotate270(&frame)
                    };
                    write_jpeg_atomic(&out_path, &frame)?;
                }
                bar.finish();
            }
        }
    }
    Ok(())
}
