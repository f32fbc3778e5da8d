//! Stage 2: build ground-truth annotation files per split.

use std::fs;

use anyhow::{Context, Result};

use crate::annotation::{AnnotationSource, GtAnnotationDb};
use crate::config::{AnnoType, PipelineConfig, Split};
use crate::io::write_json_atomic;
use crate::paths::GtPaths;

/// Build the ground-truth annotation files for every configured split and
/// annotation type.
///
/// Train and val splits get a single public file with the full records.
/// The test split gets two files: a private one with the full records for
/// server-side scoring, and a public one with the hand joint and validity
/// fields removed for blind local inference.
pub fn run_gt_anno(config: &PipelineConfig, annotations: &dyn AnnotationSource) -> Result<()> {
    log::info!("generating ground-truth annotation files");
    let gt = GtPaths::new(config);

    for &anno_type in &config.anno_types {
        for &split in &config.splits {
            let db = if split == Split::Test && anno_type == AnnoType::Auto {
                // Only manually annotated data qualifies as test ground truth.
                log::warn!("no test ground truth is generated from auto annotations; skipped");
                GtAnnotationDb::new()
            } else {
                annotations.load(split, anno_type)?
            };

            let out_dir = gt.annotation_dir(anno_type);
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;

            match split {
                Split::Train | Split::Val => {
                    write_json_atomic(&gt.public_anno_file(split, anno_type), &db)?;
                }
                Split::Test => {
                    if db.is_empty() {
                        log::warn!(
                            "no test ground truth to write for anno_type={anno_type}; skipped"
                        );
                    } else {
                        write_json_atomic(&gt.private_test_anno_file(anno_type), &db)?;
                        write_json_atomic(
                            &gt.public_anno_file(split, anno_type),
                            &db.redacted(),
                        )?;
                    }
                }
            }
        }
    }
    Ok(())
}
