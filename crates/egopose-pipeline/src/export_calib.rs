//! Stage 1: export and correct per-take device calibration JSON.

use std::fs;

use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;

use crate::annotation::AnnotationSource;
use crate::config::PipelineConfig;
use crate::device_calib::{correct_rgb_projection, CalibrationSource};
use crate::io::write_json_atomic;
use crate::paths::{DatasetPaths, GtPaths};
use crate::takes::TakesRegistry;

/// Export the device calibration of every annotated take and rewrite the
/// RGB intrinsics for the cropped/downscaled pixel grid.
///
/// Re-running re-exports from the container, so the correction is always
/// applied to fresh parameters. Takes without a sensor container are
/// skipped with a warning.
pub fn run_aria_calib(
    config: &PipelineConfig,
    annotations: &dyn AnnotationSource,
    calibrations: &dyn CalibrationSource,
) -> Result<()> {
    let dataset = DatasetPaths::new(&config.data_dir);
    let gt = GtPaths::new(config);
    let registry = TakesRegistry::load(&dataset.takes_file())?;

    let annotated = annotations.annotated_take_uids(&config.splits, &config.anno_types)?;
    let mut selected = Vec::with_capacity(annotated.len());
    for uid in &annotated {
        selected.push(registry.require_uid(uid)?);
    }

    let out_dir = gt.calib_json_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    log::info!("generating device calibration JSON files");
    let bar = ProgressBar::new(selected.len() as u64);
    for take in selected {
        bar.inc(1);
        let Some(ego_cam) = take.ego_camera_name() else {
            bail!(
                "take {} has no ego camera in the takes registry",
                take.take_name
            );
        };
        let container = dataset.calib_container(&take.take_name, ego_cam);
        if !container.exists() {
            log::warn!(
                "no sensor container at {}; skipped take {}",
                container.display(),
                take.take_name
            );
            continue;
        }
        let mut calib = calibrations.device_calibration(&container)?;
        correct_rgb_projection(&mut calib)
            .with_context(|| format!("correcting RGB intrinsics of take {}", take.take_name))?;
        write_json_atomic(&gt.calib_json_file(&take.take_name), &calib)?;
    }
    bar.finish();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::FileAnnotationSource;
    use crate::config::{AnnoType, Split};
    use crate::device_calib::{DeviceCalibration, JsonCalibrationSource};
    use crate::io::read_json;
    use serde_json::json;
    use std::path::Path;

    fn write_fixture(data_dir: &Path, take_uid: &str, take_name: &str, with_container: bool) {
        let takes = json!([{
            "take_uid": take_uid,
            "take_name": take_name,
            "capture": {"cameras": [{"cam_id": "aria01", "is_ego": true}]}
        }]);
        fs::write(data_dir.join("takes.json"), serde_json::to_vec(&takes).unwrap()).unwrap();

        let anno_dir = data_dir.join("annotations/ego_pose/train/hand/annotation");
        fs::create_dir_all(&anno_dir).unwrap();
        fs::write(anno_dir.join(format!("{take_uid}.json")), b"{\"0\": {}}").unwrap();

        if with_container {
            let take_dir = data_dir.join("takes").join(take_name);
            fs::create_dir_all(&take_dir).unwrap();
            let calib = json!({
                "CameraCalibrations": [{
                    "Label": "camera-rgb",
                    "Projection": {
                        "Name": "FisheyeRadTanThinPrism",
                        "Params": [1221.0, 1459.0, 1443.0, 0.4, -0.5, 0.1, 1.2, -1.1, 0.3,
                                   0.0004, -0.0001, 0.001, -0.0001, 0.0005, -0.0002]
                    }
                }]
            });
            fs::write(
                take_dir.join("aria01_noimagestreams.vrs"),
                serde_json::to_vec(&calib).unwrap(),
            )
            .unwrap();
        }
    }

    fn config(data_dir: &Path, gt_dir: &Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: data_dir.to_path_buf(),
            gt_output_dir: gt_dir.to_path_buf(),
            steps: vec![],
            splits: vec![Split::Train],
            anno_types: vec![AnnoType::Manual],
            portrait_view: false,
        }
    }

    #[test]
    fn exports_corrected_calibration() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "uid-1", "cooking_01", true);
        let cfg = config(dir.path(), &dir.path().join("gt"));

        let annotations = FileAnnotationSource::new(&cfg.data_dir);
        run_aria_calib(&cfg, &annotations, &JsonCalibrationSource).unwrap();

        let out = dir.path().join("gt/aria_calib_json/cooking_01.json");
        let calib: DeviceCalibration = read_json(&out).unwrap();
        let params = &calib.camera_by_label("camera-rgb").unwrap().projection.params;
        assert_eq!(params[0], 1221.0 / 2.0);
        assert_eq!(params[1], (1459.0 - 0.5 - 32.0) / 2.0);
        assert_eq!(params[2], (1443.0 - 0.5 - 32.0) / 2.0);
    }

    #[test]
    fn rerun_reapplies_from_fresh_export() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "uid-1", "cooking_01", true);
        let cfg = config(dir.path(), &dir.path().join("gt"));
        let annotations = FileAnnotationSource::new(&cfg.data_dir);

        run_aria_calib(&cfg, &annotations, &JsonCalibrationSource).unwrap();
        run_aria_calib(&cfg, &annotations, &JsonCalibrationSource).unwrap();

        let out = dir.path().join("gt/aria_calib_json/cooking_01.json");
        let calib: DeviceCalibration = read_json(&out).unwrap();
        let params = &calib.camera_by_label("camera-rgb").unwrap().projection.params;
        // Still the once-corrected values, not corrected twice.
        assert_eq!(params[0], 1221.0 / 2.0);
    }

    #[test]
    fn missing_container_skips_take() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "uid-1", "cooking_01", false);
        let cfg = config(dir.path(), &dir.path().join("gt"));
        let annotations = FileAnnotationSource::new(&cfg.data_dir);

        run_aria_calib(&cfg, &annotations, &JsonCalibrationSource).unwrap();
        assert!(!dir.path().join("gt/aria_calib_json/cooking_01.json").exists());
    }

    #[test]
    fn annotated_take_missing_from_registry_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "uid-1", "cooking_01", true);
        // Annotation for a second take the registry does not know.
        let anno_dir = dir.path().join("annotations/ego_pose/train/hand/annotation");
        fs::write(anno_dir.join("uid-ghost.json"), b"{}").unwrap();

        let cfg = config(dir.path(), &dir.path().join("gt"));
        let annotations = FileAnnotationSource::new(&cfg.data_dir);
        let err = run_aria_calib(&cfg, &annotations, &JsonCalibrationSource).unwrap_err();
        assert!(err.to_string().contains("uid-ghost"), "{err}");
    }
}
