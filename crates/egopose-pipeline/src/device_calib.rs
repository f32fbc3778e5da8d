//! Device-calibration documents and the intrinsics correction.

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use egopose_core::Real;

use crate::io::read_json;

/// Label of the RGB stream inside a device calibration.
pub const RGB_CAMERA_LABEL: &str = "camera-rgb";

/// Downscale factor applied to RGB frames before any geometric processing.
const RGB_DOWNSCALE: Real = 2.0;
/// Pixels cropped from each side of the RGB sensor before downscaling.
const RGB_CROP_PX: Real = 32.0;

/// Projection block of one camera entry.
///
/// `params` is the flat `[f, cx, cy, distortion...]` list; fields this
/// system does not interpret survive the read-modify-write cycle through
/// `extra`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraProjection {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Params")]
    pub params: Vec<Real>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One camera entry of a device calibration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraCalibration {
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Projection")]
    pub projection: CameraProjection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-device calibration document, one entry per camera label.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceCalibration {
    #[serde(rename = "CameraCalibrations")]
    pub camera_calibrations: Vec<CameraCalibration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceCalibration {
    /// The single calibration entry carrying `label`.
    ///
    /// Zero or multiple matching entries violate the document invariant and
    /// are reported as errors.
    pub fn camera_by_label(&self, label: &str) -> Result<&CameraCalibration> {
        let mut matches = self.camera_calibrations.iter().filter(|c| c.label == label);
        let Some(first) = matches.next() else {
            bail!("no calibration entry labeled '{label}'");
        };
        ensure!(
            matches.next().is_none(),
            "multiple calibration entries labeled '{label}'"
        );
        Ok(first)
    }

    fn camera_by_label_mut(&mut self, label: &str) -> Result<&mut CameraCalibration> {
        // Uniqueness first; the mutable lookup below then takes the only match.
        self.camera_by_label(label)?;
        Ok(self
            .camera_calibrations
            .iter_mut()
            .find(|c| c.label == label)
            .expect("checked above"))
    }
}

/// Rewrite the RGB projection parameters for the cropped and downscaled
/// pixel grid.
///
/// `f' = f/2`, `c' = (c - 0.5 - 32)/2` for both principal-point axes. The
/// focal length is only halved; the principal point also absorbs the
/// half-pixel shift and the crop offset.
///
/// Must be applied exactly once, to a freshly exported document.
pub fn correct_rgb_projection(calib: &mut DeviceCalibration) -> Result<()> {
    let rgb = calib.camera_by_label_mut(RGB_CAMERA_LABEL)?;
    let params = &mut rgb.projection.params;
    ensure!(
        params.len() >= 3,
        "'{RGB_CAMERA_LABEL}' projection has {} parameters, expected at least f, cx, cy",
        params.len()
    );
    params[0] /= RGB_DOWNSCALE;
    params[1] = (params[1] - 0.5 - RGB_CROP_PX) / RGB_DOWNSCALE;
    params[2] = (params[2] - 0.5 - RGB_CROP_PX) / RGB_DOWNSCALE;
    Ok(())
}

/// Source of device calibrations, queried per sensor container file.
///
/// The shipped [`JsonCalibrationSource`] reads the JSON calibration document
/// form of the container export; SDK-backed readers of binary containers
/// plug in through the same trait.
pub trait CalibrationSource {
    fn device_calibration(&self, container: &Path) -> Result<DeviceCalibration>;
}

/// Reads device calibrations stored as JSON documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCalibrationSource;

impl CalibrationSource for JsonCalibrationSource {
    fn device_calibration(&self, container: &Path) -> Result<DeviceCalibration> {
        read_json(container)
            .with_context(|| format!("reading device calibration {}", container.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(labels: &[&str]) -> DeviceCalibration {
        let cameras = labels
            .iter()
            .map(|label| {
                json!({
                    "Label": label,
                    "Projection": {
                        "Name": "FisheyeRadTanThinPrism",
                        "Params": [1221.0, 1459.0, 1443.0, 0.4, -0.5, 0.1, 1.2, -1.1, 0.3,
                                   0.0004, -0.0001, 0.001, -0.0001, 0.0005, -0.0002],
                        "Description": "projection model"
                    },
                    "SerialNumber": "0x1234"
                })
            })
            .collect::<Vec<_>>();
        serde_json::from_value(json!({
            "CameraCalibrations": cameras,
            "DeviceClassInfo": {"BuildVersion": "DVT-S"}
        }))
        .unwrap()
    }

    #[test]
    fn correction_formula_is_exact() {
        let mut calib = document(&["camera-slam-left", "camera-rgb"]);
        correct_rgb_projection(&mut calib).unwrap();

        let params = &calib.camera_by_label("camera-rgb").unwrap().projection.params;
        assert_eq!(params[0], 1221.0 / 2.0);
        assert_eq!(params[1], (1459.0 - 0.5 - 32.0) / 2.0);
        assert_eq!(params[2], (1443.0 - 0.5 - 32.0) / 2.0);
        // Distortion parameters are untouched.
        assert_eq!(params[3], 0.4);

        // Other labels are untouched.
        let slam = &calib.camera_by_label("camera-slam-left").unwrap().projection.params;
        assert_eq!(slam[0], 1221.0);
    }

    #[test]
    fn missing_rgb_entry_is_an_error() {
        let mut calib = document(&["camera-slam-left"]);
        assert!(correct_rgb_projection(&mut calib).is_err());
    }

    #[test]
    fn duplicate_rgb_entries_are_an_error() {
        let mut calib = document(&["camera-rgb", "camera-rgb"]);
        assert!(correct_rgb_projection(&mut calib).is_err());
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let calib = document(&["camera-rgb"]);
        let json = serde_json::to_value(&calib).unwrap();
        assert_eq!(json["DeviceClassInfo"]["BuildVersion"], "DVT-S");
        assert_eq!(json["CameraCalibrations"][0]["SerialNumber"], "0x1234");
        assert_eq!(
            json["CameraCalibrations"][0]["Projection"]["Description"],
            "projection model"
        );
    }
}
