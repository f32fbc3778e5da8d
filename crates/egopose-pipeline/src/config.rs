//! Pipeline configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Export and correct per-take device calibration JSON.
    AriaCalib,
    /// Build ground-truth annotation JSON per split.
    GtAnno,
    /// Extract distorted frames for annotated indices.
    RawImage,
    /// Remap distorted frames to the pinhole target.
    UndistortedImage,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::AriaCalib => "aria_calib",
            Step::GtAnno => "gt_anno",
            Step::RawImage => "raw_image",
            Step::UndistortedImage => "undistorted_image",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aria_calib" => Ok(Step::AriaCalib),
            "gt_anno" => Ok(Step::GtAnno),
            "raw_image" => Ok(Step::RawImage),
            "undistorted_image" => Ok(Step::UndistortedImage),
            other => Err(format!(
                "unknown step '{other}' (expected aria_calib, gt_anno, raw_image or undistorted_image)"
            )),
        }
    }
}

/// Dataset split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Split::Train),
            "val" => Ok(Split::Val),
            "test" => Ok(Split::Test),
            other => Err(format!("unknown split '{other}' (expected train, val or test)")),
        }
    }
}

/// Provenance of the raw annotations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnoType {
    Manual,
    Auto,
}

impl AnnoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnoType::Manual => "manual",
            AnnoType::Auto => "auto",
        }
    }
}

impl fmt::Display for AnnoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(AnnoType::Manual),
            "auto" => Ok(AnnoType::Auto),
            other => Err(format!(
                "unknown annotation type '{other}' (expected manual or auto)"
            )),
        }
    }
}

/// Immutable configuration shared by all stages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory of the capture dataset (contains `takes.json`).
    pub data_dir: PathBuf,
    /// Output directory for all ground-truth artifacts.
    pub gt_output_dir: PathBuf,
    /// Stages to run, in order.
    pub steps: Vec<Step>,
    /// Splits to process.
    pub splits: Vec<Split>,
    /// Annotation types to process.
    pub anno_types: Vec<AnnoType>,
    /// Keep the sensor's portrait orientation instead of rotating to
    /// landscape.
    #[serde(default)]
    pub portrait_view: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_roundtrip() {
        for step in [
            Step::AriaCalib,
            Step::GtAnno,
            Step::RawImage,
            Step::UndistortedImage,
        ] {
            assert_eq!(step.as_str().parse::<Step>().unwrap(), step);
        }
        assert!("calib".parse::<Step>().is_err());
    }

    #[test]
    fn config_json_roundtrip() {
        let config = PipelineConfig {
            data_dir: PathBuf::from("/data/egoexo"),
            gt_output_dir: PathBuf::from("/data/gt"),
            steps: vec![Step::GtAnno, Step::RawImage],
            splits: vec![Split::Train, Split::Test],
            anno_types: vec![AnnoType::Manual],
            portrait_view: true,
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("raw_image"), "json missing step name: {json}");

        let de: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(de.steps, config.steps);
        assert_eq!(de.splits, config.splits);
        assert_eq!(de.anno_types, config.anno_types);
        assert!(de.portrait_view);
    }
}
