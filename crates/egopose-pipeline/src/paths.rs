//! Dataset and output directory layout.

use std::path::{Path, PathBuf};

use crate::config::{AnnoType, PipelineConfig, Split};

/// Suffix of the ego camera's frame-aligned video stream.
const EGO_VIDEO_SUFFIX: &str = "214-1.mp4";

/// Read-only capture dataset layout under the data root.
#[derive(Clone, Debug)]
pub struct DatasetPaths {
    data_dir: PathBuf,
}

impl DatasetPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `<data_dir>/takes.json`
    pub fn takes_file(&self) -> PathBuf {
        self.data_dir.join("takes.json")
    }

    /// `<data_dir>/takes/<take_name>`
    pub fn take_dir(&self, take_name: &str) -> PathBuf {
        self.data_dir.join("takes").join(take_name)
    }

    /// Sensor-calibration container of the ego camera.
    /// `<take_dir>/<ego_cam>_noimagestreams.vrs`
    pub fn calib_container(&self, take_name: &str, ego_cam: &str) -> PathBuf {
        self.take_dir(take_name)
            .join(format!("{ego_cam}_noimagestreams.vrs"))
    }

    /// Frame-aligned ego video stream.
    /// `<take_dir>/frame_aligned_videos/<ego_cam>_214-1.mp4`
    pub fn video_file(&self, take_name: &str, ego_cam: &str) -> PathBuf {
        self.take_dir(take_name)
            .join("frame_aligned_videos")
            .join(format!("{ego_cam}_{EGO_VIDEO_SUFFIX}"))
    }

    /// Raw per-take annotation directory for a split/type combination.
    /// `<data_dir>/annotations/ego_pose/<split>/hand/{annotation|automatic}`
    pub fn raw_anno_dir(&self, split: Split, anno_type: AnnoType) -> PathBuf {
        let type_dir = match anno_type {
            AnnoType::Manual => "annotation",
            AnnoType::Auto => "automatic",
        };
        self.data_dir
            .join("annotations")
            .join("ego_pose")
            .join(split.as_str())
            .join("hand")
            .join(type_dir)
    }
}

/// Which side of the undistortion step an image tree holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Distorted,
    Undistorted,
}

impl ImageKind {
    fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Distorted => "distorted",
            ImageKind::Undistorted => "undistorted",
        }
    }
}

/// Ground-truth output layout under the configured output root.
#[derive(Clone, Debug)]
pub struct GtPaths {
    gt_output_dir: PathBuf,
    portrait_view: bool,
}

impl GtPaths {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            gt_output_dir: config.gt_output_dir.clone(),
            portrait_view: config.portrait_view,
        }
    }

    /// `<gt_output_dir>/aria_calib_json`
    pub fn calib_json_dir(&self) -> PathBuf {
        self.gt_output_dir.join("aria_calib_json")
    }

    /// `<gt_output_dir>/aria_calib_json/<take_name>.json`
    pub fn calib_json_file(&self, take_name: &str) -> PathBuf {
        self.calib_json_dir().join(format!("{take_name}.json"))
    }

    /// `<gt_output_dir>/annotation/<anno_type>`
    pub fn annotation_dir(&self, anno_type: AnnoType) -> PathBuf {
        self.gt_output_dir
            .join("annotation")
            .join(anno_type.as_str())
    }

    /// `<annotation_dir>/ego_pose_gt_anno_<split>_public.json`
    pub fn public_anno_file(&self, split: Split, anno_type: AnnoType) -> PathBuf {
        self.annotation_dir(anno_type)
            .join(format!("ego_pose_gt_anno_{split}_public.json"))
    }

    /// `<annotation_dir>/ego_pose_gt_anno_test_private.json`
    pub fn private_test_anno_file(&self, anno_type: AnnoType) -> PathBuf {
        self.annotation_dir(anno_type)
            .join("ego_pose_gt_anno_test_private.json")
    }

    /// Split-level image root, e.g. `<gt_output_dir>/image/distorted/train`.
    /// The prefix is `image_portrait_view` in portrait mode.
    pub fn image_dir(&self, kind: ImageKind, split: Split) -> PathBuf {
        let prefix = if self.portrait_view {
            "image_portrait_view"
        } else {
            "image"
        };
        self.gt_output_dir
            .join(prefix)
            .join(kind.as_str())
            .join(split.as_str())
    }

    /// Per-take image directory under [`Self::image_dir`].
    pub fn take_image_dir(&self, kind: ImageKind, split: Split, take_name: &str) -> PathBuf {
        self.image_dir(kind, split).join(take_name)
    }
}

/// Frame file name, zero-padded to six digits.
pub fn frame_file_name(index: u64) -> String {
    format!("{index:06}.jpg")
}

/// Frame file path inside a per-take image directory.
pub fn frame_file(dir: &Path, index: u64) -> PathBuf {
    dir.join(frame_file_name(index))
}
