//! Takes registry (`takes.json`).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::io::read_json;

/// One camera on the capture rig.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TakeCamera {
    pub cam_id: String,
    /// Whether this is the head-mounted ego camera.
    #[serde(default)]
    pub is_ego: bool,
}

/// Capture metadata of a take.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TakeCapture {
    #[serde(default)]
    pub cameras: Vec<TakeCamera>,
}

/// One recorded capture session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Take {
    pub take_uid: String,
    pub take_name: String,
    #[serde(default)]
    pub capture: TakeCapture,
}

impl Take {
    /// Device label of the ego camera, if the take has one.
    pub fn ego_camera_name(&self) -> Option<&str> {
        self.capture
            .cameras
            .iter()
            .find(|c| c.is_ego)
            .map(|c| c.cam_id.as_str())
    }
}

/// Read-only registry of all takes, indexed by uid and by name.
#[derive(Clone, Debug)]
pub struct TakesRegistry {
    takes: Vec<Take>,
    by_uid: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl TakesRegistry {
    /// Load the registry from a `takes.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let takes: Vec<Take> =
            read_json(path).with_context(|| format!("reading takes registry {}", path.display()))?;
        Ok(Self::from_takes(takes))
    }

    pub fn from_takes(takes: Vec<Take>) -> Self {
        let by_uid = takes
            .iter()
            .enumerate()
            .map(|(i, t)| (t.take_uid.clone(), i))
            .collect();
        let by_name = takes
            .iter()
            .enumerate()
            .map(|(i, t)| (t.take_name.clone(), i))
            .collect();
        Self {
            takes,
            by_uid,
            by_name,
        }
    }

    pub fn by_uid(&self, take_uid: &str) -> Option<&Take> {
        self.by_uid.get(take_uid).map(|&i| &self.takes[i])
    }

    /// Registry lookup for a take uid referenced by annotation data.
    ///
    /// An unknown uid is a data-integrity violation and aborts the run.
    pub fn require_uid(&self, take_uid: &str) -> Result<&Take> {
        self.by_uid(take_uid).with_context(|| {
            format!("take {take_uid} referenced by annotations is missing from the takes registry")
        })
    }

    pub fn by_name(&self, take_name: &str) -> Option<&Take> {
        self.by_name.get(take_name).map(|&i| &self.takes[i])
    }

    pub fn len(&self) -> usize {
        self.takes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }
}
