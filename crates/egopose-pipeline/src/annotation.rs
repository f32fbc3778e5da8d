//! Ground-truth annotation database.
//!
//! The pipeline moves, splits and redacts per-frame annotation records but
//! never interprets their contents, so records are carried as JSON maps and
//! survive unknown fields untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{AnnoType, Split};
use crate::io::read_json;
use crate::paths::DatasetPaths;

/// Ground-truth joint and validity fields withheld from the public test set.
pub const HAND_ANNOTATION_KEYS: [&str; 6] = [
    "left_hand_2d",
    "right_hand_2d",
    "left_hand_3d",
    "right_hand_3d",
    "left_hand_valid_3d",
    "right_hand_valid_3d",
];

/// One frame's annotation record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameAnnotation(pub Map<String, Value>);

impl FrameAnnotation {
    /// Remove the six hand-joint/validity fields.
    pub fn redact_hands(&mut self) {
        for key in HAND_ANNOTATION_KEYS {
            self.0.remove(key);
        }
    }

    /// Whether all six hand-joint/validity fields are present.
    pub fn has_all_hand_fields(&self) -> bool {
        HAND_ANNOTATION_KEYS.iter().all(|k| self.0.contains_key(*k))
    }
}

/// Annotations of one take, keyed by string-encoded zero-based frame index.
pub type TakeAnnotations = BTreeMap<String, FrameAnnotation>;

/// Annotation database keyed by take uid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GtAnnotationDb(pub BTreeMap<String, TakeAnnotations>);

impl GtAnnotationDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn takes(&self) -> impl Iterator<Item = (&String, &TakeAnnotations)> {
        self.0.iter()
    }

    pub fn insert(&mut self, take_uid: String, frames: TakeAnnotations) {
        self.0.insert(take_uid, frames);
    }

    /// Copy of the database with the hand fields removed from every frame.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        for frames in out.0.values_mut() {
            for frame in frames.values_mut() {
                frame.redact_hands();
            }
        }
        out
    }
}

/// Numeric frame indices of a take's annotations, sorted ascending so the
/// sequential video reader can make a single pass.
pub fn frame_indices(frames: &TakeAnnotations) -> Result<Vec<u64>> {
    let mut indices = Vec::with_capacity(frames.len());
    for key in frames.keys() {
        indices.push(
            key.parse::<u64>()
                .with_context(|| format!("frame index '{key}' is not a non-negative integer"))?,
        );
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Source of raw per-take annotations.
pub trait AnnotationSource {
    /// Load and merge all takes annotated for a split/type combination.
    fn load(&self, split: Split, anno_type: AnnoType) -> Result<GtAnnotationDb>;

    /// Uids of all takes with raw annotations in any of the given
    /// split/type combinations.
    fn annotated_take_uids(
        &self,
        splits: &[Split],
        anno_types: &[AnnoType],
    ) -> Result<BTreeSet<String>>;
}

/// File-backed annotation source.
///
/// Reads one `<take_uid>.json` per annotated take from
/// `annotations/ego_pose/<split>/hand/{annotation|automatic}`, each file a
/// `frame_index -> record` object. A missing directory contributes no takes.
#[derive(Clone, Debug)]
pub struct FileAnnotationSource {
    paths: DatasetPaths,
}

impl FileAnnotationSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: DatasetPaths::new(data_dir),
        }
    }

    fn take_files(&self, split: Split, anno_type: AnnoType) -> Result<Vec<PathBuf>> {
        let dir = self.paths.raw_anno_dir(split, anno_type);
        if !dir.is_dir() {
            log::debug!("no raw annotation directory at {}", dir.display());
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in
            fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl AnnotationSource for FileAnnotationSource {
    fn load(&self, split: Split, anno_type: AnnoType) -> Result<GtAnnotationDb> {
        let mut db = GtAnnotationDb::new();
        for path in self.take_files(split, anno_type)? {
            let take_uid = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let frames: TakeAnnotations = read_json(&path)
                .with_context(|| format!("reading raw annotation {}", path.display()))?;
            db.insert(take_uid, frames);
        }
        Ok(db)
    }

    fn annotated_take_uids(
        &self,
        splits: &[Split],
        anno_types: &[AnnoType],
    ) -> Result<BTreeSet<String>> {
        let mut uids = BTreeSet::new();
        for &anno_type in anno_types {
            for &split in splits {
                for path in self.take_files(split, anno_type)? {
                    if let Some(stem) = path.file_stem() {
                        uids.insert(stem.to_string_lossy().into_owned());
                    }
                }
            }
        }
        Ok(uids)
    }
}
