//! Reading and writing operations.
//!
//! All artifact writes go through a temp-file-plus-rename so the
//! file-existence idempotency checks of the image stages never observe a
//! partially written file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing JSON {}", path.display()))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.tmp"))
}

/// Serialize `value` as JSON and atomically replace `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec(value).context("serializing JSON")?;
    let tmp = temp_sibling(path);
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

/// Encode `img` as JPEG and atomically replace `path`.
pub fn write_jpeg_atomic(path: &Path, img: &RgbImage) -> Result<()> {
    let tmp = temp_sibling(path);
    img.save_with_format(&tmp, image::ImageFormat::Jpeg)
        .with_context(|| format!("encoding JPEG {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let value = json!({"a": 1, "b": ["x", "y"]});

        write_json_atomic(&path, &value).unwrap();
        let back: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(back, value);

        // No temp file left behind.
        assert!(!path.with_file_name("doc.json.tmp").exists());
    }

    #[test]
    fn jpeg_write_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("000000.jpg");
        let img = RgbImage::new(8, 6);

        write_jpeg_atomic(&path, &img).unwrap();
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (8, 6));
    }
}
