use base64::{engine::general_purpose::STANDARD, Engine as _};
use fs_err as fs;
use humansize::{format_size, BINARY};
use std::path::Path;

use crate::errors::AdvisorError;

/// A photo held in memory for the current chat turn only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime: &'static str,
    pub bytes: u64,
    pub data_uri: String,
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => return None,
    })
}

/// Read `path` as a data URI. Size is checked from metadata before any bytes
/// are read, so an oversized file is refused immediately.
pub fn load_image(path: &Path, max_bytes: u64) -> Result<ImageAttachment, AdvisorError> {
    let mime = mime_for(path).ok_or_else(|| {
        AdvisorError::Image(format!("{} is not a supported image type", path.display()))
    })?;

    let meta = fs::metadata(path).map_err(|e| AdvisorError::Image(e.to_string()))?;
    if !meta.is_file() {
        return Err(AdvisorError::Image(format!("{} is not a file", path.display())));
    }
    if meta.len() > max_bytes {
        return Err(AdvisorError::Image(format!(
            "please upload an image smaller than {} ({} is {})",
            format_size(max_bytes, BINARY),
            path.display(),
            format_size(meta.len(), BINARY)
        )));
    }

    let data = fs::read(path).map_err(|e| AdvisorError::Image(e.to_string()))?;
    Ok(ImageAttachment {
        mime,
        bytes: data.len() as u64,
        data_uri: format!("data:{};base64,{}", mime, STANDARD.encode(&data)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_IMAGE_BYTES;

    #[test]
    fn encodes_small_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.PNG");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let img = load_image(&path, MAX_IMAGE_BYTES).unwrap();
        assert_eq!(img.mime, "image/png");
        assert_eq!(img.bytes, 4);
        assert_eq!(img.data_uri, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.jpg");
        let f = std::fs::File::create(&path).unwrap();
        f.set_len(MAX_IMAGE_BYTES + 1).unwrap();

        let err = load_image(&path, MAX_IMAGE_BYTES).unwrap_err();
        assert!(matches!(err, AdvisorError::Image(ref m) if m.contains("5 MiB")), "{err}");
    }

    #[test]
    fn exactly_at_limit_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.webp");
        std::fs::write(&path, vec![0u8; 16]).unwrap();
        assert!(load_image(&path, 16).is_ok());
    }

    #[test]
    fn rejects_non_image_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(matches!(load_image(&path, MAX_IMAGE_BYTES), Err(AdvisorError::Image(_))));
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_image(&dir.path().join("gone.jpg"), MAX_IMAGE_BYTES),
            Err(AdvisorError::Image(_))
        ));
    }
}
