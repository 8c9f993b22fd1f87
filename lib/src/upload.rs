//! Image uploads.
//!
//! Uploaded bytes are checked before they get anywhere near storage: the
//! declared type must be an image, the body must fit the configured limit and
//! the content must start with the magic number of a known image format.

use crate::config::Uploads;
use crate::image::{Image, ImageId};
use crate::{Database, ErrorKind, Result};

/// Checks an uploaded file, returning the mime type of the detected format.
pub fn validate_image(content_type: &str, bytes: &[u8], limits: &Uploads) -> Result<String> {
    let declared: mime::Mime = content_type
        .parse()
        .map_err(|_| ErrorKind::UploadRejected(format!("unknown file type `{content_type}`")))?;
    if declared.type_() != mime::IMAGE {
        return Err(ErrorKind::UploadRejected(format!(
            "only images can be uploaded, got `{}`",
            declared.essence_str()
        ))
        .into());
    }

    if bytes.len() > limits.max_bytes {
        return Err(too_large(Some(bytes.len()), limits));
    }
    if bytes.is_empty() {
        return Err(ErrorKind::UploadRejected("file is empty".into()).into());
    }

    let format = image::guess_format(bytes)
        .map_err(|_| ErrorKind::UploadRejected("file is not a recognised image".into()))?;
    let detected = format.to_mime_type();
    if !limits.accepted_types.iter().any(|t| t == detected) {
        return Err(ErrorKind::UploadRejected(format!("images of type `{detected}` are not accepted")).into());
    }
    Ok(detected.to_string())
}

/// Rejection of a file over the size limit. `size` is left out of the message
/// when the upload was cut off before it could be measured.
pub fn too_large(size: Option<usize>, limits: &Uploads) -> crate::Error {
    let limit = human_size(limits.max_bytes);
    let message = match size {
        Some(size) => format!("file is too large ({}), the limit is {limit}", human_size(size)),
        None => format!("file is too large, the limit is {limit}"),
    };
    ErrorKind::UploadRejected(message).into()
}

fn human_size(bytes: usize) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes as f64 >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB)
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}

/// Storage backend for uploaded images.
pub trait ImageStore {
    fn store_image(&self, image: &Image) -> Result<()>;
}

impl ImageStore for Database {
    fn store_image(&self, image: &Image) -> Result<()> {
        self.set(image)
    }
}

/// Public address an uploaded image is served from.
pub fn image_url(base_url: &str, id: ImageId) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), crate::routes::IMAGE, id)
}

/// Validates and stores an uploaded image, returning its public address.
pub fn upload_image(
    store: &impl ImageStore,
    limits: &Uploads,
    base_url: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<String> {
    let content_type = validate_image(content_type, &bytes, limits)?;
    let image = Image::new(content_type, bytes);
    store.store_image(&image).map_err(|e| {
        tracing::error!(image = %image.id, "failed storing uploaded image: {e}");
        ErrorKind::UploadRejected("image could not be stored, please try again".into())
    })?;
    tracing::info!(image = %image.id, bytes = image.bytes.len(), "image uploaded");
    Ok(image_url(base_url, image.id))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[derive(Default)]
    struct CountingStore {
        calls: Cell<usize>,
        fail: bool,
    }

    impl ImageStore for CountingStore {
        fn store_image(&self, _image: &Image) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ErrorKind::DbError("disk full".into()).into());
            }
            Ok(())
        }
    }

    fn png(len: usize) -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.resize(len, 0);
        bytes
    }

    #[test]
    fn oversized_upload_is_rejected_before_storage() {
        let store = CountingStore::default();
        let err = upload_image(
            &store,
            &Uploads::default(),
            "https://example.org",
            "image/png",
            png(6 * 1024 * 1024),
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UploadRejected(_)));
        assert!(err.public_message().contains("too large"));
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn non_image_type_is_rejected() {
        let err = validate_image("application/pdf", &png(100), &Uploads::default()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UploadRejected(_)));
        let err = validate_image("not a mime", &png(100), &Uploads::default()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UploadRejected(_)));
    }

    #[test]
    fn content_must_be_an_image() {
        let err = validate_image("image/png", b"<html></html>", &Uploads::default()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UploadRejected(_)));
        let err = validate_image("image/png", b"", &Uploads::default()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UploadRejected(_)));
    }

    #[test]
    fn format_outside_accepted_list_is_rejected() {
        let limits = Uploads {
            accepted_types: vec!["image/jpeg".into()],
            ..Default::default()
        };
        let err = validate_image("image/png", &png(64), &limits).unwrap_err();
        assert!(err.public_message().contains("image/png"));
    }

    #[test]
    fn detected_format_wins_over_declared_one() {
        let mime = validate_image("image/jpeg", &png(64), &Uploads::default()).unwrap();
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn accepted_upload_returns_public_url() {
        let store = CountingStore::default();
        let url = upload_image(
            &store,
            &Uploads::default(),
            "https://example.org/",
            "image/png",
            png(1024),
        )
        .unwrap();
        assert!(url.starts_with("https://example.org/image/"));
        assert_eq!(store.calls.get(), 1);
    }

    #[test]
    fn storage_failure_blocks_upload() {
        let store = CountingStore {
            fail: true,
            ..Default::default()
        };
        let err = upload_image(&store, &Uploads::default(), "", "image/png", png(64)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UploadRejected(_)));
    }
}
