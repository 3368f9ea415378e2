//! Object storage access

use super::{respond, ApiResponse};
use crate::error::{ApiError, ValidationError};
use crate::repository::{Backend, Upload};

/// `<prefix>/<millis>-<file name>`; slashes in the file name are flattened
pub fn object_path(prefix: &str, millis: i64, file_name: &str) -> String {
    let name = file_name.trim().replace(['/', '\\'], "-");
    let name = if name.is_empty() { "upload".to_string() } else { name };
    format!("{}/{}-{}", prefix.trim_matches('/'), millis, name)
}

/// Store a blob and return its public URL. The content type is guessed
/// from the path when the caller does not know it.
pub async fn upload_file(
    backend: &dyn Backend,
    bucket: &str,
    path: &str,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> ApiResponse<String> {
    respond("upload_file", store(backend, bucket, path, content_type, bytes).await)
}

async fn store(
    backend: &dyn Backend,
    bucket: &str,
    path: &str,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<String, ApiError> {
    if bytes.is_empty() {
        return Err(ValidationError::new("file", "Cannot upload an empty file").into());
    }
    let content_type = content_type
        .filter(|ct| !ct.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string());

    tracing::debug!(bucket, path, %content_type, size = bytes.len(), "uploading object");
    let url = backend
        .upload(Upload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type,
            bytes,
        })
        .await?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryBackend;

    #[test]
    fn test_object_path() {
        assert_eq!(object_path("v1", 1700000000000, "beach.jpg"), "v1/1700000000000-beach.jpg");
        assert_eq!(object_path("/v1/", 5, "a/b.png"), "v1/5-a-b.png");
        assert_eq!(object_path("v1", 5, "  "), "v1/5-upload");
    }

    #[tokio::test]
    async fn test_content_type_is_guessed() {
        let backend = InMemoryBackend::new();
        let url = upload_file(&backend, "photos", "v1/5-beach.jpg", None, vec![0xff, 0xd8])
            .await
            .into_result()
            .unwrap();
        assert_eq!(url, "memory://storage/photos/v1/5-beach.jpg");
        assert_eq!(backend.object("photos", "v1/5-beach.jpg").unwrap().content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let backend = InMemoryBackend::new();
        assert!(!upload_file(&backend, "photos", "v1/x.png", None, vec![]).await.is_ok());
        assert!(backend.calls().is_empty());
    }
}
