use std::path::Path;

use bytes::Bytes;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// An image received through a multipart form, held in memory until stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub content_type: String,
    pub data: Bytes,
}

pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// Writes the upload under `{root}/{dir}/{uuid}.{ext}` and returns the
/// path relative to the storage root, which is what gets persisted.
pub async fn store_image(config: &StorageConfig, file: &UploadedFile, dir: &str) -> Result<String> {
    let extension = image_extension(&file.content_type)
        .ok_or_else(|| AppError::BadRequest("Tipo de imagen no soportado.".to_string()))?;

    let relative = format!("{}/{}.{}", dir.trim_matches('/'), Uuid::new_v4(), extension);
    let full = Path::new(&config.root).join(&relative);

    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::InternalError(format!("Failed to create upload directory: {}", e))
        })?;
    }

    tokio::fs::write(&full, &file.data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {}", e)))?;

    Ok(relative)
}

/// Removes a stored file. Deletions run after the database commit, so a
/// missing or stubborn file is only worth a warning, never an error.
pub async fn delete_file(config: &StorageConfig, path: &str) {
    let path = path.trim_start_matches('/');
    if path.is_empty() || path.contains("..") {
        return;
    }

    let full = Path::new(&config.root).join(path);
    if let Err(e) = tokio::fs::remove_file(&full).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to delete file {}: {}", full.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> StorageConfig {
        let root = std::env::temp_dir().join(format!("mese-storage-{}", Uuid::new_v4()));
        StorageConfig {
            root: root.to_string_lossy().into_owned(),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn maps_supported_image_types() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("image/jpg"), Some("jpg"));
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("image/webp"), Some("webp"));
        assert_eq!(image_extension("image/avif"), Some("avif"));
        assert_eq!(image_extension("image/gif"), None);
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[tokio::test]
    async fn stores_and_deletes_uploads() {
        let config = temp_config();
        let file = UploadedFile {
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG\r\n"),
        };

        let path = store_image(&config, &file, "products").await.unwrap();
        assert!(path.starts_with("products/"));
        assert!(path.ends_with(".png"));

        let full = Path::new(&config.root).join(&path);
        assert_eq!(tokio::fs::read(&full).await.unwrap(), b"\x89PNG\r\n".to_vec());

        delete_file(&config, &path).await;
        assert!(!full.exists());

        // Deleting again is a no-op.
        delete_file(&config, &path).await;

        tokio::fs::remove_dir_all(&config.root).await.ok();
    }

    #[tokio::test]
    async fn rejects_unsupported_content_type() {
        let config = temp_config();
        let file = UploadedFile {
            content_type: "image/gif".to_string(),
            data: Bytes::from_static(b"GIF89a"),
        };

        assert!(store_image(&config, &file, "slides").await.is_err());
    }

    #[tokio::test]
    async fn delete_ignores_traversal_and_empty_paths() {
        let config = temp_config();
        delete_file(&config, "").await;
        delete_file(&config, "../outside.txt").await;
        delete_file(&config, "products/../../outside.txt").await;
    }
}
