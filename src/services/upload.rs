//! Image uploads stored on local disk and served under `/uploads`.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{EcommerceError, Result};

pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

pub struct UploadService {
    dir: PathBuf,
}

impl UploadService {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    /// Stores the bytes under a generated name and returns the public URL.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let extension = image_extension(original_name)?;
        if bytes.is_empty() { return Err(EcommerceError::validation("file is empty")); }
        let name = format!("{}.{extension}", Uuid::now_v7());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::info!(file = %name, size = bytes.len(), "image uploaded");
        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }
}

fn image_extension(name: &str) -> Result<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| EcommerceError::validation("only jpg, jpeg, png, webp and gif images are accepted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("Foto.JPG").unwrap(), "jpg");
        assert_eq!(image_extension("a.b.webp").unwrap(), "webp");
        assert!(image_extension("script.svg").is_err());
        assert!(image_extension("noext").is_err());
    }

    #[tokio::test]
    async fn test_store_writes_generated_name() {
        let dir = std::env::temp_dir().join(format!("storefront-upload-{}", Uuid::now_v7()));
        let service = UploadService::new(&dir);
        let url = service.store("shirt.png", b"\x89PNG").await.unwrap();
        let name = url.strip_prefix("/uploads/").unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(dir.join(name)).unwrap(), b"\x89PNG");
        std::fs::remove_dir_all(dir).ok();
    }
}
