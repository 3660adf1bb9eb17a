use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, GenericImageView};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::infra::storage::ObjectStorage;

pub const MAX_DIMENSION: u32 = 800;
pub const JPEG_QUALITY: u8 = 80;

/// Stores an uploaded image somewhere durable and returns its public URL.
#[axum::async_trait]
pub trait MediaIngest: Send + Sync {
    async fn store_image(&self, owner_id: Uuid, data: Bytes) -> ServiceResult<String>;

    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct S3MediaIngest {
    storage: ObjectStorage,
    public_base_url: String,
}

impl S3MediaIngest {
    pub fn new(storage: ObjectStorage, public_base_url: impl Into<String>) -> Self {
        Self {
            storage,
            public_base_url: public_base_url.into(),
        }
    }
}

#[axum::async_trait]
impl MediaIngest for S3MediaIngest {
    async fn store_image(&self, owner_id: Uuid, data: Bytes) -> ServiceResult<String> {
        // Decoding and resizing is CPU bound.
        let optimized = tokio::task::spawn_blocking(move || optimize_image(&data))
            .await
            .map_err(|err| ServiceError::Internal(anyhow::anyhow!("image task failed: {}", err)))??;

        let key = object_key(owner_id, &optimized);
        self.storage
            .put_object(&key, "image/jpeg", Bytes::from(optimized))
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, owner_id = %owner_id, key = %key, "failed to upload image");
                ServiceError::upstream("failed to store image")
            })?;

        tracing::debug!(owner_id = %owner_id, key = %key, "image stored");
        Ok(public_url(&self.public_base_url, &key))
    }

    async fn ping(&self) -> ServiceResult<()> {
        self.storage.head_bucket().await.map_err(|err| {
            tracing::warn!(error = ?err, bucket = %self.storage.bucket(), "object storage unreachable");
            ServiceError::upstream("object storage unreachable")
        })
    }
}

/// Fits the image inside `MAX_DIMENSION` square (never enlarging) and
/// re-encodes it as JPEG.
pub fn optimize_image(data: &[u8]) -> ServiceResult<Vec<u8>> {
    let image = image::load_from_memory(data)
        .map_err(|err| ServiceError::validation(format!("unsupported image: {}", err)))?;

    let (width, height) = image.dimensions();
    let image = if width > MAX_DIMENSION || height > MAX_DIMENSION {
        image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        image
    };

    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|err| ServiceError::Internal(anyhow::anyhow!("failed to encode jpeg: {}", err)))?;
    Ok(out)
}

fn object_key(owner_id: Uuid, data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    format!("posts/{}/{}.jpg", owner_id, hex::encode(digest))
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
