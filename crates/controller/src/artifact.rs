// SPDX-License-Identifier: MIT

//! Resolves a model id to its descriptor and a local copy of its weights,
//! fetching from the object store and caching the weights on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use signrt_core::{ModelDescriptor, ModelId};

use crate::error::ControllerError;

/// The external object store holding model descriptors and weight files.
/// Read-only from the controller's point of view.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> std::io::Result<Vec<u8>>;
}

/// An object store backed by a local directory tree, used by the standalone
/// CLI demo and tests in place of a real object storage service.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, key: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(key)).await
    }
}

/// Resolves model ids to descriptors and locally cached weight files.
pub struct ArtifactResolver<S: ObjectStore> {
    store: S,
    cache_dir: PathBuf,
}

impl<S: ObjectStore> ArtifactResolver<S> {
    pub fn new(store: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self { store, cache_dir: cache_dir.into() }
    }

    /// Resolve `model_id` to its descriptor, a path to its locally cached
    /// copy of the descriptor JSON (handed to the worker process so it does
    /// not need object-store access of its own), and a path to its locally
    /// cached weights. `model_id` is itself the object-store key of the
    /// descriptor.
    pub async fn resolve(
        &self,
        model_id: &ModelId,
    ) -> Result<(ModelDescriptor, PathBuf, PathBuf), ControllerError> {
        let descriptor_bytes =
            self.store.get(model_id.as_str()).await.map_err(|e| ControllerError::ArtifactUnavailable {
                model_id: model_id.clone(),
                cause: e.to_string(),
            })?;
        let descriptor = ModelDescriptor::parse(&descriptor_bytes).map_err(|e| {
            ControllerError::ArtifactUnavailable { model_id: model_id.clone(), cause: e.to_string() }
        })?;

        let descriptor_path = self
            .cached_bytes(model_id.as_str(), &descriptor_bytes)
            .await
            .map_err(|e| ControllerError::ArtifactUnavailable {
                model_id: model_id.clone(),
                cause: e.to_string(),
            })?;

        let weights_path = self
            .cached_weights(&descriptor.weights_ref)
            .await
            .map_err(|e| ControllerError::ArtifactUnavailable {
                model_id: model_id.clone(),
                cause: e.to_string(),
            })?;

        Ok((descriptor, descriptor_path, weights_path))
    }

    async fn cached_weights(&self, weights_ref: &str) -> std::io::Result<PathBuf> {
        let bytes = self.store.get(weights_ref).await?;
        self.cached_bytes(weights_ref, &bytes).await
    }

    /// Write `bytes` under `cache_dir` keyed by `key`, unless already cached.
    /// Writes to a temp file in the same directory, then renames, so a
    /// concurrent resolver for the same key never observes a partial file.
    async fn cached_bytes(&self, key: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let cached_path = self.cache_dir.join(sanitize(key));
        if cached_path.exists() {
            return Ok(cached_path);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let tmp_path = self.cache_dir.join(format!(".{}.tmp-{}", sanitize(key), std::process::id()));
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &cached_path).await?;
        Ok(cached_path)
    }
}

fn sanitize(key: &str) -> String {
    key.chars().map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' }).collect()
}
