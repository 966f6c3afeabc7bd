//! Filesystem-backed `Storage`/`ObjectStore` collaborators, writing the
//! on-disk layout described in §6: `documents/<external_id>.json`,
//! `checkpoints/<session_id>.json`, `raw/<path>`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use lexsource_core::{CollaboratorError, Document};
use lexsource_core::Checkpoint;
use lexsource_core::collaborators::{ObjectStore, Storage, StorageKey};

pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub async fn new(root: PathBuf) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(root.join("documents")).await?;
        tokio::fs::create_dir_all(root.join("checkpoints")).await?;
        tokio::fs::create_dir_all(root.join("raw")).await?;
        Ok(FsStorage { root })
    }

    fn document_path(&self, external_id: &str) -> PathBuf {
        self.root.join("documents").join(format!("{external_id}.json"))
    }

    fn checkpoint_path(&self, session_id: &str) -> PathBuf {
        self.root.join("checkpoints").join(format!("{session_id}.json"))
    }
}

fn io_err(err: std::io::Error) -> CollaboratorError {
    CollaboratorError::Transient(err.to_string())
}

#[async_trait]
impl Storage for FsStorage {
    async fn save(&self, key: &StorageKey, record: &Document) -> Result<(), CollaboratorError> {
        let body = serde_json::to_vec_pretty(record)
            .map_err(|err| CollaboratorError::Terminal { status: None, reason: err.to_string() })?;
        tokio::fs::write(self.document_path(&key.external_id), body)
            .await
            .map_err(io_err)
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, CollaboratorError> {
        Ok(tokio::fs::try_exists(self.document_path(&key.external_id))
            .await
            .map_err(io_err)?)
    }

    async fn load_checkpoint(&self, session_id: &str) -> Result<Option<Checkpoint>, CollaboratorError> {
        let path = self.checkpoint_path(session_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let checkpoint = serde_json::from_slice(&bytes)
                    .map_err(|err| CollaboratorError::Terminal { status: None, reason: err.to_string() })?;
                Ok(Some(checkpoint))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(err)),
        }
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), CollaboratorError> {
        let body = serde_json::to_vec_pretty(checkpoint)
            .map_err(|err| CollaboratorError::Terminal { status: None, reason: err.to_string() })?;
        tokio::fs::write(self.checkpoint_path(&checkpoint.session_id), body)
            .await
            .map_err(io_err)
    }
}

#[async_trait]
impl ObjectStore for FsStorage {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<String, CollaboratorError> {
        let target = self.root.join("raw").join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&target, bytes).await.map_err(io_err)?;
        Ok(format!("raw/{path}"))
    }
}

pub async fn read_checkpoint(output_dir: &Path, session_id: &str) -> anyhow::Result<Option<Checkpoint>> {
    let path = output_dir.join("checkpoints").join(format!("{session_id}.json"));
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
