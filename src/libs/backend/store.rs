use crate::libs::artifact::{ArtifactHandle, ArtifactStore};
use crate::libs::backend::aws;
use crate::libs::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Artifact store backed by a directory visible to every worker.
///
/// Staged files are copied in under a numbered id. Publishing and downloads
/// go through [`aws::copy`], so destinations may be object URLs or local
/// paths.
#[derive(Debug)]
pub struct LocalArtifactStore {
    root: PathBuf,
    next_id: AtomicU64,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            next_id: AtomicU64::new(0),
        })
    }

    fn blob(&self, handle: &ArtifactHandle) -> Result<PathBuf> {
        let path = self.root.join(&handle.id);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PipelineError::collaborator(
                "artifact store",
                format!("unknown artifact {}", handle),
            ))
        }
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn stage(&self, local: &Path) -> Result<ArtifactHandle> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let name = local
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        let id = format!("{:06}-{}", n, name);
        let size = std::fs::copy(local, self.root.join(&id))?;
        log::debug!("staged {} as {} ({} bytes)", local.display(), id, size);
        Ok(ArtifactHandle::new(id, size))
    }

    fn publish(&self, handle: &ArtifactHandle, url: &str) -> Result<()> {
        let blob = self.blob(handle)?;
        aws::copy(&blob.display().to_string(), url)
    }

    fn fetch(&self, handle: &ArtifactHandle, local: &Path) -> Result<()> {
        std::fs::copy(self.blob(handle)?, local)?;
        Ok(())
    }

    fn download(&self, url: &str, local: &Path) -> Result<()> {
        aws::copy(url, &local.display().to_string())
    }

    fn download_prefix(&self, url: &str, dir: &Path) -> Result<()> {
        aws::copy_prefix(url, dir)
    }
}
