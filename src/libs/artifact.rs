//! Artifact handles and the collaborator seams the pipeline runs through.
//!
//! Nothing in the core touches object storage, containers or the scheduler
//! directly. Every operation receives a [`Collaborators`] value and goes
//! through these traits, so any backend (or an in-memory fake) can be plugged
//! in.

use crate::libs::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Opaque reference to a staged file, usable by any task of the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactHandle {
    pub id: String,
    /// Size in bytes at staging time.
    pub size: u64,
}

impl ArtifactHandle {
    pub fn new(id: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Byte length of a remote object.
pub trait SizeLookup: Sync {
    fn size(&self, uri: &str) -> Result<u64>;
}

/// Splits one read file into `bins` artifacts.
///
/// The returned order is the bin index, and it must be the same for both
/// mates of a pair.
pub trait ArtifactSplitter: Sync {
    fn split(&self, uri: &str, bins: usize) -> Result<Vec<ArtifactHandle>>;
}

/// Runs one containerized tool with `mount` bound at `/io`, returning stdout.
pub trait ContainerRunner: Sync {
    fn run(&self, image: &str, params: &[String], mount: &Path) -> Result<String>;
}

/// Storage shared by every task of a run.
pub trait ArtifactStore: Sync {
    /// Makes a local file available to other tasks.
    fn stage(&self, local: &Path) -> Result<ArtifactHandle>;

    /// Copies a staged artifact to its final destination URL.
    fn publish(&self, handle: &ArtifactHandle, url: &str) -> Result<()>;

    /// Materializes a staged artifact at `local`.
    fn fetch(&self, handle: &ArtifactHandle, local: &Path) -> Result<()>;

    /// Downloads one object or local file given by URL.
    fn download(&self, url: &str, local: &Path) -> Result<()>;

    /// Downloads everything under a URL prefix into `dir`, keeping the
    /// relative layout.
    fn download_prefix(&self, url: &str, dir: &Path) -> Result<()>;
}

/// The collaborators every stage receives explicitly.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub sizes: &'a dyn SizeLookup,
    pub splitter: &'a dyn ArtifactSplitter,
    pub runner: &'a dyn ContainerRunner,
    pub store: &'a dyn ArtifactStore,
}
