//! Collaborators that talk to real infrastructure.

pub mod aws;
pub mod docker;
pub mod splitter;
pub mod store;

pub use aws::AwsSizes;
pub use docker::DockerRunner;
pub use splitter::ContainerSplitter;
pub use store::LocalArtifactStore;

use crate::libs::error::{PipelineError, Result};

/// Fails on the first program missing from `PATH`.
pub fn require_tools(tools: &[&str]) -> Result<()> {
    for tool in tools {
        if which::which(tool).is_err() {
            return Err(PipelineError::collaborator(
                *tool,
                format!("{} not found in PATH", tool),
            ));
        }
    }
    Ok(())
}
