use crate::libs::artifact::{ArtifactHandle, ArtifactSplitter, ArtifactStore, ContainerRunner};
use crate::libs::descriptor::filename_of;
use crate::libs::error::{PipelineError, Result};
use indexmap::IndexMap;
use std::path::PathBuf;

/// Splits read files with the `fastq-split` command of the utils image.
pub struct ContainerSplitter<'a> {
    store: &'a dyn ArtifactStore,
    runner: &'a dyn ContainerRunner,
    image: String,
    scratch: PathBuf,
}

impl<'a> ContainerSplitter<'a> {
    pub fn new(
        store: &'a dyn ArtifactStore,
        runner: &'a dyn ContainerRunner,
        image: impl Into<String>,
        scratch: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            runner,
            image: image.into(),
            scratch: scratch.into(),
        }
    }
}

/// Reads `{filename: [shard, ...]}` from the last non-empty stdout line and
/// returns the shards of `filename`.
pub fn parse_split_listing(stdout: &str, filename: &str) -> Result<Vec<String>> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");
    let listing: IndexMap<String, Vec<String>> = serde_json::from_str(line).map_err(|e| {
        PipelineError::collaborator("fastq-split", format!("unexpected output {:?}: {}", line, e))
    })?;
    if listing.len() != 1 {
        return Err(PipelineError::collaborator(
            "fastq-split",
            format!("expected one input file, got {}", listing.len()),
        ));
    }
    listing.get(filename).cloned().ok_or_else(|| {
        PipelineError::collaborator("fastq-split", format!("no shards listed for {}", filename))
    })
}

impl ArtifactSplitter for ContainerSplitter<'_> {
    fn split(&self, uri: &str, bins: usize) -> Result<Vec<ArtifactHandle>> {
        std::fs::create_dir_all(&self.scratch)?;
        let dir = tempfile::Builder::new()
            .prefix("split-")
            .tempdir_in(&self.scratch)?;
        let filename = filename_of(uri);
        self.store.download(uri, &dir.path().join(filename))?;

        let params: Vec<String> = vec![
            "fastq-split".to_string(),
            "-i".to_string(),
            format!("/io/{}", filename),
            "-b".to_string(),
            bins.to_string(),
        ];
        let stdout = self.runner.run(&self.image, &params, dir.path())?;
        let shards = parse_split_listing(&stdout, filename)?;

        let mut handles = Vec::with_capacity(shards.len());
        for shard in &shards {
            let path = dir.path().join(shard);
            if !path.exists() {
                return Err(PipelineError::missing_output(
                    format!("splitting {}", uri),
                    path.display().to_string(),
                ));
            }
            handles.push(self.store.stage(&path)?);
        }
        log::info!("{}: {} shards", uri, handles.len());
        Ok(handles)
    }
}
