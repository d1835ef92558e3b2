use crate::libs::artifact::{ArtifactHandle, Collaborators};
use crate::libs::config::PipelineConfig;
use crate::libs::error::{PipelineError, Result};
use std::path::Path;

/// Merges one chromosome's shard alignments and calls methylation on it.
///
/// Returns the published URLs: the merged BAM, then the bedGraph and the
/// coverage file.
pub fn call_methylation(
    ctx: Collaborators,
    config: &PipelineConfig,
    label: &str,
    handles: &[ArtifactHandle],
    workdir: &Path,
) -> Result<Vec<String>> {
    let mut inputs = Vec::with_capacity(handles.len());
    for (i, handle) in handles.iter().enumerate() {
        let name = format!("{}_{}.bam", i, label);
        ctx.store.fetch(handle, &workdir.join(&name))?;
        require(label, workdir, &name)?;
        inputs.push(format!("/io/{}", name));
    }
    log::info!("{}: merging {} shard alignments", label, inputs.len());

    let merged = format!("{}.bam", label);
    let mut params = vec!["samtools".to_string(), "cat".to_string()];
    params.extend(inputs);
    params.push("-o".to_string());
    params.push(format!("/io/{}", merged));
    log::debug!("{}: {}", label, params.join(" "));
    ctx.runner.run(&config.apps_image, &params, workdir)?;
    require(label, workdir, &merged)?;

    let mut published = vec![];
    let merged_handle = ctx.store.stage(&workdir.join(&merged))?;
    let url = config
        .s3_output
        .url_for(&format!("{}_methylation_input.bam", label));
    ctx.store.publish(&merged_handle, &url)?;
    published.push(url);

    let params: Vec<String> = [
        "bismark_methylation_extractor",
        "--ignore_r2",
        "2",
        "--ignore_3prime_r2",
        "2",
        "--bedGraph",
        "--gzip",
        "-p",
        "--counts",
        "--no_overlap",
        "--report",
        "--o",
        "/io",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(format!("/io/{}", merged)))
    .collect();
    log::debug!("{}: {}", label, params.join(" "));
    ctx.runner.run(&config.apps_image, &params, workdir)?;

    for name in [format!("{}.bedGraph.gz", label), format!("{}.bismark.cov.gz", label)] {
        require(label, workdir, &name)?;
        let handle = ctx.store.stage(&workdir.join(&name))?;
        let url = config.s3_output.url_for(&name);
        ctx.store.publish(&handle, &url)?;
        published.push(url);
    }

    Ok(published)
}

fn require(label: &str, workdir: &Path, name: &str) -> Result<()> {
    let path = workdir.join(name);
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::missing_output(
            format!("{} methylation calling", label),
            path.display().to_string(),
        ))
    }
}
