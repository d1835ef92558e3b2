//! Object store access through the `aws` command line client.
//!
//! `file://` URLs are served from the local file system so that a run can be
//! tried out without any bucket.

use crate::libs::artifact::SizeLookup;
use crate::libs::descriptor::{local_path_of, parse_object_url, scheme_of, Storage};
use crate::libs::error::{PipelineError, Result};
use cmd_lib::run_fun;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HeadObject {
    content_length: u64,
}

/// Reads `ContentLength` from the output of `aws s3api head-object`.
///
/// ```
/// let json = r#"{"AcceptRanges": "bytes", "ContentLength": 20971520, "ETag": "\"x\""}"#;
/// assert_eq!(methylseq::libs::backend::aws::parse_content_length(json).unwrap(), 20971520);
/// ```
pub fn parse_content_length(json: &str) -> Result<u64> {
    let head: HeadObject = serde_json::from_str(json)
        .map_err(|e| PipelineError::collaborator("head-object", format!("unexpected output: {}", e)))?;
    Ok(head.content_length)
}

/// Object sizes through `aws s3api head-object`, local sizes from metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsSizes;

impl SizeLookup for AwsSizes {
    fn size(&self, uri: &str) -> Result<u64> {
        match Storage::parse(scheme_of(uri))? {
            Storage::ObjectStore => {
                let (bucket, key, _) = parse_object_url(uri)?;
                let out = run_fun!(aws s3api head-object --bucket $bucket --key $key)
                    .map_err(|e| PipelineError::collaborator(format!("size lookup of {}", uri), e))?;
                parse_content_length(&out)
            }
            Storage::LocalFile => Ok(std::fs::metadata(local_path_of(uri))?.len()),
        }
    }
}

/// Copies a single object or file. Either side may be a local path.
pub fn copy(from: &str, to: &str) -> Result<()> {
    if is_object_url(from) || is_object_url(to) {
        log::debug!("aws s3 cp {} {}", from, to);
        run_fun!(aws s3 cp --only-show-errors $from $to)
            .map_err(|e| PipelineError::collaborator(format!("copy {} to {}", from, to), e))?;
    } else {
        let to = Path::new(local_path_of(to));
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(local_path_of(from), to)?;
    }
    Ok(())
}

/// Copies everything under a prefix into `dir`, keeping relative paths.
pub fn copy_prefix(from: &str, dir: &Path) -> Result<()> {
    if is_object_url(from) {
        let to = dir.display().to_string();
        log::debug!("aws s3 cp --recursive {} {}", from, to);
        run_fun!(aws s3 cp --only-show-errors --recursive $from $to)
            .map_err(|e| PipelineError::collaborator(format!("copy {} to {}", from, to), e))?;
        Ok(())
    } else {
        copy_dir(Path::new(local_path_of(from)), dir)
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

fn is_object_url(url: &str) -> bool {
    matches!(Storage::parse(scheme_of(url)), Ok(Storage::ObjectStore))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fq");
        std::fs::write(&path, vec![b'A'; 1234]).unwrap();

        let uri = format!("file://{}", path.display());
        assert_eq!(AwsSizes.size(&uri).unwrap(), 1234);
        assert!(AwsSizes.size("gs://bucket/reads.fq").is_err());
    }

    #[test]
    fn head_object_output() {
        assert!(parse_content_length("{}").is_err());
        assert!(parse_content_length("not json").is_err());
    }

    #[test]
    fn local_copies() {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("GA_conversion")).unwrap();
        std::fs::write(src.path().join("GA_conversion/BS_GA.1.bt2"), "ga").unwrap();
        std::fs::write(src.path().join("genome.fa"), ">chr1\nACGT\n").unwrap();

        let dst = tempfile::tempdir().unwrap();
        copy_prefix(&format!("file://{}", src.path().display()), dst.path()).unwrap();
        assert!(dst.path().join("GA_conversion/BS_GA.1.bt2").exists());

        let out = dst.path().join("nested/genome.fa");
        copy(
            &format!("file://{}/genome.fa", src.path().display()),
            &out.display().to_string(),
        )
        .unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), ">chr1\nACGT\n");
    }
}
