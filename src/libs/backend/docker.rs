use crate::libs::artifact::ContainerRunner;
use crate::libs::error::{PipelineError, Result};
use cmd_lib::run_fun;
use std::path::Path;

/// Runs tools with `docker run`, the work directory bound at `/io`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DockerRunner;

/// Arguments following `docker`, exposed for logging and tests.
///
/// ```
/// let args = methylseq::libs::backend::docker::docker_args(
///     "quay.io/x/apps:1.0",
///     &["samtools".to_string(), "--version".to_string()],
///     std::path::Path::new("/tmp/work"),
/// );
/// assert_eq!(
///     args.join(" "),
///     "run --rm -v /tmp/work:/io quay.io/x/apps:1.0 samtools --version"
/// );
/// ```
pub fn docker_args(image: &str, params: &[String], mount: &Path) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        "-v".to_string(),
        format!("{}:/io", mount.display()),
        image.to_string(),
    ];
    args.extend(params.iter().cloned());
    args
}

impl ContainerRunner for DockerRunner {
    fn run(&self, image: &str, params: &[String], mount: &Path) -> Result<String> {
        let args = docker_args(image, params, mount);
        log::debug!("docker {}", args.join(" "));
        let tool = params.first().map(String::as_str).unwrap_or(image).to_string();
        run_fun!(docker $[args]).map_err(|e| PipelineError::collaborator(tool, e))
    }
}
