//! In-memory collaborators for unit tests.
//!
//! The fake runner behaves like the real tools as far as the pipeline can
//! observe: it writes each tool's output files into the mounted directory and
//! prints what the utils image would print.

use crate::libs::artifact::*;
use crate::libs::error::{PipelineError, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

pub struct FakeSizes {
    sizes: HashMap<String, u64>,
}

impl FakeSizes {
    pub fn new(entries: &[(&str, u64)]) -> Self {
        Self {
            sizes: entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

impl SizeLookup for FakeSizes {
    fn size(&self, uri: &str) -> Result<u64> {
        self.sizes
            .get(uri)
            .copied()
            .ok_or_else(|| PipelineError::collaborator("size lookup", format!("no such object {}", uri)))
    }
}

/// Returns `bins` handles named `<uri>-<i>`, or one less for uris marked short.
#[derive(Default)]
pub struct FakeSplitter {
    short: HashSet<String>,
}

impl FakeSplitter {
    pub fn short(mut self, uri: &str) -> Self {
        self.short.insert(uri.to_string());
        self
    }
}

impl ArtifactSplitter for FakeSplitter {
    fn split(&self, uri: &str, bins: usize) -> Result<Vec<ArtifactHandle>> {
        let n = if self.short.contains(uri) { bins - 1 } else { bins };
        Ok((0..n)
            .map(|i| ArtifactHandle::new(format!("{}-{}", uri, i), 1024 * 1024))
            .collect())
    }
}

pub struct FakeRunner {
    listing: Vec<(String, String)>,
    silent: HashSet<String>,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRunner {
    pub fn new(chroms: &[&str]) -> Self {
        Self {
            listing: chroms
                .iter()
                .map(|c| (c.to_string(), format!("{}_deduplicated.bam", c)))
                .collect(),
            silent: HashSet::new(),
            calls: Mutex::new(vec![]),
        }
    }

    /// `bam-sort` prints exactly these pairs. Only bare file names are written.
    pub fn listing(pairs: &[(&str, &str)]) -> Self {
        let mut runner = Self::new(&[]);
        runner.listing = pairs
            .iter()
            .map(|(label, file)| (label.to_string(), file.to_string()))
            .collect();
        runner
    }

    /// The named tool runs but writes nothing.
    pub fn silent(mut self, tool: &str) -> Self {
        self.silent.insert(tool.to_string());
        self
    }

    pub fn tools(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, params)| params[0].clone())
            .collect()
    }
}

fn touch(mount: &Path, name: &str) -> Result<()> {
    let name = name.trim_start_matches("/io/");
    std::fs::write(mount.join(name), name)?;
    Ok(())
}

impl ContainerRunner for FakeRunner {
    fn run(&self, image: &str, params: &[String], mount: &Path) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((image.to_string(), params.to_vec()));

        let tool = params[0].as_str();
        if self.silent.contains(tool) {
            return Ok(String::new());
        }

        match tool {
            "trim_galore" => {
                touch(mount, "mates_1_val_1.fq.gz")?;
                touch(mount, "mates_2_val_2.fq.gz")?;
            }
            "bismark" => {
                touch(mount, "mates_1_val_1_bismark_bt2_pe.bam")?;
                touch(mount, "mates_1_val_1_bismark_bt2_PE_report.txt")?;
            }
            "deduplicate_bismark" => {
                touch(mount, "mates_1_val_1_bismark_bt2_pe.deduplicated.bam")?;
                touch(mount, "mates_1_val_1_bismark_bt2_pe.deduplication_report.txt")?;
            }
            "bam-sort" => {
                for (_, file) in &self.listing {
                    if !file.is_empty() && !file.contains('/') && !file.starts_with('.') {
                        touch(mount, file)?;
                    }
                }
                return Ok(format!(
                    "{}\n",
                    serde_json::to_string(&self.listing).map_err(|e| PipelineError::collaborator("fake", e))?
                ));
            }
            "samtools" => {
                let pos = params.iter().position(|p| p == "-o").unwrap();
                touch(mount, &params[pos + 1])?;
            }
            "bismark_methylation_extractor" => {
                let bam = params.last().unwrap().trim_start_matches("/io/");
                let label = bam.trim_end_matches(".bam");
                touch(mount, &format!("{}.bedGraph.gz", label))?;
                touch(mount, &format!("{}.bismark.cov.gz", label))?;
            }
            _ => {}
        }
        Ok(String::new())
    }
}

#[derive(Default)]
pub struct FakeStore {
    blobs: Mutex<Vec<Vec<u8>>>,
    pub published: Mutex<Vec<(String, String)>>,
    lopsided_index: bool,
}

impl FakeStore {
    /// Writes one more GA_conversion file than CT_conversion files.
    pub fn lopsided() -> Self {
        Self {
            lopsided_index: true,
            ..Default::default()
        }
    }

    pub fn published_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, url)| url.clone())
            .collect();
        urls.sort();
        urls
    }
}

impl ArtifactStore for FakeStore {
    fn stage(&self, local: &Path) -> Result<ArtifactHandle> {
        let bytes = std::fs::read(local)?;
        let mut blobs = self.blobs.lock().unwrap();
        let id = format!("artifact-{}", blobs.len());
        let size = bytes.len() as u64;
        blobs.push(bytes);
        Ok(ArtifactHandle::new(id, size))
    }

    fn publish(&self, handle: &ArtifactHandle, url: &str) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((handle.id.clone(), url.to_string()));
        Ok(())
    }

    fn fetch(&self, handle: &ArtifactHandle, local: &Path) -> Result<()> {
        std::fs::write(local, handle.id.as_bytes())?;
        Ok(())
    }

    fn download(&self, url: &str, local: &Path) -> Result<()> {
        std::fs::write(local, url.as_bytes())?;
        Ok(())
    }

    fn download_prefix(&self, url: &str, dir: &Path) -> Result<()> {
        let ga = dir.join("GA_conversion");
        let ct = dir.join("CT_conversion");
        std::fs::create_dir_all(&ga)?;
        std::fs::create_dir_all(&ct)?;
        for i in 1..=2 {
            std::fs::write(ga.join(format!("BS_GA.{}.bt2", i)), url.as_bytes())?;
            std::fs::write(ct.join(format!("BS_CT.{}.bt2", i)), url.as_bytes())?;
        }
        if self.lopsided_index {
            std::fs::write(ga.join("BS_GA.rev.1.bt2"), url.as_bytes())?;
        }
        Ok(())
    }
}
