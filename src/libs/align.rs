use crate::libs::artifact::{ArtifactHandle, Collaborators};
use crate::libs::config::PipelineConfig;
use crate::libs::error::{PipelineError, Result};
use crate::libs::shard::ReadShard;
use indexmap::IndexMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const MATES_1_RAW_FQ: &str = "mates_1.fastq";
pub const MATES_2_RAW_FQ: &str = "mates_2.fastq";
pub const MATES_1_TRIMMED_FQ: &str = "mates_1_val_1.fq.gz";
pub const MATES_2_TRIMMED_FQ: &str = "mates_2_val_2.fq.gz";
pub const BISMARK_OUTPUT_BAM: &str = "mates_1_val_1_bismark_bt2_pe.bam";
pub const BISMARK_OUTPUT_REPORT: &str = "mates_1_val_1_bismark_bt2_PE_report.txt";
pub const BISMARK_DEDUPLICATED_BAM: &str = "mates_1_val_1_bismark_bt2_pe.deduplicated.bam";
pub const BISMARK_DEDUPLICATION_REPORT: &str = "mates_1_val_1_bismark_bt2_pe.deduplication_report.txt";

/// Reference layout under the shard work directory.
pub const GENOME_DIR: &str = "genome";
pub const BISULFITE_GENOME_DIR: &str = "Bisulfite_Genome";

/// Chromosome label to the staged per-chromosome alignment of one shard.
pub type ChromosomeArtifactMap = IndexMap<String, ArtifactHandle>;

/// Processing states of one shard, strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlignStage {
    RawReadsStaged,
    Trimmed,
    Aligned,
    Deduplicated,
    ChromosomeSplit,
}

impl AlignStage {
    pub fn next(self) -> Option<AlignStage> {
        match self {
            AlignStage::RawReadsStaged => Some(AlignStage::Trimmed),
            AlignStage::Trimmed => Some(AlignStage::Aligned),
            AlignStage::Aligned => Some(AlignStage::Deduplicated),
            AlignStage::Deduplicated => Some(AlignStage::ChromosomeSplit),
            AlignStage::ChromosomeSplit => None,
        }
    }

    /// Files a stage leaves in the work directory.
    ///
    /// The chromosome split outputs are only known from the tool's stdout.
    pub fn outputs(self) -> &'static [&'static str] {
        match self {
            AlignStage::RawReadsStaged => &[MATES_1_RAW_FQ, MATES_2_RAW_FQ],
            AlignStage::Trimmed => &[MATES_1_TRIMMED_FQ, MATES_2_TRIMMED_FQ],
            AlignStage::Aligned => &[BISMARK_OUTPUT_BAM, BISMARK_OUTPUT_REPORT],
            AlignStage::Deduplicated => &[BISMARK_DEDUPLICATED_BAM, BISMARK_DEDUPLICATION_REPORT],
            AlignStage::ChromosomeSplit => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for AlignStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlignStage::RawReadsStaged => "raw-reads-staged",
            AlignStage::Trimmed => "trimmed",
            AlignStage::Aligned => "aligned",
            AlignStage::Deduplicated => "deduplicated",
            AlignStage::ChromosomeSplit => "chromosome-split",
        };
        f.write_str(s)
    }
}

fn io_path(name: &str) -> String {
    format!("/io/{}", name)
}

fn params(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Drives one shard from raw reads to per-chromosome alignments.
///
/// All tools run with the shard's work directory mounted at `/io`.
pub struct ShardAligner<'a> {
    ctx: Collaborators<'a>,
    config: &'a PipelineConfig,
    shard: ReadShard,
    shard_idx: usize,
    workdir: PathBuf,
    stage: Option<AlignStage>,
    chromosomes: Option<ChromosomeArtifactMap>,
}

impl<'a> ShardAligner<'a> {
    pub fn new(
        ctx: Collaborators<'a>,
        config: &'a PipelineConfig,
        shard: ReadShard,
        shard_idx: usize,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ctx,
            config,
            shard,
            shard_idx,
            workdir: workdir.into(),
            stage: None,
            chromosomes: None,
        }
    }

    /// Last state reached, `None` before the reads are staged.
    pub fn stage(&self) -> Option<AlignStage> {
        self.stage
    }

    fn path(&self, name: &str) -> PathBuf {
        self.workdir.join(name)
    }

    fn require(&self, stage: AlignStage, names: &[&str]) -> Result<()> {
        for name in names {
            let path = self.path(name);
            if !path.exists() {
                return Err(PipelineError::missing_output(
                    format!("shard {} {}", self.shard_idx, stage),
                    path.display().to_string(),
                ));
            }
        }
        Ok(())
    }

    fn run_tool(&self, image: &str, params: Vec<String>) -> Result<String> {
        log::debug!("shard {}: {} {}", self.shard_idx, image, params.join(" "));
        self.ctx.runner.run(image, &params, &self.workdir)
    }

    fn publish(&self, name: &str) -> Result<()> {
        let handle = self.ctx.store.stage(&self.path(name))?;
        let url = self
            .config
            .s3_output
            .url_for(&format!("{}_{}", self.shard_idx, name));
        log::info!("shard {}: publishing {}", self.shard_idx, url);
        self.ctx.store.publish(&handle, &url)
    }

    /// Performs the next transition and returns the state reached.
    ///
    /// Does nothing once the terminal state is reached.
    pub fn advance(&mut self) -> Result<AlignStage> {
        let target = match self.stage {
            None => AlignStage::RawReadsStaged,
            Some(stage) => match stage.next() {
                Some(next) => next,
                None => return Ok(stage),
            },
        };
        if let Some(prev) = self.stage {
            self.require(target, prev.outputs())?;
        }

        log::info!("shard {} ({}): {}", self.shard_idx, self.shard.name, target);
        match target {
            AlignStage::RawReadsStaged => self.stage_reads()?,
            AlignStage::Trimmed => {
                self.trim()?;
            }
            AlignStage::Aligned => {
                self.align()?;
            }
            AlignStage::Deduplicated => {
                self.deduplicate()?;
            }
            AlignStage::ChromosomeSplit => {
                let map = self.split_by_chromosome()?;
                self.chromosomes = Some(map);
            }
        }
        self.require(target, target.outputs())?;

        match target {
            AlignStage::Aligned => {
                self.publish(BISMARK_OUTPUT_BAM)?;
                self.publish(BISMARK_OUTPUT_REPORT)?;
            }
            AlignStage::Deduplicated => {
                self.publish(BISMARK_DEDUPLICATION_REPORT)?;
            }
            _ => {}
        }

        self.stage = Some(target);
        Ok(target)
    }

    /// Runs every remaining transition.
    pub fn run(mut self) -> Result<ChromosomeArtifactMap> {
        while !self.advance()?.is_terminal() {}
        self.chromosomes.take().ok_or_else(|| {
            PipelineError::missing_output(
                format!("shard {} {}", self.shard_idx, AlignStage::ChromosomeSplit),
                "chromosome map",
            )
        })
    }

    fn stage_reads(&self) -> Result<()> {
        self.ctx.store.fetch(&self.shard.mate1, &self.path(MATES_1_RAW_FQ))?;
        self.ctx.store.fetch(&self.shard.mate2, &self.path(MATES_2_RAW_FQ))?;
        Ok(())
    }

    fn trim(&self) -> Result<String> {
        self.run_tool(
            &self.config.apps_image,
            params(&[
                "trim_galore",
                "--fastqc",
                "--gzip",
                "--paired",
                &io_path(MATES_1_RAW_FQ),
                &io_path(MATES_2_RAW_FQ),
                "-o",
                "/io/",
            ]),
        )
    }

    fn fetch_reference(&self) -> Result<()> {
        let genome_dir = self.path(GENOME_DIR);
        let index_dir = genome_dir.join(BISULFITE_GENOME_DIR);
        std::fs::create_dir_all(&index_dir)?;

        self.ctx
            .store
            .download_prefix(&self.config.bismark_index_url, &index_dir)?;
        let fasta = crate::libs::descriptor::filename_of(&self.config.bismark_genome_uri);
        self.ctx
            .store
            .download(&self.config.bismark_genome_uri, &genome_dir.join(fasta))?;

        let ga = count_files(&index_dir.join("GA_conversion"));
        let ct = count_files(&index_dir.join("CT_conversion"));
        if ga == 0 || ga != ct {
            return Err(PipelineError::missing_output(
                format!("shard {} reference", self.shard_idx),
                format!(
                    "{} ({} GA_conversion files, {} CT_conversion files)",
                    self.config.bismark_index_url, ga, ct
                ),
            ));
        }
        Ok(())
    }

    fn align(&self) -> Result<String> {
        self.fetch_reference()?;
        self.run_tool(
            &self.config.apps_image,
            params(&[
                "bismark",
                "-1",
                &io_path(MATES_1_TRIMMED_FQ),
                "-2",
                &io_path(MATES_2_TRIMMED_FQ),
                "--genome",
                &format!("/io/{}/", GENOME_DIR),
                "-o",
                "/io/",
            ]),
        )
    }

    fn deduplicate(&self) -> Result<String> {
        self.run_tool(
            &self.config.apps_image,
            params(&[
                "deduplicate_bismark",
                "-p",
                &io_path(BISMARK_OUTPUT_BAM),
                "--output_dir",
                "/io/",
            ]),
        )
    }

    fn split_by_chromosome(&self) -> Result<ChromosomeArtifactMap> {
        let stdout = self.run_tool(
            &self.config.utils_image,
            params(&["bam-sort", "-i", &io_path(BISMARK_DEDUPLICATED_BAM)]),
        )?;
        let listed = parse_chromosome_listing(&stdout)?;

        let mut map = ChromosomeArtifactMap::new();
        for (label, file) in listed {
            if map.contains_key(&label) {
                return Err(PipelineError::DuplicateChromosomeKey {
                    label,
                    shard: self.shard_idx,
                });
            }
            // listed names must stay inside the mount
            if file.is_empty()
                || !Path::new(&file)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)))
            {
                return Err(PipelineError::collaborator(
                    "bam-sort",
                    format!("illegal file name {} for {}", file, label),
                ));
            }
            self.require(AlignStage::ChromosomeSplit, &[file.as_str()])?;
            let handle = self.ctx.store.stage(&self.path(&file))?;
            map.insert(label, handle);
        }
        log::info!(
            "shard {}: {} chromosomes",
            self.shard_idx,
            map.len()
        );
        Ok(map)
    }
}

/// Reads `[[label, file], ...]` from the last non-empty line of the
/// splitter's stdout.
pub fn parse_chromosome_listing(stdout: &str) -> Result<Vec<(String, String)>> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");
    serde_json::from_str(line).map_err(|e| {
        PipelineError::collaborator("bam-sort", format!("unexpected output {:?}: {}", line, e))
    })
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}
