//! The two-phase driver.
//!
//! Phase 1 shards every read pair and aligns every shard. Its results decide
//! which chromosomes exist, so phase 2 (one methylation call per chromosome)
//! is only spawned into the task graph once phase 1 has fully finished.

use crate::libs::align::{ChromosomeArtifactMap, ShardAligner};
use crate::libs::artifact::{ArtifactHandle, Collaborators};
use crate::libs::config::PipelineConfig;
use crate::libs::error::Result;
use crate::libs::estimate::{estimate_for_read_pair, estimate_for_shard};
use crate::libs::fanin::{group_by_chromosome, ChromosomeGroup};
use crate::libs::graph::{methylation_call_requirement, TaskGraph, TaskKind, TaskSpec};
use crate::libs::methylation::call_methylation;
use crate::libs::resource::ArtifactResourceRequirement;
use crate::libs::shard::{flatten_shards, shard_read_pair, ReadShard};
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ALIGN_CORES: usize = 4;
pub const METHYLATION_CORES: usize = 4;

/// Result of a full run.
#[derive(Debug)]
pub struct PipelineRun {
    /// Published URLs per chromosome, in discovery order.
    pub outputs: IndexMap<String, Vec<String>>,
    pub graph: TaskGraph,
}

pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    ctx: Collaborators<'a>,
    workdir: PathBuf,
    graph: Mutex<TaskGraph>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, ctx: Collaborators<'a>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            ctx,
            workdir: workdir.into(),
            graph: Mutex::new(TaskGraph::new()),
        }
    }

    fn spawn(&self, f: impl FnOnce(&mut TaskGraph) -> NodeIndex) -> NodeIndex {
        let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut graph)
    }

    fn scratch(&self, prefix: &str) -> Result<tempfile::TempDir> {
        Ok(tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&self.workdir)?)
    }

    /// Resource estimates of every read pair, in config order.
    pub fn estimate(&self) -> Result<Vec<(String, ArtifactResourceRequirement)>> {
        self.config
            .paired_reads
            .iter()
            .map(|pair| Ok((pair.name.clone(), estimate_for_read_pair(self.ctx.sizes, pair)?)))
            .collect()
    }

    /// Runs both phases. The first failing unit aborts the run.
    pub fn run(self) -> Result<PipelineRun> {
        std::fs::create_dir_all(&self.workdir)?;
        let root = self.spawn(|g| g.add_root(TaskSpec::light("methylseq", TaskKind::Root)));

        let (maps, align_nodes) = self.phase_one(root)?;
        let outputs = self.phase_two(maps, &align_nodes)?;

        Ok(PipelineRun {
            outputs,
            graph: self.graph.into_inner().unwrap_or_else(|e| e.into_inner()),
        })
    }

    fn phase_one(&self, root: NodeIndex) -> Result<(Vec<ChromosomeArtifactMap>, Vec<NodeIndex>)> {
        // estimates come first so a bad input aborts before any fan-out
        let estimates = self.estimate()?;

        let per_pair = self
            .config
            .paired_reads
            .par_iter()
            .zip(estimates.par_iter())
            .map(|(pair, (_, req))| -> Result<(NodeIndex, Vec<ReadShard>)> {
                let split_req = req.scale(2.0)?;
                let split = self.spawn(|g| {
                    g.spawn_child(
                        root,
                        TaskSpec::new(format!("sharding_{}", pair.name), TaskKind::Split, 1, split_req),
                    )
                });
                log::info!("{}: sharding with {}", pair.name, split_req);

                let shards = shard_read_pair(self.ctx.splitter, pair, self.config.bins)?;
                let coalesce = self.spawn(|g| {
                    g.spawn_follow_on(
                        &[split],
                        TaskSpec::light(format!("coalesce_{}", pair.name), TaskKind::Coalesce),
                    )
                });
                Ok((coalesce, shards))
            })
            .collect::<Result<Vec<_>>>()?;

        let parents: Vec<NodeIndex> = per_pair
            .iter()
            .flat_map(|(node, shards)| std::iter::repeat(*node).take(shards.len()))
            .collect();
        let shards = flatten_shards(per_pair.into_iter().map(|(_, s)| s).collect());
        log::info!("aligning {} shards", shards.len());

        let results = shards
            .into_par_iter()
            .zip(parents.into_par_iter())
            .enumerate()
            .map(|(idx, (shard, parent))| -> Result<(NodeIndex, ChromosomeArtifactMap)> {
                let req = estimate_for_shard(&shard)?;
                let node = self.spawn(|g| {
                    g.spawn_follow_on(
                        &[parent],
                        TaskSpec::new(format!("alignment-{}", idx), TaskKind::Align, ALIGN_CORES, req),
                    )
                });
                let dir = self.scratch(&format!("shard-{}-", idx))?;
                let map = ShardAligner::new(self.ctx, self.config, shard, idx, dir.path()).run()?;
                Ok((node, map))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(results.into_iter().map(|(n, m)| (m, n)).unzip())
    }

    fn phase_two(
        &self,
        maps: Vec<ChromosomeArtifactMap>,
        align_nodes: &[NodeIndex],
    ) -> Result<IndexMap<String, Vec<String>>> {
        let group: ChromosomeGroup = group_by_chromosome(maps);
        let barrier = self.spawn(|g| {
            g.spawn_follow_on(align_nodes, TaskSpec::light("group_by_chromosome", TaskKind::Group))
        });
        log::info!("discovered {} chromosomes", group.len());

        let labels: Vec<(String, Vec<ArtifactHandle>)> = group.into_iter().collect();
        let outputs = labels
            .par_iter()
            .map(|(label, handles)| -> Result<(String, Vec<String>)> {
                self.spawn(|g| {
                    g.spawn_child(
                        barrier,
                        TaskSpec::new(
                            format!("{}_methylation_calling", label),
                            TaskKind::MethylationCall,
                            METHYLATION_CORES,
                            methylation_call_requirement(),
                        ),
                    )
                });
                let dir = self.scratch(&format!("{}-", label))?;
                let urls = call_methylation(self.ctx, self.config, label, handles, dir.path())?;
                Ok((label.clone(), urls))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(outputs.into_iter().collect())
    }
}

/// Runs `f` on a dedicated pool of `threads` workers.
pub fn with_pool<T: Send>(threads: usize, f: impl FnOnce() -> T + Send) -> anyhow::Result<T> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    Ok(pool.install(f))
}

pub fn write_graph(graph: &TaskGraph, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, graph.to_dot())
}
