use clap::*;
use methylseq::libs::backend::{require_tools, AwsSizes, ContainerSplitter, DockerRunner, LocalArtifactStore};
use methylseq::libs::config::PipelineConfig;
use methylseq::libs::pipeline::{with_pool, write_graph, Pipeline};
use methylseq::Collaborators;
use std::io::Write;
use std::path::PathBuf;

pub fn make_subcommand() -> Command {
    Command::new("run")
        .about("Shard, align and call methylation for every read pair")
        .after_help(
            r###"
Runs the whole pipeline described by a JSON config:

    {
      "paired_reads": [
        {"sample": {"1": "s3://bucket/r_1.fastq", "2": "s3://bucket/r_2.fastq"}}
      ],
      "s3_output": "s3://bucket/results/",
      "apps_image": "<image with trim_galore, bismark and samtools>",
      "utils_image": "<image with fastq-split and bam-sort>",
      "bismark_genome_index": "s3://bucket/reference/Bisulfite_Genome/",
      "bismark_reference_genome_fasta": "s3://bucket/reference/genome.fa",
      "bins": 4
    }

Phase 1 splits both mates of every pair into `bins` shards and aligns every
shard: trim_galore, bismark, deduplicate_bismark, then a split by chromosome.
Phase 2 merges each chromosome across shards and runs
bismark_methylation_extractor on it.

Reports and outputs are copied under s3_output. The published URLs are
printed as `chromosome<TAB>url`.

Requires `docker` and `aws` in PATH.

Examples:
1. Run with 8 workers:
   methylseq run config.json --parallel 8

2. Keep the task graph:
   methylseq run config.json --graph tasks.dot

"###,
        )
        .arg(
            Arg::new("config")
                .required(true)
                .num_args(1)
                .index(1)
                .help("JSON run configuration"),
        )
        .arg(
            Arg::new("workdir")
                .long("workdir")
                .num_args(1)
                .default_value("methylseq-work")
                .help("Directory for per-task scratch space"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .num_args(1)
                .help("Artifact store directory. Default: <workdir>/artifacts"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("1")
                .help("Number of threads"),
        )
        .arg(
            Arg::new("graph")
                .long("graph")
                .num_args(1)
                .help("Write the task graph in dot format"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let config = PipelineConfig::from_path(args.get_one::<String>("config").unwrap())?;
    let workdir = PathBuf::from(args.get_one::<String>("workdir").unwrap());
    let store_dir = args
        .get_one::<String>("store")
        .map(PathBuf::from)
        .unwrap_or_else(|| workdir.join("artifacts"));
    let parallel = *args.get_one::<usize>("parallel").unwrap();
    let opt_graph = args.get_one::<String>("graph");
    let mut writer = methylseq::libs::io::writer(args.get_one::<String>("outfile").unwrap())?;

    require_tools(&["docker", "aws"])?;

    //----------------------------
    // Operating
    //----------------------------
    let store = LocalArtifactStore::new(store_dir)?;
    let runner = DockerRunner;
    let splitter = ContainerSplitter::new(&store, &runner, &config.utils_image, workdir.join("split"));
    let ctx = Collaborators {
        sizes: &AwsSizes,
        splitter: &splitter,
        runner: &runner,
        store: &store,
    };

    let tasks = workdir.join("tasks");
    let run = with_pool(parallel, || Pipeline::new(&config, ctx, tasks).run())??;
    log::info!("ran {} tasks", run.graph.len());

    //----------------------------
    // Output
    //----------------------------
    if let Some(graph) = opt_graph {
        write_graph(&run.graph, graph.as_ref())?;
    }
    for (label, urls) in &run.outputs {
        for url in urls {
            writer.write_fmt(format_args!("{}\t{}\n", label, url))?;
        }
    }
    writer.flush()?;

    Ok(())
}
