use clap::*;
use methylseq::libs::backend::{AwsSizes, ContainerSplitter, DockerRunner, LocalArtifactStore};
use methylseq::libs::config::PipelineConfig;
use methylseq::libs::pipeline::Pipeline;
use methylseq::{ArtifactResourceRequirement, Collaborators, ResourceQuantity};
use std::io::Write;

pub fn make_subcommand() -> Command {
    Command::new("plan")
        .about("Print the resource estimate of every read pair")
        .after_help(
            r###"
Looks up the size of every read file and prints, per read pair:

    name    memory    disk    split_memory    split_disk

Memory is 1.25x and disk 1.10x the input size. The split task of a pair asks
for twice the pair's estimate. A final `total` row sums every pair, converted
to the largest unit present.

Only s3:// reads can be estimated.

Examples:
1. Estimate a run:
   methylseq plan config.json

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
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

/// Sums quantities of possibly different units in the largest one.
fn sum_in_largest<'a>(quantities: impl Iterator<Item = &'a ResourceQuantity> + Clone) -> anyhow::Result<ResourceQuantity> {
    let Some(unit) = quantities.clone().map(|q| q.unit()).max() else {
        return Ok(ResourceQuantity::zero(methylseq::Unit::B));
    };
    let mut total = ResourceQuantity::zero(unit);
    for q in quantities {
        total = total.try_add(&q.convert_to(unit))?;
    }
    Ok(total)
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let config = PipelineConfig::from_path(args.get_one::<String>("config").unwrap())?;
    let mut writer = methylseq::libs::io::writer(args.get_one::<String>("outfile").unwrap())?;

    // estimating never splits, runs or stores anything
    let scratch = tempfile::tempdir()?;
    let store = LocalArtifactStore::new(scratch.path())?;
    let splitter = ContainerSplitter::new(&store, &DockerRunner, &config.utils_image, scratch.path());
    let ctx = Collaborators {
        sizes: &AwsSizes,
        splitter: &splitter,
        runner: &DockerRunner,
        store: &store,
    };

    //----------------------------
    // Operating
    //----------------------------
    let estimates = Pipeline::new(&config, ctx, scratch.path()).estimate()?;

    //----------------------------
    // Output
    //----------------------------
    for (name, req) in &estimates {
        let split: ArtifactResourceRequirement = req.scale(2.0)?;
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\t{}\n",
            name, req.memory, req.disk, split.memory, split.disk
        ))?;
    }
    let memory = sum_in_largest(estimates.iter().map(|(_, r)| &r.memory))?;
    let disk = sum_in_largest(estimates.iter().map(|(_, r)| &r.disk))?;
    writer.write_fmt(format_args!("total\t{}\t{}\n", memory, disk))?;
    writer.flush()?;

    Ok(())
}
