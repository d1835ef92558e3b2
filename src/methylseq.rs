extern crate clap;
use clap::*;

mod cmd_methylseq;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("METHYLSEQ_LOG", "info"))
        .init();

    let app = Command::new("methylseq")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`methylseq` - Sharded bisulfite alignment and methylation calling")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_methylseq::run::make_subcommand())
        .subcommand(cmd_methylseq::plan::make_subcommand())
        .subcommand(cmd_methylseq::fastq_split::make_subcommand())
        .subcommand(cmd_methylseq::bam_sort::make_subcommand())
        .subcommand(cmd_methylseq::size::make_subcommand())
        .after_help(
            r###"Subcommands:

* Pipeline:
    * run   - Shard, align and call methylation for every read pair
    * plan  - Print the resource estimate of every read pair

* Utilities:
    * fastq-split - Split FASTQ files into bins by read id
    * bam-sort    - Split a BAM file by chromosome
    * size        - Render byte counts as resource quantities

Logging is controlled by METHYLSEQ_LOG (default: info).

"###,
        );

    match app.get_matches().subcommand() {
        Some(("run", sub_matches)) => cmd_methylseq::run::execute(sub_matches),
        Some(("plan", sub_matches)) => cmd_methylseq::plan::execute(sub_matches),
        Some(("fastq-split", sub_matches)) => cmd_methylseq::fastq_split::execute(sub_matches),
        Some(("bam-sort", sub_matches)) => cmd_methylseq::bam_sort::execute(sub_matches),
        Some(("size", sub_matches)) => cmd_methylseq::size::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
