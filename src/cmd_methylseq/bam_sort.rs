use clap::*;
use methylseq::libs::bam_sort::sort_by_chromosome;
use std::path::Path;

pub fn make_subcommand() -> Command {
    Command::new("bam-sort")
        .about("Split a BAM file by chromosome")
        .after_help(
            r###"
Every record on chr1 to chr22 goes to `<chrom>_<stem>.bam` next to the input,
where `<stem>` is the input file name without its extension. Records on other
references and unplaced records are dropped. Each output keeps the input's
header.

Prints a JSON list of `[chrom, file]` pairs in order of first appearance:

    [["chr1","chr1_sample.deduplicated.bam"],["chr2","chr2_sample.deduplicated.bam"]]

Examples:
1. Split a deduplicated alignment:
   methylseq bam-sort -i sample.deduplicated.bam

"###,
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .required(true)
                .num_args(1)
                .help("BAM file"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let input = args.get_one::<String>("input").unwrap();

    //----------------------------
    // Operating
    //----------------------------
    log::info!("running bam-sort");
    let written = sort_by_chromosome(Path::new(input))?;

    //----------------------------
    // Output
    //----------------------------
    println!("{}", serde_json::to_string(&written)?);

    Ok(())
}
