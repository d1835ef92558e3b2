use clap::*;
use methylseq::libs::fastq_split::split_files;

pub fn make_subcommand() -> Command {
    Command::new("fastq-split")
        .about("Split FASTQ files into bins by read id")
        .after_help(
            r###"
Every record goes to bin `murmur3(id) % bins`, so the two mates of a pair land
in bins with the same index. Inputs may be gzipped; shards are written
uncompressed next to each input as `<filename>-<bin>`.

Prints a JSON object mapping each input file name to its shard names:

    {"reads_1.fastq":["reads_1.fastq-0","reads_1.fastq-1"]}

Examples:
1. Split both mates into 4 bins:
   methylseq fastq-split -i reads_1.fastq.gz reads_2.fastq.gz -b 4

"###,
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .required(true)
                .num_args(1..)
                .help("FASTQ files"),
        )
        .arg(
            Arg::new("bins")
                .long("bins")
                .short('b')
                .required(true)
                .num_args(1)
                .value_parser(value_parser!(u32).range(1..))
                .help("Number of bins to shard into"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let inputs: Vec<&String> = args.get_many::<String>("input").unwrap().collect();
    let bins = *args.get_one::<u32>("bins").unwrap();

    //----------------------------
    // Operating
    //----------------------------
    log::info!("running fastq-split");
    let written = split_files(&inputs, bins)?;

    //----------------------------
    // Output
    //----------------------------
    println!("{}", serde_json::to_string(&written)?);

    Ok(())
}
