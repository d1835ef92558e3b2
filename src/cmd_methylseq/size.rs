use clap::*;
use methylseq::ResourceQuantity;
use std::io::Write;

pub fn make_subcommand() -> Command {
    Command::new("size")
        .about("Render byte counts as resource quantities")
        .after_help(
            r###"
Each byte count is scaled by 1024 until it drops below 1024 and is rounded to
two decimals. With --to, the result is converted at 1000 per unit step.

Units: B, KB, MB, GB, TB, PB, EB, ZB, YB (case-insensitive)

Examples:
1. Render sizes:
   methylseq size 20971520 1536
   # 20MB
   # 1.5KB

2. Convert:
   methylseq size 2147483648 --to MB
   # 2000MB

"###,
        )
        .arg(
            Arg::new("bytes")
                .required(true)
                .num_args(1..)
                .index(1)
                .value_parser(value_parser!(u64))
                .help("Byte counts"),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .num_args(1)
                .help("Target unit"),
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
    let mut writer = methylseq::libs::io::writer(args.get_one::<String>("outfile").unwrap())?;
    let opt_to = args.get_one::<String>("to");

    //----------------------------
    // Output
    //----------------------------
    for bytes in args.get_many::<u64>("bytes").unwrap() {
        let mut quantity = ResourceQuantity::from_bytes(*bytes);
        if let Some(unit) = opt_to {
            quantity = quantity.convert_to_named(unit)?;
        }
        writer.write_fmt(format_args!("{}\n", quantity))?;
    }
    writer.flush()?;

    Ok(())
}
