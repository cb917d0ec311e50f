//! Finds a longest prefix shared by two lines of the input, using a file-based mapreduce with
//! `MAPPERS` map partitions and `REDUCERS` reduce partitions.
//!
//! Lines are only compared with their neighbours inside one reduce partition, so with more than
//! one reducer a prefix shared by two lines on either side of a partition boundary is missed.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{error, info};

use filemr::prefix::{LineMapper, Maximizer, PrefixAccumulator};
use filemr::{Functor, MRController, MRParameters};

#[derive(Parser, Debug)]
#[command(name = "filemr", version, about = "Longest shared line prefix via file-based mapreduce")]
struct Args {
    /// Number of map partitions
    #[arg(value_parser = parse_partition_count)]
    mappers: usize,

    /// Number of reduce partitions
    #[arg(value_parser = parse_partition_count)]
    reducers: usize,

    /// Input file; copied into the working directory as the input container. Without it, the
    /// input container must already be present there.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Working directory holding the containers
    #[arg(short, long, default_value = "./output/")]
    work_dir: PathBuf,

    /// Shortest prefix length that is reported
    #[arg(long, default_value_t = 1)]
    min_prefix: usize,
}

fn parse_partition_count(count: &str) -> std::result::Result<usize, String> {
    match count.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid partition count '{}'", count)),
    }
}

fn run(args: Args) -> filemr::Result<()> {
    let params = MRParameters::new()
        .set_work_dir(args.work_dir)
        .set_concurrency(args.mappers, args.reducers);

    let mapper = LineMapper::new(params.delimiter);
    let mut controller = MRController::new(params)?;
    if let Some(ref input) = args.input {
        controller.install_input(input)?;
    }

    let results = controller.pipeline(&Functor::map_with(mapper),
                                      &Functor::reduce_with(PrefixAccumulator::with_min_len(args.min_prefix)),
                                      &Functor::reduce::<Maximizer>())?;
    for r in results {
        info!("longest shared prefix: {} characters, in {:?}", r.value, r.key);
        println!("{}", r);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}
