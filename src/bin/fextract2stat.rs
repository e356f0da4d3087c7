//! Compute per-feature statistics over a filtered fextract CSV.
//!
//! Usage:
//!   fextract2stat <in.csv> <out.json> [options]
//!
//! Options:
//!   --min-dist2end <n>    Minimum distance to either read end (default: 100)
//!   --both-strands        Accept reverse-strand rows as well as forward
//!   --min-coverage <n>    Minimum total coverage
//!   --max-coverage <n>    Maximum total coverage

use std::path::PathBuf;
use std::process::exit;

use fextract::filter::FilterConfig;
use fextract::pipeline::compute_feature_stats;

struct Args {
    in_csv: PathBuf,
    out_json: PathBuf,
    filter: FilterConfig,
}

fn usage() -> ! {
    eprintln!(
        "fextract2stat <in.csv> <out.json>\n\n  \
         --min-dist2end <n>   Minimum distance to either read end (default: 100)\n  \
         --both-strands       Accept reverse-strand rows as well as forward\n  \
         --min-coverage <n>   Minimum total coverage\n  \
         --max-coverage <n>   Maximum total coverage"
    );
    exit(2);
}

fn parse_num(it: &mut impl Iterator<Item = String>, flag: &str) -> u32 {
    let value = match it.next() {
        Some(v) => v,
        None => {
            eprintln!("{flag} requires a value");
            usage();
        }
    };
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("{flag} value '{value}' is not a number");
            usage();
        }
    }
}

fn parse_args() -> Args {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut filter = FilterConfig::default();

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--min-dist2end" => filter.min_dist_to_end = parse_num(&mut it, "--min-dist2end"),
            "--both-strands" => filter = filter.both_strands(),
            "--min-coverage" => filter.min_coverage = Some(parse_num(&mut it, "--min-coverage")),
            "--max-coverage" => filter.max_coverage = Some(parse_num(&mut it, "--max-coverage")),
            "--help" => usage(),
            other if other.starts_with("--") => {
                eprintln!("unknown option: {other}");
                usage();
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    if positional.len() != 2 {
        usage();
    }
    let out_json = positional.pop().unwrap_or_default();
    let in_csv = positional.pop().unwrap_or_default();
    Args {
        in_csv,
        out_json,
        filter,
    }
}

fn main() {
    env_logger::init();
    let args = parse_args();

    match compute_feature_stats(&args.in_csv, &args.out_json, &args.filter) {
        Ok(stats) => {
            println!(
                "wrote statistics for {} features to {}",
                stats.len(),
                args.out_json.display()
            );
        }
        Err(err) => {
            eprintln!("{err}");
            exit(1);
        }
    }
}
