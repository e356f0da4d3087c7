//! Convert a fextract CSV into standardized binary dataset containers.
//!
//! Usage:
//!   fextract2numpy <in.csv> <out_prefix> [options]
//!
//! Options:
//!   --stat-json <path>      Statistics manifest; enables standardization
//!   --num-train-rows <n>    Row budget for the training container (default: 1000000)
//!   --no-dump-remaining     Do not write the remainder (test) container
//!   --min-dist2end <n>      Minimum distance to either read end (default: 100)
//!   --both-strands          Accept reverse-strand rows as well as forward
//!   --min-coverage <n>      Minimum total coverage
//!   --max-coverage <n>      Maximum total coverage

use std::path::PathBuf;
use std::process::exit;

use fextract::pipeline::{fextract_to_dataset, ConvertOptions};

struct Args {
    in_csv: PathBuf,
    out_prefix: PathBuf,
    options: ConvertOptions,
}

fn usage() -> ! {
    eprintln!(
        "fextract2numpy <in.csv> <out_prefix>\n\n  \
         --stat-json <path>     Statistics manifest; enables standardization\n  \
         --num-train-rows <n>   Row budget for the training container (default: 1000000)\n  \
         --no-dump-remaining    Do not write the remainder (test) container\n  \
         --min-dist2end <n>     Minimum distance to either read end (default: 100)\n  \
         --both-strands         Accept reverse-strand rows as well as forward\n  \
         --min-coverage <n>     Minimum total coverage\n  \
         --max-coverage <n>     Maximum total coverage"
    );
    exit(2);
}

fn next_value(it: &mut impl Iterator<Item = String>, flag: &str) -> String {
    match it.next() {
        Some(v) => v,
        None => {
            eprintln!("{flag} requires a value");
            usage();
        }
    }
}

fn parse_num(it: &mut impl Iterator<Item = String>, flag: &str) -> u32 {
    let value = next_value(it, flag);
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
    let mut options = ConvertOptions::default();

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--stat-json" => {
                options.stat_json = Some(PathBuf::from(next_value(&mut it, "--stat-json")));
            }
            "--num-train-rows" => {
                options.num_train_rows = parse_num(&mut it, "--num-train-rows") as usize;
            }
            "--no-dump-remaining" => options.no_dump_remaining = true,
            "--min-dist2end" => {
                options.filter.min_dist_to_end = parse_num(&mut it, "--min-dist2end");
            }
            "--both-strands" => options.filter = options.filter.clone().both_strands(),
            "--min-coverage" => {
                options.filter.min_coverage = Some(parse_num(&mut it, "--min-coverage"));
            }
            "--max-coverage" => {
                options.filter.max_coverage = Some(parse_num(&mut it, "--max-coverage"));
            }
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
    let out_prefix = positional.pop().unwrap_or_default();
    let in_csv = positional.pop().unwrap_or_default();
    Args {
        in_csv,
        out_prefix,
        options,
    }
}

fn main() {
    env_logger::init();
    let args = parse_args();

    match fextract_to_dataset(&args.in_csv, &args.out_prefix, &args.options) {
        Ok(summary) => {
            println!(
                "encoded {} rows x {} features; train: {}",
                summary.n_rows,
                summary.n_features,
                summary.train_container.display()
            );
            if let Some(test) = &summary.test_container {
                println!("test: {}", test.display());
            }
        }
        Err(err) => {
            eprintln!("{err}");
            exit(1);
        }
    }
}
