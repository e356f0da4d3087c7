//! Merge model prediction probabilities back onto the source fextract CSV.
//!
//! Usage:
//!   mergepredictions <predictions.fxds> <in.csv> <out.csv> [options]
//!
//! Options:
//!   --verify-dataset <path.fxds>   Check the dataset container's labels
//!                                  against the CSV before merging
//!   --order-json <path>            Feature-order manifest for --verify-dataset

use std::path::PathBuf;
use std::process::exit;

use fextract::io::{load_dataset, load_feature_order, load_predictions};
use fextract::pipeline::require_suffix;
use fextract::predict::{merge_predictions, verify_labels};

struct Args {
    predictions: PathBuf,
    in_csv: PathBuf,
    out_csv: PathBuf,
    verify_dataset: Option<PathBuf>,
    order_json: Option<PathBuf>,
}

fn usage() -> ! {
    eprintln!(
        "mergepredictions <predictions.fxds> <in.csv> <out.csv>\n\n  \
         --verify-dataset <path.fxds>  Check the dataset container's labels\n                                \
         against the CSV before merging\n  \
         --order-json <path>           Feature-order manifest for --verify-dataset"
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

fn parse_args() -> Args {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut verify_dataset = None;
    let mut order_json = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--verify-dataset" => {
                verify_dataset = Some(PathBuf::from(next_value(&mut it, "--verify-dataset")));
            }
            "--order-json" => {
                order_json = Some(PathBuf::from(next_value(&mut it, "--order-json")));
            }
            "--help" => usage(),
            other if other.starts_with("--") => {
                eprintln!("unknown option: {other}");
                usage();
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    if positional.len() != 3 {
        usage();
    }
    let out_csv = positional.pop().unwrap_or_default();
    let in_csv = positional.pop().unwrap_or_default();
    let predictions = positional.pop().unwrap_or_default();
    Args {
        predictions,
        in_csv,
        out_csv,
        verify_dataset,
        order_json,
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    exit(1);
}

fn main() {
    env_logger::init();
    let args = parse_args();

    if let Err(err) = require_suffix(&args.out_csv, ".csv") {
        fail(err);
    }

    if let Some(dataset_path) = &args.verify_dataset {
        let order_path = match &args.order_json {
            Some(path) => path,
            None => fail("--verify-dataset requires --order-json"),
        };
        let order = match load_feature_order(order_path) {
            Ok(order) => order,
            Err(err) => fail(err),
        };
        let dataset = match load_dataset(dataset_path, order) {
            Ok(dataset) => dataset,
            Err(err) => fail(err),
        };
        if let Err(err) = verify_labels(dataset.cigar_labels(), &args.in_csv) {
            fail(err);
        }
        println!("verified {} labels against {}", dataset.n_rows(), args.in_csv.display());
    }

    let probabilities = match load_predictions(&args.predictions) {
        Ok(probs) => probs,
        Err(err) => fail(err),
    };

    match merge_predictions(&args.in_csv, &probabilities, &args.out_csv) {
        Ok(written) => {
            println!("wrote {} merged rows to {}", written, args.out_csv.display());
        }
        Err(err) => fail(err),
    }
}
