//! Prediction-merge tests: label verification against the source CSV and the
//! merged output's trailing columns.

use std::path::{Path, PathBuf};

use ndarray::{Array2, Axis};

use fextract::io::{load_predictions, save_predictions};
use fextract::predict::{merge_predictions, verify_labels, PredictError};

const HEADER: &str =
    "Movie,CCSBase,CCSLength,CCSPos,ArrowQv,CCSToGenomeCigar,CcsToGenomePrevDeletions";

/// Nine rows covering all four label classes: one explicit `D` row, plus two
/// deletions forced by the prior-deletion override.
const ROWS: &[&str] = &[
    "m1,A,1000,500,10,=,0",
    "m1,C,1000,500,11,I,0",
    "m1,G,1000,500,12,X,0",
    "m1,T,1000,500,13,=,0",
    "m1,A,1000,500,14,D,0",
    "m1,C,1000,500,15,=,1",
    "m1,G,1000,500,16,I,0",
    "m1,T,1000,500,17,X,3",
    "m1,A,1000,500,18,=,0",
];

/// One-hot index per row of [`ROWS`]. Rows 5 and 7 carry nonzero prior
/// deletions, so their class is 3 regardless of the cigar.
const CLASSES: [usize; 9] = [0, 1, 2, 0, 3, 3, 1, 3, 0];

fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    std::fs::write(&path, content).expect("write csv");
    path
}

fn one_hot_labels(classes: &[usize]) -> Array2<f32> {
    let mut labels = Array2::zeros((classes.len(), 4));
    for (r, &c) in classes.iter().enumerate() {
        labels[[r, c]] = 1.0;
    }
    labels
}

/// Soft probabilities peaked at each row's class, rows summing to 1.
fn probabilities(classes: &[usize]) -> Array2<f32> {
    let mut probs = Array2::from_elem((classes.len(), 4), 0.1_f32);
    for (r, &c) in classes.iter().enumerate() {
        probs[[r, c]] = 0.7;
    }
    probs
}

#[test]
fn labels_verify_against_source_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "in.csv", ROWS);
    verify_labels(&one_hot_labels(&CLASSES), &csv).expect("labels match");
}

#[test]
fn swapped_labels_are_reported_with_row_and_classes() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "in.csv", ROWS);
    let mut classes = CLASSES;
    classes[4] = 1;
    let err = verify_labels(&one_hot_labels(&classes), &csv).unwrap_err();
    match err {
        PredictError::LabelMismatch {
            row,
            container_label,
            csv_label,
        } => {
            assert_eq!(row, 4);
            assert_eq!(container_label, 'I');
            assert_eq!(csv_label, 'D');
        }
        other => panic!("expected LabelMismatch, got {other:?}"),
    }
}

#[test]
fn merged_output_carries_predictions_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "in.csv", ROWS);
    let out = dir.path().join("out.csv");
    let probs = probabilities(&CLASSES);
    // Sanity: each probability row sums to 1.
    for row in probs.axis_iter(Axis(0)) {
        assert!((row.sum() - 1.0).abs() < 1e-4);
    }

    let written = merge_predictions(&csv, &probs, &out).expect("merge");
    assert_eq!(written, 9);

    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(
        lines[0],
        format!(
            "{HEADER},SamplingPredictedCigar,SamplingPredictedMatch,\
             SamplingPredictedI,SamplingPredictedX,SamplingPredictedD"
        )
    );

    let expected_cigars = ['=', 'I', 'X', '=', 'D', 'D', 'I', 'D', '='];
    for (i, line) in lines[1..].iter().enumerate() {
        assert!(line.starts_with(ROWS[i]), "row {i} prefix changed: {line}");
        let tail: Vec<&str> = line.rsplit(',').take(5).collect();
        // rsplit yields D, X, I, Match, cigar.
        assert_eq!(tail[4].chars().next(), Some(expected_cigars[i]));
        for prob in &tail[..4] {
            let parsed: f32 = prob.parse().expect("probability field");
            assert!((0.0..=1.0).contains(&parsed));
            assert_eq!(prob.split('.').nth(1).map(str::len), Some(6));
        }
    }
}

#[test]
fn probabilities_survive_a_container_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "in.csv", ROWS);
    let container = dir.path().join("predictions.fxds");
    let out = dir.path().join("out.csv");

    save_predictions(&container, &probabilities(&CLASSES)).expect("save");
    let probs = load_predictions(&container).expect("load");
    let written = merge_predictions(&csv, &probs, &out).expect("merge");
    assert_eq!(written, 9);
}

#[test]
fn row_count_mismatch_is_fatal_both_ways() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "in.csv", ROWS);
    let out = dir.path().join("out.csv");

    let too_few = probabilities(&CLASSES[..8]);
    assert!(matches!(
        merge_predictions(&csv, &too_few, &out).unwrap_err(),
        PredictError::RowCountMismatch {
            container_rows: 8,
            csv_rows: 9
        }
    ));

    let mut ten = CLASSES.to_vec();
    ten.push(0);
    let too_many = probabilities(&ten);
    assert!(matches!(
        merge_predictions(&csv, &too_many, &out).unwrap_err(),
        PredictError::RowCountMismatch {
            container_rows: 10,
            csv_rows: 9
        }
    ));
    assert!(!out.exists());
}
