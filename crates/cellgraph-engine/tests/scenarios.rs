//! End-to-end behaviour on small hand-checked inputs.

use cellgraph_core::{DuplicatePolicy, RawCellRecord};
use cellgraph_engine::{
    run_with, AbortSignal, CsvCellSource, EdgeOrder, EdgeSink, IndexKind, OutputFormat, RunConfig,
    RunErrorKind, Stage, VecSource,
};
use cellgraph_test_utils::{
    scenario_coincident, scenario_empty, scenario_line, scenario_single, scenario_vertical,
};

fn run_csv(records: Vec<RawCellRecord>, config: &RunConfig) -> (String, cellgraph_engine::RunSummary) {
    let mut sink = EdgeSink::new(Vec::new(), OutputFormat::Csv).unwrap();
    let summary = run_with(config, &mut VecSource::new(records), &mut sink, &AbortSignal::new()).unwrap();
    (String::from_utf8(sink.into_inner().unwrap()).unwrap(), summary)
}

#[test]
fn horizontal_pair_ignores_distant_cell() {
    let (out, summary) = run_csv(scenario_line(), &RunConfig::default());
    assert_eq!(
        out,
        "from_id,to_id,direction,distance\nA,B,east,1.000\nB,A,west,1.000\n"
    );
    assert_eq!(summary.cells_processed, 3);
    assert_eq!(summary.edges_emitted, 2);
    assert!((summary.average_edges_per_cell - 2.0 / 3.0).abs() < 1e-12);
    assert!(!summary.aborted);
}

#[test]
fn vertical_pair() {
    let (out, _) = run_csv(scenario_vertical(), &RunConfig::default());
    assert_eq!(
        out,
        "from_id,to_id,direction,distance\nA,B,above,1.000\nB,A,below,1.000\n"
    );
}

#[test]
fn single_cell_has_no_edges() {
    let (out, summary) = run_csv(scenario_single(), &RunConfig::default());
    assert_eq!(out, "from_id,to_id,direction,distance\n");
    assert_eq!(summary.cells_processed, 1);
    assert_eq!(summary.edges_emitted, 0);
    assert_eq!(summary.average_edges_per_cell, 0.0);
}

#[test]
fn empty_input_succeeds() {
    let (out, summary) = run_csv(scenario_empty(), &RunConfig::default());
    assert_eq!(out, "from_id,to_id,direction,distance\n");
    assert_eq!(summary.cells_processed, 0);
    assert_eq!(summary.edges_emitted, 0);
    assert_eq!(summary.average_edges_per_cell, 0.0);
}

#[test]
fn invalid_records_are_skipped_and_counted() {
    let records = vec![
        RawCellRecord::new("A", 0.0, 0.0, 0.0),
        RawCellRecord::new("  ", 0.5, 0.0, 0.0),
        RawCellRecord::new("bad", f64::NAN, 0.0, 0.0),
        RawCellRecord::new("inf", 0.0, f64::INFINITY, 0.0),
        RawCellRecord::new("B", 1.0, 0.0, 0.0),
    ];
    let (out, summary) = run_csv(records, &RunConfig::default());
    assert_eq!(summary.skipped_records, 3);
    assert_eq!(summary.cells_processed, 2);
    assert!(out.ends_with("A,B,east,1.000\nB,A,west,1.000\n"));
}

#[test]
fn non_utf8_csv_row_is_skipped() {
    let data: &[u8] = b"id,x,y,z\nA,0,0,0\ncaf\xe9,5,5,5\nB,1,0,0\n";
    let mut sink = EdgeSink::new(Vec::new(), OutputFormat::Csv).unwrap();
    let summary = run_with(
        &RunConfig::default(),
        &mut CsvCellSource::new(data),
        &mut sink,
        &AbortSignal::new(),
    )
    .unwrap();
    assert_eq!(summary.skipped_records, 1);
    assert_eq!(summary.edges_emitted, 2);
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert!(out.ends_with("A,B,east,1.000\nB,A,west,1.000\n"));
}

#[test]
fn coincident_cells_labelled_same() {
    let (out, summary) = run_csv(scenario_coincident(), &RunConfig::default());
    assert!(out.contains("P,Q,same,0.000\n"));
    assert!(out.contains("Q,P,same,0.000\n"));
    assert_eq!(summary.coincident_pairs, 2);
    assert_eq!(summary.direction_counts[&cellgraph_core::Direction::Same], 2);
}

#[test]
fn duplicate_last_write_wins_keeps_slot() {
    let records = vec![
        RawCellRecord::new("A", 0.0, 0.0, 0.0),
        RawCellRecord::new("B", 9.0, 0.0, 0.0),
        RawCellRecord::new("A", 10.0, 0.0, 0.0),
    ];
    let (out, summary) = run_csv(records, &RunConfig::default());
    assert_eq!(summary.duplicate_ids, 1);
    assert_eq!(summary.cells_processed, 2);
    assert_eq!(
        out,
        "from_id,to_id,direction,distance\nA,B,west,1.000\nB,A,east,1.000\n"
    );
}

#[test]
fn duplicate_keep_first() {
    let records = vec![
        RawCellRecord::new("A", 0.0, 0.0, 0.0),
        RawCellRecord::new("B", 9.0, 0.0, 0.0),
        RawCellRecord::new("A", 10.0, 0.0, 0.0),
    ];
    let config = RunConfig {
        duplicate_policy: DuplicatePolicy::KeepFirst,
        ..RunConfig::default()
    };
    let (out, summary) = run_csv(records, &config);
    assert_eq!(summary.duplicate_ids, 1);
    assert_eq!(out, "from_id,to_id,direction,distance\n");
}

#[test]
fn duplicate_reject_is_fatal_at_ingest() {
    let records = vec![
        RawCellRecord::new("A", 0.0, 0.0, 0.0),
        RawCellRecord::new("A", 1.0, 0.0, 0.0),
    ];
    let config = RunConfig {
        duplicate_policy: DuplicatePolicy::Reject,
        ..RunConfig::default()
    };
    let mut sink = EdgeSink::new(Vec::new(), OutputFormat::Csv).unwrap();
    let err = run_with(&config, &mut VecSource::new(records), &mut sink, &AbortSignal::new()).unwrap_err();
    assert_eq!(err.stage, Stage::Ingest);
    assert!(matches!(err.kind, RunErrorKind::Registry(_)));
    assert_eq!(err.progress.edges_flushed, 0);
}

#[test]
fn invalid_threshold_is_fatal_before_reading() {
    for bad in [0.0, -1.0, f64::NAN] {
        let config = RunConfig {
            adjacency_threshold: bad,
            ..RunConfig::default()
        };
        let mut sink = EdgeSink::new(Vec::new(), OutputFormat::Csv).unwrap();
        let err = run_with(&config, &mut VecSource::new(scenario_line()), &mut sink, &AbortSignal::new())
            .unwrap_err();
        assert_eq!(err.stage, Stage::Configure);
        assert!(matches!(err.kind, RunErrorKind::Config(_)));
    }
}

#[test]
fn by_id_order_sorts_lexicographically() {
    let records = vec![
        RawCellRecord::new("m", 0.0, 0.0, 0.0),
        RawCellRecord::new("b", 1.0, 0.0, 0.0),
        RawCellRecord::new("z", 0.0, 1.0, 0.0),
    ];
    let config = RunConfig {
        edge_order: EdgeOrder::ById,
        batch_size: 1,
        ..RunConfig::default()
    };
    let (out, _) = run_csv(records, &config);
    let rows: Vec<&str> = out.lines().skip(1).collect();
    assert_eq!(
        rows,
        [
            "b,m,west,1.000",
            "b,z,north,1.414",
            "m,b,east,1.000",
            "m,z,north,1.000",
            "z,b,south,1.414",
            "z,m,south,1.000",
        ]
    );
}

#[test]
fn brute_force_backend_matches_grid() {
    let records = cellgraph_test_utils::random_cloud(250, 5.0, 99);
    let (grid_out, grid_summary) = run_csv(records.clone(), &RunConfig::default());
    let brute = RunConfig {
        index: IndexKind::BruteForce,
        ..RunConfig::default()
    };
    let (brute_out, brute_summary) = run_csv(records, &brute);
    assert_eq!(grid_out, brute_out);
    assert_eq!(grid_summary.output_digest, brute_summary.output_digest);
    assert!(grid_summary.candidate_pairs < brute_summary.candidate_pairs);
}

#[test]
fn jsonl_output() {
    let mut sink = EdgeSink::new(Vec::new(), OutputFormat::JsonLines).unwrap();
    run_with(
        &RunConfig::default(),
        &mut VecSource::new(scenario_vertical()),
        &mut sink,
        &AbortSignal::new(),
    )
    .unwrap();
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let rows: Vec<serde_json::Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["from_id"], "A");
    assert_eq!(rows[0]["direction"], "above");
    assert_eq!(rows[1]["direction"], "below");
    assert_eq!(rows[1]["distance"], 1.0);
}
