//! Runs the `cellgraph` binary end to end.

use std::process::Command;

fn cellgraph() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cellgraph"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn csv_to_csv_with_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells.csv");
    std::fs::write(&input, "id,x,y,z\nA,0,0,0\nB,0,0,1\n").unwrap();
    let output = dir.path().join("graph/edges.csv");

    let out = cellgraph()
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--json")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["cells_processed"], 2);
    assert_eq!(summary["edges_emitted"], 2);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "from_id,to_id,direction,distance\nA,B,above,1.000\nB,A,below,1.000\n"
    );
}

#[test]
fn bad_threshold_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells.csv");
    std::fs::write(&input, "id,x,y,z\nA,0,0,0\n").unwrap();

    let out = cellgraph()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("edges.csv"))
        .arg("--threshold=-1")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("configure stage failed"), "stderr: {stderr}");
}

#[test]
fn missing_input_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let out = cellgraph()
        .arg("-i")
        .arg(dir.path().join("absent.csv"))
        .arg("-o")
        .arg(dir.path().join("edges.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("cannot open cell source"), "stderr: {stderr}");
}

/// Ctrl-C raises the abort signal instead of killing the process, so the
/// run still exits normally and prints its summary.
#[cfg(unix)]
#[test]
fn interrupt_stops_the_run_cleanly() {
    use std::io::{BufRead, BufReader};
    use std::process::Stdio;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells.csv");
    let mut csv = String::from("id,x,y,z\n");
    for i in 0..30_000 {
        csv.push_str(&format!("c{i},{},{},{}\n", i % 40, (i / 40) % 40, i / 1600));
    }
    std::fs::write(&input, csv).unwrap();

    let mut child = cellgraph()
        .env("RUST_LOG", "info")
        .args(["--json", "--workers", "1", "--batch-size", "64", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("edges.csv"))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // The handler is installed before the run logs that it is ingesting.
    let mut stderr = BufReader::new(child.stderr.take().unwrap());
    let mut line = String::new();
    while stderr.read_line(&mut line).unwrap() > 0 && !line.contains("ingesting cells") {
        line.clear();
    }
    let _ = Command::new("kill")
        .arg("-INT")
        .arg(child.id().to_string())
        .status();
    let drain = std::thread::spawn(move || std::io::copy(&mut stderr, &mut std::io::sink()));

    let out = child.wait_with_output().unwrap();
    drain.join().unwrap().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(summary["aborted"].is_boolean());
}
