/// Smoke tests to verify the binary runs without panicking
use std::process::{Command, Output};

fn geoquantica(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_geoquantica"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute geoquantica")
}

#[test]
fn binary_shows_help() {
    let output = geoquantica(&["--help"]);

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("geoquantica"), "Help output should mention geoquantica");
    for sub in ["globe", "snapshot", "history", "analyze", "suggest", "adapt"] {
        assert!(stdout.contains(sub), "Help output should list {sub}");
    }
}

#[test]
fn binary_shows_version() {
    let output = geoquantica(&["--version"]);

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1.0"));
}

#[test]
fn invalid_subcommand_fails_gracefully() {
    let output = geoquantica(&["nonexistent-command"]);

    // Should fail with error, not panic
    assert!(
        !output.status.success(),
        "Invalid subcommand should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    // Should show helpful error, not a panic backtrace
    assert!(
        !stderr.contains("panicked at"),
        "Invalid subcommand should not cause panic"
    );
}

#[test]
fn snapshot_prints_every_pair() {
    let output = geoquantica(&["snapshot", "--seed", "7"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("snapshot is JSON");
    let links = json["links"].as_array().expect("links array");
    assert_eq!(links.len(), 45);
    assert!(links.iter().all(|l| l["latency"].as_f64().unwrap() > 0.0));

    // same seed, same draw
    let again = geoquantica(&["snapshot", "--seed", "7"]);
    let json2: serde_json::Value = serde_json::from_slice(&again.stdout).unwrap();
    assert_eq!(json["links"], json2["links"]);
}

#[test]
fn history_prints_hourly_window() {
    let output = geoquantica(&["history", "okx-aws-ap-northeast-1", "--hours", "1"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("history is JSON");
    let points = json.as_array().expect("array of samples");
    assert_eq!(points.len(), 60);
    let first = points[0]["time"].as_str().unwrap();
    assert!(first.ends_with('Z') && first.contains('.'), "ISO timestamp with millis: {first}");
    assert!(points.iter().all(|p| p["latency"].as_f64().unwrap() >= 10.0));
}

#[test]
fn history_rejects_empty_window() {
    for hours in ["0", "-3"] {
        let output = geoquantica(&["history", "okx-aws-us-east-1", "--hours", hours]);
        assert!(!output.status.success(), "--hours {hours} should fail");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(!stderr.contains("panicked at"));
        assert!(stderr.contains("invalid lookback window"), "stderr: {stderr}");
    }
}
