//! CLI tests for the `plotspec format` subcommand.

use std::process::Command;

use assert_cmd::cargo;

fn plotspec_cmd() -> Command {
    Command::new(cargo::cargo_bin!("plotspec"))
}

#[test]
fn format_opts_pretty_prints_canonical_line() {
    let output = plotspec_cmd()
        .args([
            "format",
            "opts",
            "Image plot(size=5) style(cmap='gray') norm(-mapwise)",
            "--output",
            "pretty",
        ])
        .output()
        .expect("run format command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim_end(),
        "Image {+groupwise -mapwise} [size=5] (cmap='gray')"
    );
}

#[test]
fn format_opts_json_reports_changed_flag() {
    let output = plotspec_cmd()
        .args(["format", "opts", "Curve [lw=2]", "--output", "json"])
        .output()
        .expect("run format command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["formatted"], "Curve [lw=2]");
    assert_eq!(json["changed"], false);

    let output = plotspec_cmd()
        .args(["format", "opts", "Curve   plot(lw=2)", "--output", "json"])
        .output()
        .expect("run format command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["changed"], true);
}

#[test]
fn format_invalid_line_exits_nonzero() {
    let output = plotspec_cmd()
        .args(["format", "opts", "Image [a=1", "--output", "json"])
        .output()
        .expect("run format command");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert!(json["formatted"].is_null());
    assert!(json["diagnostics"][0]["id"].as_str().is_some_and(|id| id.starts_with("SPEC1")));
}
