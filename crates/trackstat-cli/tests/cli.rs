//! End-to-end tests for the trackstat binary

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "track_id,track_name,track_artist,track_popularity,track_album_id,\
track_album_name,track_album_release_date,playlist_name,playlist_id,playlist_genre,\
playlist_subgenre,danceability,energy,key,loudness,mode,speechiness,acousticness,\
instrumentalness,liveness,valence,tempo,duration_ms";

fn row(i: usize, playlist: &str) -> String {
    let mode = i % 2;
    let energy = 0.2 + 0.6 * ((i * 7) % 13) as f64 / 13.0;
    let wobble = ((i * 37 + 11) % 17) as f64 / 17.0 - 0.5;
    let popularity = 40.0 + 5.0 * mode as f64 + 10.0 * energy + wobble;
    format!(
        "t{i},Song {i},Artist {a},{popularity:.3},\
al{i},Album {i},2019-06-14,{playlist},p{playlist},pop,dance pop,\
{dance:.3},{energy:.3},{key},-5.5,{mode},0.05,0.1,0,0.1,0.5,120,200000",
        a = i % 7,
        dance = 0.5 + 0.01 * (i % 10) as f64,
        key = i % 12,
    )
}

/// 40 tracks; the first two appear again on a second playlist
fn write_raw(dir: &Path) -> PathBuf {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..40 {
        lines.push(row(i, "Today's Top Hits"));
    }
    lines.push(row(0, "Pop Rising"));
    lines.push(row(1, "Pop Rising"));
    let path = dir.join("tracks.csv");
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn trackstat() -> Command {
    Command::cargo_bin("trackstat").unwrap()
}

#[test]
fn test_clean_keeps_one_row_per_track() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());
    let out = dir.path().join("clean.csv");

    trackstat()
        .args(["clean", "--input"])
        .arg(&raw)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(!header.contains("playlist_name"));
    assert!(!header.contains("track_album_id"));
    assert!(header.starts_with("track_id,track_name,track_artist,track_popularity"));
    assert_eq!(lines.count(), 40);
}

#[test]
fn test_clean_recodes_mode_to_stdout() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());

    trackstat()
        .args(["clean", "--recode-mode", "--recode-key", "--input"])
        .arg(&raw)
        .assert()
        .success()
        .stdout(predicate::str::contains("major"))
        .stdout(predicate::str::contains("minor"))
        .stdout(predicate::str::contains("C#"));
}

#[test]
fn test_missing_columns_fail_before_cleaning() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "track_id,track_name\nt1,Song\n").unwrap();

    trackstat()
        .args(["clean", "--input"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("track_popularity"))
        .stderr(predicate::str::contains("danceability"));
}

#[test]
fn test_fit_reports_coefficients_and_summary() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());

    trackstat()
        .args([
            "fit",
            "--dedupe",
            "artist-track",
            "--formula",
            "track_popularity ~ mode + energy",
            "--input",
        ])
        .arg(&raw)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "model,term,estimate,std_error,statistic,p_value,conf_low,conf_high",
        ))
        .stdout(predicate::str::contains("(Intercept)"))
        .stdout(predicate::str::contains("track_popularity ~ mode + energy,energy,"))
        .stdout(predicate::str::contains("r_squared"));
}

#[test]
fn test_fit_on_cleaned_labels() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());
    let cleaned = dir.path().join("clean.csv");
    let coefs = dir.path().join("coefs.csv");
    let preds = dir.path().join("preds.csv");

    trackstat()
        .args(["clean", "--recode-mode", "--input"])
        .arg(&raw)
        .arg("--output")
        .arg(&cleaned)
        .assert()
        .success();

    trackstat()
        .args(["fit", "-f", "track_popularity ~ mode * energy", "--input"])
        .arg(&cleaned)
        .arg("--coefficients")
        .arg(&coefs)
        .arg("--predictions")
        .arg(&preds)
        .assert()
        .success();

    let text = fs::read_to_string(&coefs).unwrap();
    assert!(text.contains(",modemajor,"));
    assert!(text.contains(",modemajor:energy,"));
    // header plus one row per observation
    assert_eq!(fs::read_to_string(&preds).unwrap().lines().count(), 41);
}

#[test]
fn test_failed_fit_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());

    trackstat()
        .args([
            "fit",
            "-f",
            "track_popularity ~ no_such_column",
            "-f",
            "track_popularity ~ energy",
            "--input",
        ])
        .arg(&raw)
        .assert()
        .failure()
        .stdout(predicate::str::contains("track_popularity ~ energy,energy,"))
        .stderr(predicate::str::contains("no_such_column"))
        .stderr(predicate::str::contains("1 of 2 model(s) failed"));
}

#[test]
fn test_vif_for_intercept_only_model_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());

    trackstat()
        .args([
            "fit",
            "-f",
            "track_popularity ~ 1",
            "-f",
            "track_popularity ~ energy + danceability",
            "--vif",
            "--input",
        ])
        .arg(&raw)
        .assert()
        .success()
        .stdout(predicate::str::contains("track_popularity ~ 1,(Intercept),"))
        .stdout(predicate::str::contains("model,term,vif"))
        .stdout(predicate::str::contains(
            "track_popularity ~ energy + danceability,energy,",
        ))
        .stderr(predicate::str::contains("track_popularity ~ 1: no variance inflation factors"));
}

#[test]
fn test_fit_after_clean_with_dedupe() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());
    let cleaned = dir.path().join("clean.csv");

    trackstat()
        .args(["clean", "--recode-mode", "--input"])
        .arg(&raw)
        .arg("--output")
        .arg(&cleaned)
        .assert()
        .success();

    trackstat()
        .args([
            "fit",
            "--dedupe",
            "artist-track",
            "--recode-mode",
            "-f",
            "track_popularity ~ mode",
            "--input",
        ])
        .arg(&cleaned)
        .assert()
        .success()
        .stdout(predicate::str::contains(",modemajor,"));
}

#[test]
fn test_fit_json_logistic() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());

    let output = trackstat()
        .args([
            "fit",
            "--family",
            "logistic",
            "--popular-threshold",
            "47",
            "--exponentiate",
            "--format",
            "json",
            "-f",
            "popular ~ energy",
            "--input",
        ])
        .arg(&raw)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let model = &report["models"][0];
    assert_eq!(model["family"], "logistic");
    assert_eq!(model["coefficients"][1]["term"], "energy");
    assert!(model["coefficients"][1]["estimate"].as_f64().unwrap() > 0.0);
    assert!(report["failures"].as_array().unwrap().is_empty());
}

#[test]
fn test_compare_mode_groups() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());

    trackstat()
        .args(["compare", "--recode-mode", "--input"])
        .arg(&raw)
        .assert()
        .success()
        .stdout(predicate::str::contains("group,n,mean,sd"))
        .stdout(predicate::str::contains("minor,"))
        .stdout(predicate::str::contains("major,"))
        .stdout(predicate::str::contains("first_group,second_group,difference"));
}

#[test]
fn test_stdin_input() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path());

    trackstat()
        .args(["clean", "--by", "track-id", "--input", "-"])
        .write_stdin(fs::read_to_string(raw).unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("t39,Song 39"));
}
