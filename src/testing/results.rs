//! Result aggregation and the result document written at the end of a run

use bevy::prelude::*;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::constants::RESULTS_FILE;
use crate::error::RunnerError;

/// Issue reported when discovery finds no player
pub const NO_PLAYER_ISSUE: &str = "No player node found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Passed,
    Failed,
    NoPlayer,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Passed => "passed",
            OverallStatus::Failed => "failed",
            OverallStatus::NoPlayer => "no_player",
        }
    }
}

/// Telemetry captured while a test ran
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    /// Accumulated path length
    pub distance: f32,
    /// Straight-line distance between start and final position
    pub displacement: f32,
    pub left_floor: bool,
    /// Simulated seconds the test's steps ran for
    pub duration: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_position: Option<[f32; 3]>,
    #[serde(default)]
    pub positions: Vec<[f32; 3]>,
}

/// Something observable a step did to the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// Seconds since the test started
    pub time: f32,
    pub kind: String,
    pub target: String,
    pub detail: String,
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub action: String,
    pub duration: f32,
    /// Simulated seconds actually spent in the step
    pub elapsed: f32,
    /// Why the step degraded to a no-op, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    #[serde(rename = "type")]
    pub test_type: String,
    pub status: TestStatus,
    pub issues: Vec<String>,
    pub metrics: TestMetrics,
    #[serde(default)]
    pub events: Vec<RunEvent>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub overall_status: OverallStatus,
    pub issues: Vec<String>,
}

impl Summary {
    pub fn from_results(results: &[TestResult], player_found: bool) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let failed = results.len() - passed;

        let mut issues = Vec::new();
        if !player_found {
            issues.push(NO_PLAYER_ISSUE.to_string());
        }
        for result in results {
            for issue in &result.issues {
                issues.push(format!("{}: {}", result.name, issue));
            }
        }

        let overall_status = if !player_found {
            OverallStatus::NoPlayer
        } else if failed == 0 {
            OverallStatus::Passed
        } else {
            OverallStatus::Failed
        };

        Self {
            total: results.len(),
            passed,
            failed,
            overall_status,
            issues,
        }
    }
}

/// Wall-clock frame statistics for the run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub avg_fps: f32,
    pub min_fps: f32,
    pub max_fps: f32,
    pub frame_count: usize,
    /// Wall-clock seconds across all sampled frames
    pub total_duration: f32,
}

impl Performance {
    /// Build from per-frame durations in seconds; non-positive samples are ignored
    pub fn from_samples(frame_times: &[f32]) -> Self {
        let samples: Vec<f32> = frame_times.iter().copied().filter(|&t| t > 0.0).collect();
        if samples.is_empty() {
            return Self {
                frame_count: frame_times.len(),
                ..Default::default()
            };
        }

        let total: f32 = samples.iter().sum();
        let mean = total / samples.len() as f32;
        let longest = samples.iter().copied().fold(f32::MIN, f32::max);
        let shortest = samples.iter().copied().fold(f32::MAX, f32::min);

        Self {
            avg_fps: 1.0 / mean,
            min_fps: 1.0 / longest,
            max_fps: 1.0 / shortest,
            frame_count: frame_times.len(),
            total_duration: total,
        }
    }
}

/// Complete result document consumed by the generation loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub status: String,
    pub timestamp: String,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    pub tests: Vec<TestResult>,
    pub summary: Summary,
    pub performance: Performance,
}

impl ResultDocument {
    pub fn from_file(path: &Path) -> Result<Self, RunnerError> {
        let content = fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| RunnerError::json(path, e))
    }
}

/// Aggregate test results into a result document
pub fn compile(
    status: &str,
    feature: Option<String>,
    tests: Vec<TestResult>,
    player_found: bool,
    performance: Performance,
) -> ResultDocument {
    let summary = Summary::from_results(&tests, player_found);
    info!(
        "Tests: {}/{} passed ({})",
        summary.passed,
        summary.total,
        summary.overall_status.as_str()
    );

    ResultDocument {
        status: status.to_string(),
        timestamp: Local::now().to_rfc3339(),
        run_id: Uuid::new_v4().to_string(),
        feature,
        tests,
        summary,
        performance,
    }
}

/// Write the document as pretty JSON to `<output_root>/run_<YYYYmmdd_HHMMSS>/test_results.json`
pub fn write_results(doc: &ResultDocument, output_root: &Path) -> Result<PathBuf, RunnerError> {
    let run_dir = output_root.join(format!("run_{}", Local::now().format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&run_dir).map_err(|e| RunnerError::io(&run_dir, e))?;

    let path = run_dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(doc).map_err(|e| RunnerError::json(&path, e))?;
    fs::write(&path, json).map_err(|e| RunnerError::io(&path, e))?;

    info!("Results written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, issues: &[&str]) -> TestResult {
        TestResult {
            name: name.to_string(),
            test_type: "movement".to_string(),
            status: if issues.is_empty() {
                TestStatus::Passed
            } else {
                TestStatus::Failed
            },
            issues: issues.iter().map(|s| s.to_string()).collect(),
            metrics: TestMetrics::default(),
            events: Vec::new(),
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts_and_prefixes_issues() {
        let results = vec![result("a", &[]), result("b", &["too short"]), result("c", &[])];
        let summary = Summary::from_results(&results, true);
        assert_eq!((summary.total, summary.passed, summary.failed), (3, 2, 1));
        assert_eq!(summary.overall_status, OverallStatus::Failed);
        assert_eq!(summary.issues, vec!["b: too short".to_string()]);
    }

    #[test]
    fn test_no_player_overrides_status() {
        let results = vec![result("a", &[]), result("b", &[])];
        let summary = Summary::from_results(&results, false);
        assert_eq!(summary.overall_status, OverallStatus::NoPlayer);
        assert_eq!(summary.issues[0], NO_PLAYER_ISSUE);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["overall_status"], "no_player");
    }

    #[test]
    fn test_all_passing() {
        let summary = Summary::from_results(&[result("a", &[])], true);
        assert_eq!(summary.overall_status, OverallStatus::Passed);
        assert!(summary.issues.is_empty());
    }

    #[test]
    fn test_performance_from_samples() {
        let perf = Performance::from_samples(&[0.0, 0.01, 0.02, 0.03]);
        assert_eq!(perf.frame_count, 4);
        assert!((perf.avg_fps - 50.0).abs() < 1e-3);
        assert!((perf.min_fps - 1.0 / 0.03).abs() < 1e-3);
        assert!((perf.max_fps - 100.0).abs() < 1e-3);
        assert!((perf.total_duration - 0.06).abs() < 1e-6);

        assert_eq!(Performance::from_samples(&[]), Performance::default());
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let doc = compile("completed", Some("door".to_string()), vec![result("a", &[])], true, Performance::default());

        let path = write_results(&doc, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), RESULTS_FILE);
        let run_dir = path.parent().unwrap().file_name().unwrap().to_string_lossy().to_string();
        assert!(run_dir.starts_with("run_"));
        assert_eq!(run_dir.len(), "run_YYYYmmdd_HHMMSS".len());

        let read = ResultDocument::from_file(&path).unwrap();
        assert_eq!(read, doc);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["tests"][0]["type"], "movement");
        assert_eq!(raw["tests"][0]["status"], "passed");
    }

    #[test]
    fn test_write_to_unwritable_root_errors() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let doc = compile("completed", None, Vec::new(), true, Performance::default());
        let err = write_results(&doc, blocker.path()).unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));
    }
}
