//! Plain-text feedback for the next generation round

use super::results::{OverallStatus, ResultDocument};

/// Render a result document as an "issues to fix" summary
pub fn format_feedback(doc: &ResultDocument) -> String {
    let summary = &doc.summary;
    let mut lines = vec![format!("Tests: {}/{} passed", summary.passed, summary.total)];

    if summary.overall_status == OverallStatus::Passed {
        lines.push("\nAll tests passing! Feature is working.".to_string());
        return lines.join("\n");
    }

    lines.push("\nISSUES TO FIX:".to_string());

    if summary.overall_status == OverallStatus::NoPlayer {
        lines.push(format!("\nScene: {}", super::results::NO_PLAYER_ISSUE));
    }

    for test in doc.tests.iter().filter(|t| !t.passed()) {
        lines.push(format!("\n{}: FAILED", test.name));
        for issue in &test.issues {
            lines.push(format!("  - {}", issue));
        }
    }

    lines.join("\n")
}
