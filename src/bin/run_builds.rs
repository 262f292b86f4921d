//! Batch runner for build directories
//!
//! Usage:
//!   cargo run --bin run-builds -- builds/            # Run every build under builds/
//!   cargo run --bin run-builds -- builds/ door       # Only builds whose name contains "door"
//!   cargo run --bin run-builds -- builds/ --verbose  # Show issues on failure

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use feature_runner::testing::find_suite_file;
use feature_runner::{BuildOptions, OverallStatus, RunOutcome, RunnerConfig, install_logging, run_build};

/// Run the feature tests of every build directory under a root
#[derive(Parser, Debug)]
#[command(name = "run-builds")]
struct Args {
    /// Directory whose subdirectories are builds
    root: PathBuf,

    /// Only run builds whose path contains this text
    filter: Option<String>,

    /// Show every issue for failed builds
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    install_logging(false);

    println!("Feature Builds");
    println!("==============\n");

    if !args.root.is_dir() {
        println!("No build directory found at {}", args.root.display());
        std::process::exit(1);
    }

    let builds = discover_builds(&args.root, args.filter.as_deref());
    if builds.is_empty() {
        println!("No builds with tests.json or tests.toml found.");
        if let Some(f) = &args.filter {
            println!("Filter: {}", f);
        }
        std::process::exit(1);
    }

    let config = RunnerConfig::from_config_files();
    let options = BuildOptions {
        minimal_threads: true,
        ..Default::default()
    };

    let mut passed = 0;
    let mut failed = 0;

    for build in &builds {
        let name = build
            .strip_prefix(&args.root)
            .unwrap_or(build)
            .to_string_lossy()
            .to_string();

        let outcome = run_build(build, &options, &config);
        if outcome.document.summary.overall_status == OverallStatus::Passed {
            passed += 1;
        } else {
            failed += 1;
        }
        print_result(&name, &outcome, args.verbose);
    }

    println!("\n==============");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn discover_builds(root: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut builds: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && find_suite_file(path).is_some())
        .filter(|path| match filter {
            Some(f) => path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .contains(f),
            None => true,
        })
        .collect();
    builds.sort();
    builds
}

fn print_result(name: &str, outcome: &RunOutcome, verbose: bool) {
    let dots = ".".repeat(40 - name.len().min(39));
    let summary = &outcome.document.summary;
    let verdict = match summary.overall_status {
        OverallStatus::Passed => "PASS",
        OverallStatus::Failed => "FAIL",
        OverallStatus::NoPlayer => "NO PLAYER",
    };

    println!(
        "  {} {} {} ({}/{})",
        name, dots, verdict, summary.passed, summary.total
    );

    if summary.overall_status == OverallStatus::Passed {
        return;
    }
    if verbose {
        for issue in &summary.issues {
            println!("    {}", issue);
        }
    } else if let Some(first) = summary.issues.first() {
        println!("    {}", first);
    }
}
