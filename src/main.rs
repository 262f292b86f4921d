//! Feature Runner - runs a generated build's feature tests headlessly
//!
//! Usage:
//!   feature-runner run builds/door_01                  # Run tests.json against scene.json
//!   feature-runner run builds/door_01 --tests t.toml   # Run an explicit test document
//!   feature-runner template door_with_key -o builds/x  # Write a canned test document
//!   feature-runner feedback test_runs/run_.../test_results.json

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use feature_runner::constants::TESTS_FILE_JSON;
use feature_runner::testing::FEATURE_TEMPLATES;
use feature_runner::{
    BuildOptions, OverallStatus, ResultDocument, RunOutcome, RunnerConfig, format_feedback,
    install_logging, run_build, template_for,
};

/// Feature Runner - dynamic feature tests for generated game builds
#[derive(Parser, Debug)]
#[command(
    name = "feature-runner",
    about = "Drive a simulated player through declarative feature tests and report the results"
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a build directory's feature tests
    Run {
        /// Build directory holding tests.json/tests.toml and scene.json
        build_dir: PathBuf,

        /// Test document (default: tests.json or tests.toml in the build directory)
        #[arg(short, long)]
        tests: Option<PathBuf>,

        /// Scene description (default: scene.json in the build directory)
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Root directory for run_<timestamp> result directories
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Runner settings JSON (default: config/runner_settings.json, then the template)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Simulated frames per second
        #[arg(long)]
        fps: Option<f32>,

        /// Debug-level logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write or print the canned test document for a feature type
    Template {
        /// Feature type: door, pickup, door_with_key or movement
        feature: String,

        /// Build directory to write tests.json into (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the "issues to fix" summary of a result document
    Feedback {
        /// Path to test_results.json
        results: PathBuf,
    },
}

fn main() {
    let args = Args::parse();

    let code = match args.command {
        Commands::Run {
            build_dir,
            tests,
            scene,
            output,
            settings,
            fps,
            verbose,
        } => {
            install_logging(verbose);
            let mut config = load_config(settings.as_deref());
            if let Some(output) = output {
                config.output_root = output;
            }
            if let Some(fps) = fps {
                config.fps = fps;
            }

            let options = BuildOptions {
                tests,
                scene,
                minimal_threads: false,
            };
            let outcome = run_build(&build_dir, &options, &config);
            print_outcome(&outcome);

            if outcome.document.summary.overall_status == OverallStatus::Passed {
                0
            } else {
                1
            }
        }
        Commands::Template { feature, output } => write_template(&feature, output.as_deref()),
        Commands::Feedback { results } => match ResultDocument::from_file(&results) {
            Ok(doc) => {
                println!("{}", format_feedback(&doc));
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                1
            }
        },
    };

    std::process::exit(code);
}

fn load_config(settings: Option<&Path>) -> RunnerConfig {
    let Some(path) = settings else {
        return RunnerConfig::from_config_files();
    };
    RunnerConfig::from_file(path).unwrap_or_else(|e| {
        eprintln!("Could not load settings: {}, using defaults", e);
        RunnerConfig::default()
    })
}

fn print_outcome(outcome: &RunOutcome) {
    let doc = &outcome.document;
    let summary = &doc.summary;

    println!();
    println!("Feature Tests: {}", doc.feature.as_deref().unwrap_or("(unnamed)"));
    println!("==============");
    for test in &doc.tests {
        let dots = ".".repeat(40 - test.name.len().min(39));
        let verdict = if test.passed() { "PASS" } else { "FAIL" };
        println!("  {} {} {}", test.name, dots, verdict);
    }
    println!();
    println!(
        "Results: {}/{} passed ({})",
        summary.passed,
        summary.total,
        summary.overall_status.as_str()
    );
    for issue in &summary.issues {
        println!("  - {}", issue);
    }
    println!(
        "Frames: {} (avg {:.1} fps)",
        outcome.frames,
        doc.performance.avg_fps
    );
    match &outcome.written_to {
        Some(path) => println!("Results written to {}", path.display()),
        None => println!("Results were not written"),
    }
}

fn write_template(feature: &str, output: Option<&Path>) -> i32 {
    let suite = match template_for(feature) {
        Ok(suite) => suite,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Available: {}", FEATURE_TEMPLATES.join(", "));
            return 1;
        }
    };
    let json = match serde_json::to_string_pretty(&suite) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize template: {}", e);
            return 1;
        }
    };

    let Some(dir) = output else {
        println!("{}", json);
        return 0;
    };

    let path = dir.join(TESTS_FILE_JSON);
    match fs::create_dir_all(dir).and_then(|_| fs::write(&path, json)) {
        Ok(()) => {
            println!("Wrote {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("Failed to write {}: {}", path.display(), e);
            1
        }
    }
}
