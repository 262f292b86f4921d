//! Dynamic feature testing
//!
//! Loads a declarative test document, discovers the scene's interactive
//! objects once, drives the player through each test's steps, validates the
//! outcome and aggregates a result document.

pub mod assertions;
pub mod discovery;
pub mod executor;
pub mod feedback;
pub mod parser;
pub mod results;
pub mod templates;

pub use assertions::{Validation, ValidationContext, validate};
pub use discovery::{DiscoveredObject, DiscoveryRegistry, KNOWN_GROUPS, discover};
pub use executor::{FeatureRunner, RunPhase, RunState, run_executor, steering_actions};
pub use feedback::format_feedback;
pub use parser::{
    LoadedSuite, Step, SuiteSource, TestDefinition, TestSuite, ValidationSpec, find_suite_file,
    load_suite, parse_suite_file,
};
pub use results::{
    OverallStatus, Performance, ResultDocument, RunEvent, StepResult, Summary, TestMetrics,
    TestResult, TestStatus, compile, write_results,
};
pub use templates::{FEATURE_TEMPLATES, template_for};
