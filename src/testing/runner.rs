//! Suite runner
//!
//! Runs a suite's scenarios strictly in order, one at a time, and collects
//! one result per scenario. A failing scenario never stops the run; later
//! scenarios that depend on its outcome fail their own precondition instead.

use serde::Serialize;
use serde_json::json;

use super::config::Suite;
use super::report::{print_scenario_result, print_scenario_start, print_suite_header, Output};
use super::scenario::{ScenarioEngine, ScenarioResult};
use super::session::Session;

/// Results of one suite run, in scenario order
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub suite: String,
    pub user_id: String,
    pub results: Vec<ScenarioResult>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// True when every scenario passed
    pub fn success(&self) -> bool {
        self.passed() == self.total()
    }

    /// Machine-readable form printed by `run --json`
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "suite": self.suite,
            "userId": self.user_id,
            "passed": self.passed(),
            "total": self.total(),
            "success": self.success(),
            "results": self.results,
        })
    }
}

/// Run every scenario of `suite` as `user_id`
///
/// The meeting id confirmed by the most recent meeting-creating scenario is
/// handed to the scenarios that consume one. A creating scenario that did
/// not get a confirmation clears it, so consumers never see a stale id.
pub async fn run_suite(engine: &ScenarioEngine, suite: &Suite, user_id: &str) -> RunSummary {
    let human = engine.output() == Output::Human;
    if human {
        print_suite_header(suite);
    }

    tracing::info!(suite = %suite.name, user_id, scenarios = suite.scenarios.len(), "Starting suite");

    let mut carried: Option<String> = None;
    let mut results = Vec::with_capacity(suite.scenarios.len());

    for spec in &suite.scenarios {
        if human {
            print_scenario_start(spec.name());
        }

        let session = if spec.uses_meeting() {
            Session::new(user_id).with_meeting_id(carried.clone())
        } else {
            Session::new(user_id)
        };

        let (result, session) = engine.run(spec, session).await;

        if spec.creates_meeting() {
            carried = session.meeting_id().map(str::to_string);
        }

        tracing::info!(
            scenario = %result.name,
            passed = result.passed,
            elapsed_ms = result.elapsed_ms,
            "Scenario finished"
        );
        if human {
            print_scenario_result(&result);
        }
        results.push(result);
    }

    RunSummary {
        suite: suite.name.clone(),
        user_id: user_id.to_string(),
        results,
    }
}
