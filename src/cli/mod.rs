//! CLI command handling
//!
//! Resolves configuration, runs suites and formats output.

use std::path::Path;

use colored::Colorize;

use crate::commands::{Commands, TargetArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::testing::report::{print_summary, Output};
use crate::testing::{run_suite, ScenarioEngine, ScenarioSpec, Suite, BUILTIN_SUITES};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            target,
            suite,
            suite_file,
            user_id,
            json,
        } => run(&target, &suite, suite_file.as_deref(), user_id, json).await,

        Commands::List => {
            list();
            Ok(())
        }

        Commands::Probe { target } => probe(&target).await,
    }
}

/// Build the effective configuration: defaults, then the config file, then
/// the environment, then command-line flags
pub fn load_config(target: &TargetArgs) -> Result<Config> {
    let mut config = match &target.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env();
    apply_overrides(&mut config, target);
    Ok(config)
}

fn apply_overrides(config: &mut Config, target: &TargetArgs) {
    if let Some(url) = &target.backend_url {
        config.backend.http_url = url.clone();
    }
    if let Some(url) = &target.ws_url {
        config.backend.ws_url = url.clone();
    }
    if let Some(url) = &target.database_url {
        config.database.url = Some(url.clone());
    }
}

/// Pick the user id: flag, then suite, then config
fn resolve_user_id(flag: Option<String>, suite: &Suite, config: &Config) -> String {
    flag.or_else(|| suite.user_id.clone())
        .unwrap_or_else(|| config.fixture.user_id.clone())
}

async fn run(
    target: &TargetArgs,
    suite_name: &str,
    suite_file: Option<&Path>,
    user_id: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(target)?;
    let suite = match suite_file {
        Some(path) => Suite::load(path)?,
        None => Suite::builtin(suite_name)?,
    };
    let user_id = resolve_user_id(user_id, &suite, &config);

    tracing::debug!(
        backend = %config.backend.http_url,
        ws = %config.backend.ws_url,
        database = config.database.url.is_some(),
        "Resolved configuration"
    );

    let output = if json { Output::Silent } else { Output::Human };
    let backend_url = config.backend.http_url.clone();
    let engine = ScenarioEngine::from_config(config)?.with_output(output);

    let summary = run_suite(&engine, &suite, &user_id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
    } else {
        print_summary(&summary, &suite, &backend_url);
    }

    if summary.success() {
        Ok(())
    } else {
        Err(Error::RunFailed {
            failed: summary.failed(),
            total: summary.total(),
        })
    }
}

fn list() {
    println!("{}", "Built-in suites:".cyan());
    for (name, _) in BUILTIN_SUITES {
        match Suite::builtin(name) {
            Ok(suite) => {
                println!(
                    "  {:<10} {} ({} scenarios)",
                    name.green(),
                    suite.name,
                    suite.scenarios.len()
                );
                if let Some(desc) = &suite.description {
                    println!("  {:<10} {}", "", desc.dimmed());
                }
            }
            Err(e) => println!("  {:<10} {}", name.red(), e),
        }
    }
}

/// Reachability-only suite; the database is checked only when configured
fn probe_suite(config: &Config) -> Suite {
    let mut scenarios = vec![
        ScenarioSpec::BackendHealth,
        ScenarioSpec::AudioEndpoint,
        ScenarioSpec::WebsocketConnection {
            await_response: false,
            timeout: None,
        },
    ];
    if config.database.url.is_some() {
        scenarios.push(ScenarioSpec::DatabaseConnection);
    }

    Suite {
        name: "Probe".to_string(),
        description: Some("Reachability of the backend, WebSocket endpoint and database".to_string()),
        user_id: None,
        scenarios,
        next_steps: vec![
            "Run 'meetcheck run' for the full recording workflow".to_string(),
            "Run 'meetcheck list' to see the other built-in suites".to_string(),
        ],
    }
}

async fn probe(target: &TargetArgs) -> Result<()> {
    let config = load_config(target)?;
    let suite = probe_suite(&config);
    let user_id = config.fixture.user_id.clone();
    let backend_url = config.backend.http_url.clone();

    let engine = ScenarioEngine::from_config(config)?;
    let summary = run_suite(&engine, &suite, &user_id).await;
    print_summary(&summary, &suite, &backend_url);

    if summary.success() {
        Ok(())
    } else {
        Err(Error::RunFailed {
            failed: summary.failed(),
            total: summary.total(),
        })
    }
}
