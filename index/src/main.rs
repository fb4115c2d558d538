#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code so bad input cannot panic the driver.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use index::config::{TreeConfig, WorkloadConfig};
use index::simulation::{Simulator, SimulatorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "index=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let tree_config = match TreeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load tree configuration: {e}");
            std::process::exit(1);
        }
    };

    let workload = match WorkloadConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load workload configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: degree={}, seed={}, operations={}, key_space={}",
        tree_config.degree,
        workload.seed,
        workload.operations,
        workload.key_space
    );

    let operations = workload.operations;
    let config = SimulatorConfig {
        tree: tree_config,
        workload,
        check_interval: 1,
    };

    let mut simulator = match Simulator::new(config) {
        Ok(simulator) => simulator,
        Err(e) => {
            tracing::error!("Failed to create tree: {e}");
            std::process::exit(1);
        }
    };

    let result = simulator.run(operations);
    let stats = result.stats;

    tracing::info!(
        inserts = stats.inserts,
        updates = stats.updates,
        finds_hit = stats.finds_hit,
        finds_missed = stats.finds_missed,
        deletes_hit = stats.deletes_hit,
        deletes_missed = stats.deletes_missed,
        "workload complete"
    );
    tracing::info!(
        entries = result.final_shape.entries,
        nodes = result.final_shape.nodes,
        height = result.final_shape.height,
        "final tree shape"
    );

    if !result.passed() {
        for violation in &result.invariant_violations {
            tracing::error!(
                operation = violation.operation_index,
                context = %violation.context,
                "{}",
                violation.description
            );
        }
        tracing::error!(
            "{} invariant violations (seed {})",
            result.invariant_violations.len(),
            result.seed
        );
        std::process::exit(1);
    }
}
