//! CLI argument definitions and one-shot command handlers.
//!
//! Binary name: `relayd`

use clap::{Parser, Subcommand};

use relay_core::sweeper::sweep_once;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "relayd", about = "Multi-tenant chat relay", version)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output for one-shot commands
    #[arg(long, global = true)]
    pub json: bool,

    /// Export spans via OpenTelemetry (stdout exporter)
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay server
    Serve {
        /// Bind address (overrides config.toml)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config.toml)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Delete expired sessions once and exit
    Sweep,

    /// List registered tenants
    Tenants,
}

/// Map verbosity flags to an EnvFilter directive string.
///
/// Per-crate directives must use the module-path form of the crate names
/// (underscores, not hyphens) or EnvFilter silently matches nothing.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,relay_core=debug,relay_infra=debug,relay_api=debug",
        _ => "trace",
    }
}

/// One-shot expiry sweep for cron or operator use.
pub async fn sweep(state: &AppState) -> anyhow::Result<()> {
    let store = state.session_store();
    sweep_once(&store).await;
    Ok(())
}

/// Print the registered tenant ids and display names.
pub fn tenants(state: &AppState, json: bool) -> anyhow::Result<()> {
    let entries = state.tenants.list();

    if json {
        let list: Vec<serde_json::Value> = entries
            .iter()
            .map(|(id, name)| serde_json::json!({ "id": id, "displayName": name }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!(
            "  {} No tenants registered; all connections get the generic bundle.",
            console::style("i").bold()
        );
        println!();
        return Ok(());
    }

    println!();
    for (id, name) in &entries {
        println!(
            "  {}  {}",
            console::style(id).cyan(),
            console::style(name).dim()
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter(0, true), "error");
        assert_eq!(log_filter(0, false), "warn");
        assert_eq!(log_filter(2, false), "trace");
        assert_eq!(log_filter(5, false), "trace");
    }

    #[test]
    fn test_verbose_filter_targets_use_module_paths() {
        let filter = log_filter(1, false);
        for target in ["relay_core=debug", "relay_infra=debug", "relay_api=debug"] {
            assert!(filter.contains(target), "missing directive: {target}");
        }
        // Hyphenated crate names never match as EnvFilter targets.
        assert!(!filter.contains("relay-"));
    }
}
