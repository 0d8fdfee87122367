use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use serde::Serialize;
use tracing::info;

use crate::config::load_config;
use crate::cors::{CorsHeaders, CorsRouteTable, EffectiveCors, OriginSpec};

/// Command-line interface for brrtcors
///
/// Validates CORS configuration files and shows the headers a request would
/// receive.
#[derive(Debug, Parser)]
#[command(name = "brrtcors")]
#[command(about = "Route-aware CORS policy checker", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge and validate a configuration file, then list every route policy
    Check {
        /// Configuration file (.yaml, .yml, .toml or .json)
        #[arg(short, long, env = "BRRTCORS_CONFIG")]
        config: PathBuf,
    },
    /// Print the CORS headers a request would receive, as JSON
    Resolve {
        /// Configuration file (.yaml, .yml, .toml or .json)
        #[arg(short, long, env = "BRRTCORS_CONFIG")]
        config: PathBuf,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, optionally with a query string
        #[arg(short, long)]
        path: String,

        /// `Origin` request header
        #[arg(short, long)]
        origin: Option<String>,

        /// `Access-Control-Request-Method` request header
        #[arg(short = 'r', long)]
        request_method: Option<String>,
    },
}

/// JSON printed by `resolve`.
#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    /// Route key that decided the policy; `None` when the fallback applied
    route: Option<&'a str>,
    enabled: bool,
    preflight: bool,
    headers: CorsHeaders,
}

/// Load, merge and validate a configuration file.
pub fn build_table(config: &std::path::Path) -> anyhow::Result<CorsRouteTable> {
    let loaded = load_config(config)?;
    CorsRouteTable::from_config(&loaded)
        .with_context(|| format!("invalid CORS configuration in '{}'", config.display()))
}

/// Run a parsed command, writing its output to `out`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, fails validation,
/// or the request method is not a valid HTTP method.
pub fn run_cli(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { config } => {
            let table = build_table(&config)?;
            writeln!(
                out,
                "global\t{}\tallRoutes={}",
                describe(table.global_policy()),
                table.all_routes()
            )?;
            for (key, _address, policy, source) in table.routes() {
                writeln!(out, "{}\t{}\t{}", key, describe(policy), source)?;
            }
            info!(
                config = %config.display(),
                routes = table.len(),
                "CORS configuration is valid"
            );
            Ok(())
        }
        Commands::Resolve {
            config,
            method,
            path,
            origin,
            request_method,
        } => {
            let table = build_table(&config)?;
            let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
                .with_context(|| format!("'{}' is not an HTTP method", method))?;

            let lookup = CorsRouteTable::lookup_method(&method, request_method.as_deref());
            let (route, enabled) = match &lookup {
                Some(m) => (
                    table.matched_route(m, &path),
                    table.policy_for(m, &path).is_enabled(),
                ),
                None => (None, false),
            };

            let headers =
                table.resolve(&method, &path, origin.as_deref(), request_method.as_deref());
            let output = ResolveOutput {
                route,
                enabled,
                preflight: headers.is_preflight(),
                headers,
            };
            serde_json::to_writer_pretty(&mut *out, &output)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

/// One-line summary of a policy for `check` output.
fn describe(policy: &EffectiveCors) -> String {
    let Some(p) = policy.policy() else {
        return "disabled".to_string();
    };
    let origin = match p.response_origin() {
        OriginSpec::Any => "*".to_string(),
        OriginSpec::AnyReflected => "<reflected>".to_string(),
        OriginSpec::List(origins) => origins.join(","),
    };
    let methods: Vec<&str> = p.methods.iter().map(Method::as_str).collect();
    let mut parts = vec![
        format!("origin={}", origin),
        format!("methods={}", methods.join(",")),
    ];
    if p.credentials {
        parts.push("credentials".to_string());
    }
    if let Some(max_age) = p.max_age {
        parts.push(format!("maxAge={}", max_age));
    }
    parts.join(" ")
}
