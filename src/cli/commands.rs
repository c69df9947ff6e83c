use crate::config::load_router;
use crate::echo::EchoResolver;
use crate::router::Router;
use crate::server::{Request, RouterService};
use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line interface for routeshift
///
/// Inspects route-table files: lists routes, dispatches a sample request
/// against echo handlers, and reverses routes into paths.
#[derive(Parser)]
#[command(name = "routeshift")]
#[command(about = "Inspect and exercise routeshift route tables", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List the routes of a table in dispatch order
    Routes {
        /// Route-table file (YAML or JSON)
        #[arg(short, long)]
        table: PathBuf,
    },
    /// Dispatch a request against a table with echo handlers
    Match {
        /// Route-table file (YAML or JSON)
        #[arg(short, long)]
        table: PathBuf,

        /// HTTP method
        #[arg(short, long, default_value = "GET", value_parser = parse_method)]
        method: Method,

        /// Request target, optionally with a query string
        path: String,
    },
    /// Build a path from a route's template
    Reverse {
        /// Route-table file (YAML or JSON)
        #[arg(short, long)]
        table: PathBuf,

        /// View name (handler identifier) of the route
        name: String,

        /// Template variable as `name=value`; repeatable
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Text appended verbatim after the template
        #[arg(long)]
        suffix: Option<String>,
    },
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got {s:?}"))
}

fn load(table: &Path) -> anyhow::Result<Router> {
    load_router(table, Arc::new(EchoResolver::new()))
}

/// Run a parsed command and return what it would print
pub fn execute(cli: &Cli) -> anyhow::Result<String> {
    let mut out = String::new();
    match &cli.command {
        Commands::Routes { table } => {
            let router = load(table)?;
            router.dump_routes();
            for route in router.routes() {
                let methods = route
                    .methods()
                    .map(|ms| ms.iter().map(Method::as_str).collect::<Vec<_>>().join(","))
                    .unwrap_or_else(|| "*".to_string());
                writeln!(
                    out,
                    "{:>4}  {:<8} {:<40} {}",
                    route.priority(),
                    methods,
                    route.template().unwrap_or("<any>"),
                    route.view_name()
                )?;
            }
        }
        Commands::Match {
            table,
            method,
            path,
        } => {
            let service = RouterService::new(Arc::new(load(table)?));
            let mut req = Request::new(method.clone(), path);
            let candidates: Vec<String> = service
                .router()
                .matches(&req, false)
                .map(|route| {
                    format!(
                        "{} -> {}",
                        route.template().unwrap_or("<any>"),
                        route.view_name()
                    )
                })
                .collect();
            writeln!(out, "candidates: {}", candidates.join(", "))?;
            let resp = service.respond(&mut req);
            writeln!(out, "status: {}", resp.status)?;
            if let Some(location) = resp.location() {
                writeln!(out, "location: {location}")?;
            }
            let (body, _) = resp.render_body();
            writeln!(out, "{body}")?;
        }
        Commands::Reverse {
            table,
            name,
            vars,
            suffix,
        } => {
            let router = load(table)?;
            let vars: HashMap<String, String> = vars.iter().cloned().collect();
            let path = router
                .reverse(name.as_str(), &vars, suffix.as_deref())
                .with_context(|| format!("Cannot reverse {name}"))?;
            writeln!(out, "{path}")?;
        }
    }
    Ok(out)
}

/// Parse arguments, run the command and print its output
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let out = execute(&cli)?;
    print!("{out}");
    Ok(())
}
