use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use trellis::app::RequestInfo;
use trellis::config::{load_config, AppConfig, RouteConfig};
use trellis::render::{Context, LayoutSetting, Render, Renderer};
use trellis::routing::{Dispatch, DispatchTable, Params, RouteOptions};

#[derive(Parser)]
#[command(name = "trellis-cli")]
#[command(about = "Inspect routes and render templates offline", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiled route table
    Routes,
    /// Show which route a request would hit and its parameter bindings
    Match {
        method: String,
        path: String,
    },
    /// Render a template with optional JSON data
    Render {
        name: String,
        /// Template data as a JSON object
        #[arg(long)]
        data: Option<String>,
        /// Layout to use instead of the configured default
        #[arg(long, conflicts_with = "no_layout")]
        layout: Option<String>,
        /// Render without a layout
        #[arg(long)]
        no_layout: bool,
        /// Sub-directory searched for bare template names
        #[arg(long)]
        sub_dir: Option<String>,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Routes => {
            let table = route_table(&config)?;
            for entry in table.entries() {
                println!(
                    "{:<7} {:<32} {:<40} -> {}",
                    entry.method().as_str(),
                    entry.pattern().spec(),
                    entry.pattern().expression(),
                    entry.handler()
                );
            }
        }
        Commands::Match { method, path } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let table = route_table(&config)?;
            match table.dispatch(&method, &path) {
                Dispatch::Matched { entry, params } => {
                    println!("{} {} -> {}", entry.method(), entry.pattern(), entry.handler());
                    for (name, value) in params.iter() {
                        println!("  {} = {}", name, value);
                    }
                }
                Dispatch::NotFound => {
                    eprintln!("No route matches {} {}", method, path);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Render {
            name,
            data,
            layout,
            no_layout,
            sub_dir,
        } => {
            let data: Map<String, Value> = match data {
                Some(text) => serde_json::from_str(&text)?,
                None => Map::new(),
            };
            let layout = match (layout, no_layout) {
                (_, true) => Some(LayoutSetting::Enabled(false)),
                (Some(name), false) => Some(LayoutSetting::Named(name)),
                (None, false) => None,
            };
            let options = RouteOptions {
                layout,
                templates_sub_dir: sub_dir,
            };

            let renderer = Arc::new(Renderer::from_config(&config));
            let request = RequestInfo::new(Method::GET, "/");
            let mut ctx = Context::new(renderer, request, Params::new(), &options);
            let _ = ctx.render(Render::template(name).with_data(data))?;
            print!("{}", ctx.into_response().body);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Compile the configured routes, labelled with their action or template.
fn route_table(config: &AppConfig) -> Result<DispatchTable<String>, Box<dyn std::error::Error>> {
    let mut table = DispatchTable::new();
    for route in &config.routes {
        let method = Method::from_bytes(route.method.to_ascii_uppercase().as_bytes())?;
        table.register(method, &route.path, describe(route), RouteOptions::default())?;
    }
    Ok(table)
}

fn describe(route: &RouteConfig) -> String {
    match (&route.action, &route.template) {
        (Some(action), _) => action.clone(),
        (None, Some(template)) => format!("view:{}", template),
        (None, None) => "<none>".to_string(),
    }
}
