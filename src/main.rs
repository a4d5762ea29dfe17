//! Trellis server.
//!
//! Serves the routes declared in a TOML configuration file. View routes render
//! their template directly; applications with controllers build their own
//! binary around `trellis::App`.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ dispatch table ──▶ handler(params, &mut Context)
//!                                                              │
//!                                                              ▼
//!     Client Response                                   render / compose
//!     ◀────────────── buffered response ◀──────────── template cache ◀── disk
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use trellis::config::{load_config, AppConfig};
use trellis::lifecycle::{shutdown_on_signal, Shutdown};
use trellis::observability::{logging, metrics};
use trellis::template::TemplateWatcher;
use trellis::{App, HttpServer};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Serve templates behind configured routes", long_about = None)]
struct Args {
    /// Configuration file (TOML). Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("trellis v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        template_root = %config.templates.root_dir.display(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut builder = App::builder(config);
    builder.register_config_routes()?;
    let app = Arc::new(builder.build());

    // Dropping the watcher stops it.
    let _watcher = if app.config().templates.watch {
        let engine = app.renderer().engine();
        Some(TemplateWatcher::new(engine.policy(), engine.cache().clone()).run()?)
    } else {
        None
    };

    let listener = TcpListener::bind(&app.config().listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let _signals = shutdown_on_signal(shutdown);

    HttpServer::new(app).run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
