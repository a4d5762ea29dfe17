//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;

use trellis::config::AppConfig;
use trellis::{App, HttpServer, Shutdown};

/// Write `files` (relative path, contents) under a fresh temporary root.
pub fn template_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, body) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
    dir
}

/// Default configuration with templates rooted at `root`.
pub fn config_for(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.templates.root_dir = root.to_path_buf();
    config
}

/// A small music site: layouts, controller views, shared partials.
#[allow(dead_code)]
pub fn music_site() -> TempDir {
    template_tree(&[
        ("views/layouts/main.html.tpl", "<body>{{yield}}</body>"),
        ("views/layouts/admin.html.tpl", "<admin>{{yield}}</admin>"),
        ("views/index.html.tpl", "Welcome"),
        ("views/about.html.tpl", "About <%= page %>"),
        ("views/artists/show.html.tpl", "<h1><%= name %></h1>"),
        (
            "views/artists/list.html.tpl",
            "<% for a in artists %><%= a %>;<% end %>",
        ),
        ("views/shared/footer.html.tpl", "footer"),
        ("partials/badge.html.tpl", "[<%= param(\"id\") %>]"),
    ])
}

/// Serve `app` on an ephemeral port. Trigger the returned `Shutdown` to stop.
#[allow(dead_code)]
pub async fn start_server(app: Arc<App>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = HttpServer::new(app).run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}
