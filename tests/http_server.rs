//! HTTP surface over a real listener.

use std::sync::Arc;

use axum::http::Method;
use serde_json::json;

use trellis::action::{ActionResult, Controller};
use trellis::render::{Context, Render};
use trellis::routing::Params;
use trellis::App;

mod common;

fn app(root: &std::path::Path) -> Arc<App> {
    let controller = Controller::new("artists")
        .action("show", |params: &Params, ctx: &mut Context| -> ActionResult {
            ctx.assign("name", params.get("name").unwrap_or_default());
            Ok(())
        })
        .action("search", |_: &Params, ctx: &mut Context| -> ActionResult {
            let q = ctx.request().query("q").unwrap_or_default().to_string();
            let _ = ctx.render(Render::json(json!({ "q": q })))?;
            Ok(())
        });

    let mut builder = App::builder(common::config_for(root)).controller(controller);
    builder
        .action(Method::GET, "/artists/search", "artists#search")
        .unwrap()
        .action(Method::GET, "/artists/:name", "artists#show")
        .unwrap();
    Arc::new(builder.build())
}

#[tokio::test]
async fn test_serves_rendered_pages() {
    let site = common::music_site();
    let (addr, shutdown) = common::start_server(app(site.path())).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{}/artists/Queen", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(res.text().await.unwrap(), "<body><h1>Queen</h1></body>");

    shutdown.trigger();
}

#[tokio::test]
async fn test_query_and_json() {
    let site = common::music_site();
    let (addr, shutdown) = common::start_server(app(site.path())).await;

    let res = reqwest::get(format!("http://{}/artists/search?q=brian%20may", addr))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "q": "brian may" }));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_path_is_404() {
    let site = common::music_site();
    let (addr, shutdown) = common::start_server(app(site.path())).await;

    let res = reqwest::get(format!("http://{}/albums/1", addr))
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "No matching route found");

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_template_is_500() {
    let site = common::template_tree(&[("views/layouts/main.html.tpl", "{{yield}}")]);
    let (addr, shutdown) = common::start_server(app(site.path())).await;

    let res = reqwest::get(format!("http://{}/artists/Queen", addr))
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    shutdown.trigger();
}
