//! End-to-end dispatch: routes, handlers, templates and layouts.

use axum::http::Method;
use serde_json::json;

use trellis::action::{ActionError, ActionResult, Controller};
use trellis::app::{App, Outcome, RegistrationError, RequestError, RequestInfo};
use trellis::config::{AppConfig, RouteConfig};
use trellis::render::{ContentType, Context, LayoutSetting, Render, RenderError, Response};
use trellis::routing::{Params, RouteOptions};

mod common;

fn get(app: &App, path: &str) -> Outcome {
    app.handle(RequestInfo::new(Method::GET, path)).unwrap()
}

fn handled(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Handled(response) => response,
        Outcome::NotFound => panic!("expected a matching route"),
    }
}

/// Respond with the bound values joined by commas.
fn echo(params: &Params, ctx: &mut Context) -> ActionResult {
    let values: Vec<_> = params.values().collect();
    let _ = ctx.render(Render::plain(values.join(",")))?;
    Ok(())
}

fn artists() -> Controller {
    Controller::new("artists")
        .action("show", |params: &Params, ctx: &mut Context| -> ActionResult {
            ctx.assign("name", params.get("name").unwrap_or_default());
            Ok(())
        })
        .action("list", |_: &Params, ctx: &mut Context| -> ActionResult {
            ctx.assign("artists", json!(["Queen", "Blur"]));
            let _ = ctx.render(Render::template("list").and_continue())?;
            Ok(())
        })
}

#[test]
fn test_named_params_bind_in_order() {
    let mut builder = App::builder(AppConfig::default());
    builder.get("/artist/:name/:track_id([0-9]+)", echo).unwrap();
    let app = builder.build();

    let response = handled(get(&app, "/artist/queen/12"));
    assert_eq!(response.body, "queen,12");
    assert_eq!(response.content_type, Some(ContentType::Plain));
    assert!(matches!(get(&app, "/artist/queen/twelve"), Outcome::NotFound));
}

#[test]
fn test_param_stays_within_one_segment() {
    let mut builder = App::builder(AppConfig::default());
    builder.get("/track/:id", echo).unwrap();
    let app = builder.build();

    assert_eq!(handled(get(&app, "/track/4d6172")).body, "4d6172");
    assert!(matches!(get(&app, "/track/4d/61"), Outcome::NotFound));
}

#[test]
fn test_custom_sub_pattern() {
    let mut builder = App::builder(AppConfig::default());
    builder.get("/artist/:age([0-9]{3})", echo).unwrap();
    let app = builder.build();

    assert_eq!(handled(get(&app, "/artist/123")).body, "123");
    assert!(matches!(get(&app, "/artist/12"), Outcome::NotFound));
    assert!(matches!(get(&app, "/artist/abc"), Outcome::NotFound));
}

#[test]
fn test_trailing_slash_is_optional() {
    let mut builder = App::builder(AppConfig::default());
    builder.get("/artist/:name", echo).unwrap();
    let app = builder.build();

    assert_eq!(handled(get(&app, "/artist/queen")).body, "queen");
    assert_eq!(handled(get(&app, "/artist/queen/")).body, "queen");
}

#[test]
fn test_first_registered_route_wins() {
    let mut builder = App::builder(AppConfig::default());
    builder
        .get("/artist/:name", echo)
        .unwrap()
        .get("/artist/queen", |_: &Params, ctx: &mut Context| -> ActionResult {
            let _ = ctx.render(Render::plain("specific"))?;
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    assert_eq!(handled(get(&app, "/artist/queen")).body, "queen");
}

#[test]
fn test_method_must_match() {
    let mut builder = App::builder(AppConfig::default());
    builder.post("/artists", echo).unwrap();
    let app = builder.build();

    assert!(matches!(get(&app, "/artists"), Outcome::NotFound));
    let outcome = app
        .handle(RequestInfo::new(Method::POST, "/artists"))
        .unwrap();
    assert!(matches!(outcome, Outcome::Handled(_)));
}

#[test]
fn test_controller_action_auto_renders() {
    let site = common::music_site();
    let mut builder = App::builder(common::config_for(site.path())).controller(artists());
    builder
        .action(Method::GET, "/artists/:name", "artists#show")
        .unwrap();
    let app = builder.build();

    let response = handled(get(&app, "/artists/Queen"));
    assert_eq!(response.body, "<body><h1>Queen</h1></body>");
    assert_eq!(response.content_type, Some(ContentType::Html));
    assert_eq!(response.status, 200);
}

#[test]
fn test_explicit_render_is_not_repeated() {
    let site = common::music_site();
    let mut builder = App::builder(common::config_for(site.path())).controller(artists());
    builder.action(Method::GET, "/artists", "artists#list").unwrap();
    let app = builder.build();

    let response = handled(get(&app, "/artists"));
    assert_eq!(response.body, "<body>Queen;Blur;</body>");
}

#[test]
fn test_config_view_routes() {
    let site = common::music_site();
    let mut config = common::config_for(site.path());
    config.routes = vec![
        RouteConfig {
            method: "GET".to_string(),
            path: "/about/:page".to_string(),
            action: None,
            template: Some("about".to_string()),
            layout: None,
            templates_sub_dir: None,
        },
        RouteConfig {
            method: "GET".to_string(),
            path: "/admin/about/:page".to_string(),
            action: None,
            template: Some("about".to_string()),
            layout: Some(LayoutSetting::from("admin")),
            templates_sub_dir: None,
        },
        RouteConfig {
            method: "GET".to_string(),
            path: "/bare/about/:page".to_string(),
            action: None,
            template: Some("about".to_string()),
            layout: Some(LayoutSetting::from(false)),
            templates_sub_dir: None,
        },
    ];

    let mut builder = App::builder(config);
    builder.register_config_routes().unwrap();
    let app = builder.build();

    assert_eq!(handled(get(&app, "/about/team")).body, "<body>About team</body>");
    assert_eq!(
        handled(get(&app, "/admin/about/team")).body,
        "<admin>About team</admin>"
    );
    assert_eq!(handled(get(&app, "/bare/about/team")).body, "About team");
}

#[test]
fn test_template_resolution_precedence() {
    let site = common::music_site();
    let options = RouteOptions {
        templates_sub_dir: Some("artists".to_string()),
        ..RouteOptions::default()
    };
    let mut builder = App::builder(common::config_for(site.path()));
    builder
        .route(
            Method::GET,
            "/mixed/:id",
            trellis::action::HandlerRef::closure(|_: &Params, ctx: &mut Context| -> ActionResult {
                ctx.assign("name", "Blur");
                // Bare name: under the sub-directory.
                let _ = ctx.render(Render::partial("show"))?;
                // Internal separator: relative to the templates root.
                let _ = ctx.render(Render::partial("shared/footer"))?;
                // Leading separator: relative to the root, sub-directory ignored.
                let _ = ctx.render(Render::partial("/partials/badge"))?;
                Ok(())
            }),
            options,
        )
        .unwrap();
    let app = builder.build();

    let response = handled(get(&app, "/mixed/7"));
    assert_eq!(response.body, "<h1>Blur</h1>footer[7]");
}

#[test]
fn test_missing_template_fails_without_output() {
    let site = common::music_site();
    let mut builder = App::builder(common::config_for(site.path()));
    builder
        .get("/ghost", |_: &Params, ctx: &mut Context| -> ActionResult {
            let _ = ctx.render("ghost")?;
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    let err = app
        .handle(RequestInfo::new(Method::GET, "/ghost"))
        .unwrap_err();
    let RequestError::Handler { source, .. } = &err;
    assert!(matches!(source, ActionError::Render(e) if e.is_template_not_found()));
}

#[test]
fn test_invalid_render_options_fail_the_request() {
    let mut builder = App::builder(AppConfig::default());
    builder
        .get("/bad", |_: &Params, ctx: &mut Context| -> ActionResult {
            let _ = ctx.render_value(json!({ "plain": "a", "html": "b" }), None)?;
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    let RequestError::Handler { source, .. } = app
        .handle(RequestInfo::new(Method::GET, "/bad"))
        .unwrap_err();
    assert!(matches!(
        source,
        ActionError::Render(RenderError::InvalidArgument(_))
    ));
}

#[test]
fn test_redirect_halts_auto_render() {
    let site = common::music_site();
    let mut config = common::config_for(site.path());
    config.site.base_url = Some("https://music.test/".to_string());

    let controller = Controller::new("artists").action(
        "legacy",
        |_: &Params, ctx: &mut Context| -> ActionResult {
            let _ = ctx.redirect("/artists");
            Ok(())
        },
    );
    let mut builder = App::builder(config).controller(controller);
    builder
        .action(Method::GET, "/old-artists", "artists#legacy")
        .unwrap();
    let app = builder.build();

    let response = handled(get(&app, "/old-artists"));
    assert_eq!(response.status, 302);
    assert_eq!(response.header("Location"), Some("https://music.test/artists"));
    assert!(response.body.is_empty());
}

#[test]
fn test_json_response_with_status() {
    let mut builder = App::builder(AppConfig::default());
    builder
        .post("/artists", |_: &Params, ctx: &mut Context| -> ActionResult {
            let _ = ctx.render(Render::json(json!({ "created": true })).with_status(201))?;
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    let response = handled(
        app.handle(RequestInfo::new(Method::POST, "/artists"))
            .unwrap(),
    );
    assert_eq!(response.status, 201);
    assert_eq!(response.content_type, Some(ContentType::Json));
    let value: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(value, json!({ "created": true }));
}

#[test]
fn test_unknown_action_rejected_at_registration() {
    let mut builder = App::builder(AppConfig::default()).controller(artists());
    let err = builder
        .action(Method::GET, "/artists/:name", "artists#destroy")
        .unwrap_err();
    assert!(matches!(err, RegistrationError::HandlerNotInvocable(_)));
    assert!(builder.build().table().is_empty());
}

#[test]
fn test_app_helper_available_in_templates() {
    let site = common::template_tree(&[("views/shout.html.tpl", "<%= shout(word) %>")]);
    let mut builder = App::builder(common::config_for(site.path())).helper("shout", |args| {
        let word = args.first().and_then(|v| v.as_str()).unwrap_or_default();
        Ok(json!(format!("{}!", word.to_uppercase())))
    });
    builder
        .get("/shout/:word", |params: &Params, ctx: &mut Context| -> ActionResult {
            ctx.data_mut().extend(params.to_data());
            let _ = ctx.render(Render::template("shout").without_layout())?;
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    assert_eq!(handled(get(&app, "/shout/hey")).body, "HEY!");
}
