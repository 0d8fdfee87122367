//! Unit tests for CLI commands

use std::io::Write as _;

use clap::Parser;

use crate::cli::{run_cli, Cli, Commands};

const CONFIG: &str = r#"
cors:
  allRoutes: false
  origin: "*"
routes:
  "PUT /cors-true": { cors: true }
  "/origin-example-com": { cors: { origin: "http://example.com", maxAge: 60 } }
  "GET /legacy": { cors: false }
"#;

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    run_cli(cli, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_check_command_parses() {
    let cli = Cli::try_parse_from(["brrtcors", "check", "--config", "cors.yaml"]).unwrap();
    match cli.command {
        Commands::Check { config } => assert_eq!(config.to_string_lossy(), "cors.yaml"),
        _ => panic!("Expected Check command"),
    }
}

#[test]
fn test_resolve_command_with_flags() {
    let cli = Cli::try_parse_from([
        "brrtcors",
        "resolve",
        "-c",
        "cors.toml",
        "-m",
        "OPTIONS",
        "-p",
        "/widgets",
        "-o",
        "http://example.com",
        "-r",
        "PUT",
    ])
    .unwrap();
    match cli.command {
        Commands::Resolve {
            method,
            path,
            origin,
            request_method,
            ..
        } => {
            assert_eq!(method, "OPTIONS");
            assert_eq!(path, "/widgets");
            assert_eq!(origin.as_deref(), Some("http://example.com"));
            assert_eq!(request_method.as_deref(), Some("PUT"));
        }
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_resolve_requires_path() {
    assert!(Cli::try_parse_from(["brrtcors", "resolve", "--config", "x.yaml"]).is_err());
}

#[test]
fn test_check_lists_routes_in_order() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let out = run(&["brrtcors", "check", "--config", path]).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("global\torigin=*"), "{out}");
    assert!(lines[1].starts_with("PUT /cors-true\t"), "{out}");
    assert!(lines[2].contains("origin=http://example.com"), "{out}");
    assert!(lines[2].contains("maxAge=60"), "{out}");
    assert!(lines[3].contains("disabled"), "{out}");
}

#[test]
fn test_check_rejects_unsafe_config() {
    let file = config_file(
        r#"
cors:
  allRoutes: true
  origin: "*"
  credentials: true
"#,
    );
    let path = file.path().to_str().unwrap();
    let err = run(&["brrtcors", "check", "--config", path]).unwrap_err();
    let cors_err = err
        .downcast_ref::<crate::cors::CorsConfigError>()
        .expect("CORS error in chain");
    assert!(cors_err.is_unsafe());
}

#[test]
fn test_resolve_prints_preflight_json() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let out = run(&[
        "brrtcors",
        "resolve",
        "--config",
        path,
        "--method",
        "options",
        "--path",
        "/origin-example-com?x=1",
        "--origin",
        "http://example.com",
        "--request-method",
        "POST",
    ])
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["route"], "/origin-example-com");
    assert_eq!(json["preflight"], true);
    assert_eq!(
        json["headers"]["access-control-allow-origin"],
        "http://example.com"
    );
    assert_eq!(json["headers"]["access-control-max-age"], "60");
    assert_eq!(json["headers"]["vary"], "Origin");
}

#[test]
fn test_resolve_unmatched_route() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let out = run(&[
        "brrtcors",
        "resolve",
        "--config",
        path,
        "--path",
        "/nowhere",
        "--origin",
        "http://example.com",
    ])
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(json["route"].is_null());
    assert_eq!(json["enabled"], false);
    assert_eq!(json["headers"], serde_json::json!({}));
}

#[test]
fn test_resolve_preflight_reports_route_for_requested_method() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let resolve = |requested: &str| {
        let out = run(&[
            "brrtcors",
            "resolve",
            "--config",
            path,
            "--method",
            "OPTIONS",
            "--path",
            "/cors-true",
            "--origin",
            "http://example.com",
            "--request-method",
            requested,
        ])
        .unwrap();
        serde_json::from_str::<serde_json::Value>(&out).unwrap()
    };

    let json = resolve("put");
    assert_eq!(json["route"], "PUT /cors-true");
    assert_eq!(json["enabled"], true);
    assert_eq!(json["preflight"], true);

    let json = resolve("NOT VALID");
    assert!(json["route"].is_null());
    assert_eq!(json["enabled"], false);
    assert_eq!(json["headers"], serde_json::json!({}));
}
