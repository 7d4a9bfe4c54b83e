use super::*;

const ENDPOINT: &str = "https://spacetravelling.cdn.prismic.io/api/v2";

fn raw_with_endpoint() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.prismic.api_endpoint = Some(ENDPOINT.to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_endpoint();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn api_endpoint_is_required() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing endpoint");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "prismic.api_endpoint",
            ..
        }
    ));
}

#[test]
fn prismic_defaults_match_blog_listing() {
    let settings = Settings::from_raw(raw_with_endpoint()).expect("valid settings");

    assert_eq!(settings.prismic.api_endpoint.as_str(), ENDPOINT);
    assert_eq!(settings.prismic.document_type, "posts");
    assert_eq!(settings.prismic.page_size.get(), 5);
    assert!(settings.prismic.access_token.is_none());
    assert!(settings.prismic.request_timeout.is_none());
}

#[test]
fn zero_page_size_is_rejected() {
    let mut raw = raw_with_endpoint();
    raw.prismic.page_size = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "prismic.page_size",
            ..
        }
    ));
}

#[test]
fn blank_access_token_is_treated_as_unset() {
    let mut raw = raw_with_endpoint();
    raw.prismic.access_token = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.prismic.access_token.is_none());
}

#[test]
fn request_timeout_is_optional() {
    let mut raw = raw_with_endpoint();
    let overrides = ServeOverrides {
        prismic_request_timeout_seconds: Some(7),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.prismic.request_timeout, Some(Duration::from_secs(7)));
}

#[test]
fn comments_are_disabled_without_repo() {
    let settings = Settings::from_raw(raw_with_endpoint()).expect("valid settings");
    assert!(settings.comments.is_none());
}

#[test]
fn comments_use_default_widget_parameters() {
    let mut raw = raw_with_endpoint();
    raw.comments.repo = Some("someone/blog-comments".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.comments,
        Some(CommentsSettings {
            repo: "someone/blog-comments".to_string(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        })
    );
}

#[test]
fn malformed_comments_repo_is_rejected() {
    let mut raw = raw_with_endpoint();
    raw.comments.repo = Some("just-a-name".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn public_url_defaults_to_listener_address() {
    let settings = Settings::from_raw(raw_with_endpoint()).expect("valid settings");
    assert_eq!(settings.site.public_url.as_str(), "http://127.0.0.1:3000/");
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_endpoint();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["spacetravelling"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "spacetravelling",
        "--config-file",
        "site.toml",
        "serve",
        "--server-port",
        "8080",
        "--prismic-api-endpoint",
        ENDPOINT,
        "--log-json",
        "true",
    ]);

    assert_eq!(
        args.config_file.as_deref(),
        Some(std::path::Path::new("site.toml"))
    );
    match args.command.expect("command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(8080));
            assert_eq!(
                serve.overrides.prismic_api_endpoint.as_deref(),
                Some(ENDPOINT)
            );
            assert_eq!(serve.overrides.log_json, Some(true));
        }
    }
}
