use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the spacetravelling binary.
#[derive(Debug, Parser)]
#[command(
    name = "spacetravelling",
    version,
    about = "spacetravelling blog front-end"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "SPACETRAVELLING_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the Prismic API endpoint, e.g. `https://repo.cdn.prismic.io/api/v2`.
    #[arg(long = "prismic-api-endpoint", value_name = "URL")]
    pub prismic_api_endpoint: Option<String>,

    /// Override the Prismic access token.
    #[arg(long = "prismic-access-token", value_name = "TOKEN")]
    pub prismic_access_token: Option<String>,

    /// Override the number of posts per page.
    #[arg(long = "prismic-page-size", value_name = "COUNT")]
    pub prismic_page_size: Option<u32>,

    /// Override the content request timeout.
    #[arg(long = "prismic-request-timeout-seconds", value_name = "SECONDS")]
    pub prismic_request_timeout_seconds: Option<u64>,

    /// Override the public site URL used for canonical links.
    #[arg(long = "site-public-url", value_name = "URL")]
    pub site_public_url: Option<String>,

    /// Override the GitHub repository that stores comments (`owner/name`).
    #[arg(long = "comments-repo", value_name = "REPO")]
    pub comments_repo: Option<String>,
}
