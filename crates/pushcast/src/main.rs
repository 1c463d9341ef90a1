//! # pushcast
//!
//! Send one APNs notification to a list of device tokens.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pushcast_core::logging::{LogFormat, init_subscriber};
use pushcast_core::{
    CancellationToken, ConnectionConfig, Environment, Headers, Notification, Payload, PushServer,
    load_config_from_path,
};
use tracing::{info, warn};

/// Broadcast an Apple push notification to many devices.
#[derive(Parser, Debug)]
#[command(name = "pushcast", about = "Broadcast an APNs notification over HTTP/2")]
struct Cli {
    /// JSON connection config (environment, certPath, keyPath, caPath, ...).
    #[arg(long, conflicts_with_all = ["cert", "key", "ca", "env", "host"])]
    config: Option<PathBuf>,

    /// Target environment: test, development, production.
    #[arg(long, default_value = "development")]
    env: Environment,

    /// Base URL overriding the environment host.
    #[arg(long)]
    host: Option<String>,

    /// PEM client certificate.
    #[arg(long)]
    cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long)]
    key: Option<PathBuf>,

    /// PEM CA bundle to trust instead of the built-in roots.
    #[arg(long)]
    ca: Option<PathBuf>,

    /// JSON notification file (`payload` + `headers`).
    #[arg(
        long,
        conflicts_with_all = ["alert", "title", "badge", "sound", "content_available", "apns_id", "expiration"]
    )]
    notification: Option<PathBuf>,

    /// Alert text.
    #[arg(long)]
    alert: Option<String>,

    /// Alert title.
    #[arg(long)]
    title: Option<String>,

    /// Badge count.
    #[arg(long, default_value_t = 0)]
    badge: u32,

    /// Sound name.
    #[arg(long, default_value = pushcast_core::notification::DEFAULT_SOUND)]
    sound: String,

    /// Mark as a background content update.
    #[arg(long)]
    content_available: bool,

    /// Delivery identifier (generated when omitted).
    #[arg(long)]
    apns_id: Option<String>,

    /// Expiration value sent as `apns-expiration`.
    #[arg(long, default_value = "0")]
    expiration: String,

    /// Per-request deadline in seconds (0 disables it).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Maximum concurrent requests.
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Print per-device outcomes as JSON.
    #[arg(long)]
    report: bool,

    /// Minimum log level.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Device tokens.
    #[arg(required = true)]
    tokens: Vec<String>,
}

impl Cli {
    fn connection_config(&self) -> Result<ConnectionConfig> {
        let mut config = if let Some(path) = &self.config {
            load_config_from_path(path)?
        } else {
            let (Some(cert), Some(key)) = (&self.cert, &self.key) else {
                bail!("either --config or both --cert and --key are required");
            };
            let mut config = ConnectionConfig::new(self.env, cert, key);
            if let Some(host) = &self.host {
                config = config.with_host(host);
            }
            if let Some(ca) = &self.ca {
                config = config.with_ca(ca);
            }
            config
        };

        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout_secs(secs);
        }
        if let Some(limit) = self.max_in_flight {
            config = config.with_max_in_flight(limit);
        }
        Ok(config)
    }

    fn notification(&self) -> Result<Notification> {
        if let Some(path) = &self.notification {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read notification: {}", path.display()))?;
            return serde_json::from_str(&content)
                .with_context(|| format!("failed to parse notification: {}", path.display()));
        }

        let Some(alert) = &self.alert else {
            bail!("either --notification or --alert is required");
        };
        let mut payload = Payload::new(alert)
            .with_badge(self.badge)
            .with_sound(&self.sound)
            .with_content_available(self.content_available);
        if let Some(title) = &self.title {
            payload = payload.with_title(title);
        }

        let headers = match &self.apns_id {
            Some(id) => Headers::new(id, &self.expiration),
            None => Headers::generate(&self.expiration),
        };
        Ok(Notification::new(payload, headers))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_subscriber(&cli.log_level, format);

    let config = cli.connection_config()?;
    let notification = cli.notification()?;
    let server = PushServer::connect(&config).context("failed to set up APNs connection")?;

    if !cli.report {
        server
            .send(&notification, &cli.tokens)
            .await
            .context("push rejected before sending")?;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight pushes");
            ctrl_c.cancel();
        }
    });

    let outcomes = server
        .send_with_outcomes(&notification, &cli.tokens, &cancel)
        .await
        .context("push rejected before sending")?;
    let delivered = outcomes.iter().filter(|o| o.is_success()).count();
    info!(delivered, total = outcomes.len(), "done");
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pushcast").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn tokens_are_required() {
        assert!(Cli::try_parse_from(["pushcast", "--alert", "hi"]).is_err());
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&[
            "--env", "production", "--cert", "/c.pem", "--key", "/k.pem", "--ca", "/ca.pem",
            "--max-in-flight", "8", "--timeout-secs", "5", "--alert", "hi", "tok1",
        ]);
        let config = cli.connection_config().unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.ca_path, Some(PathBuf::from("/ca.pem")));
        assert_eq!(config.max_in_flight, Some(8));
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn missing_key_is_an_error() {
        let cli = parse(&["--cert", "/c.pem", "--alert", "hi", "tok1"]);
        assert!(cli.connection_config().is_err());
    }

    #[test]
    fn config_conflicts_with_cert_flags() {
        let result = Cli::try_parse_from([
            "pushcast", "--config", "/p.json", "--cert", "/c.pem", "--alert", "hi", "tok1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_build_notification_with_generated_id() {
        let cli = parse(&[
            "--alert", "Simple message", "--title", "This is the title", "--badge", "2",
            "--content-available", "tok1", "tok2",
        ]);
        let n = cli.notification().unwrap();
        assert_eq!(n.payload.title(), Some("This is the title"));
        assert_eq!(n.payload.badge, 2);
        assert_eq!(n.payload.sound, "default");
        assert!(n.payload.content_available);
        assert_eq!(n.headers.apns_expiration, "0");
        assert!(n.headers.validate().is_ok());
        assert_eq!(cli.tokens, vec!["tok1", "tok2"]);
    }

    #[test]
    fn notification_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.json");
        std::fs::write(
            &path,
            r#"{"payload": {"alert": "from file"},
                "headers": {"apns-id": "0192b7a4-6c1e-7f3a-9d2b-4e5f6a7b8c9d", "apns-expiration": "60"}}"#,
        )
        .unwrap();
        let cli = parse(&["--notification", path.to_str().unwrap(), "tok1"]);
        let n = cli.notification().unwrap();
        assert_eq!(n.payload.alert, "from file");
        assert_eq!(n.headers.apns_expiration, "60");
    }

    #[test]
    fn notification_file_conflicts_with_header_flags() {
        for flag in [["--apns-id", "0192b7a4-6c1e-7f3a-9d2b-4e5f6a7b8c9d"], ["--expiration", "60"]] {
            let result = Cli::try_parse_from([
                "pushcast", "--notification", "/n.json", flag[0], flag[1], "tok1",
            ]);
            assert!(result.is_err(), "{} should conflict with --notification", flag[0]);
        }
    }

    #[test]
    fn alert_or_file_is_required() {
        let cli = parse(&["tok1"]);
        assert!(cli.notification().is_err());
    }
}
