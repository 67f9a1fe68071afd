// # livelinkd - LiveLink Daemon
//
// Thin integration layer: reads configuration from environment variables,
// initializes the runtime, wires the platform client, the redirect sink,
// the reconciler and the webhook listener together, and handles shutdown.
// All reconciliation logic lives in livelink-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Channels
// - `LIVELINK_CHANNELS`: Comma-separated channel logins, in priority order
// - `LIVELINK_DEFAULT_URL`: Fallback URL when no channel is live (optional)
//
// ### Twitch
// - `LIVELINK_TWITCH_CLIENT_ID`: Application client ID
// - `LIVELINK_TWITCH_CLIENT_SECRET`: Application client secret
//
// ### Cloudflare
// - `LIVELINK_CLOUDFLARE_API_TOKEN`: API token with Zone:DNS:Edit
// - `LIVELINK_CLOUDFLARE_ZONE_ID`: Zone ID
// - `LIVELINK_CLOUDFLARE_DOMAIN`: Zone apex domain (e.g. "example.com")
// - `LIVELINK_CLOUDFLARE_RECORD`: Redirect record host label (e.g. "live")
//
// ### Webhook
// - `LIVELINK_WEBHOOK_BIND`: Listen address (default "0.0.0.0:8080")
// - `LIVELINK_WEBHOOK_URL`: Publicly reachable callback URL
// - `LIVELINK_WEBHOOK_SECRET`: Shared secret for notification signatures
//
// ### Engine
// - `LIVELINK_POLL_INTERVAL_SECS`: Polling fallback interval (default 60)
// - `LIVELINK_LOG_LEVEL`: trace|debug|info|warn|error (default info)
//
// ## Example
//
// ```bash
// export LIVELINK_CHANNELS=alice,bob
// export LIVELINK_TWITCH_CLIENT_ID=...
// export LIVELINK_TWITCH_CLIENT_SECRET=...
// export LIVELINK_CLOUDFLARE_API_TOKEN=...
// export LIVELINK_CLOUDFLARE_ZONE_ID=...
// export LIVELINK_CLOUDFLARE_DOMAIN=example.com
// export LIVELINK_CLOUDFLARE_RECORD=live
// export LIVELINK_WEBHOOK_URL=https://hooks.example.com/webhook
// export LIVELINK_WEBHOOK_SECRET=...
//
// livelinkd
// ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use livelink_core::{
    ChannelSet, EngineConfig, LiveLinkConfig, LivenessSource, Reconciler, StreamPlatform,
    WebhookConfig, establish_subscriptions, spawn_poller,
};
use livelink_dns_cloudflare::CloudflareRedirect;
use livelink_platform_twitch::TwitchPlatform;
use livelink_webhook::WebhookState;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum LiveLinkExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<LiveLinkExitCode> for ExitCode {
    fn from(code: LiveLinkExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    channels: Vec<String>,
    default_url: Option<String>,
    twitch_client_id: String,
    twitch_client_secret: String,
    cloudflare_api_token: String,
    cloudflare_zone_id: String,
    cloudflare_domain: String,
    cloudflare_record: String,
    webhook_bind: String,
    webhook_url: String,
    webhook_secret: String,
    poll_interval_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            channels: env::var("LIVELINK_CHANNELS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            default_url: env::var("LIVELINK_DEFAULT_URL").ok().filter(|s| !s.is_empty()),
            twitch_client_id: env::var("LIVELINK_TWITCH_CLIENT_ID").unwrap_or_default(),
            twitch_client_secret: env::var("LIVELINK_TWITCH_CLIENT_SECRET").unwrap_or_default(),
            cloudflare_api_token: env::var("LIVELINK_CLOUDFLARE_API_TOKEN").unwrap_or_default(),
            cloudflare_zone_id: env::var("LIVELINK_CLOUDFLARE_ZONE_ID").unwrap_or_default(),
            cloudflare_domain: env::var("LIVELINK_CLOUDFLARE_DOMAIN").unwrap_or_default(),
            cloudflare_record: env::var("LIVELINK_CLOUDFLARE_RECORD").unwrap_or_default(),
            webhook_bind: env::var("LIVELINK_WEBHOOK_BIND")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            webhook_url: env::var("LIVELINK_WEBHOOK_URL").unwrap_or_default(),
            webhook_secret: env::var("LIVELINK_WEBHOOK_SECRET").unwrap_or_default(),
            poll_interval_secs: env::var("LIVELINK_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            log_level: env::var("LIVELINK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Absence of any required value is a fatal startup error; the core
    /// never sees a partial configuration.
    fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            anyhow::bail!(
                "LIVELINK_CHANNELS must contain at least one channel login. \
                Set it via: export LIVELINK_CHANNELS=alice,bob"
            );
        }
        require(&self.twitch_client_id, "LIVELINK_TWITCH_CLIENT_ID")?;
        require(&self.twitch_client_secret, "LIVELINK_TWITCH_CLIENT_SECRET")?;
        require(&self.cloudflare_api_token, "LIVELINK_CLOUDFLARE_API_TOKEN")?;
        require(&self.cloudflare_zone_id, "LIVELINK_CLOUDFLARE_ZONE_ID")?;
        require(&self.cloudflare_domain, "LIVELINK_CLOUDFLARE_DOMAIN")?;
        require(&self.cloudflare_record, "LIVELINK_CLOUDFLARE_RECORD")?;
        require(&self.webhook_url, "LIVELINK_WEBHOOK_URL")?;
        require(&self.webhook_secret, "LIVELINK_WEBHOOK_SECRET")?;

        // Range and shape checks are shared with the core config
        self.core_config().validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LIVELINK_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Project the environment values onto the core configuration
    fn core_config(&self) -> LiveLinkConfig {
        LiveLinkConfig {
            channels: self.channels.clone(),
            default_url: self.default_url.clone(),
            webhook: WebhookConfig {
                callback_url: self.webhook_url.clone(),
                secret: self.webhook_secret.clone(),
            },
            engine: EngineConfig {
                poll_interval_secs: self.poll_interval_secs,
                ..EngineConfig::default()
            },
        }
    }
}

fn require(value: &str, name: &str) -> Result<()> {
    if value.is_empty() {
        anyhow::bail!("required environment variable not set: {name}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return LiveLinkExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return LiveLinkExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return LiveLinkExitCode::ConfigError.into();
    }

    info!("Starting livelinkd daemon");
    info!("Monitoring {} channel(s)", config.channels.len());

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return LiveLinkExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {e:#}");
            LiveLinkExitCode::RuntimeError
        } else {
            LiveLinkExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let core_config = config.core_config();

    // Platform client: authenticate, then pin down the monitored identities
    let platform: Arc<dyn StreamPlatform> = Arc::new(
        TwitchPlatform::connect(&config.twitch_client_id, &config.twitch_client_secret)
            .await
            .context("failed to initialize Twitch client")?,
    );
    let channels = ChannelSet::new(
        platform
            .resolve_channels(&core_config.channels)
            .await
            .context("failed to resolve monitored channels")?,
    );

    // Redirect sink: find the managed record
    let sink = CloudflareRedirect::discover(
        &config.cloudflare_api_token,
        &config.cloudflare_zone_id,
        &config.cloudflare_domain,
        &config.cloudflare_record,
    )
    .await
    .context("failed to initialize Cloudflare client")?;

    let (reconciler, mut event_rx) = Reconciler::new(
        channels,
        core_config.default_url.clone(),
        Box::new(sink),
        core_config.engine.event_channel_capacity,
    );
    let reconciler = Arc::new(reconciler);

    // Drain reconciler events so observability never backs up reconciliation
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            tracing::debug!(?event, "reconciler event");
        }
    });

    if let Err(e) = reconciler.seed_applied_target().await {
        warn!("Could not read current redirect target: {e}");
    }

    // Choose the liveness source for this run
    let source = establish_subscriptions(
        platform.as_ref(),
        reconciler.channels(),
        &core_config.webhook.callback_url,
        &core_config.webhook.secret,
    )
    .await;

    // Initial probe so the redirect is correct before any event arrives
    match platform.live_channels(reconciler.channels()).await {
        Ok(live) => {
            if let Err(e) = reconciler.ingest_bulk(&live).await {
                warn!("Initial redirect update failed: {e}");
            }
        }
        Err(e) => warn!("Initial stream status check failed: {e}"),
    }

    let poller = match source {
        LivenessSource::Push => {
            info!("Liveness source: push notifications");
            None
        }
        LivenessSource::Poll => {
            info!(
                "Liveness source: polling every {}s",
                core_config.engine.poll_interval_secs
            );
            Some(spawn_poller(
                platform.clone(),
                reconciler.clone(),
                Duration::from_secs(core_config.engine.poll_interval_secs),
            ))
        }
    };

    // Webhook listener
    let state = Arc::new(WebhookState {
        reconciler: reconciler.clone(),
        secret: core_config.webhook.secret.clone(),
    });
    let listener = TcpListener::bind(&config.webhook_bind)
        .await
        .with_context(|| format!("failed to bind {}", config.webhook_bind))?;
    info!("Webhook listener on {}", config.webhook_bind);

    axum::serve(listener, livelink_webhook::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited unexpectedly")?;

    if let Some(poller) = poller {
        poller.shutdown().await;
    }
    info!("Shutdown complete");

    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sig) => sig,
        Err(e) => {
            error!("Failed to set up SIGTERM handler: {e}");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(sig) => sig,
        Err(e) => {
            error!("Failed to set up SIGINT handler: {e}");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
}

/// Wait for CTRL-C (non-Unix platforms)
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {e}");
    }
}
