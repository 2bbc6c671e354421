mod console;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use chanserv_api::SystemClock;
use chanserv_config_hcl::HclParser;
use chanserv_engine::audit::TracingAudit;
use chanserv_engine::config::{ConfigParser, ServiceConfig, TomlParser};
use chanserv_engine::sync::WireUplink;
use chanserv_engine::Engine;

const PARSERS: &[&dyn ConfigParser] = &[&TomlParser, &HclParser];

#[derive(Parser)]
#[command(name = "chanserv-server", about = "ChanServ topic service")]
struct Cli {
    /// Path to the configuration file (.toml or .hcl).
    #[arg(long, default_value = "chanserv.toml", env = "CHANSERV_CONFIG")]
    config: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!(config = %cli.config, "loading configuration");
    let config = match ServiceConfig::load_with(&cli.config, PARSERS) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let token = CancellationToken::new();

    // Uplink writer: drains encoded topic changes to stdout.
    let (uplink, mut uplink_rx) = WireUplink::new(config.server_name.clone(), config.uplink);
    let writer_token = token.clone();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        loop {
            let line = tokio::select! {
                line = uplink_rx.recv() => line,
                _ = writer_token.cancelled() => {
                    // Flush whatever is already queued.
                    uplink_rx.close();
                    uplink_rx.recv().await
                }
            };
            let Some(line) = line else { break };
            if let Err(e) = stdout.write_all(format!(">> {line}\n").as_bytes()).await {
                tracing::error!(error = %e, "uplink write failed");
                break;
            }
            let _ = stdout.flush().await;
        }
        tracing::info!("uplink writer stopped");
    });

    tracing::info!(
        registrations = config.registrations.len(),
        channels = config.channels.len(),
        "bootstrapping engine"
    );
    let mut engine = match Engine::bootstrap(
        config,
        Arc::new(uplink),
        Arc::new(TracingAudit),
        Arc::new(SystemClock),
    ) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "failed to bootstrap engine");
            std::process::exit(1);
        }
    };

    tracing::info!(
        service = %engine.config().service_nick,
        "chanserv-server started, type HELP for commands, Ctrl+C to stop"
    );

    let mut sighup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to register SIGHUP handler");
            std::process::exit(1);
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let mut out = String::new();
                    for reply in console::respond(engine.service(), &line) {
                        out.push_str(&reply);
                        out.push('\n');
                    }
                    if let Err(e) = stdout.write_all(out.as_bytes()).await {
                        tracing::error!(error = %e, "console write failed");
                        break;
                    }
                    let _ = stdout.flush().await;
                }
                Ok(None) => {
                    tracing::info!("end of input, shutting down...");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "console read failed");
                    break;
                }
            },
            _ = sighup.recv() => {
                tracing::info!(config = %cli.config, "SIGHUP received, reloading configuration");
                match engine.reload_from_file(&cli.config, PARSERS) {
                    Ok(()) => tracing::info!("configuration reloaded successfully"),
                    Err(e) => tracing::error!(error = %e, "configuration reload failed (keeping old config)"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down...");
                break;
            }
        }
    }

    token.cancel();
    // The engine holds the sending half of the uplink queue.
    drop(engine);
    if let Err(e) = writer.await {
        tracing::error!(error = %e, "uplink writer task failed");
    }
}
