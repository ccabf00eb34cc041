use axum::serve;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysdash::canvas::RecordingCanvas;
use sysdash::client::TelemetryClient;
use sysdash::collectors::HostResources;
use sysdash::config::Config;
use sysdash::host::InputSurface;
use sysdash::render::{ram_reading, vram_reading};
use sysdash::{http, Dashboard};
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "sysdash")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the telemetry endpoints from this machine (default).
    Serve,
    /// Drive a headless dashboard against `base_url` and log what it shows.
    Watch {
        /// Stop after this many frames instead of waiting for Ctrl+C.
        #[arg(long)]
        frames: Option<u64>,
        /// Do not trigger Run on start; only live polling is shown.
        #[arg(long)]
        no_run: bool,
    },
    PrintDefaultConfig,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);
    if let Command::PrintDefaultConfig = command {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = match Config::load_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    match command {
        Command::Serve => run_backend(&cfg).await,
        Command::Watch { frames, no_run } => watch(&cfg, frames, !no_run).await,
        Command::PrintDefaultConfig => {}
    }
}

async fn run_backend(cfg: &Config) {
    let addr: SocketAddr = match cfg.listen.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!(error = %err, listen = %cfg.listen, "invalid listen address");
            std::process::exit(1);
        }
    };
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(err) => {
            error!(error = %err, %addr, "failed to bind HTTP server");
            std::process::exit(1);
        }
    };

    let source = tokio::task::spawn_blocking(HostResources::new).await;
    let source = match source {
        Ok(source) => source,
        Err(err) => {
            error!(error = %err, "failed to initialize resource collection");
            std::process::exit(1);
        }
    };

    info!(%addr, "serving telemetry endpoints");
    let app = http::build_router(Arc::new(source));
    let server = serve(listener, app).with_graceful_shutdown(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
        }
        info!("Ctrl+C received, shutting down");
    });

    if let Err(err) = server.await {
        error!(error = %err, "HTTP server error");
        std::process::exit(1);
    }
}

async fn watch(cfg: &Config, frames: Option<u64>, run: bool) {
    let client = TelemetryClient::new(cfg.base_url.as_str());
    let mut dashboard = Dashboard::new(client, InputSurface::shared(), cfg.dashboard_options());
    if run {
        dashboard.run();
    }

    let mut canvas = RecordingCanvas::new();
    let mut ticker = tokio::time::interval(cfg.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut drawn = 0u64;
    let mut last_status: Option<Instant> = None;
    loop {
        tokio::select! {
            res = &mut shutdown => {
                if let Err(err) = res {
                    error!(error = %err, "failed to listen for Ctrl+C");
                }
                info!("Ctrl+C received, shutting down");
                break;
            }
            _ = ticker.tick() => {
                canvas.clear();
                let output = dashboard.draw(&mut canvas);
                drawn += 1;

                for alert in dashboard.take_alerts() {
                    warn!(%alert, "dashboard alert");
                }

                if last_status.map_or(true, |t| t.elapsed() >= STATUS_LOG_INTERVAL) {
                    let live = dashboard.state().live();
                    info!(
                        mode = ?output.mode,
                        ram = %ram_reading(&live.ram).0,
                        vram = %vram_reading(&live.vram).0,
                        width = dashboard.node().size.width,
                        height = dashboard.node().size.height,
                        commands = canvas.commands().len(),
                        "frame"
                    );
                    last_status = Some(Instant::now());
                }

                if frames.is_some_and(|limit| drawn >= limit) {
                    break;
                }
            }
        }
    }

    dashboard.remove();
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
