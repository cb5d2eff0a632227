mod config;
mod error;
mod http;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comicdex_client::UpstreamClient;
use comicdex_core::{Auth, ConcurrencyGate, RateLimiter, Scanner, Scheduler, Stemmer, Updater};
use comicdex_storage::{SqliteComicStore, SqliteKeywordStore, SqliteUserStore};
use comicdex_token::JwtTokenManager;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use structopt::StructOpt;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::state::AppState;

#[derive(Debug, StructOpt)]
#[structopt(name = "comicdex", about = "A searchable index over a remote comic corpus.")]
struct Options {
    /// Path to the YAML config file.
    #[structopt(long, default_value = "config.yaml", env, parse(from_os_str))]
    config: PathBuf,

    /// Overrides the configured port.
    #[structopt(long, short, env)]
    port: Option<u16>,

    /// The log level filter.
    #[structopt(long, default_value = "info", env)]
    log_level: LevelFilter,
}

fn main() {
    let options = Options::from_args();

    if let Err(err) = setup_logger(options.log_level) {
        eprintln!("error setting up logging: {err:?}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error creating runtime: {err:?}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(options)) {
        log::error!("fatal error: {err:?}");
        std::process::exit(1);
    }
}

fn setup_logger(level: LevelFilter) -> Result<()> {
    let colours = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::BrightRed)
        .debug(Color::Magenta)
        .trace(Color::Cyan);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} | {} | {:<5} - {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                colours.color(record.level()),
                message,
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}

async fn run(options: Options) -> Result<()> {
    let mut config = Config::load(&options.config)?;
    if let Some(port) = options.port {
        config.port = port;
    }

    log::info!("config loaded: dsn={}, source_url={}", config.dsn, config.source_url);

    let pool = comicdex_storage::connect(&config.dsn).await?;

    let stemmer = Arc::new(Stemmer::new());
    let comic_store = Arc::new(SqliteComicStore::new(pool.clone()));
    let keyword_store = Arc::new(SqliteKeywordStore::new(pool.clone()));
    let user_store = Arc::new(SqliteUserStore::new(pool));

    let upstream = Arc::new(UpstreamClient::new(config.source_url.clone(), config.req_timeout())?);
    let token_manager = Arc::new(JwtTokenManager::new(config.token_secret.as_bytes(), config.token_ttl()));

    let auth = Arc::new(Auth::new(token_manager, user_store));
    let scanner = Arc::new(Scanner::new(stemmer.clone(), comic_store.clone(), keyword_store.clone()));
    let updater = Arc::new(Updater::new(
        stemmer,
        comic_store,
        keyword_store,
        upstream,
        config.fetch_limit,
        config.parallel,
    ));
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit));
    let concurrency_gate = Arc::new(ConcurrencyGate::new(config.concurrency_limit));

    let state = AppState {
        auth,
        scanner,
        updater: updater.clone(),
        rate_limiter,
        concurrency_gate,
        scan_timeout: config.scan_timeout(),
        scan_limit: config.scan_limit,
    };

    let shutdown = CancellationToken::new();

    let scheduler = Scheduler::new(updater, config.scheduler_hour, config.scheduler_minute);
    let scheduler_cancel = shutdown.clone();
    let scheduler_task = tokio::spawn(async move {
        if let Err(err) = scheduler.run(scheduler_cancel).await {
            log::error!("scheduler stopped: {err:?}");
        }
    });

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    log::info!("listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutdown signal received");
        })
        .await?;

    shutdown.cancel();
    let _ = scheduler_task.await;

    Ok(())
}
