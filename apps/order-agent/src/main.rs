//! Order Agent Binary
//!
//! Runs the trading loop against the paper exchange described in the config.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-agent -- config.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_AGENT_CONFIG`: Config path when none is passed (default: config.yaml)
//! - `RUST_LOG`: Log filter (default: order_agent=info)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use order_agent::application::ports::Clock;
use order_agent::application::services::{
    MarketCache, Notifier, OrderComposer, RequestGovernor, TradingLoop, TradingLoopConfig,
};
use order_agent::application::use_cases::{
    DetectOpenOrdersUseCase, MaintainBuyLadderUseCase, ProcessFillsUseCase, SweepStaleOrdersUseCase,
};
use order_agent::config::{CONFIG_PATH_ENV, Config, DEFAULT_CONFIG_PATH, load_config};
use order_agent::infrastructure::clock::SystemClock;
use order_agent::infrastructure::exchange::{GovernedExchange, PaperExchange};
use order_agent::infrastructure::notify::{LogNotifier, LogSocial};
use order_agent::infrastructure::session::{FileSessionLock, FileSessionStore};
use order_agent::infrastructure::settings::ConfigFileSettings;
use order_agent::observability::{LoggingConfig, MetricsConfig, init_logging, init_metrics};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Exchange stack used by the binary.
type AgentExchange = GovernedExchange<PaperExchange>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let path = config_path();
    let config = load_config(Some(&path))?;

    init_logging(&LoggingConfig {
        json: config.observability.json_logs,
        ..LoggingConfig::default()
    })?;

    tracing::info!(
        config = %path,
        exchange = %config.exchange.name,
        api_version = %config.exchange.api_version,
        strategy = %config.strategy.kind,
        "Starting order agent"
    );

    if let Some(addr) = &config.observability.metrics_addr {
        let addr: SocketAddr = addr.parse().context("observability.metrics_addr")?;
        init_metrics(&MetricsConfig::with_addr(addr))?;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let exchange = create_exchange(&config, Arc::clone(&clock));
    let notifier = create_notifier(&config, Arc::clone(&clock));

    let mut trading_loop = create_trading_loop(&config, &path, &exchange, &notifier, clock)?;
    trading_loop.start().await.context("start-up snapshot failed")?;

    if let Some(ladder) = &config.ladder {
        reconcile_ladder(&config, ladder, &exchange).await?;
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    trading_loop.run(shutdown).await;

    tracing::info!("Order agent stopped");
    Ok(())
}

/// Config path: first argument, then `$ORDER_AGENT_CONFIG`, then the default.
fn config_path() -> String {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Paper exchange seeded from config, wrapped in the request governor.
fn create_exchange(config: &Config, clock: Arc<dyn Clock>) -> Arc<AgentExchange> {
    let paper = PaperExchange::with_clock(
        config.paper.markets.iter().map(|m| m.market()).collect(),
        Arc::clone(&clock),
    );
    for market in &config.paper.markets {
        paper.set_ticker(&market.symbol(), market.ticker);
    }

    let session_dir = &config.exchange.session_dir;
    let governor = RequestGovernor::new(
        Arc::new(FileSessionStore::new(session_dir, &config.exchange.name)),
        Arc::new(FileSessionLock::new(session_dir, &config.exchange.name)),
        clock,
    )
    .with_fallback(config.governor.calls.clone());

    tracing::info!(
        markets = config.paper.markets.len(),
        session_dir = %session_dir.display(),
        "Paper exchange initialized"
    );

    Arc::new(GovernedExchange::new(paper, Arc::new(governor)))
}

fn create_notifier(config: &Config, clock: Arc<dyn Clock>) -> Arc<Notifier> {
    let notifier = Notifier::new(Arc::new(LogNotifier), clock, config.exchange.name.clone());
    if config.notifications.social {
        Arc::new(notifier.with_social(Arc::new(LogSocial)))
    } else {
        Arc::new(notifier)
    }
}

/// Wire the use cases into the trading loop.
fn create_trading_loop(
    config: &Config,
    path: &str,
    exchange: &Arc<AgentExchange>,
    notifier: &Arc<Notifier>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<TradingLoop<AgentExchange>> {
    let version = config.exchange.api_version;
    let strategy = config.strategy.to_strategy(version)?;
    let composer = Arc::new(OrderComposer::new(Arc::clone(exchange), version));
    let markets = Arc::new(MarketCache::new(Arc::clone(exchange), version));

    let fills = ProcessFillsUseCase::new(
        Arc::clone(exchange),
        Arc::clone(&composer),
        markets,
        Arc::clone(notifier),
        strategy,
        version,
    );
    let opens = DetectOpenOrdersUseCase::new(Arc::clone(exchange), Arc::clone(notifier));
    let sweeper = SweepStaleOrdersUseCase::new(
        composer,
        Arc::clone(notifier),
        chrono::Duration::days(config.sweeper.max_order_age_days),
        version,
    );

    let loop_config = TradingLoopConfig {
        poll_interval: Duration::from_secs(config.strategy.poll_interval_secs),
        sweep_interval: chrono::Duration::seconds(config.sweeper.interval_secs),
    };

    Ok(TradingLoop::new(
        Arc::clone(exchange),
        fills,
        opens,
        sweeper,
        Arc::new(ConfigFileSettings::new(path)),
        Arc::clone(notifier),
        clock,
        loop_config,
    ))
}

/// Bring the configured buy ladder in line with the open buys.
async fn reconcile_ladder(
    config: &Config,
    ladder: &order_agent::config::LadderConfig,
    exchange: &Arc<AgentExchange>,
) -> anyhow::Result<()> {
    let version = config.exchange.api_version;
    let request = ladder.to_request()?;
    let use_case = MaintainBuyLadderUseCase::new(
        Arc::clone(exchange),
        Arc::new(OrderComposer::new(Arc::clone(exchange), version)),
        Arc::new(MarketCache::new(Arc::clone(exchange), version)),
    );

    let report = use_case
        .execute(&request)
        .await
        .with_context(|| format!("buy ladder on {}", request.market))?;

    tracing::info!(
        market = %request.market,
        cancelled = report.cancelled.len(),
        skipped = report.skipped.len(),
        placed = report.placed.len(),
        "Buy ladder reconciled"
    );
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM.
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
#[allow(clippy::expect_used)]
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown.cancel();
}
