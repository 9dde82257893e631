//! App orchestration module.
//!
//! Wires the indexer poller, order gateway, maturity monitor, and
//! admin server together and runs them until shutdown.

use std::sync::Arc;

use tracing::{error, info};

use crate::adapter::polymarket;
use crate::adapter::{GammaClient, IndexerClient};
use crate::app::server::{self, ServerState};
use crate::app::AppState;
use crate::config::Config;
use crate::domain::StrategyCatalog;
use crate::error::Result;
use crate::exchange::OrderExecutor;
use crate::service::{
    EventMonitor, MaturityMonitor, OrderGateway, PositionCloser, PurchaseExecutor,
};

/// Main application struct.
pub struct App;

impl App {
    /// Run the main application loop.
    ///
    /// The event monitor runs in the foreground; the maturity monitor
    /// and admin server run as background tasks and are torn down when
    /// the event loop exits.
    pub async fn run(config: Config) -> Result<()> {
        let catalog = Arc::new(StrategyCatalog::load(&config.catalog.path)?);
        info!(
            strategies = catalog.len(),
            path = %config.catalog.path.display(),
            "Strategy catalog loaded"
        );

        let state = Arc::new(build_state(&config)?);

        let executor: Arc<dyn OrderExecutor> = Arc::new(polymarket::Executor::new(&config).await?);
        info!(api_url = %config.polymarket.api_url, "Order executor ready");

        let gateway = Arc::new(OrderGateway::new(executor, state.clone(), &config.gateway));
        let purchases = Arc::new(PurchaseExecutor::new(
            catalog.clone(),
            gateway.clone(),
            state.clone(),
        ));
        let closer = Arc::new(PositionCloser::new(catalog.clone(), gateway, state.clone()));

        let strategy_address = config.strategy_address()?;
        let log_source = Arc::new(IndexerClient::new(&config.indexer.url)?);
        let event_monitor = Arc::new(EventMonitor::new(
            log_source,
            purchases,
            strategy_address,
            config.indexer.clone(),
        ));

        let status_source = Arc::new(GammaClient::new(&config.polymarket.gamma_url)?);
        let maturity_monitor = Arc::new(MaturityMonitor::new(
            &catalog,
            status_source,
            closer.clone(),
            state.clone(),
            &config.maturity,
        ));

        let server_state = ServerState {
            event_monitor: event_monitor.clone(),
            maturity_monitor: maturity_monitor.clone(),
            closer,
            state,
        };

        let maturity_task = {
            let monitor = maturity_monitor.clone();
            tokio::spawn(async move { monitor.start().await })
        };

        let bind_addr = config.server.bind_addr.clone();
        let server_task = tokio::spawn(async move {
            if let Err(e) = server::serve(server_state, &bind_addr).await {
                error!(error = %e, "Admin server exited");
            }
        });

        let result = event_monitor.start().await;

        maturity_monitor.stop();
        maturity_task.abort();
        server_task.abort();

        result
    }
}

/// Build shared state, attaching the settlement journal if configured.
fn build_state(config: &Config) -> Result<AppState> {
    match &config.maturity.settlement_file {
        Some(path) => {
            info!(path = %path.display(), "Settlement journal enabled");
            AppState::with_settlement_journal(path.clone())
        }
        None => Ok(AppState::new()),
    }
}
