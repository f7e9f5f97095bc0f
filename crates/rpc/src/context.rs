//! Application context - wires everything together

use crate::config::PlatformConfig;
use crate::notify::LogNotifier;
use anyhow::Context;
use lus_bus::EventBus;
use lus_compliance::{ScreeningGate, StaticSanctionsList, StoreHistoryReader};
use lus_core::{Actor, Clock, SystemClock};
use lus_engine::TransactionEngine;
use lus_settlement::SettlementWorkflow;
use lus_store::{Store, UserRepo};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Application context - wires together all components
pub struct AppContext {
    pub store: Store,
    pub engine: TransactionEngine,
    pub settlement: SettlementWorkflow,
    pub bus: EventBus,
    config: PlatformConfig,
}

impl AppContext {
    /// Open the store under `data_dir` and build every component on it.
    pub async fn new(data_dir: impl AsRef<Path>, config: PlatformConfig) -> anyhow::Result<Self> {
        Self::with_clock(data_dir, config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        data_dir: impl AsRef<Path>,
        config: PlatformConfig,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let url = config.database_url(data_dir);
        let store = Store::connect(&url, config.db_timeout())
            .await
            .with_context(|| format!("opening {url}"))?;

        let sanctions = StaticSanctionsList::new(
            config.sanctions.iter().cloned(),
            config.screening.sanctions_match_threshold,
        );
        let gate = ScreeningGate::new(
            config.screening.clone(),
            Arc::new(sanctions),
            Arc::new(StoreHistoryReader::new(store.clone())),
        )?;

        let bus = EventBus::new();
        let engine = TransactionEngine::builder(store.clone(), Arc::new(gate))
            .with_limits(config.limits.clone())
            .with_fees(config.fees.clone())
            .with_config(config.transactions.clone())
            .with_bus(bus.clone())
            .with_clock(clock)
            .build()?;
        let settlement = SettlementWorkflow::new(engine.clone(), config.settlement.clone());

        info!(database = %url, sanctions = config.sanctions.len(), "context ready");
        Ok(Self {
            store,
            engine,
            settlement,
            bus,
            config,
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Forward lifecycle events to the log until the context is dropped.
    pub fn start_notifications(&self) -> tokio::task::JoinHandle<()> {
        self.bus.spawn_subscriber(Arc::new(LogNotifier))
    }

    /// Resolve the acting user's role from the store.
    pub async fn actor(&self, user_id: &str) -> anyhow::Result<Actor> {
        let mut conn = self.store.acquire().await?;
        let user = UserRepo::get(&mut conn, user_id)
            .await?
            .with_context(|| format!("unknown actor {user_id}"))?;
        Ok(Actor::new(user.id, user.role))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.engine.clock()
    }
}
