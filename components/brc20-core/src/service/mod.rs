use config::Config;
use deadpool_postgres::Pool;

use crate::error::EngineError;
use crate::ingestion::{apply_event, Admission, IngestionCoordinator};
use crate::wire::{BlockApply, BlockEvent, BlockRollback};
use crate::Context;

/// Wires configuration, a Postgres pool, and the ingestion coordinator together into the
/// long-running process an operator starts with `service start`. The external block source is
/// expected to call [`Service::on_block`]/[`Service::on_rollback`] as it observes new blocks;
/// this crate does not itself dial out to Bitcoin.
pub struct Service {
    pub config: Config,
    pub ctx: Context,
    pub pg_pool: Pool,
    coordinator: IngestionCoordinator,
}

impl Service {
    pub fn new(config: &Config, ctx: &Context) -> Result<Self, String> {
        let pg_pool = brc20_postgres::pg_pool(&config.brc20_db)?;
        let worker_pool = pg_pool.clone();
        let worker_ctx = ctx.clone();
        let coordinator = IngestionCoordinator::start(
            config.ingestion.queue_max_depth,
            ctx.clone(),
            move |event| {
                let pool = worker_pool.clone();
                let ctx = worker_ctx.clone();
                async move { Self::apply_one(&event, &pool, &ctx).await }
            },
        );
        Ok(Service {
            config: config.clone(),
            ctx: ctx.clone(),
            pg_pool,
            coordinator,
        })
    }

    async fn apply_one(event: &BlockEvent, pool: &Pool, ctx: &Context) -> Result<(), EngineError> {
        let mut conn = brc20_postgres::pg_pool_client(pool)
            .await
            .map_err(EngineError::Store)?;
        let transaction = brc20_postgres::pg_begin(&mut conn)
            .await
            .map_err(EngineError::Store)?;
        apply_event(event, &transaction, ctx).await?;
        transaction
            .commit()
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;
        Ok(())
    }

    pub fn on_block(&self, block: BlockApply) -> Admission {
        self.coordinator.on_block(BlockEvent::Apply(block))
    }

    pub fn on_rollback(&self, block: BlockRollback) -> Admission {
        self.coordinator.on_rollback(BlockEvent::Rollback(block))
    }

    /// Blocks the calling thread until `shutdown` receives a signal, the way the CLI's
    /// `service start` keeps the process alive while the coordinator's worker drains blocks
    /// handed to it by the external block source.
    pub fn run(&self, shutdown: &crossbeam_channel::Receiver<()>) {
        let _ = shutdown.recv();
    }
}
