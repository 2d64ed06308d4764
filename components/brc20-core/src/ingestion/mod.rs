use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tokio_postgres::GenericClient;

use crate::error::EngineError;
use crate::wire::BlockEvent;
use crate::Context;

/// Bounded number of times a transient store error retries the same block before the worker
/// gives up and escalates to fatal, mirroring `pg_connect_with_retry`'s own retry posture.
pub const MAX_STORE_RETRY_ATTEMPTS: u32 = 3;

/// Fixed delay between retry attempts.
const STORE_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Whether the coordinator admitted a delivery onto its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Rejected,
}

/// Bounded single-consumer FIFO in front of the operation engine. `on_block`/`on_rollback`
/// never block: they `try_send` and report admission immediately, matching the contract the
/// external block source expects.
pub struct IngestionCoordinator {
    sender: Sender<BlockEvent>,
}

impl IngestionCoordinator {
    /// Spawns the worker thread and returns a coordinator whose queue holds at most
    /// `queue_max_depth` pending deliveries.
    pub fn start<F, Fut>(queue_max_depth: usize, ctx: Context, handle: F) -> Self
    where
        F: Fn(BlockEvent) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), EngineError>> + Send,
    {
        let (sender, receiver): (Sender<BlockEvent>, Receiver<BlockEvent>) =
            bounded(queue_max_depth);
        std::thread::spawn(move || {
            hiro_system_kit::nestable_block_on(async move {
                'drain: while let Ok(event) = receiver.recv() {
                    let height = event.height();
                    let mut attempt = 0u32;
                    loop {
                        match handle(event.clone()).await {
                            Ok(()) => break,
                            Err(EngineError::Store(msg)) if attempt < MAX_STORE_RETRY_ATTEMPTS => {
                                attempt += 1;
                                try_warn!(
                                    ctx,
                                    "transient store error applying block {} (attempt {}/{}): {}, retrying",
                                    height,
                                    attempt,
                                    MAX_STORE_RETRY_ATTEMPTS,
                                    msg
                                );
                                tokio::time::sleep(STORE_RETRY_DELAY).await;
                            }
                            Err(EngineError::Store(msg)) => {
                                try_error!(
                                    ctx,
                                    "store error applying block {} exhausted {} retries, escalating: {}",
                                    height,
                                    MAX_STORE_RETRY_ATTEMPTS,
                                    msg
                                );
                                break 'drain;
                            }
                            Err(EngineError::Fatal(msg)) => {
                                try_error!(ctx, "fatal error applying block {}: {}", height, msg);
                                break 'drain;
                            }
                            Err(e) => {
                                try_warn!(ctx, "error applying block {}: {}", height, e.to_string());
                                break;
                            }
                        }
                    }
                }
            });
        });
        IngestionCoordinator { sender }
    }

    pub fn on_block(&self, event: BlockEvent) -> Admission {
        self.try_admit(event)
    }

    pub fn on_rollback(&self, event: BlockEvent) -> Admission {
        self.try_admit(event)
    }

    fn try_admit(&self, event: BlockEvent) -> Admission {
        match self.sender.try_send(event) {
            Ok(()) => Admission::Accepted,
            Err(TrySendError::Full(_)) => Admission::Rejected,
            Err(TrySendError::Disconnected(_)) => Admission::Rejected,
        }
    }
}

/// Applies one block event against the engine, used as the `handle` closure passed to
/// [`IngestionCoordinator::start`] in production; exposed standalone so tests can drive it
/// directly against a single transaction.
pub async fn apply_event<T: GenericClient>(
    event: &BlockEvent,
    client: &T,
    ctx: &Context,
) -> Result<(), EngineError> {
    use crate::engine;
    match event {
        BlockEvent::Apply(block) => {
            for inscription in &block.inscriptions {
                match inscription {
                    crate::wire::InscriptionEvent::Genesis {
                        inscription_id,
                        payload,
                        mime,
                        location,
                        ..
                    } => {
                        engine::apply_inscription_genesis(
                            inscription_id,
                            block.height,
                            &location.tx_id,
                            mime,
                            payload,
                            location,
                            client,
                            ctx,
                        )
                        .await?;
                    }
                    crate::wire::InscriptionEvent::Transfer {
                        inscription_id,
                        location,
                    } => {
                        engine::apply_inscription_transfer(
                            inscription_id,
                            block.height,
                            location,
                            client,
                            ctx,
                        )
                        .await?;
                    }
                }
            }
            Ok(())
        }
        BlockEvent::Rollback(block) => engine::rollback_block(block.height, client, ctx).await,
    }
}
