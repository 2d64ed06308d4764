use tokio_postgres::GenericClient;

use crate::error::{ConsensusRejection, EngineError, EngineOutcome};
use crate::ledger::models::DbBalanceDelta;
use crate::ledger::{self, EventType, NewDeploy, NewMint, NewTransfer};
use crate::numeric::Decimal;
use crate::parser::{self, Operation, ParseError};
use crate::wire::Location;
use crate::Context;

/// Handles the first appearance of an inscription: parses its payload and, if it is a
/// recognized BRC-20 operation, applies the relevant consensus rule.
pub async fn apply_inscription_genesis<T: GenericClient>(
    inscription_id: &str,
    block_height: u64,
    tx_id: &str,
    mime: &str,
    payload: &[u8],
    location: &Location,
    client: &T,
    ctx: &Context,
) -> Result<EngineOutcome, EngineError> {
    let operation = match parser::parse(mime, payload) {
        Ok(op) => op,
        Err(ParseError::NotBrc20)
        | Err(ParseError::UnsupportedContentType(_))
        | Err(ParseError::InvalidJson)
        | Err(ParseError::InvalidField(_))
        | Err(ParseError::InvalidTickLength(_)) => {
            return Ok(EngineOutcome::Ignored);
        }
    };

    let Some(address) = location.address.as_deref() else {
        try_debug!(
            ctx,
            "brc-20 inscription {} revealed with no owning address, ignoring",
            inscription_id
        );
        return Ok(EngineOutcome::Rejected(ConsensusRejection::InscribedToFee));
    };

    match operation {
        Operation::Deploy {
            ticker,
            max_supply,
            mint_limit,
            decimals,
        } => {
            apply_deploy(
                inscription_id,
                block_height,
                tx_id,
                address,
                &ticker,
                &max_supply,
                mint_limit.as_ref(),
                decimals,
                client,
                ctx,
            )
            .await
        }
        Operation::Mint { ticker, amount } => {
            apply_mint(
                inscription_id,
                block_height,
                tx_id,
                address,
                &ticker,
                &amount,
                client,
                ctx,
            )
            .await
        }
        Operation::Transfer { ticker, amount } => {
            apply_inscribe_transfer(
                inscription_id,
                block_height,
                tx_id,
                address,
                &ticker,
                &amount,
                client,
                ctx,
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn apply_deploy<T: GenericClient>(
    inscription_id: &str,
    block_height: u64,
    tx_id: &str,
    address: &str,
    ticker: &str,
    max_supply: &Decimal,
    mint_limit: Option<&Decimal>,
    decimals: u8,
    client: &T,
    ctx: &Context,
) -> Result<EngineOutcome, EngineError> {
    let inserted = ledger::insert_deploy(
        &NewDeploy {
            ticker,
            inscription_id,
            block_height,
            tx_id,
            address,
            max_supply,
            mint_limit,
            decimals,
        },
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    let Some(deploy) = inserted else {
        try_debug!(ctx, "brc-20 deploy '{}' rejected: ticker already exists", ticker);
        return Ok(EngineOutcome::Rejected(ConsensusRejection::DuplicateTicker(
            ticker.to_string(),
        )));
    };

    ledger::insert_event(
        inscription_id,
        deploy.id,
        block_height,
        EventType::Deploy,
        None,
        None,
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    try_info!(
        ctx,
        "brc-20 deploy {} ({}) at block {}",
        ticker,
        address,
        block_height
    );
    Ok(EngineOutcome::Applied)
}

#[allow(clippy::too_many_arguments)]
async fn apply_mint<T: GenericClient>(
    inscription_id: &str,
    block_height: u64,
    tx_id: &str,
    address: &str,
    ticker: &str,
    amount: &Decimal,
    client: &T,
    ctx: &Context,
) -> Result<EngineOutcome, EngineError> {
    let Some(deploy) = ledger::get_deploy_by_ticker(ticker, client)
        .await
        .map_err(EngineError::Store)?
    else {
        return Ok(EngineOutcome::Rejected(ConsensusRejection::TickerNotFound(
            ticker.to_string(),
        )));
    };

    if let Some(limit) = &deploy.mint_limit {
        if amount > limit {
            return Ok(EngineOutcome::Rejected(ConsensusRejection::AmountExceedsLimit {
                ticker: ticker.to_string(),
                amount: amount.to_string(),
                limit: limit.to_string(),
            }));
        }
    }
    if amount.scale() > deploy.decimals as u32 {
        return Ok(EngineOutcome::Rejected(ConsensusRejection::DecimalsExceeded {
            ticker: ticker.to_string(),
            amount: amount.to_string(),
            decimals: deploy.decimals,
        }));
    }

    let minted = ledger::get_minted_supply(deploy.id, client)
        .await
        .map_err(EngineError::Store)?;
    let remaining = match deploy.max_supply.checked_sub(&minted) {
        Ok(remaining) if !remaining.is_zero() => remaining,
        _ => {
            return Ok(EngineOutcome::Rejected(ConsensusRejection::SupplyExhausted(
                ticker.to_string(),
            )))
        }
    };
    let effective_amount = amount.min(&remaining);

    let mint = ledger::insert_mint(
        &NewMint {
            inscription_id,
            deploy_id: deploy.id,
            block_height,
            tx_id,
            address,
            requested_amount: amount,
            effective_amount: &effective_amount,
        },
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    ledger::insert_balance_delta(
        &DbBalanceDelta {
            id: 0,
            inscription_id: inscription_id.to_string(),
            deploy_id: deploy.id,
            block_height,
            address: address.to_string(),
            avail_delta: ledger::positive(&effective_amount),
            trans_delta: ledger::zero_delta(),
        },
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    ledger::insert_event(
        inscription_id,
        deploy.id,
        block_height,
        EventType::Mint,
        Some(mint.id),
        None,
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    try_info!(
        ctx,
        "brc-20 mint {} {} ({}) at block {}",
        ticker,
        effective_amount,
        address,
        block_height
    );
    Ok(EngineOutcome::Applied)
}

#[allow(clippy::too_many_arguments)]
async fn apply_inscribe_transfer<T: GenericClient>(
    inscription_id: &str,
    block_height: u64,
    tx_id: &str,
    address: &str,
    ticker: &str,
    amount: &Decimal,
    client: &T,
    ctx: &Context,
) -> Result<EngineOutcome, EngineError> {
    let Some(deploy) = ledger::get_deploy_by_ticker(ticker, client)
        .await
        .map_err(EngineError::Store)?
    else {
        return Ok(EngineOutcome::Rejected(ConsensusRejection::TickerNotFound(
            ticker.to_string(),
        )));
    };

    let (available, _) = ledger::get_balance(address, deploy.id, client)
        .await
        .map_err(EngineError::Store)?;
    if amount > &available {
        return Ok(EngineOutcome::Rejected(ConsensusRejection::InsufficientBalance {
            ticker: ticker.to_string(),
            available: available.to_string(),
            requested: amount.to_string(),
        }));
    }

    let transfer = ledger::insert_transfer(
        &NewTransfer {
            inscription_id,
            deploy_id: deploy.id,
            block_height,
            tx_id,
            from_address: address,
            amount,
        },
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    ledger::insert_balance_delta(
        &DbBalanceDelta {
            id: 0,
            inscription_id: inscription_id.to_string(),
            deploy_id: deploy.id,
            block_height,
            address: address.to_string(),
            avail_delta: ledger::negate(amount),
            trans_delta: ledger::positive(amount),
        },
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    ledger::insert_event(
        inscription_id,
        deploy.id,
        block_height,
        EventType::TransferReserve,
        None,
        Some(transfer.id),
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    try_info!(
        ctx,
        "brc-20 transfer (inscribe) {} {} ({}) at block {}",
        ticker,
        amount,
        address,
        block_height
    );
    Ok(EngineOutcome::Applied)
}

/// Handles a subsequent movement of an inscription: settles its transfer-intent, if any, and
/// ignores anything else (already settled, or no reserve found).
pub async fn apply_inscription_transfer<T: GenericClient>(
    inscription_id: &str,
    block_height: u64,
    location: &Location,
    client: &T,
    ctx: &Context,
) -> Result<EngineOutcome, EngineError> {
    let intents = ledger::get_transfer_intents_for_inscription(inscription_id, client)
        .await
        .map_err(EngineError::Store)?;

    let [intent] = intents.as_slice() else {
        try_debug!(
            ctx,
            "brc-20 inscription {} moved with {} transfer-intent rows, ignoring",
            inscription_id,
            intents.len()
        );
        return Ok(EngineOutcome::Ignored);
    };
    if intent.to_address.is_some() {
        try_debug!(
            ctx,
            "brc-20 transfer for inscription {} already settled, ignoring",
            inscription_id
        );
        return Ok(EngineOutcome::Ignored);
    }

    let recipient = location.address.as_deref();
    ledger::settle_transfer(intent.id, recipient, client)
        .await
        .map_err(EngineError::Store)?;

    ledger::insert_balance_delta(
        &DbBalanceDelta {
            id: 0,
            inscription_id: inscription_id.to_string(),
            deploy_id: intent.deploy_id,
            block_height,
            address: intent.from_address.clone(),
            avail_delta: ledger::zero_delta(),
            trans_delta: ledger::negate(&intent.amount),
        },
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    if let Some(recipient_address) = recipient {
        ledger::insert_balance_delta(
            &DbBalanceDelta {
                id: 0,
                inscription_id: inscription_id.to_string(),
                deploy_id: intent.deploy_id,
                block_height,
                address: recipient_address.to_string(),
                avail_delta: ledger::positive(&intent.amount),
                trans_delta: ledger::zero_delta(),
            },
            client,
        )
        .await
        .map_err(EngineError::Store)?;
    }

    ledger::insert_event(
        inscription_id,
        intent.deploy_id,
        block_height,
        EventType::TransferSettle,
        None,
        Some(intent.id),
        client,
    )
    .await
    .map_err(EngineError::Store)?;

    try_info!(
        ctx,
        "brc-20 transfer settle {} ({} -> {:?}) at block {}",
        intent.amount,
        intent.from_address,
        recipient,
        block_height
    );
    Ok(EngineOutcome::Applied)
}

/// Removes every ledger row written at `block_height`. Must be called in strictly decreasing
/// height order from the current tip. Rolling back a height that never recorded a single row is
/// treated as a rollback of an unknown height and is fatal, not a silent no-op.
pub async fn rollback_block<T: GenericClient>(
    block_height: u64,
    client: &T,
    ctx: &Context,
) -> Result<(), EngineError> {
    let affected = ledger::delete_block(block_height, client)
        .await
        .map_err(EngineError::Store)?;
    if affected == 0 {
        return Err(EngineError::Fatal(format!(
            "rollback requested for block {} but no ledger rows were recorded at that height",
            block_height
        )));
    }
    try_info!(ctx, "brc-20 rolled back block {}", block_height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::test_support::{pg_test_client, pg_test_pool, pg_test_reset};

    fn loc(block_height: u64, address: Option<&str>) -> Location {
        Location {
            block_height,
            tx_id: format!("tx-{block_height}"),
            address: address.map(str::to_string),
            offset: 0,
        }
    }

    async fn deploy(client: &impl GenericClient, ticker: &str, max: &str, lim: Option<&str>, height: u64) -> EngineOutcome {
        let lim_field = lim.map(|l| format!(r#","lim":"{l}""#)).unwrap_or_default();
        let body = format!(r#"{{"p":"brc-20","op":"deploy","tick":"{ticker}","max":"{max}"{lim_field}}}"#);
        apply_inscription_genesis(
            &format!("deploy-{ticker}-{height}"),
            height,
            "tx",
            "text/plain",
            body.as_bytes(),
            &loc(height, Some("deployer")),
            client,
            &Context::empty(),
        )
        .await
        .unwrap()
    }

    async fn mint(client: &impl GenericClient, ticker: &str, amt: &str, address: &str, height: u64) -> EngineOutcome {
        let body = format!(r#"{{"p":"brc-20","op":"mint","tick":"{ticker}","amt":"{amt}"}}"#);
        apply_inscription_genesis(
            &format!("mint-{ticker}-{address}-{height}"),
            height,
            "tx",
            "text/plain",
            body.as_bytes(),
            &loc(height, Some(address)),
            client,
            &Context::empty(),
        )
        .await
        .unwrap()
    }

    async fn inscribe_transfer(
        client: &impl GenericClient,
        inscription_id: &str,
        ticker: &str,
        amt: &str,
        address: &str,
        height: u64,
    ) -> EngineOutcome {
        let body = format!(r#"{{"p":"brc-20","op":"transfer","tick":"{ticker}","amt":"{amt}"}}"#);
        apply_inscription_genesis(
            inscription_id,
            height,
            "tx",
            "text/plain",
            body.as_bytes(),
            &loc(height, Some(address)),
            client,
            &Context::empty(),
        )
        .await
        .unwrap()
    }

    async fn balance_of<T: GenericClient>(client: &T, ticker: &str, address: &str) -> (Decimal, Decimal) {
        let deploy = ledger::get_deploy_by_ticker(ticker, client).await.unwrap().unwrap();
        ledger::get_balance(address, deploy.id, client).await.unwrap()
    }

    #[tokio::test]
    async fn deploy_mint_and_balance() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            assert_eq!(
                deploy(&tx, "ordi", "21000000", Some("1000"), 100).await,
                EngineOutcome::Applied
            );
            assert_eq!(
                mint(&tx, "ordi", "500", "addr-a", 101).await,
                EngineOutcome::Applied
            );

            let (avail, trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(avail, Decimal::from_str("500").unwrap());
            assert_eq!(trans, Decimal::zero());

            let supply = crate::query::supply("ordi", &tx).await.unwrap().unwrap();
            assert_eq!(supply.max_supply, Decimal::from_str("21000000").unwrap());
            assert_eq!(supply.minted_supply, Decimal::from_str("500").unwrap());
            assert_eq!(supply.holder_count, 1);

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn mint_exceeds_limit_is_rejected() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            deploy(&tx, "ordi", "21000000", Some("1000"), 100).await;
            mint(&tx, "ordi", "500", "addr-a", 101).await;

            let outcome = mint(&tx, "ordi", "2000", "addr-a", 102).await;
            assert!(matches!(
                outcome,
                EngineOutcome::Rejected(ConsensusRejection::AmountExceedsLimit { .. })
            ));

            let (avail, _) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(avail, Decimal::from_str("500").unwrap());

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn mint_excess_is_clamped_to_remaining_supply() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            deploy(&tx, "clmp", "100", None, 100).await;
            mint(&tx, "clmp", "80", "addr-a", 101).await;

            assert_eq!(
                mint(&tx, "clmp", "50", "addr-b", 102).await,
                EngineOutcome::Applied
            );

            let (avail, _) = balance_of(&tx, "clmp", "addr-b").await;
            assert_eq!(avail, Decimal::from_str("20").unwrap());

            let supply = crate::query::supply("clmp", &tx).await.unwrap().unwrap();
            assert_eq!(supply.minted_supply, Decimal::from_str("100").unwrap());

            // Fully minted now: a further mint finds zero remaining supply.
            assert_eq!(
                mint(&tx, "clmp", "1", "addr-c", 103).await,
                EngineOutcome::Rejected(ConsensusRejection::SupplyExhausted("clmp".to_string()))
            );

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn transfer_two_step_settles_on_next_move() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            deploy(&tx, "ordi", "21000000", None, 100).await;
            mint(&tx, "ordi", "1000", "addr-a", 101).await;

            assert_eq!(
                inscribe_transfer(&tx, "xfer-1", "ordi", "300", "addr-a", 102).await,
                EngineOutcome::Applied
            );
            let (avail, trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(avail, Decimal::from_str("700").unwrap());
            assert_eq!(trans, Decimal::from_str("300").unwrap());

            // First subsequent move settles: addr-a loses the hold, addr-b is credited.
            let outcome = apply_inscription_transfer(
                "xfer-1",
                104,
                &loc(104, Some("addr-b")),
                &tx,
                &Context::empty(),
            )
            .await
            .unwrap();
            assert_eq!(outcome, EngineOutcome::Applied);

            let (a_avail, a_trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(a_avail, Decimal::from_str("700").unwrap());
            assert_eq!(a_trans, Decimal::zero());
            let (b_avail, b_trans) = balance_of(&tx, "ordi", "addr-b").await;
            assert_eq!(b_avail, Decimal::from_str("300").unwrap());
            assert_eq!(b_trans, Decimal::zero());

            // A second move of the same inscription is ignored: already settled.
            let second = apply_inscription_transfer(
                "xfer-1",
                106,
                &loc(106, Some("addr-c")),
                &tx,
                &Context::empty(),
            )
            .await
            .unwrap();
            assert_eq!(second, EngineOutcome::Ignored);

            let (c_avail, _) = balance_of(&tx, "ordi", "addr-c").await;
            assert_eq!(c_avail, Decimal::zero());

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn transfer_with_insufficient_balance_is_rejected() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            deploy(&tx, "ordi", "21000000", None, 100).await;
            mint(&tx, "ordi", "100", "addr-a", 101).await;

            let outcome = inscribe_transfer(&tx, "xfer-2", "ordi", "101", "addr-a", 102).await;
            assert!(matches!(
                outcome,
                EngineOutcome::Rejected(ConsensusRejection::InsufficientBalance { .. })
            ));

            let (avail, trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(avail, Decimal::from_str("100").unwrap());
            assert_eq!(trans, Decimal::zero());

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn rollback_restores_prior_state() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();
            let ctx = Context::empty();

            deploy(&tx, "ordi", "21000000", None, 100).await;
            mint(&tx, "ordi", "1000", "addr-a", 101).await;
            inscribe_transfer(&tx, "xfer-3", "ordi", "300", "addr-a", 102).await;
            apply_inscription_transfer(
                "xfer-3",
                103,
                &loc(103, Some("addr-b")),
                &tx,
                &ctx,
            )
            .await
            .unwrap();

            let (a_avail, a_trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(a_avail, Decimal::from_str("700").unwrap());
            assert_eq!(a_trans, Decimal::zero());
            let (b_avail, _) = balance_of(&tx, "ordi", "addr-b").await;
            assert_eq!(b_avail, Decimal::from_str("300").unwrap());

            // Rollback the settlement block (H+2): B disappears, A's hold comes back.
            rollback_block(103, &tx, &ctx).await.unwrap();
            let (a_avail, a_trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(a_avail, Decimal::from_str("700").unwrap());
            assert_eq!(a_trans, Decimal::from_str("300").unwrap());
            let (b_avail, _) = balance_of(&tx, "ordi", "addr-b").await;
            assert_eq!(b_avail, Decimal::zero());
            let intents = ledger::get_transfer_intents_for_inscription("xfer-3", &tx)
                .await
                .unwrap();
            assert_eq!(intents.len(), 1);
            assert_eq!(intents[0].to_address, None);

            // Rollback the reserve block (H+1): the intent and its hold vanish, A is back to
            // its post-mint balance.
            rollback_block(102, &tx, &ctx).await.unwrap();
            let (a_avail, a_trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(a_avail, Decimal::from_str("1000").unwrap());
            assert_eq!(a_trans, Decimal::zero());
            let intents = ledger::get_transfer_intents_for_inscription("xfer-3", &tx)
                .await
                .unwrap();
            assert!(intents.is_empty());

            // Rolling back strictly in reverse height order from the tip: the mint's block
            // must go before the genesis block that the mint's deploy row depends on.
            rollback_block(101, &tx, &ctx).await.unwrap();
            let (a_avail, a_trans) = balance_of(&tx, "ordi", "addr-a").await;
            assert_eq!(a_avail, Decimal::zero());
            assert_eq!(a_trans, Decimal::zero());

            // Rollback the genesis block: the token itself disappears.
            rollback_block(100, &tx, &ctx).await.unwrap();
            assert!(ledger::get_deploy_by_ticker("ordi", &tx).await.unwrap().is_none());

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn rollback_of_unknown_height_is_fatal() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            deploy(&tx, "ordi", "1000", None, 100).await;

            let err = rollback_block(999, &tx, &Context::empty()).await.unwrap_err();
            assert!(matches!(err, EngineError::Fatal(_)));

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn duplicate_ticker_case_insensitive_is_rejected() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            assert_eq!(
                deploy(&tx, "ordi", "1000", None, 100).await,
                EngineOutcome::Applied
            );
            let collision = deploy(&tx, "ORDI", "1000", None, 101).await;
            assert_eq!(
                collision,
                EngineOutcome::Rejected(ConsensusRejection::DuplicateTicker("ORDI".to_string()))
            );

            let (tokens, total) = crate::query::list_tokens(None, &crate::query::Paging::default(), &tx)
                .await
                .unwrap();
            assert_eq!(total, 1);
            assert_eq!(tokens.len(), 1);

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn inscribed_to_fee_is_rejected_without_address() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            let body = br#"{"p":"brc-20","op":"deploy","tick":"fees","max":"1000"}"#;
            let outcome = apply_inscription_genesis(
                "fee-spend",
                100,
                "tx",
                "text/plain",
                body,
                &loc(100, None),
                &tx,
                &Context::empty(),
            )
            .await
            .unwrap();
            assert_eq!(
                outcome,
                EngineOutcome::Rejected(ConsensusRejection::InscribedToFee)
            );
            assert!(ledger::get_deploy_by_ticker("fees", &tx).await.unwrap().is_none());

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn non_brc20_payload_is_ignored() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();

            let outcome = apply_inscription_genesis(
                "not-brc20",
                100,
                "tx",
                "text/plain",
                br#"{"hello":"world"}"#,
                &loc(100, Some("addr-a")),
                &tx,
                &Context::empty(),
            )
            .await
            .unwrap();
            assert_eq!(outcome, EngineOutcome::Ignored);

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }
}
