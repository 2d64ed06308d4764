pub mod models;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use refinery::embed_migrations;
use tokio_postgres::{Client, GenericClient};

use crate::numeric::Decimal;
use crate::parser::ticker_key;

use self::models::{DbBalanceDelta, DbDeploy, DbMint, DbTransfer};

embed_migrations!("./migrations");

pub async fn migrate(pg_client: &mut Client) -> Result<(), String> {
    match migrations::runner()
        .set_migration_table_name("pgmigrations")
        .run_async(pg_client)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("error running pg migrations: {e}")),
    }
}

fn to_bigdecimal(value: &Decimal) -> BigDecimal {
    BigDecimal::from_str(&value.to_string()).expect("Decimal always formats as valid BigDecimal")
}

pub struct NewDeploy<'a> {
    pub ticker: &'a str,
    pub inscription_id: &'a str,
    pub block_height: u64,
    pub tx_id: &'a str,
    pub address: &'a str,
    pub max_supply: &'a Decimal,
    pub mint_limit: Option<&'a Decimal>,
    pub decimals: u8,
}

/// Inserts a deploy, skipping silently on a case-insensitive ticker collision. Returns the
/// persisted row only when this call created it.
pub async fn insert_deploy<T: GenericClient>(
    deploy: &NewDeploy<'_>,
    client: &T,
) -> Result<Option<DbDeploy>, String> {
    let row = client
        .query_opt(
            "INSERT INTO brc20_deploys
                (ticker, display_ticker, inscription_id, block_height, tx_id, address, max_supply, mint_limit, decimals)
                VALUES (lower($1), $1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (lower(ticker)) DO NOTHING
                RETURNING *",
            &[
                &deploy.ticker,
                &deploy.inscription_id,
                &(deploy.block_height as i64),
                &deploy.tx_id,
                &deploy.address,
                &to_bigdecimal(deploy.max_supply),
                &deploy.mint_limit.map(to_bigdecimal),
                &(deploy.decimals as i32),
            ],
        )
        .await
        .map_err(|e| format!("insert_deploy: {e}"))?;
    Ok(row.map(|r| {
        use brc20_postgres::FromPgRow;
        DbDeploy::from_pg_row(&r)
    }))
}

pub async fn get_deploy_by_ticker<T: GenericClient>(
    ticker: &str,
    client: &T,
) -> Result<Option<DbDeploy>, String> {
    let key = ticker_key(ticker);
    let row = client
        .query_opt("SELECT * FROM brc20_deploys WHERE lower(ticker) = $1", &[&key])
        .await
        .map_err(|e| format!("get_deploy_by_ticker: {e}"))?;
    use brc20_postgres::FromPgRow;
    Ok(row.map(|r| DbDeploy::from_pg_row(&r)))
}

pub async fn get_minted_supply<T: GenericClient>(
    deploy_id: i64,
    client: &T,
) -> Result<Decimal, String> {
    let row = client
        .query_one(
            "SELECT COALESCE(SUM(effective_amount), 0) AS total FROM brc20_mints WHERE deploy_id = $1",
            &[&deploy_id],
        )
        .await
        .map_err(|e| format!("get_minted_supply: {e}"))?;
    let total: BigDecimal = row.get("total");
    Ok(Decimal::from_str(&total.to_string()).unwrap_or_else(|_| Decimal::zero()))
}

/// Current `(available, transferable)` balance for an address and token, summed from delta rows.
pub async fn get_balance<T: GenericClient>(
    address: &str,
    deploy_id: i64,
    client: &T,
) -> Result<(Decimal, Decimal), String> {
    let row = client
        .query_one(
            "SELECT COALESCE(SUM(avail_delta), 0) AS avail, COALESCE(SUM(trans_delta), 0) AS trans
                FROM brc20_balances WHERE address = $1 AND deploy_id = $2",
            &[&address, &deploy_id],
        )
        .await
        .map_err(|e| format!("get_balance: {e}"))?;
    let avail: BigDecimal = row.get("avail");
    let trans: BigDecimal = row.get("trans");
    Ok((
        Decimal::from_str(&avail.to_string()).unwrap_or_else(|_| Decimal::zero()),
        Decimal::from_str(&trans.to_string()).unwrap_or_else(|_| Decimal::zero()),
    ))
}

pub struct NewMint<'a> {
    pub inscription_id: &'a str,
    pub deploy_id: i64,
    pub block_height: u64,
    pub tx_id: &'a str,
    pub address: &'a str,
    pub requested_amount: &'a Decimal,
    pub effective_amount: &'a Decimal,
}

pub async fn insert_mint<T: GenericClient>(mint: &NewMint<'_>, client: &T) -> Result<DbMint, String> {
    let row = client
        .query_one(
            "INSERT INTO brc20_mints
                (inscription_id, deploy_id, block_height, tx_id, address, requested_amount, effective_amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *",
            &[
                &mint.inscription_id,
                &mint.deploy_id,
                &(mint.block_height as i64),
                &mint.tx_id,
                &mint.address,
                &to_bigdecimal(mint.requested_amount),
                &to_bigdecimal(mint.effective_amount),
            ],
        )
        .await
        .map_err(|e| format!("insert_mint: {e}"))?;
    use brc20_postgres::FromPgRow;
    Ok(DbMint::from_pg_row(&row))
}

pub struct NewTransfer<'a> {
    pub inscription_id: &'a str,
    pub deploy_id: i64,
    pub block_height: u64,
    pub tx_id: &'a str,
    pub from_address: &'a str,
    pub amount: &'a Decimal,
}

pub async fn insert_transfer<T: GenericClient>(
    transfer: &NewTransfer<'_>,
    client: &T,
) -> Result<DbTransfer, String> {
    let row = client
        .query_one(
            "INSERT INTO brc20_transfers
                (inscription_id, deploy_id, block_height, tx_id, from_address, to_address, amount)
                VALUES ($1, $2, $3, $4, $5, NULL, $6)
                RETURNING *",
            &[
                &transfer.inscription_id,
                &transfer.deploy_id,
                &(transfer.block_height as i64),
                &transfer.tx_id,
                &transfer.from_address,
                &to_bigdecimal(transfer.amount),
            ],
        )
        .await
        .map_err(|e| format!("insert_transfer: {e}"))?;
    use brc20_postgres::FromPgRow;
    Ok(DbTransfer::from_pg_row(&row))
}

/// Transfer-intents recorded for an inscription, capped at 2 rows: the reserve and, once
/// settled, its own row again is never created (settlement only sets `to_address`), so in
/// practice this returns at most one row; the cap exists to make a data anomaly observable
/// rather than silently picking one.
pub async fn get_transfer_intents_for_inscription<T: GenericClient>(
    inscription_id: &str,
    client: &T,
) -> Result<Vec<DbTransfer>, String> {
    let rows = client
        .query(
            "SELECT * FROM brc20_transfers WHERE inscription_id = $1 LIMIT 2",
            &[&inscription_id],
        )
        .await
        .map_err(|e| format!("get_transfer_intents_for_inscription: {e}"))?;
    use brc20_postgres::FromPgRow;
    Ok(rows.iter().map(DbTransfer::from_pg_row).collect())
}

pub async fn settle_transfer<T: GenericClient>(
    transfer_id: i64,
    to_address: Option<&str>,
    client: &T,
) -> Result<(), String> {
    client
        .execute(
            "UPDATE brc20_transfers SET to_address = $1 WHERE id = $2",
            &[&to_address, &transfer_id],
        )
        .await
        .map_err(|e| format!("settle_transfer: {e}"))?;
    Ok(())
}

pub async fn insert_balance_delta<T: GenericClient>(
    delta: &DbBalanceDelta,
    client: &T,
) -> Result<(), String> {
    client
        .execute(
            "INSERT INTO brc20_balances
                (inscription_id, deploy_id, block_height, address, avail_delta, trans_delta)
                VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &delta.inscription_id,
                &delta.deploy_id,
                &(delta.block_height as i64),
                &delta.address,
                &delta.avail_delta,
                &delta.trans_delta,
            ],
        )
        .await
        .map_err(|e| format!("insert_balance_delta: {e}"))?;
    Ok(())
}

/// Negated `BigDecimal` view of a protocol `Decimal`, for the debit side of a balance delta.
pub fn negate(value: &Decimal) -> BigDecimal {
    -to_bigdecimal(value)
}

/// `BigDecimal` view of a protocol `Decimal`, for the credit side of a balance delta.
pub fn positive(value: &Decimal) -> BigDecimal {
    to_bigdecimal(value)
}

pub fn zero_delta() -> BigDecimal {
    BigDecimal::from(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Deploy,
    Mint,
    TransferReserve,
    TransferSettle,
}

impl EventType {
    fn as_sql(&self) -> &'static str {
        match self {
            EventType::Deploy => "deploy",
            EventType::Mint => "mint",
            EventType::TransferReserve => "transfer_reserve",
            EventType::TransferSettle => "transfer_settle",
        }
    }
}

pub async fn insert_event<T: GenericClient>(
    inscription_id: &str,
    deploy_id: i64,
    block_height: u64,
    event_type: EventType,
    mint_id: Option<i64>,
    transfer_id: Option<i64>,
    client: &T,
) -> Result<(), String> {
    client
        .execute(
            "INSERT INTO brc20_events
                (inscription_id, deploy_id, block_height, event_type, mint_id, transfer_id)
                VALUES ($1, $2, $3, $4::brc20_event_type, $5, $6)",
            &[
                &inscription_id,
                &deploy_id,
                &(block_height as i64),
                &event_type.as_sql(),
                &mint_id,
                &transfer_id,
            ],
        )
        .await
        .map_err(|e| format!("insert_event: {e}"))?;
    Ok(())
}

/// Deletes every ledger row produced at `block_height`, across all tables, in the caller's
/// transaction. Because balances are append-only deltas, this alone restores prior balances.
/// Returns the total number of rows removed, so the caller can tell a real rollback apart from
/// a height that never recorded anything.
pub async fn delete_block<T: GenericClient>(block_height: u64, client: &T) -> Result<u64, String> {
    let height = block_height as i64;
    let mut affected = 0u64;
    affected += client
        .execute("DELETE FROM brc20_events WHERE block_height = $1", &[&height])
        .await
        .map_err(|e| format!("delete_block(events): {e}"))?;
    affected += client
        .execute("DELETE FROM brc20_balances WHERE block_height = $1", &[&height])
        .await
        .map_err(|e| format!("delete_block(balances): {e}"))?;
    affected += client
        .execute("DELETE FROM brc20_transfers WHERE block_height = $1", &[&height])
        .await
        .map_err(|e| format!("delete_block(transfers): {e}"))?;
    affected += client
        .execute("DELETE FROM brc20_mints WHERE block_height = $1", &[&height])
        .await
        .map_err(|e| format!("delete_block(mints): {e}"))?;
    affected += client
        .execute("DELETE FROM brc20_deploys WHERE block_height = $1", &[&height])
        .await
        .map_err(|e| format!("delete_block(deploys): {e}"))?;
    Ok(affected)
}
