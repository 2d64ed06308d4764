use std::str::FromStr;

use bigdecimal::BigDecimal;
use brc20_postgres::FromPgRow;
use tokio_postgres::Row;

use crate::numeric::Decimal;

fn decimal_from_row(row: &Row, column: &str) -> Decimal {
    let raw: BigDecimal = row.get(column);
    Decimal::from_str(&raw.to_string()).expect("numeric column holds a non-negative decimal")
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbDeploy {
    pub id: i64,
    pub ticker: String,
    pub display_ticker: String,
    pub inscription_id: String,
    pub block_height: u64,
    pub tx_id: String,
    pub address: String,
    pub max_supply: Decimal,
    pub mint_limit: Option<Decimal>,
    pub decimals: u8,
}

impl FromPgRow for DbDeploy {
    fn from_pg_row(row: &Row) -> Self {
        let mint_limit: Option<BigDecimal> = row.get("mint_limit");
        DbDeploy {
            id: row.get("id"),
            ticker: row.get("ticker"),
            display_ticker: row.get("display_ticker"),
            inscription_id: row.get("inscription_id"),
            block_height: row.get::<_, i64>("block_height") as u64,
            tx_id: row.get("tx_id"),
            address: row.get("address"),
            max_supply: decimal_from_row(row, "max_supply"),
            mint_limit: mint_limit.map(|v| Decimal::from_str(&v.to_string()).unwrap()),
            decimals: row.get::<_, i32>("decimals") as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbMint {
    pub id: i64,
    pub inscription_id: String,
    pub deploy_id: i64,
    pub block_height: u64,
    pub tx_id: String,
    pub address: String,
    pub requested_amount: Decimal,
    pub effective_amount: Decimal,
}

impl FromPgRow for DbMint {
    fn from_pg_row(row: &Row) -> Self {
        DbMint {
            id: row.get("id"),
            inscription_id: row.get("inscription_id"),
            deploy_id: row.get("deploy_id"),
            block_height: row.get::<_, i64>("block_height") as u64,
            tx_id: row.get("tx_id"),
            address: row.get("address"),
            requested_amount: decimal_from_row(row, "requested_amount"),
            effective_amount: decimal_from_row(row, "effective_amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbTransfer {
    pub id: i64,
    pub inscription_id: String,
    pub deploy_id: i64,
    pub block_height: u64,
    pub tx_id: String,
    pub from_address: String,
    pub to_address: Option<String>,
    pub amount: Decimal,
}

impl FromPgRow for DbTransfer {
    fn from_pg_row(row: &Row) -> Self {
        DbTransfer {
            id: row.get("id"),
            inscription_id: row.get("inscription_id"),
            deploy_id: row.get("deploy_id"),
            block_height: row.get::<_, i64>("block_height") as u64,
            tx_id: row.get("tx_id"),
            from_address: row.get("from_address"),
            to_address: row.get("to_address"),
            amount: decimal_from_row(row, "amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbBalanceDelta {
    pub id: i64,
    pub inscription_id: String,
    pub deploy_id: i64,
    pub block_height: u64,
    pub address: String,
    /// Signed: a delta, not a balance. Unlike every user-facing amount, this is allowed to be
    /// negative (e.g. `-amt` when a transfer reserve debits available balance).
    pub avail_delta: BigDecimal,
    pub trans_delta: BigDecimal,
}

impl FromPgRow for DbBalanceDelta {
    fn from_pg_row(row: &Row) -> Self {
        DbBalanceDelta {
            id: row.get("id"),
            inscription_id: row.get("inscription_id"),
            deploy_id: row.get("deploy_id"),
            block_height: row.get::<_, i64>("block_height") as u64,
            address: row.get("address"),
            avail_delta: row.get("avail_delta"),
            trans_delta: row.get("trans_delta"),
        }
    }
}
