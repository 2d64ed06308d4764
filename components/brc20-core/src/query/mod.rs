use std::str::FromStr;

use bigdecimal::BigDecimal;
use tokio_postgres::GenericClient;

use crate::numeric::Decimal;
use crate::parser::ticker_key;

#[derive(Debug, Clone, PartialEq)]
pub struct Paging {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Paging {
    fn default() -> Self {
        Paging {
            limit: 100,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSummary {
    pub ticker: String,
    pub max_supply: Decimal,
    pub mint_limit: Option<Decimal>,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddressBalance {
    pub ticker: String,
    pub available: Decimal,
    pub transferable: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSupply {
    pub max_supply: Decimal,
    pub minted_supply: Decimal,
    pub holder_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holder {
    pub address: String,
    pub total_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEvent {
    pub event_type: String,
    pub inscription_id: String,
    pub block_height: u64,
}

fn parse_decimal(value: BigDecimal) -> Decimal {
    Decimal::from_str(&value.to_string()).unwrap_or_else(|_| Decimal::zero())
}

pub async fn list_tokens<T: GenericClient>(
    ticker_filter: Option<&str>,
    paging: &Paging,
    client: &T,
) -> Result<(Vec<TokenSummary>, i64), String> {
    let key_filter = ticker_filter.map(ticker_key);
    let rows = client
        .query(
            "SELECT ticker, max_supply, mint_limit, decimals FROM brc20_deploys
                WHERE $1::text IS NULL OR lower(ticker) = $1
                ORDER BY id ASC LIMIT $2 OFFSET $3",
            &[&key_filter, &paging.limit, &paging.offset],
        )
        .await
        .map_err(|e| format!("list_tokens: {e}"))?;
    let total = client
        .query_one(
            "SELECT COUNT(*) AS total FROM brc20_deploys WHERE $1::text IS NULL OR lower(ticker) = $1",
            &[&key_filter],
        )
        .await
        .map_err(|e| format!("list_tokens(count): {e}"))?
        .get::<_, i64>("total");

    let tokens = rows
        .iter()
        .map(|row| {
            let mint_limit: Option<BigDecimal> = row.get("mint_limit");
            TokenSummary {
                ticker: row.get("ticker"),
                max_supply: parse_decimal(row.get("max_supply")),
                mint_limit: mint_limit.map(parse_decimal),
                decimals: row.get::<_, i32>("decimals") as u8,
            }
        })
        .collect();
    Ok((tokens, total))
}

pub async fn balances<T: GenericClient>(
    address: &str,
    ticker_filter: Option<&str>,
    paging: &Paging,
    client: &T,
) -> Result<Vec<AddressBalance>, String> {
    let key_filter = ticker_filter.map(ticker_key);
    let rows = client
        .query(
            "SELECT d.ticker AS ticker,
                    COALESCE(SUM(b.avail_delta), 0) AS avail,
                    COALESCE(SUM(b.trans_delta), 0) AS trans
                FROM brc20_balances b
                JOIN brc20_deploys d ON d.id = b.deploy_id
                WHERE b.address = $1 AND ($2::text IS NULL OR lower(d.ticker) = $2)
                GROUP BY d.ticker
                ORDER BY d.ticker ASC
                LIMIT $3 OFFSET $4",
            &[&address, &key_filter, &paging.limit, &paging.offset],
        )
        .await
        .map_err(|e| format!("balances: {e}"))?;
    Ok(rows
        .iter()
        .map(|row| {
            let avail = parse_decimal(row.get("avail"));
            let trans = parse_decimal(row.get("trans"));
            let total = avail.checked_add(&trans);
            AddressBalance {
                ticker: row.get("ticker"),
                available: avail,
                transferable: trans,
                total,
            }
        })
        .collect())
}

pub async fn supply<T: GenericClient>(ticker: &str, client: &T) -> Result<Option<TokenSupply>, String> {
    let key = ticker_key(ticker);
    let Some(deploy_row) = client
        .query_opt(
            "SELECT id, max_supply FROM brc20_deploys WHERE lower(ticker) = $1",
            &[&key],
        )
        .await
        .map_err(|e| format!("supply: {e}"))?
    else {
        return Ok(None);
    };
    let deploy_id: i64 = deploy_row.get("id");
    let max_supply = parse_decimal(deploy_row.get("max_supply"));

    let minted_row = client
        .query_one(
            "SELECT COALESCE(SUM(effective_amount), 0) AS minted FROM brc20_mints WHERE deploy_id = $1",
            &[&deploy_id],
        )
        .await
        .map_err(|e| format!("supply(minted): {e}"))?;
    let minted_supply = parse_decimal(minted_row.get("minted"));

    let holders_row = client
        .query_one(
            "SELECT COUNT(*) AS holders FROM (
                SELECT address FROM brc20_balances WHERE deploy_id = $1
                GROUP BY address HAVING SUM(avail_delta) + SUM(trans_delta) > 0
            ) t",
            &[&deploy_id],
        )
        .await
        .map_err(|e| format!("supply(holders): {e}"))?;
    let holder_count: i64 = holders_row.get("holders");

    Ok(Some(TokenSupply {
        max_supply,
        minted_supply,
        holder_count,
    }))
}

pub async fn holders<T: GenericClient>(
    ticker: &str,
    paging: &Paging,
    client: &T,
) -> Result<Vec<Holder>, String> {
    let key = ticker_key(ticker);
    let rows = client
        .query(
            "SELECT b.address AS address, SUM(b.avail_delta) + SUM(b.trans_delta) AS total
                FROM brc20_balances b
                JOIN brc20_deploys d ON d.id = b.deploy_id
                WHERE lower(d.ticker) = $1
                GROUP BY b.address
                HAVING SUM(b.avail_delta) + SUM(b.trans_delta) > 0
                ORDER BY total DESC
                LIMIT $2 OFFSET $3",
            &[&key, &paging.limit, &paging.offset],
        )
        .await
        .map_err(|e| format!("holders: {e}"))?;
    Ok(rows
        .iter()
        .map(|row| Holder {
            address: row.get("address"),
            total_balance: parse_decimal(row.get("total")),
        })
        .collect())
}

pub async fn history<T: GenericClient>(
    ticker: &str,
    paging: &Paging,
    client: &T,
) -> Result<Vec<HistoryEvent>, String> {
    let key = ticker_key(ticker);
    let rows = client
        .query(
            "SELECT e.event_type::text AS event_type, e.inscription_id AS inscription_id,
                    e.block_height AS block_height
                FROM brc20_events e
                JOIN brc20_deploys d ON d.id = e.deploy_id
                WHERE lower(d.ticker) = $1
                ORDER BY e.id DESC
                LIMIT $2 OFFSET $3",
            &[&key, &paging.limit, &paging.offset],
        )
        .await
        .map_err(|e| format!("history: {e}"))?;
    Ok(rows
        .iter()
        .map(|row| HistoryEvent {
            event_type: row.get("event_type"),
            inscription_id: row.get("inscription_id"),
            block_height: row.get::<_, i64>("block_height") as u64,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::apply_inscription_genesis;
    use crate::ledger;
    use crate::test_support::{pg_test_client, pg_test_pool, pg_test_reset};
    use crate::wire::Location;
    use crate::Context;

    fn loc(block_height: u64, address: &str) -> Location {
        Location {
            block_height,
            tx_id: format!("tx-{block_height}"),
            address: Some(address.to_string()),
            offset: 0,
        }
    }

    async fn seed(client: &impl GenericClient) {
        let ctx = Context::empty();
        apply_inscription_genesis(
            "deploy-ordi",
            100,
            "tx",
            "text/plain",
            br#"{"p":"brc-20","op":"deploy","tick":"ordi","max":"1000"}"#,
            &loc(100, "deployer"),
            client,
            &ctx,
        )
        .await
        .unwrap();
        apply_inscription_genesis(
            "mint-a",
            101,
            "tx",
            "text/plain",
            br#"{"p":"brc-20","op":"mint","tick":"ordi","amt":"600"}"#,
            &loc(101, "addr-a"),
            client,
            &ctx,
        )
        .await
        .unwrap();
        apply_inscription_genesis(
            "mint-b",
            102,
            "tx",
            "text/plain",
            br#"{"p":"brc-20","op":"mint","tick":"ordi","amt":"400"}"#,
            &loc(102, "addr-b"),
            client,
            &ctx,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn list_tokens_filters_case_insensitively_and_paginates() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();
            seed(&tx).await;

            let (all, total) = list_tokens(None, &Paging::default(), &tx).await.unwrap();
            assert_eq!(total, 1);
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].ticker, "ordi");

            let (found, _) = list_tokens(Some("ORDI"), &Paging::default(), &tx).await.unwrap();
            assert_eq!(found.len(), 1);

            let (missing, count) = list_tokens(Some("none"), &Paging::default(), &tx).await.unwrap();
            assert!(missing.is_empty());
            assert_eq!(count, 0);

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn balances_groups_and_sums_by_ticker() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();
            seed(&tx).await;

            let rows = balances("addr-a", None, &Paging::default(), &tx).await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].ticker, "ordi");
            assert_eq!(rows[0].available.to_string(), "600");
            assert_eq!(rows[0].transferable.to_string(), "0");
            assert_eq!(rows[0].total.to_string(), "600");

            let empty = balances("addr-nobody", None, &Paging::default(), &tx).await.unwrap();
            assert!(empty.is_empty());

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn supply_reports_max_minted_and_holder_count() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();
            seed(&tx).await;

            let s = supply("ordi", &tx).await.unwrap().unwrap();
            assert_eq!(s.max_supply.to_string(), "1000");
            assert_eq!(s.minted_supply.to_string(), "1000");
            assert_eq!(s.holder_count, 2);

            assert!(supply("none", &tx).await.unwrap().is_none());

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn holders_orders_by_total_balance_desc() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();
            seed(&tx).await;

            let rows = holders("ordi", &Paging::default(), &tx).await.unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].address, "addr-a");
            assert_eq!(rows[0].total_balance.to_string(), "600");
            assert_eq!(rows[1].address, "addr-b");
            assert_eq!(rows[1].total_balance.to_string(), "400");

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }

    #[tokio::test]
    async fn history_orders_most_recent_first() {
        let mut pg_client = pg_test_client().await;
        ledger::migrate(&mut pg_client).await.unwrap();
        let pool = pg_test_pool();
        {
            let mut conn = brc20_postgres::pg_pool_client(&pool).await.unwrap();
            let tx = brc20_postgres::pg_begin(&mut conn).await.unwrap();
            seed(&tx).await;

            let events = history("ordi", &Paging::default(), &tx).await.unwrap();
            assert_eq!(events.len(), 3);
            assert_eq!(events[0].event_type, "mint");
            assert_eq!(events[0].block_height, 102);
            assert_eq!(events[2].event_type, "deploy");
            assert_eq!(events[2].block_height, 100);

            tx.commit().await.unwrap();
        }
        pg_test_reset(&mut pg_client).await;
    }
}
