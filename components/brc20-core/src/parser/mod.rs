use std::str::FromStr;

use serde_json::Value;

use crate::numeric::Decimal;

pub const PROTOCOL_LITERAL: &str = "brc-20";
pub const TICK_BYTE_COUNT: usize = 4;
pub const MAX_DECIMALS: u8 = 18;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),
    #[error("body is not valid utf-8 json")]
    InvalidJson,
    #[error("not a brc-20 operation")]
    NotBrc20,
    #[error("field '{0}' is missing or malformed")]
    InvalidField(&'static str),
    #[error("tick must be exactly {TICK_BYTE_COUNT} utf-8 bytes, got {0}")]
    InvalidTickLength(usize),
}

/// A parsed, typed BRC-20 operation. Once constructed, numeric fields are guaranteed valid
/// `Decimal` values and `ticker` is guaranteed to be exactly four UTF-8 bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Deploy {
        ticker: String,
        max_supply: Decimal,
        mint_limit: Option<Decimal>,
        decimals: u8,
    },
    Mint {
        ticker: String,
        amount: Decimal,
    },
    Transfer {
        ticker: String,
        amount: Decimal,
    },
}

impl Operation {
    pub fn ticker(&self) -> &str {
        match self {
            Operation::Deploy { ticker, .. } => ticker,
            Operation::Mint { ticker, .. } => ticker,
            Operation::Transfer { ticker, .. } => ticker,
        }
    }
}

fn accepts_content_type(mime: &str) -> bool {
    matches!(
        mime,
        "text/plain" | "text/plain;charset=utf-8" | "text/plain;charset=UTF-8" | "application/json"
    ) || mime.starts_with("text/plain;")
        || mime.starts_with("application/json;")
}

/// Parses an inscription payload into a typed [`Operation`]. Returns `Err(ParseError::NotBrc20)`
/// (or a more specific variant) for any payload that is not a BRC-20 operation; callers treat
/// every `Err` the same way — skip the inscription.
pub fn parse(mime: &str, body: &[u8]) -> Result<Operation, ParseError> {
    if !accepts_content_type(mime) {
        return Err(ParseError::UnsupportedContentType(mime.to_string()));
    }
    let text = std::str::from_utf8(body).map_err(|_| ParseError::InvalidJson)?;
    let value: Value = serde_json::from_str(text).map_err(|_| ParseError::InvalidJson)?;
    let object = value.as_object().ok_or(ParseError::NotBrc20)?;

    let p = object
        .get("p")
        .and_then(Value::as_str)
        .ok_or(ParseError::NotBrc20)?;
    if !p.eq_ignore_ascii_case(PROTOCOL_LITERAL) {
        return Err(ParseError::NotBrc20);
    }

    let op = object
        .get("op")
        .and_then(Value::as_str)
        .ok_or(ParseError::NotBrc20)?;

    let ticker = parse_ticker(object)?;

    if op.eq_ignore_ascii_case("deploy") {
        let max_supply = parse_decimal(object, "max")?;
        let mint_limit = match object.get("lim") {
            Some(Value::String(s)) => Some(
                Decimal::from_str(s).map_err(|_| ParseError::InvalidField("lim"))?,
            ),
            Some(_) => return Err(ParseError::InvalidField("lim")),
            None => None,
        };
        let decimals = match object.get("dec") {
            Some(Value::String(s)) => {
                let parsed: u8 = s.parse().map_err(|_| ParseError::InvalidField("dec"))?;
                if parsed > MAX_DECIMALS {
                    return Err(ParseError::InvalidField("dec"));
                }
                parsed
            }
            Some(_) => return Err(ParseError::InvalidField("dec")),
            None => MAX_DECIMALS,
        };
        if max_supply.is_zero() {
            return Err(ParseError::InvalidField("max"));
        }
        Ok(Operation::Deploy {
            ticker,
            max_supply,
            mint_limit,
            decimals,
        })
    } else if op.eq_ignore_ascii_case("mint") {
        let amount = parse_decimal(object, "amt")?;
        if amount.is_zero() {
            return Err(ParseError::InvalidField("amt"));
        }
        Ok(Operation::Mint { ticker, amount })
    } else if op.eq_ignore_ascii_case("transfer") {
        let amount = parse_decimal(object, "amt")?;
        if amount.is_zero() {
            return Err(ParseError::InvalidField("amt"));
        }
        Ok(Operation::Transfer { ticker, amount })
    } else {
        Err(ParseError::NotBrc20)
    }
}

fn parse_ticker(object: &serde_json::Map<String, Value>) -> Result<String, ParseError> {
    let tick = object
        .get("tick")
        .and_then(Value::as_str)
        .ok_or(ParseError::InvalidField("tick"))?;
    let byte_len = tick.len();
    if byte_len != TICK_BYTE_COUNT {
        return Err(ParseError::InvalidTickLength(byte_len));
    }
    Ok(tick.to_string())
}

fn parse_decimal(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Decimal, ParseError> {
    let raw = object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ParseError::InvalidField(field))?;
    Decimal::from_str(raw).map_err(|_| ParseError::InvalidField(field))
}

/// Case-insensitive ticker identity: the key used for uniqueness and lookups.
pub fn ticker_key(ticker: &str) -> String {
    ticker.to_lowercase()
}
