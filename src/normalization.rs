// src/normalization.rs
//
// Canonical value normalization. Every monetary/time value entering the
// catalog goes through here exactly once and comes out as a U256.

use chrono::{DateTime, TimeZone, Utc};
use ethers::types::U256;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Heterogeneous raw encodings of an on-chain monetary/time value.
#[derive(Debug, Clone)]
pub enum RawAmount {
    Uint(U256),
    Text(String),
    Number(f64),
    Absent,
}

impl From<U256> for RawAmount {
    fn from(v: U256) -> Self {
        RawAmount::Uint(v)
    }
}

impl From<u64> for RawAmount {
    fn from(v: u64) -> Self {
        RawAmount::Uint(U256::from(v))
    }
}

impl From<&str> for RawAmount {
    fn from(v: &str) -> Self {
        RawAmount::Text(v.to_string())
    }
}

impl From<Option<U256>> for RawAmount {
    fn from(v: Option<U256>) -> Self {
        match v {
            Some(v) => RawAmount::Uint(v),
            None => RawAmount::Absent,
        }
    }
}

/// Converts any raw encoding into the canonical non-negative integer.
///
/// Fail-safe: malformed, absent, or negative input normalizes to zero. A
/// missing price/bid means "no price set", not a fault, so no error is
/// surfaced. Idempotent: `normalize(normalize(x).into())` is a fixpoint.
pub fn normalize(raw: RawAmount) -> U256 {
    match raw {
        RawAmount::Uint(v) => v,
        RawAmount::Text(s) => normalize_str(&s),
        RawAmount::Number(n) => {
            if n.is_finite() && n >= 0.0 {
                U256::from(n.trunc() as u128)
            } else {
                U256::zero()
            }
        }
        RawAmount::Absent => U256::zero(),
    }
}

/// Parses a decimal or `0x`-prefixed hex string, zero on failure.
pub fn normalize_str(s: &str) -> U256 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return U256::zero();
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return U256::from_str_radix(hex, 16).unwrap_or_else(|_| U256::zero());
    }
    U256::from_dec_str(trimmed).unwrap_or_else(|_| U256::zero())
}

/// Normalizes a value plucked out of an arbitrary JSON document.
pub fn normalize_json(value: Option<&Value>) -> U256 {
    match value {
        None | Some(Value::Null) => U256::zero(),
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                U256::from(u)
            } else {
                normalize(RawAmount::Number(n.as_f64().unwrap_or(0.0)))
            }
        }
        Some(Value::String(s)) => normalize_str(s),
        Some(_) => U256::zero(),
    }
}

/// Decimal helper: 10^n, None beyond u64 capacity (n > 19)
fn pow10_decimal(n: u8) -> Option<Decimal> {
    10u64.checked_pow(n as u32).map(Decimal::from)
}

/// Base-unit amount as a human-decimal `Decimal` (display only — monetary
/// comparison always happens on the canonical integer).
pub fn to_display_decimal(amount: U256, decimals: u8) -> Decimal {
    let scale = match pow10_decimal(decimals) {
        Some(s) => s,
        None => return Decimal::ZERO,
    };
    let amt = Decimal::from_str(&amount.to_string()).unwrap_or(Decimal::ZERO);
    amt / scale
}

/// Formats a wei amount as an ETH string for log lines and terminal output.
pub fn format_eth(wei: U256) -> String {
    if wei.is_zero() {
        return "0 ETH".to_string();
    }
    let dec = to_display_decimal(wei, 18);
    if dec == Decimal::ZERO {
        // Out of Decimal's range; show raw wei rather than lying.
        return format!("{} wei", wei);
    }
    format!("{} ETH", dec.round_dp(6).normalize())
}

/// Interprets a canonical seconds-since-epoch value as a UTC timestamp.
pub fn seconds_to_datetime(secs: U256) -> Option<DateTime<Utc>> {
    if secs > U256::from(i64::MAX as u64) {
        return None;
    }
    Utc.timestamp_opt(secs.as_u64() as i64, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_like_inputs_normalize_to_zero() {
        assert_eq!(normalize(RawAmount::Absent), U256::zero());
        assert_eq!(normalize(RawAmount::Text("0".into())), U256::zero());
        assert_eq!(normalize(RawAmount::Uint(U256::zero())), U256::zero());
        assert_eq!(normalize(0u64.into()), U256::zero());
        assert_eq!(normalize("not a number".into()), U256::zero());
        assert_eq!(normalize(RawAmount::Text("".into())), U256::zero());
        assert_eq!(normalize(RawAmount::Number(f64::NAN)), U256::zero());
        assert_eq!(normalize(RawAmount::Number(-3.0)), U256::zero());
    }

    #[test]
    fn valid_encodings_round_trip() {
        assert_eq!(normalize("12345".into()), U256::from(12345u64));
        assert_eq!(normalize("0xff".into()), U256::from(255u64));
        assert_eq!(normalize(RawAmount::Number(42.0)), U256::from(42u64));
        let big = U256::from_dec_str("123456789012345678901234567890").unwrap();
        assert_eq!(normalize(RawAmount::Uint(big)), big);
        assert_eq!(normalize(RawAmount::Text(big.to_string())), big);
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            RawAmount::Text("987654321".into()),
            RawAmount::Number(17.9),
            RawAmount::Absent,
            RawAmount::Text("garbage".into()),
        ] {
            let once = normalize(raw.clone());
            assert_eq!(normalize(RawAmount::Uint(once)), once);
        }
    }

    #[test]
    fn normalize_json_covers_shapes() {
        use serde_json::json;
        assert_eq!(normalize_json(None), U256::zero());
        assert_eq!(normalize_json(Some(&json!(null))), U256::zero());
        assert_eq!(normalize_json(Some(&json!(7))), U256::from(7u64));
        assert_eq!(normalize_json(Some(&json!("0x10"))), U256::from(16u64));
        assert_eq!(normalize_json(Some(&json!([1, 2]))), U256::zero());
    }

    #[test]
    fn eth_formatting_is_display_only() {
        assert_eq!(format_eth(U256::zero()), "0 ETH");
        let one_eth = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(format_eth(one_eth), "1 ETH");
        let half = one_eth / 2;
        assert_eq!(format_eth(half), "0.5 ETH");
    }

    #[test]
    fn epoch_seconds_convert() {
        let ts = seconds_to_datetime(U256::from(1_700_000_000u64)).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert!(seconds_to_datetime(U256::MAX).is_none());
    }
}
