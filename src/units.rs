//! Quantity parsing and human-readable unit formatting.

use anyhow::{anyhow, Context, Result};
use primitive_types::U256;

pub const ETHER_DECIMALS: u8 = 18;

/// Render a smallest-unit amount as a decimal string with `decimals` places.
///
/// Always keeps at least one fractional digit and drops the rest of the
/// trailing zeros, so `10^18` with 18 decimals is `"1.0"` and zero is `"0.0"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let places = decimals as usize;
    if places == 0 {
        return format!("{digits}.0");
    }

    let padded = if digits.len() <= places {
        format!("{}{}", "0".repeat(places + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    let frac = frac_part.trim_end_matches('0');
    let frac = if frac.is_empty() { "0" } else { frac };
    format!("{int_part}.{frac}")
}

/// Format wei as ether.
pub fn format_ether(wei: U256) -> String {
    format_units(wei, ETHER_DECIMALS)
}

/// Parse a JSON-RPC hex quantity (`0x1b4`) into a `u64`.
pub fn parse_hex_u64(s: &str) -> Result<u64> {
    let digits = strip_0x(s).ok_or_else(|| anyhow!("quantity '{s}' is missing 0x prefix"))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid hex quantity '{s}'"))
}

/// Parse a JSON-RPC hex quantity into a `U256`.
pub fn parse_hex_u256(s: &str) -> Result<U256> {
    let digits = strip_0x(s).ok_or_else(|| anyhow!("quantity '{s}' is missing 0x prefix"))?;
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| anyhow!("invalid hex quantity '{s}': {e:?}"))
}

/// Parse a block number typed by the user: decimal, or hex with `0x`.
pub fn parse_block_input(input: &str) -> Result<u64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(anyhow!("block number is empty"));
    }
    if strip_0x(s).is_some() {
        return parse_hex_u64(s);
    }
    s.parse::<u64>()
        .map_err(|_| anyhow!("'{s}' is not a block number"))
}

/// `0x` followed by 40 hex digits. Checksum casing is not verified.
pub fn is_address(input: &str) -> bool {
    match strip_0x(input.trim()) {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Format a block number as a JSON-RPC quantity.
pub fn to_hex_quantity(n: u64) -> String {
    format!("{n:#x}")
}

fn strip_0x(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}
