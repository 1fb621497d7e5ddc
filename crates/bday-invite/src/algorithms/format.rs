//! Display helpers for addresses, dates and explorer links.

use chrono::{DateTime, Utc};

/// Block explorer base URL.
pub const EXPLORER_BASE: &str = "https://explorer.solana.com";

/// `first8...last8`.
pub fn truncate_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(8).collect();
    let tail: String = chars[chars.len().saturating_sub(8)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// `January 1, 2099`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `03:04 PM`.
pub fn format_time(date: &DateTime<Utc>) -> String {
    date.format("%I:%M %p").to_string()
}

/// Explorer URL for a transaction on `cluster`.
pub fn explorer_link(tx: &str, cluster: &str) -> String {
    format!("{}/tx/{}?cluster={}", EXPLORER_BASE, tx, cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_address() {
        let key = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
        assert_eq!(truncate_address(key), "9xQeWvG8...9PusVFin");
        assert_eq!(truncate_address(""), "");
    }

    #[test]
    fn test_truncate_short_address_repeats_like_slice() {
        assert_eq!(truncate_address("abc"), "abc...abc");
    }

    #[test]
    fn test_format_date_and_time() {
        let date = Utc.with_ymd_and_hms(2099, 1, 1, 15, 4, 0).unwrap();
        assert_eq!(format_date(&date), "January 1, 2099");
        assert_eq!(format_time(&date), "03:04 PM");
    }

    #[test]
    fn test_explorer_link() {
        assert_eq!(
            explorer_link("5xSig", "devnet"),
            "https://explorer.solana.com/tx/5xSig?cluster=devnet"
        );
    }
}
