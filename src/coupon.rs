//! Coupon evaluation.
//!
//! A coupon resolves to a discount policy at payment time, not at booking
//! time, so the price reflects whatever the code is worth at checkout.
//! Evaluation is pure: no storage, no clock. Unknown codes are a no-op
//! rather than an error, so checkout never blocks on a bad code.

use std::collections::HashMap;

use tracing::warn;

/// Discount policy a coupon code resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// The full amount is waived; the payment settles at zero.
    FullWaiver,
    /// Percentage off, 0..=100.
    PercentOff(u8),
}

/// The coupon table: normalized code -> policy.
///
/// Codes are normalized by trimming and upper-casing, both when the table is
/// built and when a code is looked up.
#[derive(Debug, Clone)]
pub struct CouponBook {
    codes: HashMap<String, Discount>,
}

impl Default for CouponBook {
    /// The codes the marketplace has always honored: two full waivers and a
    /// 10% first-booking discount.
    fn default() -> Self {
        let mut codes = HashMap::new();
        codes.insert("FREE100".to_string(), Discount::FullWaiver);
        codes.insert("DEVTEST".to_string(), Discount::FullWaiver);
        codes.insert("NEWUSER10".to_string(), Discount::PercentOff(10));
        Self { codes }
    }
}

impl CouponBook {
    /// Parse a table from the `COUPONS` env format:
    /// `FREE100=waiver,NEWUSER10=10%`. Entries that do not parse are skipped
    /// with a warning rather than failing startup.
    pub fn parse(table: &str) -> Self {
        let mut codes = HashMap::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((code, policy)) = entry.split_once('=') else {
                warn!("ignoring malformed coupon entry: {entry}");
                continue;
            };
            let code = normalize(code);
            match parse_policy(policy.trim()) {
                Some(discount) => {
                    codes.insert(code, discount);
                }
                None => warn!("ignoring coupon {code} with unknown policy: {policy}"),
            }
        }
        Self { codes }
    }

    /// Build the table from an optional env override, falling back to the
    /// built-in codes.
    pub fn from_override(table: Option<&str>) -> Self {
        match table {
            Some(s) => Self::parse(s),
            None => Self::default(),
        }
    }

    /// Apply the coupon to `base_amount` (minor units) and return the
    /// adjusted amount. Unknown or absent codes leave the amount unchanged.
    /// The result is never negative; percentage discounts round the adjusted
    /// amount down to the nearest minor unit.
    pub fn evaluate(&self, code: Option<&str>, base_amount: i64) -> i64 {
        let Some(code) = code else {
            return base_amount;
        };
        match self.codes.get(&normalize(code)) {
            Some(Discount::FullWaiver) => 0,
            Some(Discount::PercentOff(pct)) => {
                let pct = i64::from((*pct).min(100));
                (base_amount * (100 - pct)) / 100
            }
            None => base_amount,
        }
    }

    /// Whether the code resolves to a policy at all.
    pub fn is_known(&self, code: &str) -> bool {
        self.codes.contains_key(&normalize(code))
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

fn parse_policy(policy: &str) -> Option<Discount> {
    if policy.eq_ignore_ascii_case("waiver") {
        return Some(Discount::FullWaiver);
    }
    let pct = policy.strip_suffix('%')?.parse::<u8>().ok()?;
    (pct <= 100).then_some(Discount::PercentOff(pct))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_waiver_zeroes_the_amount() {
        let book = CouponBook::default();
        assert_eq!(book.evaluate(Some("FREE100"), 500), 0);
        assert_eq!(book.evaluate(Some("DEVTEST"), 123_456), 0);
    }

    #[test]
    fn percent_off_rounds_down() {
        let book = CouponBook::default();
        assert_eq!(book.evaluate(Some("NEWUSER10"), 1000), 900);
        // 999 * 90 / 100 = 899.1, adjusted amount rounds down
        assert_eq!(book.evaluate(Some("NEWUSER10"), 999), 899);
        assert_eq!(book.evaluate(Some("NEWUSER10"), 0), 0);
    }

    #[test]
    fn unknown_codes_are_a_no_op() {
        let book = CouponBook::default();
        assert_eq!(book.evaluate(Some("UNKNOWN"), 1000), 1000);
        assert_eq!(book.evaluate(None, 1000), 1000);
        assert!(!book.is_known("UNKNOWN"));
    }

    #[test]
    fn codes_are_normalized() {
        let book = CouponBook::default();
        assert_eq!(book.evaluate(Some("  free100 "), 500), 0);
        assert!(book.is_known("newuser10"));
    }

    #[test]
    fn parse_accepts_waivers_and_percentages() {
        let book = CouponBook::parse("VIP=waiver, half=50%, junk, BAD=200%");
        assert_eq!(book.evaluate(Some("VIP"), 700), 0);
        assert_eq!(book.evaluate(Some("HALF"), 701), 350);
        // malformed and out-of-range entries are skipped
        assert_eq!(book.evaluate(Some("JUNK"), 100), 100);
        assert_eq!(book.evaluate(Some("BAD"), 100), 100);
    }

    #[test]
    fn from_override_falls_back_to_builtin_table() {
        let book = CouponBook::from_override(None);
        assert!(book.is_known("FREE100"));
        let book = CouponBook::from_override(Some("ONLY=5%"));
        assert!(!book.is_known("FREE100"));
        assert_eq!(book.evaluate(Some("ONLY"), 100), 95);
    }
}
