// 🏷️ Network Classifier - Rules as Data
// Ordered prefix ranges mapping a card number to its network

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// BRAND
// ============================================================================

/// Brand - Card network inferred from the leading digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Brand {
    VisaElectron,
    Visa,
    AmericanExpress,
    Discover,
    Mastercard,
    RuPay,
    ChinaUnionPay,
    Jcb,
    DinersClub,
    Maestro,
    Mir,
    Uatp,
    Unknown,
}

impl Brand {
    pub const ALL: [Brand; 13] = [
        Brand::VisaElectron,
        Brand::Visa,
        Brand::AmericanExpress,
        Brand::Discover,
        Brand::Mastercard,
        Brand::RuPay,
        Brand::ChinaUnionPay,
        Brand::Jcb,
        Brand::DinersClub,
        Brand::Maestro,
        Brand::Mir,
        Brand::Uatp,
        Brand::Unknown,
    ];

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Brand::VisaElectron => "Visa Electron",
            Brand::Visa => "Visa",
            Brand::AmericanExpress => "American Express",
            Brand::Discover => "Discover",
            Brand::Mastercard => "Mastercard",
            Brand::RuPay => "RuPay",
            Brand::ChinaUnionPay => "China UnionPay",
            Brand::Jcb => "JCB",
            Brand::DinersClub => "Diners Club",
            Brand::Maestro => "Maestro",
            Brand::Mir => "Mir",
            Brand::Uatp => "UATP",
            Brand::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Brand::Unknown
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a display name, case-insensitively ("visa", "AMERICAN EXPRESS")
impl FromStr for Brand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Brand::ALL
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown card network: {}", s))
    }
}

// ============================================================================
// RANGE RULE
// ============================================================================

/// One row of the decision table
///
/// Matches when the first `prefix_len` digits, read as an integer, fall in
/// `low..=high`. Comparison is numeric so "6440".."6499" never gets confused
/// with shorter prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkRange {
    pub prefix_len: usize,
    pub low: u32,
    pub high: u32,
    pub brand: Brand,
}

impl NetworkRange {
    const fn new(prefix_len: usize, low: u32, high: u32, brand: Brand) -> Self {
        NetworkRange {
            prefix_len,
            low,
            high,
            brand,
        }
    }

    const fn exact(prefix_len: usize, value: u32, brand: Brand) -> Self {
        NetworkRange::new(prefix_len, value, value, brand)
    }

    /// Check if this rule matches the given digit string
    pub fn matches(&self, number: &str) -> bool {
        match prefix_value(number, self.prefix_len) {
            Some(prefix) => self.low <= prefix && prefix <= self.high,
            None => false,
        }
    }
}

/// First `len` characters as an integer, if they exist and are all digits
fn prefix_value(number: &str, len: usize) -> Option<u32> {
    let prefix = number.get(..len)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

// ============================================================================
// DECISION TABLE
// ============================================================================

use Brand::*;

/// Ordered rules: earlier rows win over later, more general ones.
///
/// Set-membership rows are unrolled into single-value ranges in place, so the
/// precedence between rows is unchanged.
pub static NETWORK_RANGES: &[NetworkRange] = &[
    // Visa Electron overrides (all start with 4)
    NetworkRange::exact(6, 417500, VisaElectron),
    NetworkRange::exact(6, 405141, VisaElectron),
    NetworkRange::exact(6, 405144, VisaElectron),
    NetworkRange::exact(6, 450603, VisaElectron),
    NetworkRange::exact(6, 450605, VisaElectron),
    NetworkRange::exact(6, 450628, VisaElectron),
    NetworkRange::exact(1, 4, Visa),
    // American Express
    NetworkRange::exact(2, 34, AmericanExpress),
    NetworkRange::exact(2, 37, AmericanExpress),
    // Discover must run before RuPay, UnionPay and Maestro
    NetworkRange::exact(4, 6011, Discover),
    NetworkRange::new(6, 622126, 622925, Discover),
    NetworkRange::new(4, 6440, 6499, Discover),
    NetworkRange::exact(2, 65, Discover),
    // Mastercard: 51-55, then the 2-series (22 AND 2221..=2720 AND digits 3-4 >= 20)
    NetworkRange::new(2, 51, 55, Mastercard),
    NetworkRange::new(4, 2221, 2299, Mastercard),
    // RuPay
    NetworkRange::new(4, 5081, 5082, RuPay),
    NetworkRange::exact(4, 5090, RuPay),
    NetworkRange::new(4, 6061, 6068, RuPay),
    NetworkRange::new(3, 508, 509, RuPay),
    NetworkRange::new(3, 606, 608, RuPay),
    // China UnionPay
    NetworkRange::exact(2, 62, ChinaUnionPay),
    NetworkRange::exact(2, 81, ChinaUnionPay),
    // JCB
    NetworkRange::new(4, 3528, 3589, Jcb),
    // Diners Club
    NetworkRange::exact(2, 36, DinersClub),
    NetworkRange::new(2, 38, 39, DinersClub),
    NetworkRange::new(4, 3000, 3059, DinersClub),
    // Maestro (whatever is left of 50 and 56-69)
    NetworkRange::exact(2, 50, Maestro),
    NetworkRange::new(2, 56, 69, Maestro),
    // Mir
    NetworkRange::new(4, 2200, 2204, Mir),
    // UATP
    NetworkRange::exact(1, 1, Uatp),
];

/// Classify a card number by its prefix
///
/// Pure and total: anything that matches no rule (or is shorter than two
/// characters) is `Brand::Unknown`.
pub fn classify(number: &str) -> Brand {
    if number.len() < 2 {
        return Brand::Unknown;
    }

    NETWORK_RANGES
        .iter()
        .find(|rule| rule.matches(number))
        .map(|rule| rule.brand)
        .unwrap_or(Brand::Unknown)
}

// ============================================================================
// TESTS
// ============================================================================
