// 🎴 Card Synthesizer - fresh numbers from a brand, or regenerated from a seed
// Every emitted number carries a valid Luhn check digit

use crate::error::SelectionError;
use crate::extractor::{CardFields, Cvv};
use crate::luhn::check_digit_of;
use crate::network::Brand;
use chrono::{Datelike, Local, NaiveDate};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Records produced by one "regenerate" interaction
pub const REGEN_BATCH: usize = 10;

// ============================================================================
// CARD KIND
// ============================================================================

/// CardKind - brands we can generate from scratch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

impl CardKind {
    pub const ALL: [CardKind; 4] = [
        CardKind::Visa,
        CardKind::Mastercard,
        CardKind::Amex,
        CardKind::Discover,
    ];

    /// Curated seed prefixes; each one classifies as `self.brand()`
    pub fn seeds(&self) -> &'static [&'static str] {
        match self {
            CardKind::Visa => &["4532", "4539", "4556", "4916", "4929", "4485", "4024"],
            CardKind::Mastercard => &["5425", "5555", "5105", "5454", "2221"],
            CardKind::Amex => &["3782", "3714", "3787", "3747"],
            CardKind::Discover => &["6011", "622126", "6529", "6444"],
        }
    }

    /// Total digits including the check digit
    pub fn length(&self) -> usize {
        match self {
            CardKind::Amex => 15,
            _ => 16,
        }
    }

    pub fn cvv_length(&self) -> usize {
        match self {
            CardKind::Amex => 4,
            _ => 3,
        }
    }

    pub fn brand(&self) -> Brand {
        match self {
            CardKind::Visa => Brand::Visa,
            CardKind::Mastercard => Brand::Mastercard,
            CardKind::Amex => Brand::AmericanExpress,
            CardKind::Discover => Brand::Discover,
        }
    }

    /// Short code used on the command line
    pub fn code(&self) -> &'static str {
        match self {
            CardKind::Visa => "visa",
            CardKind::Mastercard => "mastercard",
            CardKind::Amex => "amex",
            CardKind::Discover => "discover",
        }
    }

    /// Uniform pick among all kinds
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> CardKind {
        CardKind::ALL[rng.random_range(0..CardKind::ALL.len())]
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.brand().name())
    }
}

impl FromStr for CardKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CardKind::ALL
            .iter()
            .copied()
            .find(|k| k.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SelectionError::Brand(s.to_string()))
    }
}

// ============================================================================
// CARD RECORD
// ============================================================================

/// CardRecord - one synthesized output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub number: String,
    pub month: u8,
    pub year: u16,
    pub cvv: Cvv,
}

impl CardRecord {
    /// Canonical form: `NUMBER|MM|YYYY|CVV`
    pub fn to_canonical(&self) -> String {
        format!(
            "{}|{:02}|{}|{}",
            self.number, self.month, self.year, self.cvv
        )
    }
}

impl fmt::Display for CardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

// ============================================================================
// DIGIT HELPERS
// ============================================================================

fn random_digits<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// `seed` (truncated to leave room for the check digit) + random fill + check digit
fn synthesize_number<R: Rng + ?Sized>(seed: &str, total_len: usize, rng: &mut R) -> String {
    let body_len = total_len.saturating_sub(1);

    let mut digits: Vec<u8> = seed
        .bytes()
        .take(body_len)
        .map(|b| b - b'0')
        .collect();
    while digits.len() < body_len {
        digits.push(rng.random_range(0..10u8));
    }
    digits.push(check_digit_of(&digits));

    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Expiry 1-5 years plus 0-11 months after `today`
fn random_expiry<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> (u8, u16) {
    let years_ahead: i32 = rng.random_range(1..=5);
    let months_ahead: i32 = rng.random_range(0..=11);

    let total = today.month0() as i32 + months_ahead;
    let month = (total % 12) as u8 + 1;
    let year = (today.year() + years_ahead + total / 12) as u16;
    (month, year)
}

// ============================================================================
// FRESH GENERATION
// ============================================================================

/// Generate `count` fresh cards of `kind`, expiries counted from today
pub fn generate<R: Rng + ?Sized>(kind: CardKind, count: usize, rng: &mut R) -> Vec<CardRecord> {
    generate_from(kind, count, Local::now().date_naive(), rng)
}

/// Same as `generate`, with an explicit reference date for the expiry
pub fn generate_from<R: Rng + ?Sized>(
    kind: CardKind,
    count: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<CardRecord> {
    (0..count)
        .map(|_| {
            // seeds() is never empty
            let seed = kind.seeds().choose(rng).copied().unwrap_or_default();
            let number = synthesize_number(seed, kind.length(), rng);
            let (month, year) = random_expiry(today, rng);
            let cvv = Cvv::Digits(random_digits(kind.cvv_length(), rng));

            CardRecord {
                number,
                month,
                year,
                cvv,
            }
        })
        .collect()
}

// ============================================================================
// REGENERATION
// ============================================================================

/// New number from the same seed prefix, same expiry, CVV redrawn at the same length
///
/// A placeholder CVV stays a placeholder. When the seed prefix covers the
/// whole number, only the check digit is recomputed.
pub fn regenerate<R: Rng + ?Sized>(fields: &CardFields, rng: &mut R) -> CardRecord {
    let number = synthesize_number(&fields.seed_prefix, fields.number.len(), rng);

    let cvv = match &fields.cvv {
        Cvv::Digits(d) => Cvv::Digits(random_digits(d.len(), rng)),
        Cvv::Placeholder => Cvv::Placeholder,
    };

    CardRecord {
        number,
        month: fields.month,
        year: fields.year,
        cvv,
    }
}

/// `REGEN_BATCH` independent regenerations
pub fn regenerate_batch<R: Rng + ?Sized>(fields: &CardFields, rng: &mut R) -> Vec<CardRecord> {
    (0..REGEN_BATCH).map(|_| regenerate(fields, rng)).collect()
}

// ============================================================================
// TESTS
// ============================================================================
