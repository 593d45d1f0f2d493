// 🔎 Field Extractor - Recover number / expiry / CVV from pasted text
// Ordered strategy chains: first structurally valid match wins
//
// Supported shapes (non-exhaustive):
// - 5154620012228852|05|2029|704
// - 4610460230910523:02:2026:512
// - 5333171205882075 09/28 139
// - 5195095001277932 Exp Date 04/27 CVV2 106
// - 5172790117287059 0530 903
// - CC #: 4028521000035233|Exp: 0327|CCV: 264

use crate::network::{classify, Brand};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;
use tracing::debug;

/// Leading digits kept fixed when a number is regenerated
pub const SEED_PREFIX_LEN: usize = 12;

const CVV_PLACEHOLDER: &str = "XXX";

// ============================================================================
// CORE TYPES
// ============================================================================

/// Cvv - a 3-4 digit code, or the "unknown, keep as-is" placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cvv {
    Digits(String),
    Placeholder,
}

impl Cvv {
    /// Accepts only purely numeric 3-4 character candidates
    pub fn from_candidate(candidate: &str) -> Cvv {
        let numeric = candidate.bytes().all(|b| b.is_ascii_digit());
        if numeric && (3..=4).contains(&candidate.len()) {
            Cvv::Digits(candidate.to_string())
        } else {
            Cvv::Placeholder
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Cvv::Digits(d) => d,
            Cvv::Placeholder => CVV_PLACEHOLDER,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Cvv::Placeholder)
    }
}

impl fmt::Display for Cvv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expiry - normalized month/year pair found by a date strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub month: u8,
    pub year: u16,
}

impl Expiry {
    /// Validate raw captures: month 01..=12, year of 2 or 4 digits ("27" → 2027)
    pub fn from_parts(month_raw: &str, year_raw: &str) -> Option<Expiry> {
        let month: u8 = month_raw.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }

        let year: u16 = match year_raw.len() {
            2 => 2000 + year_raw.parse::<u16>().ok()?,
            4 => year_raw.parse().ok()?,
            _ => return None,
        };

        Some(Expiry { month, year })
    }

    pub fn month_str(&self) -> String {
        format!("{:02}", self.month)
    }

    pub fn year_str(&self) -> String {
        self.year.to_string()
    }
}

/// DateMatch - an expiry plus the byte span (month start..year end) it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub expiry: Expiry,
    pub span: Range<usize>,
}

/// CardFields - Structured record recovered from free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFields {
    pub number: String,
    pub month: u8,
    pub year: u16,
    pub cvv: Cvv,
    /// First 12 digits of `number` (all of it if shorter)
    pub seed_prefix: String,
    pub brand: Brand,
}

impl CardFields {
    /// Build a record, enforcing the field invariants
    ///
    /// Returns `None` if the number is not 2-19 digits, the month is outside
    /// 1..=12, or the year is not a 4-digit year.
    pub fn new(number: &str, month: u8, year: u16, cvv: Cvv) -> Option<Self> {
        if !(2..=19).contains(&number.len()) || !number.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return None;
        }

        let seed_len = number.len().min(SEED_PREFIX_LEN);

        Some(CardFields {
            number: number.to_string(),
            month,
            year,
            cvv,
            seed_prefix: number[..seed_len].to_string(),
            brand: classify(number),
        })
    }

    pub fn month_str(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Canonical form: `NUMBER|MM|YYYY|CVV`
    pub fn to_canonical(&self) -> String {
        format!(
            "{}|{:02}|{}|{}",
            self.number, self.month, self.year, self.cvv
        )
    }
}

// ============================================================================
// DATE STRATEGIES
// ============================================================================

/// A named expiry rule: `(text without the card number) -> Option<DateMatch>`
#[derive(Clone, Copy)]
pub struct DateStrategy {
    pub name: &'static str,
    pub find: fn(&str) -> Option<DateMatch>,
}

static LABELED_SEPARATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Exp(?:iry)?(?:\s+Date)?|Date)\s*:?\s*([0-9]{2})\s*[/\-:;,\s]\s*([0-9]{2,4})")
        .expect("valid regex")
});
static LABELED_JOINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Exp(?:iry)?(?:\s+Date)?|Date)\s*:?\s*([0-9]{2})([0-9]{2,4})").expect("valid regex")
});
static DELIMITED_TRIPLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[|:]\s*([0-9]{2})\s*[|:]\s*([0-9]{2,4})\s*(?:[|:]|$)").expect("valid regex")
});
static GENERIC_SEPARATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{2})\s*[/\-:;,\s]\s*([0-9]{2,4})").expect("valid regex"));
static BARE_MMYY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])([0-9]{2})([0-9]{2})(?:\s|$)").expect("valid regex"));

/// First capture pair of `re` in `text` that forms a valid expiry
///
/// A rejected candidate only gives up its first month digit, so a valid
/// date overlapping it ("123 05/29" → "23 05" rejected) is still tried.
fn first_valid_expiry(re: &Regex, text: &str) -> Option<DateMatch> {
    let mut pos = 0;
    while pos <= text.len() {
        let caps = re.captures_at(text, pos)?;
        let month = caps.get(1)?;
        let year = caps.get(2)?;

        if let Some(expiry) = Expiry::from_parts(month.as_str(), year.as_str()) {
            return Some(DateMatch {
                expiry,
                span: month.start()..year.end(),
            });
        }
        pos = month.start() + 1;
    }
    None
}

/// "Exp: 04/27", "Expiry 04-2027", "Exp Date 04 27"
pub fn labeled_separated(text: &str) -> Option<DateMatch> {
    first_valid_expiry(&LABELED_SEPARATED, text)
}

/// "Exp: 0427", "Date:042027"
pub fn labeled_joined(text: &str) -> Option<DateMatch> {
    first_valid_expiry(&LABELED_JOINED, text)
}

/// "|04|2027|" or ":04:2027:" (trailing delimiter may be end of text)
pub fn delimited_triplet(text: &str) -> Option<DateMatch> {
    first_valid_expiry(&DELIMITED_TRIPLET, text)
}

/// "04/27", "04-2027", "04 27" anywhere
pub fn generic_separated(text: &str) -> Option<DateMatch> {
    first_valid_expiry(&GENERIC_SEPARATED, text)
}

/// " 0427 " with nothing between month and year
pub fn bare_mmyy(text: &str) -> Option<DateMatch> {
    first_valid_expiry(&BARE_MMYY, text)
}

pub static DATE_STRATEGIES: &[DateStrategy] = &[
    DateStrategy { name: "labeled_separated", find: labeled_separated },
    DateStrategy { name: "labeled_joined", find: labeled_joined },
    DateStrategy { name: "delimited_triplet", find: delimited_triplet },
    DateStrategy { name: "generic_separated", find: generic_separated },
    DateStrategy { name: "bare_mmyy", find: bare_mmyy },
];

// ============================================================================
// CVV STRATEGIES
// ============================================================================

/// What a CVV rule gets to look at
#[derive(Debug, Clone)]
pub struct CvvScan<'a> {
    /// Original (trimmed) input
    pub full: &'a str,
    /// Input with the card number removed
    pub remainder: &'a str,
    /// Month/year strings already consumed by the date match
    pub month: &'a str,
    pub year: &'a str,
    /// Where the date match sits inside `remainder`
    pub date_span: Range<usize>,
}

impl CvvScan<'_> {
    fn is_consumed(&self, run: &DigitRun<'_>) -> bool {
        let overlaps = run.span.start < self.date_span.end && self.date_span.start < run.span.end;
        overlaps || run.digits == self.month || run.digits == self.year
    }
}

/// A named CVV rule; returns the raw candidate, which may still be non-numeric
#[derive(Clone, Copy)]
pub struct CvvStrategy {
    pub name: &'static str,
    pub find: fn(&CvvScan<'_>) -> Option<String>,
}

static PIPE_TRIPLET_CVV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|([0-9]{2})\|([0-9]{2,4})\|([A-Z0-9]{3,4})").expect("valid regex")
});
static COLON_TRIPLET_CVV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([0-9]{2}):([0-9]{2,4}):([A-Z0-9]{3,4})").expect("valid regex"));
static LABELED_CVV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:CVV2|CVC2|CVV|CVC|CCV)\s*:?\s*([A-Z0-9]{3,4})").expect("valid regex")
});
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

fn third_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(3))
        .map(|m| m.as_str().to_string())
}

/// `number|MM|YYYY|CVV`
pub fn pipe_triplet_cvv(scan: &CvvScan<'_>) -> Option<String> {
    third_capture(&PIPE_TRIPLET_CVV, scan.full)
}

/// `number:MM:YYYY:CVV`
pub fn colon_triplet_cvv(scan: &CvvScan<'_>) -> Option<String> {
    third_capture(&COLON_TRIPLET_CVV, scan.full)
}

/// "CVV: 123", "CVV2 106", "ccv 264"
pub fn labeled_cvv(scan: &CvvScan<'_>) -> Option<String> {
    LABELED_CVV
        .captures(scan.remainder)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_soft_boundary(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, ',' | ';' | ':'),
    }
}

struct DigitRun<'a> {
    digits: &'a str,
    span: Range<usize>,
    before: Option<char>,
    after: Option<char>,
}

/// Maximal 3-4 digit runs in `text`, with the characters around each
fn short_digit_runs(text: &str) -> impl Iterator<Item = DigitRun<'_>> {
    DIGIT_RUN
        .find_iter(text)
        .filter(|m| (3..=4).contains(&m.as_str().len()))
        .map(move |m| DigitRun {
            digits: m.as_str(),
            span: m.range(),
            before: text[..m.start()].chars().next_back(),
            after: text[m.end()..].chars().next(),
        })
}

/// A 3-4 digit run set off by whitespace, `,`, `;`, `:` or the text edges
pub fn bounded_digits_cvv(scan: &CvvScan<'_>) -> Option<String> {
    short_digit_runs(scan.remainder)
        .find(|run| {
            is_soft_boundary(run.before) && is_soft_boundary(run.after) && !scan.is_consumed(run)
        })
        .map(|run| run.digits.to_string())
}

/// Any other 3-4 digit run outside the expiry
pub fn any_digits_cvv(scan: &CvvScan<'_>) -> Option<String> {
    short_digit_runs(scan.remainder)
        .find(|run| !scan.is_consumed(run))
        .map(|run| run.digits.to_string())
}

pub static CVV_STRATEGIES: &[CvvStrategy] = &[
    CvvStrategy { name: "pipe_triplet", find: pipe_triplet_cvv },
    CvvStrategy { name: "colon_triplet", find: colon_triplet_cvv },
    CvvStrategy { name: "labeled", find: labeled_cvv },
    CvvStrategy { name: "bounded_digits", find: bounded_digits_cvv },
    CvvStrategy { name: "any_digits", find: any_digits_cvv },
];

// ============================================================================
// EXTRACTOR
// ============================================================================

static CARD_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{15,16}").expect("valid regex"));

/// FieldExtractor - runs the number search, then both strategy chains
#[derive(Clone)]
pub struct FieldExtractor {
    date_strategies: Vec<DateStrategy>,
    cvv_strategies: Vec<CvvStrategy>,
}

impl FieldExtractor {
    /// Extractor with the default priority order
    pub fn new() -> Self {
        FieldExtractor {
            date_strategies: DATE_STRATEGIES.to_vec(),
            cvv_strategies: CVV_STRATEGIES.to_vec(),
        }
    }

    /// Extractor with custom strategy chains (order = priority)
    pub fn with_strategies(date_strategies: Vec<DateStrategy>, cvv_strategies: Vec<CvvStrategy>) -> Self {
        FieldExtractor {
            date_strategies,
            cvv_strategies,
        }
    }

    /// Recover a card record from free text
    ///
    /// # Returns
    /// * `Some(CardFields)` - number, expiry and CVV (possibly the placeholder)
    /// * `None` - no 15/16 digit run, or no usable expiry
    pub fn extract(&self, text: &str) -> Option<CardFields> {
        let text = text.trim();

        let number = CARD_NUMBER.find(text)?.as_str();
        let remainder = text.replacen(number, "", 1);

        let date = self.find_expiry(&remainder)?;
        let expiry = date.expiry;

        let month = expiry.month_str();
        let year = expiry.year_str();
        let scan = CvvScan {
            full: text,
            remainder: &remainder,
            month: &month,
            year: &year,
            date_span: date.span,
        };
        let cvv = self.find_cvv(&scan);

        CardFields::new(number, expiry.month, expiry.year, cvv)
    }

    fn find_expiry(&self, remainder: &str) -> Option<DateMatch> {
        self.date_strategies.iter().find_map(|strategy| {
            let found = (strategy.find)(remainder)?;
            debug!(strategy = strategy.name, "expiry matched");
            Some(found)
        })
    }

    fn find_cvv(&self, scan: &CvvScan<'_>) -> Cvv {
        let candidate = self.cvv_strategies.iter().find_map(|strategy| {
            let found = (strategy.find)(scan)?;
            debug!(strategy = strategy.name, "cvv candidate matched");
            Some(found)
        });

        match candidate {
            Some(c) => Cvv::from_candidate(&c),
            None => Cvv::Placeholder,
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_EXTRACTOR: Lazy<FieldExtractor> = Lazy::new(FieldExtractor::new);

/// Extract with the default strategy chains
pub fn extract(text: &str) -> Option<CardFields> {
    DEFAULT_EXTRACTOR.extract(text)
}

// ============================================================================
// TESTS
// ============================================================================
