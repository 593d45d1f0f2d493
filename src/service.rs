// 🧭 Card Service - the user-facing interactions, minus any chat/UI layer
//
// 1. Fresh generation: brand (or random) + quantity menu
// 2. Submission: pasted text → extract → ledger observe → regenerate 10
// 3. Regenerate again: same text, new batch, ledger only read

use crate::error::SelectionError;
use crate::extractor::{extract, CardFields};
use crate::ledger::{prefix_key, warning_text, LedgerEntry, UsageLedger};
use crate::luhn::{format_card_number, validate};
use crate::network::{classify, Brand};
use crate::synth::{self, CardKind, CardRecord};
use rand::Rng;
use std::fmt::Write as _;
use std::str::FromStr;
use tracing::info;

// ============================================================================
// SELECTIONS
// ============================================================================

/// Quantity - the only batch sizes offered for fresh generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    One,
    Five,
    Ten,
}

impl Quantity {
    pub fn count(&self) -> usize {
        match self {
            Quantity::One => 1,
            Quantity::Five => 5,
            Quantity::Ten => 10,
        }
    }
}

impl TryFrom<u32> for Quantity {
    type Error = SelectionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Quantity::One),
            5 => Ok(Quantity::Five),
            10 => Ok(Quantity::Ten),
            other => Err(SelectionError::Quantity(other)),
        }
    }
}

/// BrandChoice - a specific kind, or "surprise me"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandChoice {
    Kind(CardKind),
    Random,
}

impl BrandChoice {
    fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> CardKind {
        match self {
            BrandChoice::Kind(kind) => *kind,
            BrandChoice::Random => CardKind::random(rng),
        }
    }
}

impl FromStr for BrandChoice {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("random") {
            return Ok(BrandChoice::Random);
        }
        s.parse().map(BrandChoice::Kind)
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// FreshBatch - output of fresh generation
#[derive(Debug, Clone)]
pub struct FreshBatch {
    pub kind: CardKind,
    pub records: Vec<CardRecord>,
}

impl FreshBatch {
    pub fn render(&self) -> String {
        let mut out = format!("✨ Generated {} test card(s)\n\n", self.records.len());

        for (idx, card) in self.records.iter().enumerate() {
            let _ = writeln!(out, "Card #{}", idx + 1);
            let _ = writeln!(out, "💳 {}", self.kind);
            let _ = writeln!(out, "{}", format_card_number(&card.number));
            let _ = writeln!(out, "📅 Expiry: {:02}/{:02}", card.month, card.year % 100);
            let _ = writeln!(out, "🔒 CVV: {}\n", card.cvv);
        }

        out.push_str("⚠️ For testing only - not real cards\n");
        out
    }
}

/// PrefixStatus - whether the ledger had seen this 6-digit prefix before
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixStatus {
    New,
    Seen(LedgerEntry),
}

impl PrefixStatus {
    pub fn is_seen(&self) -> bool {
        matches!(self, PrefixStatus::Seen(_))
    }

    fn banner(&self) -> String {
        match self {
            PrefixStatus::New => "✅ New BIN - not used before\n".to_string(),
            PrefixStatus::Seen(entry) => warning_text(entry),
        }
    }
}

/// Submission - one pasted card and its regenerated batch
#[derive(Debug, Clone)]
pub struct Submission {
    pub source: String,
    pub fields: CardFields,
    pub prefix_key: String,
    pub status: PrefixStatus,
    pub records: Vec<CardRecord>,
}

impl Submission {
    pub fn render(&self) -> String {
        let mut out = self.status.banner();
        out.push('\n');
        out.push_str("🎴 Generator Card\n\n");
        let _ = writeln!(out, "Bin #: {}", self.source);
        for card in &self.records {
            let _ = writeln!(out, "{}", card);
        }
        out.push_str("\nℹ️ Info:\n");
        let _ = writeln!(out, "• Type: {}", self.fields.brand);
        let _ = writeln!(out, "• BIN: {}", self.prefix_key);
        out.push_str("• Format: CREDIT CARD\n");
        out
    }
}

/// CheckReport - Luhn verdict plus network for a single number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub number: String,
    pub valid: bool,
    pub brand: Brand,
}

impl CheckReport {
    pub fn render(&self) -> String {
        let verdict = if self.valid { "✅ Luhn valid" } else { "❌ Luhn invalid" };
        let network = if self.brand.is_known() {
            format!("💳 Network: {}", self.brand)
        } else {
            "❔ Network: not recognized".to_string()
        };
        format!("{}\n{}\n", verdict, network)
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// CardService - holds the process-wide ledger by reference
pub struct CardService<'a> {
    ledger: &'a UsageLedger,
}

impl<'a> CardService<'a> {
    pub fn new(ledger: &'a UsageLedger) -> Self {
        CardService { ledger }
    }

    pub fn ledger(&self) -> &UsageLedger {
        self.ledger
    }

    /// Fresh cards for a brand choice and menu quantity
    pub fn generate<R: Rng + ?Sized>(&self, choice: BrandChoice, quantity: Quantity, rng: &mut R) -> FreshBatch {
        let kind = choice.resolve(rng);
        let records = synth::generate(kind, quantity.count(), rng);
        info!(kind = kind.code(), count = records.len(), "generated fresh cards");
        FreshBatch { kind, records }
    }

    /// Handle pasted text: record the prefix, then regenerate a batch
    ///
    /// Returns `None` when the text holds no usable card (nothing is recorded).
    pub fn submit<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Option<Submission> {
        let fields = extract(text)?;
        let previous = self.ledger.observe(&fields.number, fields.brand);
        let status = match previous {
            Some(entry) => PrefixStatus::Seen(entry),
            None => PrefixStatus::New,
        };

        Some(self.build(text, fields, status, rng))
    }

    /// New batch for text submitted earlier; the ledger is read, never written
    ///
    /// `was_seen` is the status from the original submission. A seen prefix
    /// shows its current ledger entry; one missing from the ledger shows as new.
    pub fn regenerate_again<R: Rng + ?Sized>(&self, text: &str, was_seen: bool, rng: &mut R) -> Option<Submission> {
        let fields = extract(text)?;
        let status = if was_seen {
            match self.ledger.lookup(&fields.number) {
                Some(entry) => PrefixStatus::Seen(entry),
                None => PrefixStatus::New,
            }
        } else {
            PrefixStatus::New
        };

        Some(self.build(text, fields, status, rng))
    }

    fn build<R: Rng + ?Sized>(&self, text: &str, fields: CardFields, status: PrefixStatus, rng: &mut R) -> Submission {
        let records = synth::regenerate_batch(&fields, rng);
        let key = prefix_key(&fields.number);
        info!(prefix = %key, seen = status.is_seen(), count = records.len(), "regenerated batch");

        Submission {
            source: text.trim().to_string(),
            fields,
            prefix_key: key,
            status,
            records,
        }
    }

    /// Luhn check and classification of one number
    pub fn check(&self, number: &str) -> CheckReport {
        let cleaned: String = number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        CheckReport {
            valid: validate(&cleaned),
            brand: classify(&cleaned),
            number: cleaned,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
