// Card Synth - Core Library
// Exposes all modules for use in the CLI and tests

pub mod luhn;      // Mod-10 check digits
pub mod network;   // Prefix → card network table
pub mod extractor; // Free text → card fields
pub mod synth;     // Fresh + regenerated numbers
pub mod ledger;    // Persistent prefix usage counts
pub mod service;   // User-facing interactions
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use luhn::{check_digit, complete, format_card_number, validate};
pub use network::{classify, Brand, NetworkRange, NETWORK_RANGES};
pub use extractor::{extract, CardFields, Cvv, Expiry, FieldExtractor};
pub use synth::{generate, regenerate, regenerate_batch, CardKind, CardRecord, REGEN_BATCH};
pub use ledger::{prefix_key, warning_text, LedgerEntry, LedgerStats, UsageLedger};
pub use service::{
    BrandChoice, CardService, CheckReport, FreshBatch, PrefixStatus, Quantity, Submission,
};
pub use config::Config;
pub use error::{LedgerError, SelectionError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
