// End-to-end flows through the public API: paste → ledger → regenerate

use cardsynth::{
    classify, extract, validate, Brand, BrandChoice, CardKind, CardService, Cvv, PrefixStatus,
    Quantity, UsageLedger,
};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;

fn temp_ledger_path() -> PathBuf {
    std::env::temp_dir().join(format!("cardsynth-flow-{}.json", uuid::Uuid::new_v4()))
}

#[test]
fn test_labeled_paste_is_extracted() {
    let fields = extract("5195095001277932 Exp Date  04/27 CVV2  106").unwrap();
    assert_eq!(fields.number, "5195095001277932");
    assert_eq!(fields.month_str(), "04");
    assert_eq!(fields.year, 2027);
    assert_eq!(fields.cvv, Cvv::Digits("106".to_string()));
}

#[test]
fn test_pipe_paste_round_trips() {
    let text = "5154620012228852|05|2029|704";
    let fields = extract(text).unwrap();
    assert_eq!(fields.seed_prefix, "515462001222");
    assert_eq!(fields.to_canonical(), text);
}

#[test]
fn test_no_card_run_means_no_fields() {
    assert!(extract("call me at 555 1234, exp 04/27").is_none());
    assert!(extract("12345678901234 04/27 123").is_none());
}

#[test]
fn test_classification_samples() {
    assert_eq!(classify("4532015112830366"), Brand::Visa);
    assert_eq!(classify("6011000000000004"), Brand::Discover);
    assert_eq!(classify("2221000000000009"), Brand::Mastercard);
    assert_eq!(classify("0000000000000000"), Brand::Unknown);
}

#[test]
fn test_paste_twice_warns_and_survives_restart() {
    let path = temp_ledger_path();
    let mut rng = StdRng::seed_from_u64(11);

    {
        let ledger = UsageLedger::open(&path);
        let service = CardService::new(&ledger);

        let first = service.submit("4610460230910523:02:2026:512", &mut rng).unwrap();
        assert_eq!(first.status, PrefixStatus::New);
        for card in &first.records {
            assert!(card.number.starts_with("461046023091"));
            assert!(validate(&card.number));
            assert_eq!((card.month, card.year), (2, 2026));
        }
    }

    // A fresh process sees the earlier paste
    let ledger = UsageLedger::open(&path);
    let service = CardService::new(&ledger);
    let second = service.submit("4610461111111111|03|2028|999", &mut rng).unwrap();

    match &second.status {
        PrefixStatus::Seen(entry) => {
            assert_eq!(entry.use_count, 1);
            assert_eq!(entry.brand, "Visa");
        }
        other => panic!("expected Seen, got {:?}", other),
    }
    let rendered = second.render();
    assert!(rendered.contains("Times used: 1"));
    assert!(rendered.contains("• BIN: 461046"));

    let stored = ledger.lookup("461046").unwrap();
    assert_eq!(stored.use_count, 2);
    assert!(stored.last_seen >= stored.first_seen);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_regenerate_again_leaves_file_untouched() {
    let path = temp_ledger_path();
    let mut rng = StdRng::seed_from_u64(12);
    let ledger = UsageLedger::open(&path);
    let service = CardService::new(&ledger);
    let text = "5154620012228852|05|2029|704";

    service.submit(text, &mut rng).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    for _ in 0..3 {
        let again = service.regenerate_again(text, true, &mut rng).unwrap();
        assert_eq!(again.records.len(), 10);
    }

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_fresh_generation_for_every_choice() {
    let ledger = UsageLedger::in_memory();
    let service = CardService::new(&ledger);
    let mut rng = StdRng::seed_from_u64(13);

    for kind in CardKind::ALL {
        let batch = service.generate(BrandChoice::Kind(kind), Quantity::Ten, &mut rng);
        assert_eq!(batch.records.len(), 10);
        for card in &batch.records {
            assert!(validate(&card.number));
            assert_eq!(classify(&card.number), kind.brand());
        }
    }

    let random = service.generate(BrandChoice::Random, Quantity::One, &mut rng);
    assert_eq!(random.records.len(), 1);
    assert!(Quantity::try_from(3).is_err());
}

#[test]
fn test_fresh_expiry_is_in_the_future() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
    let mut rng = StdRng::seed_from_u64(14);

    for card in cardsynth::synth::generate_from(CardKind::Amex, 50, today, &mut rng) {
        assert!(card.year >= 2027);
        assert_eq!(card.cvv.as_str().len(), 4);
    }
}
