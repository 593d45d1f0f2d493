use anyhow::{anyhow, Context, Result};
use dotenv::dotenv;
use std::env;

use cardsynth::{
    telemetry, BrandChoice, CardService, Config, Quantity, UsageLedger, VERSION,
};

fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    telemetry::init(&config.log_filter);

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let ledger = UsageLedger::open(&config.ledger_path);
    let service = CardService::new(&ledger);

    match command {
        "gen" => run_gen(&service, &args[2..])?,
        "regen" => run_regen(&service, &args[2..])?,
        "check" => run_check(&service, &args[2..])?,
        "stats" => run_stats(&ledger),
        _ => print_usage(),
    }

    Ok(())
}

fn run_gen(service: &CardService<'_>, args: &[String]) -> Result<()> {
    let choice: BrandChoice = args
        .first()
        .ok_or_else(|| anyhow!("missing brand: visa, mastercard, amex, discover or random"))?
        .parse()?;

    let quantity = match args.get(1) {
        Some(raw) => {
            let n: u32 = raw.parse().with_context(|| format!("quantity '{raw}' is not a number"))?;
            Quantity::try_from(n)?
        }
        None => Quantity::One,
    };

    let batch = service.generate(choice, quantity, &mut rand::rng());
    print!("{}", batch.render());
    Ok(())
}

fn run_regen(service: &CardService<'_>, args: &[String]) -> Result<()> {
    let text = args.join(" ");
    if text.trim().is_empty() {
        return Err(anyhow!("paste a card line, e.g. 5154620012228852|05|2029|704"));
    }

    match service.submit(&text, &mut rand::rng()) {
        Some(submission) => print!("{}", submission.render()),
        None => {
            println!("❌ Could not find a card number and expiry in that text");
            println!("   Expected something like: 5154620012228852|05|2029|704");
        }
    }
    Ok(())
}

fn run_check(service: &CardService<'_>, args: &[String]) -> Result<()> {
    let number = args.join("");
    if number.is_empty() {
        return Err(anyhow!("missing card number"));
    }

    print!("{}", service.check(&number).render());
    Ok(())
}

fn run_stats(ledger: &UsageLedger) {
    let stats = ledger.stats();

    println!("📊 BIN ledger");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if let Some(path) = ledger.path() {
        println!("📂 File: {}", path.display());
    }
    println!("🔢 Prefixes tracked: {}", stats.total_prefixes);
    for (brand, count) in &stats.by_brand {
        println!("   • {}: {}", brand, count);
    }
}

fn print_usage() {
    println!("🎴 cardsynth {} - test card generator", VERSION);
    println!();
    println!("Usage:");
    println!("  cardsynth gen <visa|mastercard|amex|discover|random> [1|5|10]");
    println!("  cardsynth regen \"<pasted card text>\"");
    println!("  cardsynth check <number>");
    println!("  cardsynth stats");
}
