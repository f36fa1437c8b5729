/// time control - deterministic valuation with a controlled clock
use investment_ledger_rs::chrono::{Duration, TimeZone, Utc};
use investment_ledger_rs::{
    Ledger, LedgerConfig, MemoryCache, MemoryStore, Money, NewUser, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== time control example ===\n");

    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let mut ledger = Ledger::new(&store, &cache, LedgerConfig::default());

    // create controlled time for deterministic balances
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    println!("starting date: {}", time.now().format("%Y-%m-%d"));

    let user = ledger.register_user(NewUser::new("noa", "noa@example.com", "s3cret"), &time)?;
    let investment = ledger.open_investment(user.id, Money::from_major(1000), &time)?;
    println!("opened investment: {}", investment.amount);

    // short-term bracket: held under a year
    controller.advance(Duration::days(243));
    let at_8_months = ledger.investment(investment.id, user.id, &time)?;
    println!(
        "\n{}: balance {} (8 months, 22.5% tax)",
        time.now().format("%Y-%m-%d"),
        at_8_months.expected_balance
    );

    // medium-term bracket: between one and two years
    controller.advance(Duration::days(334));
    let at_19_months = ledger.investment(investment.id, user.id, &time)?;
    println!(
        "{}: balance {} (19 months, 18.5% tax)",
        time.now().format("%Y-%m-%d"),
        at_19_months.expected_balance
    );

    // long-term bracket: two years and beyond
    controller.advance(Duration::days(365));
    let at_31_months = ledger.investment(investment.id, user.id, &time)?;
    println!(
        "{}: balance {} (31 months, 15% tax)",
        time.now().format("%Y-%m-%d"),
        at_31_months.expected_balance
    );

    // deactivation freezes the valuation permanently
    ledger.deactivate_investment(investment.id, user.id, &time)?;
    println!("\ndeactivated on {}", time.now().format("%Y-%m-%d"));

    controller.advance(Duration::days(730));
    let frozen = ledger.investment(investment.id, user.id, &time)?;
    println!(
        "{}: balance {} (frozen at deactivation)",
        time.now().format("%Y-%m-%d"),
        frozen.expected_balance
    );

    Ok(())
}
