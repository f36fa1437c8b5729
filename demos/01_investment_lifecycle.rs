/// investment lifecycle - open, value, deactivate, withdraw
use investment_ledger_rs::chrono::{Duration, TimeZone, Utc};
use investment_ledger_rs::{
    Event, Ledger, LedgerConfig, MemoryCache, MemoryStore, Money, NewUser, Page,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== investment lifecycle example ===\n");

    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let mut ledger = Ledger::new(&store, &cache, LedgerConfig::default());

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    // register an account
    let user = ledger.register_user(
        NewUser::new("maria", "maria@example.com", "s3cret"),
        &time,
    )?;
    println!("registered {} ({})", user.name, user.email);

    // open a 1000 investment
    let investment = ledger.open_investment(user.id, Money::from_major(1000), &time)?;
    println!(
        "opened investment of {} on {}",
        investment.amount,
        time.now().format("%Y-%m-%d")
    );

    // eight months later the balance has compounded
    controller.advance(Duration::days(243));
    let view = ledger.investment(investment.id, user.id, &time)?;
    println!(
        "\nbalance on {}: {}",
        time.now().format("%Y-%m-%d"),
        view.expected_balance
    );

    // withdrawing deactivates the investment and freezes its value
    let withdrawal = ledger.withdraw_investment(investment.id, user.id, &time)?;
    println!(
        "withdrew {} on {}",
        withdrawal.amount,
        withdrawal.created_at.format("%Y-%m-%d")
    );

    // a second attempt is rejected
    if let Err(error) = ledger.withdraw_investment(investment.id, user.id, &time) {
        println!("second attempt rejected: {error}");
    }

    // the frozen value never moves again
    controller.advance(Duration::days(365));
    let frozen = ledger.investment(investment.id, user.id, &time)?;
    println!(
        "\nbalance on {}: {} (frozen)",
        time.now().format("%Y-%m-%d"),
        frozen.expected_balance
    );

    let withdrawals = ledger.withdrawals(user.id, Page::default(), &time)?;
    println!("withdrawals on record: {}", withdrawals.len());

    // drain emitted events
    println!("\nevents:");
    for event in ledger.take_events() {
        match event {
            Event::UserRegistered { user_id, .. } => println!("  user registered: {user_id}"),
            Event::InvestmentOpened { amount, .. } => println!("  investment opened: {amount}"),
            Event::InvestmentDeactivated { timestamp, .. } => println!(
                "  investment deactivated at {}",
                timestamp.format("%Y-%m-%d")
            ),
            Event::WithdrawalRealized { amount, .. } => {
                println!("  withdrawal realized: {amount}")
            }
            other => println!("  {other:?}"),
        }
    }

    Ok(())
}
