/// quick start - minimal example to get started
use investment_ledger_rs::{
    Ledger, LedgerConfig, MemoryCache, MemoryStore, Money, NewUser, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let mut ledger = Ledger::new(&store, &cache, LedgerConfig::default());
    let time = SafeTimeProvider::new(TimeSource::System);

    // register an account
    let user = ledger.register_user(
        NewUser::new("maria", "maria@example.com", "s3cret"),
        &time,
    )?;

    // deposit into an investment
    let investment = ledger.open_investment(user.id, Money::from_major(1000), &time)?;

    // read it back with its computed balance
    let view = ledger.investment(investment.id, user.id, &time)?;
    println!("{}", view.to_json_pretty()?);

    Ok(())
}
