//! Basic example of using the `Ledger` directly.
//!
//! Run with: `cargo run --example basic`

use ex_banking::{Decimal, Ledger};

fn main() {
    // Initialize logger (optional, but shows what's happening)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();

    let mut ledger = Ledger::new();
    let one = Decimal::ONE;
    let two = Decimal::TWO;

    println!("{:?}", ledger.get_balance("user1", "EUR"));
    println!("{:?}", ledger.create_user("user1"));
    println!("{:?}", ledger.create_user("user1"));
    println!("{:?}", ledger.create_user("user2"));
    println!("{:?}", ledger.get_balance("user1", "EUR"));
    println!("{:?}", ledger.deposit("user1", one, "EUR"));
    println!("{:?}", ledger.withdraw("user1", two, "EUR"));
    println!("{:?}", ledger.send("user1", "user2", one, "EUR"));
    println!("{:?}", ledger.get_balance("user2", "EUR"));

    println!("\n=== Final Balances ===");
    ledger
        .export_balances(std::io::stdout())
        .expect("Failed to export balances");
}
