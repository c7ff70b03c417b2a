pub(crate) use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ex-banking",
    author,
    version,
    about = "Replay a banking operation script against an in-memory ledger",
    long_about = None,
    after_help = "INPUT:\n    CSV with columns: type, username, receiver, amount, currency\n    type is one of create_user, deposit, withdraw, get_balance, send\n\nOUTPUT:\n    One CSV outcome row per operation is printed to stdout:\n\n    ex-banking script.csv > outcomes.csv"
)]
pub struct Args {
    /// Path to the operation script
    #[arg(index = 1, value_name = "FILE", help = "Input CSV operation script")]
    pub input_file: PathBuf,

    /// Roll back the sender when a transfer cannot be credited to the receiver
    #[arg(long)]
    pub atomic_send: bool,

    /// Also write the final balances (username, currency, amount) to this file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}
