mod commands;

use anyhow::{Context, Result};
use commands::{Args, Parser};
use ex_banking::{Ledger, SendPolicy};

fn main() -> Result<()> {
    let args = Args::parse();

    // Default to info, override with RUST_LOG
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let policy = if args.atomic_send {
        SendPolicy::Atomic
    } else {
        SendPolicy::Sequential
    };
    let mut ledger = Ledger::with_policy(policy);

    log::info!("Replaying operations from {}", args.input_file.display());
    let file = std::fs::File::open(&args.input_file)
        .with_context(|| format!("Failed to open input file: {}", args.input_file.display()))?;

    ledger
        .process_operations(file, std::io::stdout())
        .context("Failed to process operations")?;

    if let Some(path) = &args.export {
        let export = std::fs::File::create(path)
            .with_context(|| format!("Failed to create export file: {}", path.display()))?;
        ledger
            .export_balances(export)
            .context("Failed to export balances")?;
        log::info!(
            "Exported {} accounts to {}",
            ledger.user_count(),
            path.display()
        );
    }

    Ok(())
}
