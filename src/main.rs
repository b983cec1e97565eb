// Rent Ledger CLI
// Drives the ledger against a local CSV-file grid - the same layout the
// shared spreadsheet uses, minus the remote spreadsheet service.

use anyhow::{bail, Result};
use std::env;

use rent_ledger::{
    default_effective_month, execute, format_amounts_owed, CommandIntent, CommandOutcome, CsvGrid,
    LedgerEngine, Verb, YearMonth, HELP_MESSAGE,
};

const USAGE: &str = r#"Usage: rent-ledger <command> [args]

Commands:
  show                           Amounts currently owed per tenant
  add [name]                     Add a tenant to the rent roll
  remove [name]                  Remove a tenant from the rent roll
  paid [name]                    Mark this month's rent as paid
  rent-amt <amount>              Set the month's total rent
  utility-amt <amount>           Set the month's total utility bill
  weeks-stayed <weeks> [name]    Record weeks stayed this month
  create-month                   Make sure this month's block exists
  dump                           Print the decoded ledger as JSON
  help                           Show the chat-command help text

Environment:
  RENT_LEDGER_SHEET_PATH   Grid CSV file (default: rent-ledger.csv)
  RENT_LEDGER_USER         Acting user name (default: cli)
  RENT_LEDGER_MONTH        Effective month as m/yyyy (default: 2 weeks ago)"#;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        println!("{}", USAGE);
        return Ok(());
    }

    let sheet_path =
        env::var("RENT_LEDGER_SHEET_PATH").unwrap_or_else(|_| "rent-ledger.csv".to_string());
    let acting_user = env::var("RENT_LEDGER_USER").unwrap_or_else(|_| "cli".to_string());
    let effective_month = match env::var("RENT_LEDGER_MONTH") {
        Ok(raw) => raw.parse::<YearMonth>()?,
        Err(_) => default_effective_month(),
    };

    let mut engine = LedgerEngine::new(CsvGrid::open(&sheet_path));
    if engine.init_if_empty()? {
        println!("Initialized new ledger at {}", sheet_path);
    }

    let intent = match build_intent(&args, &acting_user, effective_month, &mut engine)? {
        Some(intent) => intent,
        None => return Ok(()), // handled locally (help/dump)
    };

    match execute(&mut engine, &intent)? {
        CommandOutcome::Reply(reply) => println!("{}", reply),
        CommandOutcome::AmountsOwed(owed) => println!("{}", format_amounts_owed(&owed)),
    }
    Ok(())
}

/// Map CLI arguments onto a command intent, or handle the few commands
/// that never go through `execute`.
fn build_intent(
    args: &[String],
    acting_user: &str,
    effective_month: YearMonth,
    engine: &mut LedgerEngine<CsvGrid>,
) -> Result<Option<CommandIntent>> {
    let (command, rest) = (args[0].as_str(), &args[1..]);

    let (verb, argument, user_override) = match command {
        "show" => (Verb::Show, None, None),
        "add" => (Verb::Add, rest.first().cloned(), None),
        "remove" => (Verb::Remove, rest.first().cloned(), None),
        "paid" => (Verb::Paid, None, rest.first().cloned()),
        "rent-amt" => (Verb::RentAmt, rest.first().cloned(), None),
        "utility-amt" => (Verb::UtilityAmt, rest.first().cloned(), None),
        "weeks-stayed" => (Verb::WeeksStayed, rest.first().cloned(), rest.get(1).cloned()),
        "create-month" => (Verb::CreateMonth, None, None),
        "help" => {
            println!("{}", HELP_MESSAGE);
            return Ok(None);
        }
        "dump" => {
            let snapshot = engine.snapshot()?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            return Ok(None);
        }
        other => bail!("unknown command {:?}\n\n{}", other, USAGE),
    };

    Ok(Some(CommandIntent {
        verb,
        acting_user: user_override.unwrap_or_else(|| acting_user.to_string()),
        argument,
        effective_month,
    }))
}
