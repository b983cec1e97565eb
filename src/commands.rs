// 💬 Command intents - the chat-facing surface of the ledger
// Translates "/rent <verb> [arg]" messages into ledger operations and the
// operations' results back into reply text. The transport (webhook, CLI)
// lives in the binaries; this module only sees parsed text and a user.

use crate::codec::{parse_amount, parse_number};
use crate::engine::LedgerEngine;
use crate::error::LedgerError;
use crate::grid::GridStore;
use crate::records::YearMonth;
use anyhow::Result;
use chrono::{Datelike, Duration, Utc};

pub const HELP_MESSAGE: &str = r#"Hey! You can make me do things by typing "/rent <command name>" (without the quotes); here're the available commands:

"/rent show"
    Show how much everyone owes right now
"/rent weeks-stayed <num weeks>"
    Mark how long you've stayed this month, e.g. "/rent weeks-stayed 4"
"/rent paid"
    Mark that you've paid this month's rent
"/rent add <user name>"
    Add someone new (you, by default) to pay the rent
"/rent remove <user name>"
    Removes someone (you, by default) from paying rent
"/rent rent-amt <rent cost>"
    Set the total apartment rent for the month
"/rent utility-amt <utility cost>"
    Set the total apartment utility bill for the month
"/rent create-month"
    Make sure this month's block exists on the sheet
"/rent help"
    Have this chit-chat with me again, anytime"#;

// ============================================================================
// INTENT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Help,
    Add,
    Remove,
    Paid,
    RentAmt,
    UtilityAmt,
    WeeksStayed,
    Show,
    CreateMonth,
}

impl Verb {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "help" => Some(Verb::Help),
            "add" => Some(Verb::Add),
            "remove" => Some(Verb::Remove),
            "paid" => Some(Verb::Paid),
            "rent-amt" => Some(Verb::RentAmt),
            "utility-amt" => Some(Verb::UtilityAmt),
            "weeks-stayed" => Some(Verb::WeeksStayed),
            "show" => Some(Verb::Show),
            "create-month" => Some(Verb::CreateMonth),
            _ => None,
        }
    }
}

/// One parsed command: what to do, who asked, any trailing argument, and
/// the month the command applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandIntent {
    pub verb: Verb,
    pub acting_user: String,
    pub argument: Option<String>,
    pub effective_month: YearMonth,
}

/// What came out of scanning a chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Not addressed to the bot at all.
    NotACommand,
    /// Addressed to the bot, but the verb is unknown.
    Unrecognized(String),
    Command(CommandIntent),
}

/// Result of executing an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Reply(String),
    AmountsOwed(std::collections::BTreeMap<String, f64>),
}

// ============================================================================
// PARSING
// ============================================================================

/// The month a command should apply to: two weeks ago, so commands sent
/// in the first days of a month still land on the month being settled.
pub fn default_effective_month() -> YearMonth {
    let t = Utc::now() - Duration::days(14);
    YearMonth::new(t.year(), t.month())
}

/// Scan a chat message for the "/rent <verb> [argument]" trigger.
pub fn parse_message(text: &str, acting_user: &str, effective_month: YearMonth) -> ParseOutcome {
    let trimmed = text.trim_start();
    let Some(rest) = trimmed.strip_prefix("/rent") else {
        return ParseOutcome::NotACommand;
    };
    // "/rental" and friends are somebody else's conversation
    if !rest.starts_with(char::is_whitespace) {
        return ParseOutcome::NotACommand;
    }

    let rest = rest.trim();
    let (token, tail) = match rest.split_once(char::is_whitespace) {
        Some((token, tail)) => (token, tail.trim()),
        None => (rest, ""),
    };
    let Some(verb) = Verb::from_token(token) else {
        return ParseOutcome::Unrecognized(token.to_string());
    };

    let argument = if tail.is_empty() {
        None
    } else {
        Some(tail.trim_start_matches('@').to_string())
    };
    ParseOutcome::Command(CommandIntent {
        verb,
        acting_user: acting_user.to_string(),
        argument,
        effective_month,
    })
}

// ============================================================================
// EXECUTION
// ============================================================================

/// Run one command against the ledger, yielding either a reply string or
/// the amounts-owed mapping for `show`.
pub fn execute<G: GridStore>(
    engine: &mut LedgerEngine<G>,
    intent: &CommandIntent,
) -> Result<CommandOutcome> {
    let month = intent.effective_month;
    match intent.verb {
        Verb::Help => Ok(CommandOutcome::Reply(HELP_MESSAGE.to_string())),

        Verb::Add => {
            let name = intent.argument.as_deref().unwrap_or(&intent.acting_user);
            engine.add_tenant(name, month)?;
            Ok(CommandOutcome::Reply(format!("Added @{} to the rent roll", name)))
        }

        Verb::Remove => {
            let name = intent.argument.as_deref().unwrap_or(&intent.acting_user);
            engine.remove_tenant(name, month)?;
            Ok(CommandOutcome::Reply(format!(
                "Removed @{} from the rent roll",
                name
            )))
        }

        Verb::Paid => {
            // The current month's block may not exist yet; assume the
            // payment was meant for the previous month in that case.
            let paid_month = match engine.mark_paid(&intent.acting_user, month) {
                Ok(()) => month,
                Err(err) if err.downcast_ref::<LedgerError>().map_or(false, |e| {
                    matches!(e, LedgerError::MonthNotFound { .. })
                }) =>
                {
                    let previous = month.previous();
                    engine.mark_paid(&intent.acting_user, previous)?;
                    previous
                }
                Err(err) => return Err(err),
            };
            Ok(CommandOutcome::Reply(format!(
                "@{} paid the rent for {} {}",
                intent.acting_user,
                month_name(paid_month.month),
                paid_month.year
            )))
        }

        Verb::RentAmt => {
            let Some(amount) = parse_positive_amount(intent.argument.as_deref()) else {
                return Ok(CommandOutcome::Reply(
                    "Hmmm, I couldn't read that amount (did you include it like \"/rent rent-amt $1234.00\"?)"
                        .to_string(),
                ));
            };
            engine.set_total_rent(amount, month)?;
            Ok(CommandOutcome::Reply(format!(
                "@{} set the total rent for {} {} at ${:.2}",
                intent.acting_user,
                month_name(month.month),
                month.year,
                amount
            )))
        }

        Verb::UtilityAmt => {
            let Some(amount) = parse_positive_amount(intent.argument.as_deref()) else {
                return Ok(CommandOutcome::Reply(
                    "Hmmm, I couldn't read that amount (did you include it like \"/rent utility-amt $1234.00\"?)"
                        .to_string(),
                ));
            };
            engine.set_total_utility(amount, month)?;
            Ok(CommandOutcome::Reply(format!(
                "@{} set the total utility cost for {} {} to ${:.2}",
                intent.acting_user,
                month_name(month.month),
                month.year,
                amount
            )))
        }

        Verb::WeeksStayed => {
            let weeks = intent
                .argument
                .as_deref()
                .and_then(|arg| parse_number(arg).ok())
                .filter(|w| *w >= 0.0);
            let Some(weeks) = weeks else {
                return Ok(CommandOutcome::Reply(
                    "Hmmm, I couldn't read how many weeks that was (did you include it like \"/rent weeks-stayed 4\"?)"
                        .to_string(),
                ));
            };
            engine.set_weeks_stayed(weeks, &intent.acting_user, month)?;
            Ok(CommandOutcome::Reply(format!(
                "@{} stayed for {} weeks in {} {}",
                intent.acting_user,
                weeks,
                month_name(month.month),
                month.year
            )))
        }

        Verb::Show => Ok(CommandOutcome::AmountsOwed(engine.amounts_owed()?)),

        Verb::CreateMonth => {
            engine.create_month(month)?;
            Ok(CommandOutcome::Reply(format!(
                "The rent block for {} {} is ready",
                month_name(month.month),
                month.year
            )))
        }
    }
}

/// Render the `show` mapping the way the chat expects it.
pub fn format_amounts_owed(owed: &std::collections::BTreeMap<String, f64>) -> String {
    if owed.is_empty() {
        return "...hmmm, I'm not sure who's paying rent right now (have you run \"/rent add\" to add yourself?)"
            .to_string();
    }
    let lines: Vec<String> = owed
        .iter()
        .map(|(name, amt)| format!("@{}: ${:.2}", name, amt))
        .collect();
    format!("=== Rents Due ===\n{}", lines.join("\n"))
}

fn parse_positive_amount(argument: Option<&str>) -> Option<f64> {
    parse_amount(argument?).ok().filter(|a| *a >= 0.0)
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MemoryGrid;

    const SEPT: YearMonth = YearMonth { year: 2021, month: 9 };
    const OCT: YearMonth = YearMonth { year: 2021, month: 10 };

    fn engine() -> LedgerEngine<MemoryGrid> {
        let mut engine = LedgerEngine::new(MemoryGrid::new());
        engine.init_if_empty().unwrap();
        engine
    }

    fn parse(text: &str) -> ParseOutcome {
        parse_message(text, "Jake Deerin", SEPT)
    }

    #[test]
    fn test_parse_trigger() {
        assert_eq!(parse("what's for dinner"), ParseOutcome::NotACommand);
        assert_eq!(parse("/rental market is rough"), ParseOutcome::NotACommand);
        assert_eq!(
            parse("/rent dance"),
            ParseOutcome::Unrecognized("dance".to_string())
        );

        let ParseOutcome::Command(intent) = parse("  /rent show") else {
            panic!("expected a command");
        };
        assert_eq!(intent.verb, Verb::Show);
        assert_eq!(intent.acting_user, "Jake Deerin");
        assert_eq!(intent.argument, None);
    }

    #[test]
    fn test_parse_argument_strips_mention() {
        let ParseOutcome::Command(intent) = parse("/rent add @Mac Mathis") else {
            panic!("expected a command");
        };
        assert_eq!(intent.verb, Verb::Add);
        assert_eq!(intent.argument.as_deref(), Some("Mac Mathis"));
    }

    #[test]
    fn test_add_defaults_to_acting_user() {
        let mut engine = engine();
        let ParseOutcome::Command(intent) = parse("/rent add") else {
            panic!("expected a command");
        };
        let outcome = execute(&mut engine, &intent).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Reply("Added @Jake Deerin to the rent roll".to_string())
        );
        assert!(engine.snapshot().unwrap().roster.contains_key("Jake Deerin"));
    }

    #[test]
    fn test_paid_falls_back_to_previous_month() {
        let mut engine = engine();
        engine.add_tenant("Jake Deerin", SEPT).unwrap();

        // October's block doesn't exist; the payment lands on September
        let intent = CommandIntent {
            verb: Verb::Paid,
            acting_user: "Jake Deerin".to_string(),
            argument: None,
            effective_month: OCT,
        };
        let outcome = execute(&mut engine, &intent).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Reply("@Jake Deerin paid the rent for September 2021".to_string())
        );
        assert!(engine.snapshot().unwrap().months[0].line_items["Jake Deerin"].is_paid);
    }

    #[test]
    fn test_paid_pre_epoch_month_is_not_retried() {
        // A month before the ledger epoch is a configuration error, not a
        // missing block; the "maybe they meant last month" retry must not
        // fire for it
        let mut engine = engine();
        engine.add_tenant("Jake Deerin", SEPT).unwrap();

        let intent = CommandIntent {
            verb: Verb::Paid,
            acting_user: "Jake Deerin".to_string(),
            argument: None,
            effective_month: YearMonth::new(2021, 7),
        };
        let err = execute(&mut engine, &intent).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::MonthBeforeEpoch { .. })
        ));
    }

    #[test]
    fn test_rent_amt_accepts_dollar_sign() {
        let mut engine = engine();
        let ParseOutcome::Command(intent) = parse("/rent rent-amt $1,697.00") else {
            panic!("expected a command");
        };
        let outcome = execute(&mut engine, &intent).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Reply(
                "@Jake Deerin set the total rent for September 2021 at $1697.00".to_string()
            )
        );
    }

    #[test]
    fn test_rent_amt_rejects_garbage_with_a_hint() {
        let mut engine = engine();
        for text in ["/rent rent-amt", "/rent rent-amt lots", "/rent rent-amt -50"] {
            let ParseOutcome::Command(intent) = parse(text) else {
                panic!("expected a command");
            };
            let CommandOutcome::Reply(reply) = execute(&mut engine, &intent).unwrap() else {
                panic!("expected a reply");
            };
            assert!(reply.contains("couldn't read that amount"), "for {:?}", text);
        }
        // Nothing at all was written for the bad inputs
        assert_eq!(engine.grid().write_batches(), 1);
    }

    #[test]
    fn test_weeks_stayed_applies_to_acting_user() {
        let mut engine = engine();
        engine.add_tenant("Jake Deerin", SEPT).unwrap();

        let ParseOutcome::Command(intent) = parse("/rent weeks-stayed 2.5") else {
            panic!("expected a command");
        };
        let outcome = execute(&mut engine, &intent).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Reply("@Jake Deerin stayed for 2.5 weeks in September 2021".to_string())
        );
        assert_eq!(
            engine.snapshot().unwrap().months[0].line_items["Jake Deerin"].weeks_stayed,
            2.5
        );
    }

    #[test]
    fn test_show_formats_rents_due() {
        let mut engine = engine();
        engine.add_tenant("A", SEPT).unwrap();
        engine.set_total_rent(100.0, SEPT).unwrap();

        let ParseOutcome::Command(intent) = parse("/rent show") else {
            panic!("expected a command");
        };
        let CommandOutcome::AmountsOwed(owed) = execute(&mut engine, &intent).unwrap() else {
            panic!("expected amounts");
        };
        let text = format_amounts_owed(&owed);
        assert!(text.starts_with("=== Rents Due ==="));
        assert!(text.contains("@A: $100.00"));
    }

    #[test]
    fn test_show_with_empty_roster() {
        let owed = std::collections::BTreeMap::new();
        assert!(format_amounts_owed(&owed).contains("/rent add"));
    }
}
