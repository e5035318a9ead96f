use std::io::{self, Read};

use anyhow::{bail, Context};
use log::{error, info, warn};

use splitter_rs::formatter::{format_amount, format_balances, format_transfers};
use splitter_rs::parser::{parse_expense, parse_members};
use splitter_rs::{
    check_expenses, compute_balances_with_config, settle, spending_report, summarize, Config,
    Expense, ExpenseFilter, LedgerError, Member,
};

/// Read a members line followed by one expense per line from stdin, then print the
/// balances and the transfers that settle them.
///
/// ```text
/// members alice bob carol
/// alice 100 alice bob carol #food - dinner
/// bob 60 alice/20 carol/40 #transport - taxi
/// carol 90 alice/50% bob/50% #accommodation - hotel
/// ```
fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let config = Config::from_env().context("Cannot read configuration")?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Cannot read expenses from stdin")?;

    let (members, expenses) = parse_input(&input, &config)?;
    info!(
        "Read {} members and {} expenses",
        members.len(),
        expenses.len()
    );

    let errors = check_expenses(&members, &expenses, &config);
    if !errors.is_empty() {
        errors.iter().for_each(report);
        bail!("{} invalid expenses", errors.len());
    }

    let balances = compute_balances_with_config(&members, &expenses, &config)?;
    let transfers = settle(&balances)?;
    let summary = summarize(&balances)?;
    let spending = spending_report(&expenses, &ExpenseFilter::default())?;

    println!("Balances:");
    print!("{}", format_balances(&balances, config.currency));
    println!(
        "\nOwed: {}, owing: {}\n",
        format_amount(summary.total_owed, config.currency),
        format_amount(summary.total_owing, config.currency)
    );
    println!("Spending:");
    for (category, amount) in &spending.by_category {
        println!("{category:<14}{}", format_amount(*amount, config.currency));
    }
    println!(
        "{} expenses, total {}, average {}\n",
        spending.count,
        format_amount(spending.total, config.currency),
        format_amount(spending.average, config.currency)
    );
    println!("Transfers:");
    println!("{}", format_transfers(&transfers, config.currency));

    Ok(())
}

/// Expense ids are line numbers, so errors about a single expense point at its line.
fn report(e: &LedgerError) {
    let location = e
        .expense_id()
        .map(|id| format!("line {id}: "))
        .unwrap_or_default();
    if e.is_recoverable() {
        warn!("{location}{e}");
    } else {
        error!("{location}{e}");
    }
    eprintln!("{location}{e}");
}

/// The first non-empty line declares the members; every other non-empty line is an
/// expense, identified by its line number. All syntax errors are reported before
/// giving up.
fn parse_input(input: &str, config: &Config) -> anyhow::Result<(Vec<Member>, Vec<Expense>)> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (line_number, members_line) = lines.next().context("Empty input")?;
    let members =
        parse_members(members_line).with_context(|| format!("line {line_number}"))?;

    let mut expenses = vec![];
    let mut failures = 0;
    for (line_number, line) in lines {
        match parse_expense(line, config.currency)
            .and_then(|parsed| parsed.into_expense(line_number.to_string()))
        {
            Ok(expense) => expenses.push(expense),
            Err(e) => {
                failures += 1;
                error!("Cannot parse line {line_number}: {e}");
                eprintln!("line {line_number}: {e}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} lines could not be parsed");
    }
    Ok((members, expenses))
}
