use clap::Parser;
use parser::{Mt940Data, ParseError, Statement};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "cli_viewer",
    version,
    about = "Парсит выписку MT940 и печатает её содержимое.",
    long_about = None,
)]
struct Args {
    /// Входной файл MT940
    #[arg(long)]
    input: PathBuf,

    /// Печатать результат как JSON вместо таблицы
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), ParseError> {
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("input file does not exist: {}", args.input.display());
        process::exit(1)
    }

    let file = File::open(&args.input).unwrap_or_else(|err| {
        eprintln!("failed to open input file {}: {err}", args.input.display());
        process::exit(1);
    });

    let reader = io::BufReader::new(file);
    let data = Mt940Data::parse(reader)?;

    if args.json {
        let json = serde_json::to_string_pretty(&data.statements)
            .map_err(|e| ParseError::BadInput(format!("json serialization failed: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    for (index, statement) in data.statements.iter().enumerate() {
        print_statement(index, statement);
    }

    Ok(())
}

fn print_statement(index: usize, statement: &Statement) {
    println!("=== statement {} ===", index + 1);

    if let Some(reference) = &statement.transaction_reference {
        println!("reference:       {reference}");
    }
    if let Some(account) = &statement.account_identification {
        println!("account:         {account}");
    }
    if let Some(number) = statement.statement_number {
        match statement.sequence_number {
            Some(sequence) => println!("statement no:    {number}/{sequence}"),
            None => println!("statement no:    {number}"),
        }
    }
    if let Some(balance) = &statement.opening_balance {
        println!("opening balance: {} ({})", balance.amount, balance.date);
    }
    if let Some(balance) = &statement.closing_balance {
        println!("closing balance: {} ({})", balance.amount, balance.date);
    }
    if let Some(balance) = &statement.available_balance {
        println!("available:       {} ({})", balance.amount, balance.date);
    }
    if let Some(balance) = &statement.forward_available_balance {
        println!("forward avail.:  {} ({})", balance.amount, balance.date);
    }

    if statement.transactions.is_empty() {
        println!("no transactions");
        return;
    }

    println!("transactions:");
    for transaction in &statement.transactions {
        println!("{transaction}");
    }
}
