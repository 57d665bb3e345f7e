use chrono::NaiveDate;
use parser::{DebitCredit, Mt940Data, Statement};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::{fs::File, io::BufReader, path::PathBuf};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("mt940")
        .join("example.sta")
}

fn parse_fixture() -> Statement {
    let path = fixture_path();
    let file =
        File::open(&path).unwrap_or_else(|e| panic!("failed to open MT940 fixture {path:?}: {e}"));
    let reader = BufReader::new(file);

    let mut data = Mt940Data::parse(reader).expect("failed to parse MT940 fixture");
    assert_eq!(
        data.statements.len(),
        1,
        "fixture contains exactly one {{4:}} block"
    );

    data.statements.remove(0)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn mt940_example_parses_statement_level_fields() {
    let stmt = parse_fixture();

    // из фикстуры:
    // :20:ABN AMRO BANK NV / :25:517852257 / :28:13501/1
    assert_eq!(
        stmt.transaction_reference.as_deref(),
        Some("ABN AMRO BANK NV")
    );
    assert_eq!(stmt.account_identification.as_deref(), Some("517852257"));
    assert_eq!(stmt.statement_number, Some(13501));
    assert_eq!(stmt.sequence_number, Some(1));
}

#[test]
fn mt940_example_parses_all_four_balances() {
    let stmt = parse_fixture();

    let opening = stmt
        .opening_balance
        .as_ref()
        .expect("opening balance from :60F:");
    assert_eq!(opening.status, DebitCredit::Credit);
    assert_eq!(opening.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(opening.amount.value, dec("500000.00"));
    assert_eq!(opening.amount.currency.as_deref(), Some("EUR"));

    let closing = stmt
        .closing_balance
        .as_ref()
        .expect("closing balance from :62F:");
    assert_eq!(closing.amount.value, dec("498750.75"));
    assert_eq!(closing.date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());

    assert!(
        stmt.available_balance.is_some(),
        "available balance from :64:"
    );
    assert!(
        stmt.forward_available_balance.is_some(),
        "forward available balance from :65:"
    );

    // балансы сходятся: 500000,00 - 1500,00 + 250,75
    assert_eq!(
        opening.amount.value + dec("-1500.00") + dec("250.75"),
        closing.amount.value
    );
}

#[test]
fn mt940_example_parses_transactions() {
    let stmt = parse_fixture();

    assert_eq!(
        stmt.transactions.len(),
        2,
        "fixture is expected to contain 2 transactions"
    );

    let first = &stmt.transactions[0];
    assert_eq!(first.status, DebitCredit::Debit);
    assert_eq!(first.amount.value, dec("-1500.00"));
    assert_eq!(
        first.amount.currency.as_deref(),
        Some("EUR"),
        "transaction currency is inherited from the opening balance"
    );
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(
        first.entry_date,
        Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    );
    assert_eq!(first.transaction_type.as_deref(), Some("NMSC"));
    assert_eq!(first.customer_reference.as_deref(), Some("NONREF"));

    // :86: с многострочным продолжением склеивается через '\n'
    assert_eq!(
        first.details.as_deref(),
        Some("GIRO 428428 KPN - DIGITALE TV\nBETALINGSKENM. 000000042188659")
    );

    let second = &stmt.transactions[1];
    assert_eq!(second.status, DebitCredit::Credit);
    assert_eq!(second.amount.value, dec("250.75"));
    assert_eq!(second.transaction_type.as_deref(), Some("NTRF"));
    assert_eq!(second.customer_reference.as_deref(), Some("PAYMENT REF 42"));
    assert_eq!(
        second.details.as_deref(),
        Some("INCASSO VERZEKERING POLIS 123")
    );
}
