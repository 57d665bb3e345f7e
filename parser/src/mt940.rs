mod utils;

use crate::error::ParseError;
use crate::model::{Statement, Transaction};
use crate::processors::Processors;
use crate::tags::{self, FieldValue, Fields, ParseContext, Scope};
use std::io::{BufRead, BufReader, Read};
use utils::*;

/// Структура с разобранными выписками формата mt940.
///
/// Для парсинга используйте [`Mt940Data::parse`], либо
/// [`Mt940Data::parse_with`], если нужны пользовательские процессоры.
///
/// Пример:
/// ```rust,no_run
/// use std::io::Cursor;
/// use parser::Mt940Data;
/// # use parser::ParseError;
/// # fn main() -> Result<(), ParseError> {
/// let reader = Cursor::new(b":20:ABC\n:25:ACCOUNT\n:60F:C240101EUR0,00\n");
/// let data = Mt940Data::parse(reader)?;
/// #     Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Mt940Data {
    /// Выписки по одной на каждый блок {4: ... -}
    pub statements: Vec<Statement>,
}

impl Mt940Data {
    /// Парсит при помощи переданного reader данные в [`Mt940Data`]
    ///
    /// При ошибке возвращает [`ParseError`]
    pub fn parse<R: Read>(reader: R) -> Result<Self, ParseError> {
        Self::parse_with(reader, &Processors::default())
    }

    /// То же, что [`Mt940Data::parse`], но с пре/пост-процессорами тегов
    pub fn parse_with<R: Read>(reader: R, processors: &Processors) -> Result<Self, ParseError> {
        let buf_reader = BufReader::new(reader);
        let lines = buf_reader
            .lines()
            .collect::<Result<Vec<String>, std::io::Error>>()?;

        let mut statements = Vec::new();
        for body in message_bodies(lines) {
            let tag_lines = group_tag_lines(&body)?;
            if tag_lines.is_empty() {
                continue;
            }
            statements.push(parse_message(&tag_lines, processors)?);
        }

        if statements.is_empty() {
            return Err(ParseError::BadInput("0 mt940 messages detected".into()));
        }

        Ok(Mt940Data { statements })
    }
}

/// Вырезает тела текстовых блоков `{4: ... -}` из строк файла
///
/// Файлы без блочной обёртки (голый поток тегов) считаются одним телом.
fn message_bodies(lines: Vec<String>) -> Vec<Vec<String>> {
    if !lines.iter().any(|line| line.contains("{4:")) {
        return vec![lines];
    }

    let mut bodies = Vec::new();
    let mut body: Vec<String> = Vec::new();
    let mut in_text_block = false;

    for line in lines {
        if !in_text_block {
            if let Some(pos) = line.find("{4:") {
                in_text_block = true;
                let after = line[pos + 3..].trim();
                if !after.is_empty() {
                    body.push(after.to_string());
                }
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.starts_with("-}") || trimmed.starts_with('}') {
            bodies.push(std::mem::take(&mut body));
            in_text_block = false;
        } else {
            body.push(line);
        }
    }

    // файл закончился, но блок не закрыт
    if in_text_block && !body.is_empty() {
        bodies.push(body);
    }

    bodies
}

fn parse_message(lines: &[TagLine], processors: &Processors) -> Result<Statement, ParseError> {
    let mut statement = Statement::default();
    let mut current_tx: Option<Transaction> = None;
    let mut ctx = ParseContext::default();

    for line in lines {
        let id = match tag_id(&line.tag) {
            Ok(id) => id,
            Err(_) => {
                eprintln!("skipped non-numeric tag {}: {}", line.tag, line.value);
                continue;
            }
        };

        let Some(tag) = tags::lookup(id) else {
            eprintln!("skipped unknown tag {id}: {}", line.value);
            continue;
        };

        let mut raw = line.value.clone();
        processors.run_pre(tag, &mut raw);

        let parsed = tags::parse_tag(id, &raw, &ctx)?;
        let mut fields = parsed.fields;
        processors.run_post(tag, &mut fields);

        match parsed.scope {
            Scope::Statement => merge_statement_fields(&mut statement, &mut ctx, fields),
            Scope::Transaction => {
                if id == 61 {
                    // закрываем предыдущую проводку
                    if let Some(tx) = current_tx.take() {
                        statement.transactions.push(tx);
                    }
                    current_tx = Some(transaction_from_fields(fields)?);
                } else if let Some(text) = take_text(&mut fields, "transaction_details") {
                    match current_tx.as_mut() {
                        Some(tx) => push_details(&mut tx.details, &text),
                        // :86: до первой проводки относится к выписке целиком
                        None => push_details(&mut statement.details, &text),
                    }
                }
            }
        }
    }

    // не забываем последнюю проводку
    if let Some(tx) = current_tx.take() {
        statement.transactions.push(tx);
    }

    Ok(statement)
}

/// Раскладывает поля тегов уровня выписки по полям [`Statement`]
///
/// Валюта последнего слитого баланса становится валютой контекста -
/// её наследуют суммы последующих :61:.
fn merge_statement_fields(statement: &mut Statement, ctx: &mut ParseContext, fields: Fields) {
    for (key, value) in fields {
        match (key, value) {
            ("transaction_reference", FieldValue::Text(text)) => {
                statement.transaction_reference = Some(text);
            }
            ("related_reference", FieldValue::Text(text)) => {
                statement.related_reference = Some(text);
            }
            ("account_identification", FieldValue::Text(text)) => {
                statement.account_identification = Some(text);
            }
            ("statement_number", FieldValue::Int(number)) => {
                statement.statement_number = Some(number);
            }
            ("sequence_number", FieldValue::Int(number)) => {
                statement.sequence_number = Some(number);
            }
            (slug, FieldValue::Balance(balance)) => {
                if let Some(currency) = balance.amount.currency.clone() {
                    ctx.currency = Some(currency);
                }
                match slug {
                    "opening_balance" => {
                        // первый 60* считаем opening_balance
                        if statement.opening_balance.is_none() {
                            statement.opening_balance = Some(balance);
                        } else {
                            eprintln!("multiple :60: opening balances, keeping the first one");
                        }
                    }
                    "closing_balance" => statement.closing_balance = Some(balance),
                    "available_balance" => statement.available_balance = Some(balance),
                    "forward_available_balance" => {
                        statement.forward_available_balance = Some(balance);
                    }
                    other => eprintln!("skipped unexpected balance field {other}"),
                }
            }
            (key, _) => eprintln!("skipped unexpected statement field {key}"),
        }
    }
}

fn transaction_from_fields(mut fields: Fields) -> Result<Transaction, ParseError> {
    let date = match fields.remove("date") {
        Some(FieldValue::Date(date)) => date,
        _ => {
            return Err(ParseError::BadInput(
                "statement line without value date".into(),
            ));
        }
    };

    let amount = match fields.remove("amount") {
        Some(FieldValue::Amount(amount)) => amount,
        _ => return Err(ParseError::BadInput("statement line without amount".into())),
    };

    let status = match take_text(&mut fields, "status") {
        Some(mark) => mark.parse()?,
        None => {
            return Err(ParseError::BadInput(
                "statement line without debit/credit mark".into(),
            ));
        }
    };

    let entry_date = match fields.remove("entry_date") {
        Some(FieldValue::Date(date)) => Some(date),
        _ => None,
    };

    Ok(Transaction {
        date,
        entry_date,
        status,
        funds_code: take_text(&mut fields, "funds_code"),
        amount,
        transaction_type: take_text(&mut fields, "transaction_type"),
        customer_reference: take_text(&mut fields, "customer_reference"),
        bank_reference: take_text(&mut fields, "bank_reference"),
        extra_details: take_text(&mut fields, "extra_details"),
        details: None,
    })
}

fn take_text(fields: &mut Fields, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(FieldValue::Text(text)) => Some(text),
        _ => None,
    }
}

fn push_details(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}
