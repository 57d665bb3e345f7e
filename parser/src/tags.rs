//! Реестр тегов MT940 и грамматики их значений.
//!
//! Каждому числовому тегу соответствует одна грамматика (regex с именованными
//! группами) и финализатор, который превращает сырые группы в типизированные
//! поля. Реестр собирается один раз и дальше не меняется; `parse_tag` -
//! единственная точка входа для внешнего построчного разбора.
//!
//! Нотация длин полей - как в стандарте SWIFT:
//! `[] = опционально, ! = фиксированная длина, a = буквы, x = текст,
//! d = число с десятичным разделителем, c = код, n = цифры`.

use crate::error::ParseError;
use crate::model::{parse_date, Amount, Balance, DebitCredit};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Куда попадает результат тега: в выписку целиком или в одну проводку
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Statement,
    Transaction,
}

/// Типизированное значение одного выходного поля
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(u32),
    Amount(Amount),
    Date(NaiveDate),
    Balance(Balance),
}

/// Выходные поля одного тега: имя -> типизированное значение
pub type Fields = HashMap<&'static str, FieldValue>;

/// Контекст разбора, который внешний накопитель передаёт в `parse_tag`
///
/// Пока это только валюта по умолчанию: у грамматики :61: своего кода валюты
/// нет, сумма наследует валюту ранее разобранного баланса.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    pub currency: Option<String>,
}

/// Результат разбора одного тега
#[derive(Debug)]
pub struct ParsedTag {
    pub scope: Scope,
    pub fields: Fields,
}

/// Семейство финализаторов; балансовые теги различаются только слагом
#[derive(Debug, Clone, Copy)]
enum Family {
    /// один свободнотекстовый захват, ключ совпадает со слагом
    Text,
    StatementNumber,
    Balance,
    StatementLine,
}

/// Один зарегистрированный тег MT940
#[derive(Debug)]
pub struct Tag {
    pub id: u16,
    pub slug: &'static str,
    pub scope: Scope,
    family: Family,
    re: Regex,
}

impl Tag {
    fn new(id: u16, slug: &'static str, scope: Scope, family: Family, pattern: &str) -> Self {
        // реестр собирается на старте процесса, битый паттерн -
        // ошибка конфигурации, а не данных
        let re = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid pattern for mt940 tag {id}: {e}"));

        Tag {
            id,
            slug,
            scope,
            family,
            re,
        }
    }

    fn finalize(&self, caps: &Captures<'_>, ctx: &ParseContext) -> Result<Fields, ParseError> {
        let mut fields = Fields::new();

        match self.family {
            Family::Text => {
                insert_text(&mut fields, self.slug, caps);
            }
            Family::StatementNumber => {
                let number = parse_u32("statement_number", &caps["statement_number"])?;
                fields.insert("statement_number", FieldValue::Int(number));

                if let Some(m) = caps.name("sequence_number") {
                    let sequence = parse_u32("sequence_number", m.as_str())?;
                    fields.insert("sequence_number", FieldValue::Int(sequence));
                }
            }
            Family::Balance => {
                let status: DebitCredit = caps["status"].parse()?;
                let currency = caps["currency"].to_string();
                let amount = Amount::parse(&caps["amount"], status, Some(currency))?;
                let date = parse_date("date", &caps["year"], &caps["month"], &caps["day"])?;

                fields.insert(
                    self.slug,
                    FieldValue::Balance(Balance {
                        status,
                        amount,
                        date,
                    }),
                );
            }
            Family::StatementLine => {
                let status: DebitCredit = caps["status"].parse()?;
                // у :61: нет кода валюты - наследуем валюту выписки
                let amount = Amount::parse(&caps["amount"], status, ctx.currency.clone())?;
                let date = parse_date("date", &caps["year"], &caps["month"], &caps["day"])?;

                fields.insert("status", FieldValue::Text(status.as_mark().to_string()));
                fields.insert("amount", FieldValue::Amount(amount));
                fields.insert("date", FieldValue::Date(date));

                // дата проводки приходит без года, год берём из даты валютирования
                if let (Some(month), Some(day)) =
                    (caps.name("entry_month"), caps.name("entry_day"))
                {
                    let entry = parse_date(
                        "entry_date",
                        &date.year().to_string(),
                        month.as_str(),
                        day.as_str(),
                    )?;
                    fields.insert("entry_date", FieldValue::Date(entry));
                }

                insert_text(&mut fields, "funds_code", caps);
                insert_text(&mut fields, "transaction_type", caps);
                insert_text(&mut fields, "customer_reference", caps);
                insert_text(&mut fields, "bank_reference", caps);
                insert_text(&mut fields, "extra_details", caps);
            }
        }

        Ok(fields)
    }
}

/// Пустые опциональные захваты в выходные поля не попадают
fn insert_text(fields: &mut Fields, key: &'static str, caps: &Captures<'_>) {
    if let Some(m) = caps.name(key)
        && !m.as_str().is_empty()
    {
        fields.insert(key, FieldValue::Text(m.as_str().to_string()));
    }
}

fn parse_u32(field: &'static str, raw: &str) -> Result<u32, ParseError> {
    raw.parse().map_err(|_| ParseError::FieldConversion {
        field,
        value: raw.to_string(),
    })
}

/// :60:/:62:/:64:/:65:, формат 1!a6!n3!a15d
///
/// Единственная грамматика, заякоренная с обеих сторон: хвостовой мусор
/// после суммы баланса - это ошибка данных, а не supplementary details.
const BALANCE_PATTERN: &str = r"(?xi)^
    (?P<status>[DC])          # 1!a метка дебет/кредит
    (?P<year>\d{2})           # 6!n дата (YYMMDD)
    (?P<month>\d{2})
    (?P<day>\d{2})
    (?P<currency>.{3})        # 3!a валюта
    (?P<amount>[0-9,]{0,16})  # 15d сумма вместе с разделителем
$";

/// :61:, формат 6!n[4!n]2a[1!a]15d1!a3!c16x[//16x][34x]
///
/// Двухбуквенная метка сторно (RD/RC) поглощается группой status жадно;
/// граница между меткой и funds code решается порядком групп, без
/// ветвлений в коде.
const STATEMENT_PATTERN: &str = r"(?xi)^
    (?P<year>\d{2})                          # 6!n дата валютирования (YYMMDD)
    (?P<month>\d{2})
    (?P<day>\d{2})
    (?P<entry_month>\d{2})?                  # [4!n] дата проводки (MMDD)
    (?P<entry_day>\d{2})?
    (?P<status>[A-Z]?[DC])                   # 2a метка дебет/кредит, RD/RC - сторно
    (?P<funds_code>[A-Z])?                   # [1!a] третья буква кода валюты
    (?P<amount>[\d,]{1,15})                  # 15d сумма
    (?P<transaction_type>[A-Z][A-Z0-9]{3})?  # 1!a3!c код типа операции
    (?P<customer_reference>.{0,16})          # 16x референс клиента
    (//(?P<bank_reference>.{0,16}))?         # [//16x] референс банка
    (?P<extra_details>.{0,34})               # [34x] supplementary details
";

fn build_tags() -> Vec<Tag> {
    vec![
        // референсные теги: один текстовый захват, длина ограничена, но не валидируется
        Tag::new(
            20,
            "transaction_reference",
            Scope::Statement,
            Family::Text,
            r"(?i)^(?P<transaction_reference>.{0,16})",
        ),
        Tag::new(
            21,
            "related_reference",
            Scope::Statement,
            Family::Text,
            r"(?i)^(?P<related_reference>.{0,16})",
        ),
        Tag::new(
            25,
            "account_identification",
            Scope::Statement,
            Family::Text,
            r"(?i)^(?P<account_identification>.{0,35})",
        ),
        Tag::new(
            28,
            "statement_number",
            Scope::Statement,
            Family::StatementNumber,
            r"(?xi)^
                (?P<statement_number>\d{1,5})       # 5n
                (?:/(?P<sequence_number>\d{1,5}))?  # [/5n]
            ",
        ),
        Tag::new(
            60,
            "opening_balance",
            Scope::Statement,
            Family::Balance,
            BALANCE_PATTERN,
        ),
        Tag::new(
            61,
            "statement",
            Scope::Transaction,
            Family::StatementLine,
            STATEMENT_PATTERN,
        ),
        Tag::new(
            62,
            "closing_balance",
            Scope::Statement,
            Family::Balance,
            BALANCE_PATTERN,
        ),
        Tag::new(
            64,
            "available_balance",
            Scope::Statement,
            Family::Balance,
            BALANCE_PATTERN,
        ),
        Tag::new(
            65,
            "forward_available_balance",
            Scope::Statement,
            Family::Balance,
            BALANCE_PATTERN,
        ),
        // 6x65x, многострочные продолжения уже склеены вызывающей стороной
        Tag::new(
            86,
            "transaction_details",
            Scope::Transaction,
            Family::Text,
            r"(?i)^(?P<transaction_details>[\s\S]{0,330})",
        ),
    ]
}

static REGISTRY: Lazy<HashMap<u16, Tag>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tag in build_tags() {
        let id = tag.id;
        if map.insert(id, tag).is_some() {
            panic!("duplicate mt940 tag id {id}");
        }
    }
    map
});

/// Ищет тег по числовому идентификатору
pub fn lookup(id: u16) -> Option<&'static Tag> {
    REGISTRY.get(&id)
}

/// Все зарегистрированные теги
pub fn all_tags() -> impl Iterator<Item = &'static Tag> {
    REGISTRY.values()
}

/// Разбирает значение одного тега
///
/// Без состояния и побочных эффектов: реестр иммутабелен, поэтому функцию
/// можно звать из нескольких потоков без синхронизации.
pub fn parse_tag(id: u16, raw: &str, ctx: &ParseContext) -> Result<ParsedTag, ParseError> {
    let tag = lookup(id).ok_or(ParseError::UnknownTag(id))?;

    let caps = tag
        .re
        .captures(raw)
        .ok_or_else(|| ParseError::MalformedField {
            tag: id,
            value: raw.to_string(),
        })?;

    let fields = tag.finalize(&caps, ctx)?;

    Ok(ParsedTag {
        scope: tag.scope,
        fields,
    })
}
