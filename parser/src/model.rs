use crate::error::ParseError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Метка дебет/кредит из тегов :60:/:61:/:62:/:64:/:65:
///
/// Помимо обычных `D`/`C` тег :61: допускает расширенные формы `RD`/`RC` —
/// признак сторнированной проводки. Знак суммы у них тот же, что у `D`/`C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DebitCredit {
    /// Дебет
    Debit,
    /// Кредит
    Credit,
    /// Сторно по дебету (RD)
    ReversalDebit,
    /// Сторно по кредиту (RC)
    ReversalCredit,
}

impl DebitCredit {
    /// true для D и RD
    pub fn is_debit(self) -> bool {
        matches!(self, DebitCredit::Debit | DebitCredit::ReversalDebit)
    }

    /// true для RD и RC
    pub fn is_reversal(self) -> bool {
        matches!(self, DebitCredit::ReversalDebit | DebitCredit::ReversalCredit)
    }

    /// Каноническая метка, как она пишется в выписке
    pub fn as_mark(self) -> &'static str {
        match self {
            DebitCredit::Debit => "D",
            DebitCredit::Credit => "C",
            DebitCredit::ReversalDebit => "RD",
            DebitCredit::ReversalCredit => "RC",
        }
    }
}

impl FromStr for DebitCredit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "D" => Ok(DebitCredit::Debit),
            "C" => Ok(DebitCredit::Credit),
            "RD" => Ok(DebitCredit::ReversalDebit),
            "RC" => Ok(DebitCredit::ReversalCredit),
            _ => Err(ParseError::FieldConversion {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DebitCredit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mark())
    }
}

/// Денежная сумма со знаком
///
/// Хранится как [`Decimal`] без потерь точности. Знак берётся из метки
/// дебет/кредит: дебетовые суммы отрицательные.
///
/// `currency` может отсутствовать, если тег не содержит валюты, а контекст
/// не дал валюту по умолчанию (у :61: своего кода валюты нет).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Amount {
    pub value: Decimal,
    pub currency: Option<String>,
}

impl Amount {
    /// Собирает сумму из сырой строки вида "1500,00" и метки дебет/кредит
    pub fn parse(
        raw: &str,
        mark: DebitCredit,
        currency: Option<String>,
    ) -> Result<Self, ParseError> {
        let value = parse_decimal(raw)?;
        let value = if mark.is_debit() { -value } else { value };

        Ok(Amount { value, currency })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.currency {
            Some(currency) => write!(f, "{} {}", self.value, currency),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Разбирает десятичную сумму, нормализуя запятую-разделитель в точку
pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, ParseError> {
    let normalized = raw.trim().replace(',', ".");
    // "1," после замены превращается в "1." - хвостовую точку убираем
    let normalized = normalized.strip_suffix('.').unwrap_or(&normalized);

    Decimal::from_str(normalized).map_err(|_| ParseError::FieldConversion {
        field: "amount",
        value: raw.to_string(),
    })
}

/// Собирает дату из строковых групп год/месяц/день
///
/// Двузначный год раскрывается в 2000-е. `field` попадает в ошибку конверсии,
/// чтобы было видно, какая именно дата не разобралась.
pub(crate) fn parse_date(
    field: &'static str,
    year: &str,
    month: &str,
    day: &str,
) -> Result<NaiveDate, ParseError> {
    let bad = || ParseError::FieldConversion {
        field,
        value: format!("{year}{month}{day}"),
    };

    let year: i32 = year.parse().map_err(|_| bad())?;
    let year = if year < 100 { 2000 + year } else { year };
    let month: u32 = month.parse().map_err(|_| bad())?;
    let day: u32 = day.parse().map_err(|_| bad())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)
}

/// Баланс из тегов :60:/:62:/:64:/:65:
///
/// Все четыре тега используют одну грамматику и различаются только тем,
/// в какое поле выписки попадает результат.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub status: DebitCredit,
    pub amount: Amount,
    pub date: NaiveDate,
}

/// Одна банковская выписка (один message MT940)
///
/// Поля уровня выписки заполняются тегами 20/21/25/28/60/62/64/65,
/// проводки - тегами 61/86.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// :20: Transaction Reference Number
    pub transaction_reference: Option<String>,

    /// :21: Related Reference
    pub related_reference: Option<String>,

    /// :25: Account Identification (номер счёта/IBAN как есть)
    pub account_identification: Option<String>,

    /// :28: номер выписки
    pub statement_number: Option<u32>,

    /// :28: порядковый номер после '/'
    pub sequence_number: Option<u32>,

    /// :60F: / :60M: Opening Balance
    pub opening_balance: Option<Balance>,

    /// :62F: / :62M: Closing Balance
    pub closing_balance: Option<Balance>,

    /// :64: Closing Available Balance
    pub available_balance: Option<Balance>,

    /// :65: Forward Available Balance
    pub forward_available_balance: Option<Balance>,

    /// Текст :86:, встреченный вне проводок (грязные данные)
    pub details: Option<String>,

    /// Проводки (:61: + связанные :86:)
    pub transactions: Vec<Transaction>,
}

/// Одна проводка из :61: с текстом из связанных :86:
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// дата валютирования
    pub date: NaiveDate,

    /// дата проводки; в выписке указана без года, год берётся из даты валютирования
    pub entry_date: Option<NaiveDate>,

    /// метка дебет/кредит, включая сторно
    pub status: DebitCredit,

    /// funds code - третья буква кода валюты, если банк её передал
    pub funds_code: Option<String>,

    /// сумма; валюта - из контекста выписки
    pub amount: Amount,

    /// код типа операции, напр. "NTRF", "NMSC"
    pub transaction_type: Option<String>,

    /// референс клиента (часть до `//`)
    pub customer_reference: Option<String>,

    /// референс банка (часть после `//`)
    pub bank_reference: Option<String>,

    /// хвост строки :61: (supplementary details)
    pub extra_details: Option<String>,

    /// всё текстовое описание из :86:
    pub details: Option<String>,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry_date_str = self.entry_date.map(|d| d.to_string()).unwrap_or_default();

        let type_str = self.transaction_type.as_deref().unwrap_or("");
        let reference_str = self.customer_reference.as_deref().unwrap_or("");
        let details_str = self.details.as_deref().unwrap_or("").replace('\n', " ");

        write!(
            f,
            "{:<10} {:<10} {:>2} {:>18} {:<4} {} {}",
            self.date,
            entry_date_str,
            self.status.as_mark(),
            self.amount,
            type_str,
            reference_str,
            details_str,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // DebitCredit

    #[test]
    fn debit_credit_parses_all_marks() {
        assert_eq!("D".parse::<DebitCredit>().unwrap(), DebitCredit::Debit);
        assert_eq!("C".parse::<DebitCredit>().unwrap(), DebitCredit::Credit);
        assert_eq!(
            "RD".parse::<DebitCredit>().unwrap(),
            DebitCredit::ReversalDebit
        );
        assert_eq!(
            "rc".parse::<DebitCredit>().unwrap(),
            DebitCredit::ReversalCredit
        );
    }

    #[test]
    fn debit_credit_rejects_unknown_mark() {
        let err = "XD".parse::<DebitCredit>().unwrap_err();
        match err {
            ParseError::FieldConversion { field, value } => {
                assert_eq!(field, "status");
                assert_eq!(value, "XD");
            }
            other => panic!("expected FieldConversion, got {other:?}"),
        }
    }

    #[test]
    fn debit_credit_sign_and_reversal_flags() {
        assert!(DebitCredit::Debit.is_debit());
        assert!(DebitCredit::ReversalDebit.is_debit());
        assert!(!DebitCredit::Credit.is_debit());
        assert!(!DebitCredit::ReversalCredit.is_debit());

        assert!(DebitCredit::ReversalDebit.is_reversal());
        assert!(DebitCredit::ReversalCredit.is_reversal());
        assert!(!DebitCredit::Debit.is_reversal());
    }

    // Amount

    #[test]
    fn amount_normalizes_comma_separator() {
        let amount = Amount::parse("1500,00", DebitCredit::Credit, Some("EUR".into())).unwrap();
        assert_eq!(amount.value, Decimal::from_str("1500.00").unwrap());
        assert_eq!(amount.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn amount_debit_and_credit_have_opposite_signs() {
        let debit = Amount::parse("1,00", DebitCredit::Debit, None).unwrap();
        let credit = Amount::parse("1,00", DebitCredit::Credit, None).unwrap();

        assert_eq!(debit.value, -credit.value);
        assert_eq!(credit.value, Decimal::from_str("1.00").unwrap());
    }

    #[test]
    fn amount_reversal_marks_keep_plain_signs() {
        let rd = Amount::parse("10,50", DebitCredit::ReversalDebit, None).unwrap();
        let rc = Amount::parse("10,50", DebitCredit::ReversalCredit, None).unwrap();

        assert!(rd.value.is_sign_negative());
        assert!(rc.value.is_sign_positive());
    }

    #[test]
    fn amount_errors_on_garbage() {
        let err = Amount::parse("12,34,56", DebitCredit::Credit, None).unwrap_err();
        assert!(matches!(
            err,
            ParseError::FieldConversion { field: "amount", .. }
        ));
    }

    // parse_decimal

    #[test]
    fn parse_decimal_accepts_trailing_comma() {
        // "1," встречается в грязных выписках как "1 без копеек"
        assert_eq!(parse_decimal("1,").unwrap(), Decimal::from_str("1").unwrap());
    }

    #[test]
    fn parse_decimal_errors_on_empty() {
        assert!(parse_decimal("").is_err());
    }

    // parse_date

    #[test]
    fn parse_date_expands_two_digit_year_into_2000s() {
        let date = parse_date("date", "24", "01", "15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn parse_date_accepts_four_digit_year() {
        let date = parse_date("entry_date", "2024", "01", "16").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }

    #[test]
    fn parse_date_errors_on_impossible_components() {
        let err = parse_date("date", "24", "13", "01").unwrap_err();
        match err {
            ParseError::FieldConversion { field, value } => {
                assert_eq!(field, "date");
                assert_eq!(value, "241301");
            }
            other => panic!("expected FieldConversion, got {other:?}"),
        }
    }
}
