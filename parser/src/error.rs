use thiserror::Error;

/// Ошибки при парсинге данных
#[derive(Debug, Error)]
pub enum ParseError {
    // обёртки

    /// обёртка std::io::Error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // логические ошибки

    /// тег с таким идентификатором не зарегистрирован
    #[error("unknown mt940 tag {0}")]
    UnknownTag(u16),

    /// значение тега не совпало с его грамматикой
    #[error("tag {tag} value does not match its grammar: '{value}'")]
    MalformedField { tag: u16, value: String },

    /// грамматика совпала, но подполе не конвертируется в типизированное значение
    #[error("cannot convert field '{field}' from '{value}'")]
    FieldConversion {
        field: &'static str,
        value: String,
    },

    /// очень общая ошибка плохих входных данных
    #[error("bad input: {0}")]
    BadInput(String),

    /// ошибка разбора строки с тегом mt940
    #[error("bad mt940 tag line: {0}")]
    Mt940Tag(String),
}
