pub mod error;
pub mod model;
pub mod mt940;
pub mod processors;
pub mod tags;

pub use crate::error::ParseError;
pub use crate::model::{Amount, Balance, DebitCredit, Statement, Transaction};
pub use crate::mt940::Mt940Data;
pub use crate::processors::{override_currency_post_processor, Processors};
pub use crate::tags::{parse_tag, FieldValue, Fields, ParseContext, ParsedTag, Scope, Tag};
