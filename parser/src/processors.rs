//! Пре/пост-процессоры тегов.
//!
//! Хуки позволяют вызывающей стороне поправить сырое значение тега до
//! грамматики или уже разобранные поля после финализатора, не трогая сам
//! реестр. Ядро разбора про хуки не знает - их применяет накопитель
//! ([`crate::mt940::Mt940Data::parse_with`]).

use crate::tags::{FieldValue, Fields, Tag};

/// Хук над сырым значением тега, до грамматики
pub type PreProcessor = Box<dyn Fn(&Tag, &mut String)>;

/// Хук над разобранными полями тега, после финализатора
pub type PostProcessor = Box<dyn Fn(&Tag, &mut Fields)>;

/// Набор хуков, привязанных к числовым идентификаторам тегов
///
/// Хуки одного тега выполняются в порядке регистрации.
#[derive(Default)]
pub struct Processors {
    pre: Vec<(u16, PreProcessor)>,
    post: Vec<(u16, PostProcessor)>,
}

impl Processors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует пре-процессор для тега `tag_id`
    pub fn add_pre(&mut self, tag_id: u16, hook: impl Fn(&Tag, &mut String) + 'static) {
        self.pre.push((tag_id, Box::new(hook)));
    }

    /// Регистрирует пост-процессор для тега `tag_id`
    pub fn add_post(&mut self, tag_id: u16, hook: impl Fn(&Tag, &mut Fields) + 'static) {
        self.post.push((tag_id, Box::new(hook)));
    }

    pub(crate) fn run_pre(&self, tag: &Tag, raw: &mut String) {
        for (id, hook) in &self.pre {
            if *id == tag.id {
                hook(tag, raw);
            }
        }
    }

    pub(crate) fn run_post(&self, tag: &Tag, fields: &mut Fields) {
        for (id, hook) in &self.post {
            if *id == tag.id {
                hook(tag, fields);
            }
        }
    }
}

/// Пост-процессор, подменяющий валюту у всех балансов и сумм тега
///
/// Нужен для выписок, где код валюты в балансе битый или отсутствует,
/// а правильная валюта известна вызывающей стороне заранее.
pub fn override_currency_post_processor(currency: &str) -> impl Fn(&Tag, &mut Fields) + 'static {
    let currency = currency.to_string();

    move |_tag, fields| {
        for value in fields.values_mut() {
            match value {
                FieldValue::Balance(balance) => {
                    balance.amount.currency = Some(currency.clone());
                }
                FieldValue::Amount(amount) => {
                    amount.currency = Some(currency.clone());
                }
                _ => {}
            }
        }
    }
}
