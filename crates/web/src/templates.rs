use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::response::Html;
use rust_decimal::{Decimal, RoundingStrategy};
use tera::{Context, Tera, Value};

use crate::error::WebResult;

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../templates/base.html")),
    ("list.html", include_str!("../templates/list.html")),
    ("stats.html", include_str!("../templates/stats.html")),
    ("form.html", include_str!("../templates/form.html")),
    ("confirm_delete.html", include_str!("../templates/confirm_delete.html")),
    ("error.html", include_str!("../templates/error.html")),
];

/// Page templates, compiled once at startup.
#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        tera.register_filter("round2", round2);

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, name: &str, context: &Context) -> WebResult<Html<String>> {
        Ok(Html(self.tera.render(name, context)?))
    }
}

/// Formats a number (or a decimal serialized as a string) with two decimals.
fn round2(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let decimal = match value {
        Value::Null => return Ok(Value::String(String::new())),
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64_retain),
        Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
    .ok_or_else(|| tera::Error::msg(format!("round2 expects a number, got {value}")))?;

    let rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(Value::String(format!("{rounded:.2}")))
}
