//! String templates: `{{ Path.To.Value }}` expressions rendered against
//! event data with `minijinja`.
//!
//! Top-level event data keys are template variables, nested values are
//! reached with attribute (`Invoice.id`) or index (`orders[0]`) syntax.
//! Strings render raw, `null` renders empty, maps and lists render as JSON.
//! A string that references an undefined value, or is not a valid template,
//! is left exactly as written.

use std::fmt::Write as _;
use std::sync::LazyLock;

use minijinja::value::ValueKind;
use minijinja::{Environment, Error, ErrorKind, Output, State, UndefinedBehavior};
use serde_json::Value;

use crate::trigger::EventData;

/// Upper bound on the work one render may do.
const FUEL_LIMIT: u64 = 10_000;

static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_fuel(Some(FUEL_LIMIT));
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_formatter(format_value);
    env
});

fn format_value(out: &mut Output, state: &State, value: &minijinja::Value) -> Result<(), Error> {
    match value.kind() {
        ValueKind::None => Ok(()),
        ValueKind::Map | ValueKind::Seq => {
            let json = serde_json::to_string(value)
                .map_err(|err| Error::new(ErrorKind::BadSerialization, err.to_string()))?;
            out.write_str(&json)
                .map_err(|_| Error::from(ErrorKind::WriteFailure))
        }
        _ => minijinja::escape_formatter(out, state, value),
    }
}

/// Render `template` against `data`.
#[must_use]
pub fn interpolate(template: &str, data: &EventData) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }
    let context = minijinja::Value::from_serialize(data);
    ENV.render_str(template, context)
        .unwrap_or_else(|_| template.to_string())
}

/// Interpolate every string nested anywhere inside `value`.
#[must_use]
pub fn interpolate_value(value: &Value, data: &EventData) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate(s, data)),
        Value::Array(items) => Value::Array(items.iter().map(|v| interpolate_value(v, data)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), interpolate_value(v, data)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> EventData {
        let Value::Object(map) = serde_json::json!({
            "Invoice": {"id": "inv-9", "price": 12.5, "status": "paid", "buyer": null},
            "ActionData0": {"orders": [{"id": "o-1"}]},
            "Flag": true
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn should_replace_nested_string_values() {
        assert_eq!(
            interpolate("Invoice {{Invoice.id}} is {{ Invoice.status }}", &data()),
            "Invoice inv-9 is paid"
        );
    }

    #[test]
    fn should_render_numbers_and_booleans() {
        assert_eq!(interpolate("{{Invoice.price}}/{{Flag}}", &data()), "12.5/true");
    }

    #[test]
    fn should_render_null_as_empty() {
        assert_eq!(interpolate("[{{Invoice.buyer}}]", &data()), "[]");
    }

    #[test]
    fn should_index_into_arrays() {
        assert_eq!(interpolate("{{ActionData0.orders[0].id}}", &data()), "o-1");
    }

    #[test]
    fn should_render_lists_as_json() {
        assert_eq!(
            interpolate("{{ActionData0.orders}}", &data()),
            r#"[{"id":"o-1"}]"#
        );
    }

    #[test]
    fn should_leave_unresolved_template_as_written() {
        assert_eq!(
            interpolate("hello {{Missing.path}}!", &data()),
            "hello {{Missing.path}}!"
        );
        assert_eq!(
            interpolate("{{Invoice.id}} {{Invoice.nope}}", &data()),
            "{{Invoice.id}} {{Invoice.nope}}"
        );
    }

    #[test]
    fn should_keep_unterminated_token_verbatim() {
        assert_eq!(interpolate("a {{Invoice.id", &data()), "a {{Invoice.id");
    }

    #[test]
    fn should_pass_plain_text_through() {
        assert_eq!(interpolate("50% off {% not a tag", &data()), "50% off {% not a tag");
    }

    #[test]
    fn should_interpolate_strings_inside_json_values() {
        let template = serde_json::json!({
            "subject": "Paid {{Invoice.id}}",
            "lines": ["{{Invoice.status}}", 3],
            "count": 1
        });
        assert_eq!(
            interpolate_value(&template, &data()),
            serde_json::json!({"subject": "Paid inv-9", "lines": ["paid", 3], "count": 1})
        );
    }
}
