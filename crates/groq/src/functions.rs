use serde_json::Value;

use crate::eval::EvalError;

/// Call a GROQ function. `this` is the document being evaluated, which
/// `references()` inspects.
pub fn call_builtin(name: &str, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let first = args.first().unwrap_or(&Value::Null);
    Ok(match name {
        "count" => match first {
            Value::Array(items) => items.len().into(),
            _ => Value::Null,
        },
        "defined" => Value::Bool(!first.is_null()),
        "length" => match first {
            Value::String(s) => s.chars().count().into(),
            Value::Array(items) => items.len().into(),
            _ => Value::Null,
        },
        "coalesce" => args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null),
        "references" => {
            if args.is_empty() {
                return Err(EvalError::TypeError("references() needs at least one id".into()));
            }
            let ids: Vec<&str> = args
                .iter()
                .flat_map(|arg| match arg {
                    Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                    other => other.as_str().into_iter().collect::<Vec<_>>(),
                })
                .collect();
            Value::Bool(refers_to_any(this, &ids))
        }
        _ => return Err(EvalError::UnknownFunction(name.to_string())),
    })
}

fn refers_to_any(value: &Value, ids: &[&str]) -> bool {
    match value {
        Value::Object(map) => {
            let direct = map
                .get("_ref")
                .and_then(Value::as_str)
                .is_some_and(|target| ids.contains(&target));
            direct || map.values().any(|v| refers_to_any(v, ids))
        }
        Value::Array(items) => items.iter().any(|v| refers_to_any(v, ids)),
        _ => false,
    }
}
