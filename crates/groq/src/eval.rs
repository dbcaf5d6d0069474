//! In-memory GROQ evaluation against a dataset snapshot.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::ast::{BinaryOp, Expr, OrderKey, Projected, Stage};
use crate::functions::call_builtin;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EvalError {
    #[error("type error: {0}")]
    TypeError(String),
    #[error("unknown function: {0}()")]
    UnknownFunction(String),
    #[error("unsupported expression")]
    Unsupported,
}

/// Evaluation scope: the documents `*` ranges over and the bound `$params`.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub dataset: &'a [Value],
    pub params: &'a Value,
}

/// Evaluate a full query against a dataset.
pub fn eval_query(expr: &Expr, dataset: &[Value], params: &Value) -> Result<Value, EvalError> {
    tracing::trace!(documents = dataset.len(), "evaluating GROQ query");
    Scope { dataset, params }.eval(expr, &Value::Null)
}

impl Scope<'_> {
    /// Evaluate `expr` with `this` as the current document.
    pub fn eval(&self, expr: &Expr, this: &Value) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item, this))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Ident(name) => Ok(this.get(name).cloned().unwrap_or(Value::Null)),
            Expr::Param(name) => Ok(self.params.get(name).cloned().unwrap_or(Value::Null)),
            Expr::This => Ok(this.clone()),
            Expr::Everything => Ok(Value::Array(self.dataset.to_vec())),
            Expr::Attribute(base, field) => Ok(attribute(&self.eval(base, this)?, field)),
            Expr::Not(inner) => Ok(match as_bool(&self.eval(inner, this)?) {
                Some(b) => Value::Bool(!b),
                None => Value::Null,
            }),
            Expr::Binary(op, left, right) => self.binary(*op, left, right, this),
            Expr::Call(name, args) => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg, this))
                    .collect::<Result<Vec<_>, _>>()?;
                call_builtin(name, this, &values)
            }
            Expr::Pipeline(source, stages) => {
                let mut current = self.eval(source, this)?;
                for stage in stages {
                    current = self.stage(stage, current)?;
                }
                Ok(current)
            }
            Expr::Deref(..) | Expr::Parent => Err(EvalError::Unsupported),
        }
    }

    /// Whether `predicate` holds for `doc`; `null` counts as false.
    pub fn matches(&self, predicate: &Expr, doc: &Value) -> Result<bool, EvalError> {
        Ok(self.eval(predicate, doc)? == Value::Bool(true))
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr, this: &Value) -> Result<Value, EvalError> {
        let lhs = self.eval(left, this)?;

        // Three-valued logic: a decided side wins over null.
        match (op, as_bool(&lhs)) {
            (BinaryOp::And, Some(false)) => return Ok(Value::Bool(false)),
            (BinaryOp::Or, Some(true)) => return Ok(Value::Bool(true)),
            _ => {}
        }

        let rhs = self.eval(right, this)?;
        let result = match op {
            BinaryOp::And => match (as_bool(&lhs), as_bool(&rhs)) {
                (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            BinaryOp::Or => match (as_bool(&lhs), as_bool(&rhs)) {
                (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            BinaryOp::Eq => equality(&lhs, &rhs),
            BinaryOp::Neq => equality(&lhs, &rhs).map(|eq| !eq),
            BinaryOp::Lt => order_values(&lhs, &rhs).map(Ordering::is_lt),
            BinaryOp::Gt => order_values(&lhs, &rhs).map(Ordering::is_gt),
            BinaryOp::Lte => order_values(&lhs, &rhs).map(Ordering::is_le),
            BinaryOp::Gte => order_values(&lhs, &rhs).map(Ordering::is_ge),
            BinaryOp::In => match &rhs {
                Value::Array(items) => Some(items.iter().any(|item| equality(&lhs, item) == Some(true))),
                Value::Null => None,
                other => {
                    return Err(EvalError::TypeError(format!(
                        "right side of `in` must be an array, got {other}"
                    )))
                }
            },
        };
        Ok(result.map_or(Value::Null, Value::Bool))
    }

    fn stage(&self, stage: &Stage, current: Value) -> Result<Value, EvalError> {
        let items = match current {
            Value::Array(items) => items,
            single => {
                return match stage {
                    Stage::Projection(fields) if single.is_object() => self.project(fields, &single),
                    _ => Ok(Value::Null),
                }
            }
        };

        match stage {
            Stage::Filter(predicate) => {
                let mut kept = Vec::new();
                for item in items {
                    if self.matches(predicate, &item)? {
                        kept.push(item);
                    }
                }
                Ok(Value::Array(kept))
            }
            Stage::Projection(fields) => items
                .iter()
                .map(|item| self.project(fields, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Stage::Order(keys) => self.order(keys, items).map(Value::Array),
        }
    }

    fn project(&self, fields: &[Projected], doc: &Value) -> Result<Value, EvalError> {
        let mut out = Map::new();
        for field in fields {
            match field {
                Projected::Spread => {
                    if let Value::Object(source) = doc {
                        out.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                }
                Projected::Field(name, expr) => {
                    out.insert(name.clone(), self.eval(expr, doc)?);
                }
            }
        }
        Ok(Value::Object(out))
    }

    fn order(&self, keys: &[OrderKey], items: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        let mut keyed = items
            .into_iter()
            .map(|item| -> Result<_, EvalError> {
                let values = keys
                    .iter()
                    .map(|key| self.eval(&key.expr, &item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((values, item))
            })
            .collect::<Result<Vec<_>, _>>()?;

        keyed.sort_by(|(a, _), (b, _)| {
            keys.iter()
                .zip(a.iter().zip(b))
                .map(|(key, (x, y))| {
                    let ord = order_values(x, y).unwrap_or(Ordering::Equal);
                    if key.descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// Attribute access; on arrays it maps over the elements.
fn attribute(value: &Value, field: &str) -> Value {
    match value {
        Value::Object(map) => map.get(field).cloned().unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| attribute(item, field))
                .filter(|v| !v.is_null())
                .collect(),
        ),
        _ => Value::Null,
    }
}

/// `null == null` holds; comparing null with anything else is itself null.
fn equality(a: &Value, b: &Value) -> Option<bool> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(true),
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(x), Value::Number(y)) => Some(x.as_f64() == y.as_f64()),
        _ => Some(a == b),
    }
}

fn order_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use serde_json::json;

    fn dataset() -> Vec<Value> {
        vec![
            json!({"_id": "a", "_type": "page", "translationId": "t1", "language": "en", "title": "Home"}),
            json!({"_id": "drafts.b", "_type": "page", "translationId": "t1", "language": "fr"}),
            json!({"_id": "c", "_type": "page", "translationId": "t2", "language": "en"}),
            json!({"_id": "img", "_type": "sanity.imageAsset"}),
        ]
    }

    fn query(q: &str, params: Value) -> Value {
        eval_query(&parse(q).unwrap(), &dataset(), &params).unwrap()
    }

    fn ids(result: &Value) -> Vec<&str> {
        result
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["_id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn null_parameter_matches_missing_fields_only() {
        let result = query("*[translationId == $translationId]", json!({"translationId": null}));
        assert_eq!(ids(&result), vec!["img"]);
        assert_eq!(ids(&query("*[title == null]", json!({}))), vec!["drafts.b", "c", "img"]);
        let result = query("*[translationId != \"t1\"]", json!({}));
        assert_eq!(ids(&result), vec!["c"]);
    }

    #[test]
    fn three_valued_logic() {
        let eval = |q: &str| eval_query(&parse(q).unwrap(), &[], &json!({})).unwrap();
        assert_eq!(eval("false && null == 1"), json!(false));
        assert_eq!(eval("true && null == 1"), json!(null));
        assert_eq!(eval("null == 1 || true"), json!(true));
        assert_eq!(eval("!(null == 1)"), json!(null));
        assert_eq!(eval("null == null"), json!(true));
        assert_eq!(eval("null != null"), json!(false));
    }

    #[test]
    fn filter_with_params_and_projection() {
        let result = query(
            "*[_id in $ids]{_id, translationId}",
            json!({"ids": ["a", "img", "missing"]}),
        );
        assert_eq!(
            result,
            json!([
                {"_id": "a", "translationId": "t1"},
                {"_id": "img", "translationId": null},
            ])
        );
    }

    #[test]
    fn count_of_group_members_in_language() {
        let q = "count(*[translationId == $translationId && language == $language])";
        assert_eq!(query(q, json!({"translationId": "t1", "language": "fr"})), json!(1));
        assert_eq!(query(q, json!({"translationId": "t2", "language": "fr"})), json!(0));
        assert_eq!(query("count(*)", json!({})), json!(4));
    }

    #[test]
    fn in_with_array_literal_of_params() {
        let result = query(
            "*[_id in [$id, $draft]]{_type}",
            json!({"id": "b", "draft": "drafts.b"}),
        );
        assert_eq!(result, json!([{"_type": "page"}]));
    }

    #[test]
    fn spread_projection_and_order() {
        let result = query(
            "*[translationId == \"t1\"]{..., \"lang\": language} | order(_id desc)",
            json!({}),
        );
        assert_eq!(ids(&result), vec!["drafts.b", "a"]);
        assert_eq!(result[1]["lang"], json!("en"));
        assert_eq!(result[1]["title"], json!("Home"));
    }

    #[test]
    fn order_by_several_keys() {
        let result = query("*[defined(language)] | order(language, _id desc)", json!({}));
        assert_eq!(ids(&result), vec!["c", "a", "drafts.b"]);
    }

    #[test]
    fn in_requires_an_array() {
        let err = eval_query(&parse("*[_id in \"a\"]").unwrap(), &dataset(), &json!({}));
        assert!(matches!(err, Err(EvalError::TypeError(_))));
    }

    #[test]
    fn attribute_maps_over_arrays() {
        assert_eq!(
            query("*[_type == \"page\"]{_id}._id", json!({})),
            json!(["a", "drafts.b", "c"])
        );
        let doc = json!({"tags": [{"name": "a"}, {"name": "b"}, {}]});
        let expr = parse("tags.name").unwrap();
        let params = json!({});
        let scope = Scope { dataset: &[], params: &params };
        assert_eq!(scope.eval(&expr, &doc).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn dereference_and_parent_are_unsupported() {
        for q in ["author->name", "^._id"] {
            let err = eval_query(&parse(q).unwrap(), &dataset(), &json!({}));
            assert_eq!(err, Err(EvalError::Unsupported));
        }
    }
}
