//! GROQ support for the multi-language workspace.
//!
//! The translation engine speaks to its document store in GROQ. This crate
//! tokenizes and parses those queries and evaluates them against an
//! in-memory dataset, which is how the in-process store answers them.

pub mod ast;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr};
pub use eval::{eval_query, EvalError, Scope};
pub use parser::{parse, ParseError};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_are_collected_once_in_order() {
        let expr = parse("*[translationId == $tid && language == $lang && _id != $tid]").unwrap();
        assert_eq!(expr.params(), vec!["tid", "lang"]);
    }

    #[test]
    fn parse_then_evaluate() {
        let expr = parse("*[_type == $type]{_id}").unwrap();
        let dataset = vec![
            json!({"_id": "a", "_type": "page"}),
            json!({"_id": "b", "_type": "post"}),
        ];
        let result = eval_query(&expr, &dataset, &json!({"type": "page"})).unwrap();
        assert_eq!(result, json!([{"_id": "a"}]));
    }
}
