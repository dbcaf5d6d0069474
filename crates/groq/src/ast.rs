use serde::{Deserialize, Serialize};
use serde_json::Value;

/// GROQ abstract syntax tree.
///
/// Covers the query shapes the translation engine issues: filtered document
/// sets, projections, `in` lookups over parameter arrays and `count()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// `"str"`, `12`, `1.5`, `true`, `null`.
    Literal(Value),
    Array(Vec<Expr>),
    /// Attribute of the current document.
    Ident(String),
    /// `$name`, stored without the sigil.
    Param(String),
    /// `@`
    This,
    /// `^`
    Parent,
    /// `*`
    Everything,
    /// `base.field`
    Attribute(Box<Expr>, String),
    /// `base->field`
    Deref(Box<Expr>, String),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    /// A source followed by filters, projections and `| order(...)`.
    Pipeline(Box<Expr>, Vec<Stage>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    In,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            _ => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    Filter(Expr),
    Projection(Vec<Projected>),
    Order(Vec<OrderKey>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projected {
    /// `...`
    Spread,
    Field(String, Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderKey {
    pub expr: Expr,
    pub descending: bool,
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    /// Names of every `$param` the expression refers to, in first-seen order.
    pub fn params(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_params(&mut names);
        names
    }

    fn collect_params<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Param(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Array(items) | Expr::Call(_, items) => {
                items.iter().for_each(|e| e.collect_params(names))
            }
            Expr::Attribute(e, _) | Expr::Deref(e, _) | Expr::Not(e) => e.collect_params(names),
            Expr::Binary(_, l, r) => {
                l.collect_params(names);
                r.collect_params(names);
            }
            Expr::Pipeline(source, stages) => {
                source.collect_params(names);
                for stage in stages {
                    match stage {
                        Stage::Filter(e) => e.collect_params(names),
                        Stage::Projection(fields) => fields.iter().for_each(|field| {
                            if let Projected::Field(_, e) = field {
                                e.collect_params(names);
                            }
                        }),
                        Stage::Order(keys) => keys.iter().for_each(|k| k.expr.collect_params(names)),
                    }
                }
            }
            Expr::Literal(_) | Expr::Ident(_) | Expr::This | Expr::Parent | Expr::Everything => {}
        }
    }
}
