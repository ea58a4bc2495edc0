//! JSON front-end.
//!
//! Expressions arrive as nested objects tagged by `type`:
//!
//! ```json
//! {"type": "Multiply",
//!  "left":  {"type": "Plus", "left": {"type": "Literal", "value": 1},
//!                            "right": {"type": "Literal", "value": 2}},
//!  "right": {"type": "Variable", "name": "x"}}
//! ```
//!
//! `Add` is accepted as an alias of `Plus`. Anything else is rejected here,
//! with the path of the offending node, before it can reach the core.

use serde_json::{Map, Value};

use cal_eval::ensure_sufficient_stack;
use cal_ir::Expr;

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON that does not describe an expression.
    #[error("malformed expression at {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Parse a JSON document into an expression.
pub fn parse_expr(source: &str) -> Result<Expr, FrontendError> {
    let value: Value = serde_json::from_str(source)?;
    decode(&value)
}

/// Decode an already-parsed JSON value.
pub fn decode(value: &Value) -> Result<Expr, FrontendError> {
    let mut path = String::from("$");
    let expr = decode_at(value, &mut path)?;
    tracing::debug!(nodes = expr.node_count(), "decoded expression");
    Ok(expr)
}

fn decode_at(value: &Value, path: &mut String) -> Result<Expr, FrontendError> {
    ensure_sufficient_stack(|| {
        let Value::Object(fields) = value else {
            return Err(malformed(path, "expected an object"));
        };
        let tag = match fields.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(_) => return Err(malformed(path, "`type` must be a string")),
            None => return Err(malformed(path, "missing `type`")),
        };

        match tag {
            "Literal" => literal(fields, path),
            "Plus" | "Add" => {
                let left = operand(fields, "left", path)?;
                let right = operand(fields, "right", path)?;
                Ok(Expr::add(left, right))
            }
            "Multiply" => {
                let left = operand(fields, "left", path)?;
                let right = operand(fields, "right", path)?;
                Ok(Expr::multiply(left, right))
            }
            "Variable" => match fields.get("name") {
                Some(Value::String(name)) => Ok(Expr::variable(name.as_str())),
                Some(_) => Err(malformed(path, "`name` must be a string")),
                None => Err(malformed(path, "missing `name`")),
            },
            other => Err(malformed(path, format!("unknown expression type `{other}`"))),
        }
    })
}

fn literal(fields: &Map<String, Value>, path: &str) -> Result<Expr, FrontendError> {
    match fields.get("value") {
        Some(Value::Number(number)) => number.as_i64().map(Expr::literal).ok_or_else(|| {
            malformed(path, format!("literal {number} is not a 64-bit signed integer"))
        }),
        Some(_) => Err(malformed(path, "`value` must be a number")),
        None => Err(malformed(path, "missing `value`")),
    }
}

fn operand(
    fields: &Map<String, Value>,
    key: &str,
    path: &mut String,
) -> Result<Expr, FrontendError> {
    let Some(child) = fields.get(key) else {
        return Err(malformed(path, format!("missing `{key}`")));
    };
    let len = path.len();
    path.push('.');
    path.push_str(key);
    let result = decode_at(child, path);
    path.truncate(len);
    result
}

fn malformed(path: &str, message: impl Into<String>) -> FrontendError {
    FrontendError::Malformed {
        path: path.to_string(),
        message: message.into(),
    }
}
