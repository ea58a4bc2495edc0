//! C source generation.
//!
//! The body is the expression's usual fully parenthesized rendering, with
//! each variable replaced by a read of its slot: `((env[0]*env[1])+3)`.
//! The unit around it exports one function:
//!
//! ```c
//! int64_t evaluate(const int64_t *env);
//! ```
//!
//! Signed overflow is undefined in C, so the unit must be compiled with
//! `-fwrapv` to keep the wrapping semantics of the other backends.
//!
//! Compilers cap bracket nesting (clang at 256 by default). Once a
//! subexpression reaches [`MAX_NESTING`] levels it is hoisted into a
//! `const int64_t tN` declared ahead of the `return`, and the parent reads
//! the temporary instead. Temporaries are declared in evaluation order, so
//! each one only refers to earlier ones.

use cal_eval::{ensure_sufficient_stack, EvalError, EvalResult, LocationTable};
use cal_ir::{BinaryOp, Expr};

/// Exported symbol of every generated unit.
pub const ENTRY_POINT: &str = "evaluate";

/// Deepest bracket nesting emitted in any single C expression.
pub const MAX_NESTING: usize = 128;

/// A rendered function body: temporaries, then the returned expression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Body {
    /// `const int64_t tN = ...;` declarations in evaluation order.
    pub temporaries: Vec<String>,
    /// The returned C expression.
    pub result: String,
}

/// Render `expr` as C reading slots from `env`.
pub fn render_body(expr: &Expr, table: &LocationTable) -> EvalResult<Body> {
    let mut renderer = Renderer {
        table,
        temporaries: Vec::new(),
    };
    let (result, _) = renderer.render(expr)?;
    Ok(Body {
        temporaries: renderer.temporaries,
        result,
    })
}

struct Renderer<'a> {
    table: &'a LocationTable,
    temporaries: Vec<String>,
}

impl Renderer<'_> {
    /// Rendered text and its bracket nesting depth.
    fn render(&mut self, expr: &Expr) -> EvalResult<(String, usize)> {
        ensure_sufficient_stack(|| match expr {
            Expr::Literal(value) => Ok(literal(*value)),
            Expr::Add(left, right) => self.binary(BinaryOp::Add, left, right),
            Expr::Multiply(left, right) => self.binary(BinaryOp::Multiply, left, right),
            Expr::Variable(name) => {
                let slot = self
                    .table
                    .slot(name.as_str())
                    .ok_or_else(|| EvalError::MissingSlot { name: name.clone() })?;
                Ok((format!("env[{slot}]"), 1))
            }
        })
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> EvalResult<(String, usize)> {
        let (left, left_depth) = self.render(left)?;
        let (right, right_depth) = self.render(right)?;
        let text = format!("({left}{}{right})", op.symbol());
        let depth = left_depth.max(right_depth) + 1;
        if depth < MAX_NESTING {
            return Ok((text, depth));
        }
        let name = format!("t{}", self.temporaries.len());
        self.temporaries.push(format!("const int64_t {name} = {text};"));
        Ok((name, 0))
    }
}

/// `i64::MIN` has no literal form in C: `-9223372036854775808` is the
/// negation of a constant that does not fit in `int64_t`.
fn literal(value: i64) -> (String, usize) {
    if value == i64::MIN {
        ("(-9223372036854775807-1)".to_string(), 1)
    } else {
        (value.to_string(), 0)
    }
}

/// Wrap a rendered body in a complete compilation unit.
pub fn compilation_unit(body: &Body) -> String {
    let mut unit = format!(
        "#include <stdint.h>\n\
         \n\
         int64_t {ENTRY_POINT}(const int64_t *env) {{\n\
         \x20   (void)env;\n"
    );
    for temporary in &body.temporaries {
        unit.push_str("    ");
        unit.push_str(temporary);
        unit.push('\n');
    }
    unit.push_str("    return ");
    unit.push_str(&body.result);
    unit.push_str(";\n}\n");
    unit
}
