//! Instantiated questions and their LaTeX rendering.
//!
//! `to_str` returns text ready for the sheet renderer: every number is
//! already substituted, math is wrapped in `$...$`. Kinds without a
//! dedicated template fall back to listing their numbers.

use serde::Serialize;

use crate::sheet_engine::{
    catalogue::subkind_factor,
    models::{Attributes, NormalizedQuestion},
    number::Value,
    sources::rank_word_value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Exc,
    Ans,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Label from the exercise numbering policy, possibly empty.
    pub number: String,
    /// 1-based position within the exercise.
    pub position: usize,
    pub id: String,
    pub kind: String,
    pub subkind: String,
    pub options: Attributes,
    pub nbs: Vec<Value>,
}

/// Exercise, answer and hint text of one question.
struct Rendered {
    exc: String,
    ans: String,
    hint: String,
}

impl Rendered {
    fn new(exc: String, ans: String, hint: impl Into<String>) -> Self {
        Rendered { exc, ans, hint: hint.into() }
    }
}

fn math(body: String) -> String {
    format!("${body}$")
}

fn op(a: &Value, b: &Value, f: fn(&Value, &Value) -> Option<Value>) -> String {
    f(a, b).map_or_else(|| "?".to_string(), |v| v.to_string())
}

impl Question {
    pub fn new(q: NormalizedQuestion, nbs: Vec<Value>, number: String, position: usize) -> Self {
        Question {
            number,
            position,
            id: q.id,
            kind: q.kind,
            subkind: q.subkind,
            options: q.options,
            nbs,
        }
    }

    pub fn to_str(&self, mode: RenderMode) -> String {
        let r = self.render();
        match mode {
            RenderMode::Exc  => r.exc,
            RenderMode::Ans  => r.ans,
            RenderMode::Hint => r.hint,
        }
    }

    fn render(&self) -> Rendered {
        let nbs = self.nbs.as_slice();
        match (self.kind.as_str(), self.subkind.as_str(), nbs) {
            ("multi", "direct", [a, b]) => {
                let p = op(a, b, Value::checked_mul);
                Rendered::new(
                    math(format!(r"{a} \times {b} = \ldots")),
                    math(format!(r"{a} \times {b} = {p}")),
                    format!("Use the table of {}.", a),
                )
            }
            ("multi", "reversed", [a, b]) => {
                let p = op(a, b, Value::checked_mul);
                Rendered::new(
                    math(format!(r"\ldots \times \ldots = {p}")),
                    math(format!(r"{a} \times {b} = {p}")),
                    format!("{p} is in the table of {a}."),
                )
            }
            ("divi", "direct", [a, b]) => {
                let p = op(a, b, Value::checked_mul);
                Rendered::new(
                    math(format!(r"{p} \div {a} = \ldots")),
                    math(format!(r"{p} \div {a} = {b}")),
                    math(format!(r"{a} \times \ldots = {p}")),
                )
            }
            ("addi", "direct", [a, b]) => {
                let s = op(a, b, Value::checked_add);
                Rendered::new(
                    math(format!("{a} + {b} = \\ldots")),
                    math(format!("{a} + {b} = {s}")),
                    "",
                )
            }
            ("subtr", "direct", [a, b]) => {
                let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
                let d = op(hi, lo, Value::checked_sub);
                Rendered::new(
                    math(format!("{hi} - {lo} = \\ldots")),
                    math(format!("{hi} - {lo} = {d}")),
                    math(format!("{lo} + \\ldots = {hi}")),
                )
            }
            ("vocabulary", subkind, _) => self.render_vocabulary(subkind),
            ("area" | "perimeter", "square", [side, ..]) => {
                let value = if self.kind == "area" {
                    op(side, side, Value::checked_mul)
                } else {
                    op(&Value::Int(4), side, Value::checked_mul)
                };
                Rendered::new(
                    format!("What is the {} of a square of side {side}?", self.kind),
                    format!("{value}"),
                    if self.kind == "area" { "side × side" } else { "4 × side" },
                )
            }
            ("area" | "perimeter", "rectangle", [l, w]) => {
                let value = if self.kind == "area" {
                    op(l, w, Value::checked_mul)
                } else {
                    l.checked_add(w)
                        .map_or_else(|| "?".to_string(), |s| op(&Value::Int(2), &s, Value::checked_mul))
                };
                Rendered::new(
                    format!("What is the {} of a {l} by {w} rectangle?", self.kind),
                    format!("{value}"),
                    if self.kind == "area" { "length × width" } else { "2 × (length + width)" },
                )
            }
            ("rank", _, [Value::Text(word)]) => {
                let value = rank_word_value(word).map_or_else(|| "?".to_string(), |d| d.to_string());
                Rendered::new(
                    format!("1 {word} = \\ldots"),
                    format!("1 {word} = {value}"),
                    "",
                )
            }
            ("fraction", "simplification", _) => self.render_fraction(),
            ("calculation", "order_of_operations", [a, b, c]) => {
                let product = b.checked_mul(c);
                let result = product
                    .as_ref()
                    .map_or_else(|| "?".to_string(), |p| op(a, p, Value::checked_add));
                Rendered::new(
                    math(format!(r"{a} + {b} \times {c} = \ldots")),
                    math(format!(r"{a} + {b} \times {c} = {result}")),
                    "Multiplication comes first.",
                )
            }
            _ => self.render_generic(),
        }
    }

    fn render_vocabulary(&self, subkind: &str) -> Rendered {
        let nbs = self.nbs.as_slice();
        if let (Some(factor), Some(base)) = (subkind_factor(subkind), nbs.last()) {
            let factor = Value::Int(factor);
            let whole = op(&factor, base, Value::checked_mul);
            let (number, answer) = if matches!(subkind, "half" | "third" | "quarter") {
                (whole, base.to_string())
            } else {
                (base.to_string(), whole)
            };
            return Rendered::new(
                format!("The {subkind} of {number} is \\ldots"),
                format!("The {subkind} of {number} is {answer}"),
                "",
            );
        }
        let (label, value) = match (subkind, nbs) {
            ("multi", [a, b]) => (format!("product of {a} and {b}"), op(a, b, Value::checked_mul)),
            ("addi", [a, b]) => (format!("sum of {a} and {b}"), op(a, b, Value::checked_add)),
            ("subtr", [a, b]) => {
                let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
                (format!("difference between {hi} and {lo}"), op(hi, lo, Value::checked_sub))
            }
            ("divi", [a, b]) => {
                let p = op(a, b, Value::checked_mul);
                (format!("quotient of {p} by {a}"), b.to_string())
            }
            _ => return self.render_generic(),
        };
        Rendered::new(
            format!("The {label} is \\ldots"),
            format!("The {label} is {value}"),
            "",
        )
    }

    /// `(factor, n, d)` from merged draws, or a bare `(n, d)` scaled by the
    /// `ratio` option (2 when absent).
    fn render_fraction(&self) -> Rendered {
        let ratio = self
            .options
            .get("ratio")
            .and_then(|r| r.parse::<i64>().ok());
        let ints: Option<Vec<i64>> = self.nbs.iter().map(Value::as_int).collect();
        let (factor, n, d) = match ints.as_deref() {
            Some([a, b, c]) => (ratio.unwrap_or(*b), (*a).min(*c), (*a).max(*c)),
            Some([n, d]) => (ratio.unwrap_or(2), *n, *d),
            _ => return self.render_generic(),
        };
        Rendered::new(
            math(format!(r"\dfrac{{{}}}{{{}}} = \ldots", factor * n, factor * d)),
            math(format!(r"\dfrac{{{}}}{{{}}} = \dfrac{{{n}}}{{{d}}}", factor * n, factor * d)),
            format!("Divide both by {factor}."),
        )
    }

    fn render_generic(&self) -> Rendered {
        let numbers: Vec<String> = self.nbs.iter().map(Value::to_string).collect();
        let list = numbers.join(", ");
        Rendered::new(
            format!("{} ({}): {list}", self.kind, self.subkind),
            list,
            "",
        )
    }
}
