use std::cmp::Ordering;

use rusqlite::types::Value as SqlValue;

use crate::sheet_engine::{
    error::{Result, SheetError},
    number::Value,
    pool::{PoolLayout, PoolRow},
};

/// Inclusive range on one field; either end may be open.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBound {
    pub field: String,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

impl FieldBound {
    pub fn new(field: &str, min: Option<Value>, max: Option<Value>) -> Self {
        FieldBound { field: field.to_string(), min, max }
    }
}

/// Row shapes, all read on the `nb1`/`nb2` fields except the triangle
/// inequality which names its field.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// `nb1 != nb2`
    Rectangle,
    /// `nb1 == nb2`
    Square,
    /// `nb2 - nb1 >= 7`
    Diff7AtLeast,
    /// `|a - b| + 1 <= field <= a + b - 1`
    TriangleInequality { a: i64, b: i64, field: String },
}

/// Rows where either of two fields holds one of `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct EitherIn {
    pub fields: (String, String),
    pub values: Vec<Value>,
}

/// Everything a draw may be constrained by. All parts are ANDed; `either_in`
/// is an OR across its two fields and `raw` an OR across its clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawConstraint {
    pub bounds: Vec<FieldBound>,
    pub pinned: Vec<(String, Value)>,
    /// Excluded from every value column, unless pinned or prevailing.
    pub not_in: Vec<Value>,
    /// Numbers of the previous draw from the same pool. Excluded like
    /// `not_in`, but dropped when nothing else qualifies.
    pub recent: Vec<Value>,
    pub prevails: Vec<Value>,
    pub either_in: Option<EitherIn>,
    /// One of `nb1`/`nb2` equals this number and the pair is coprime.
    pub coprime_to: Option<i64>,
    pub shapes: Vec<Shape>,
    pub suits_for_deci1: bool,
    pub suits_for_deci2: bool,
    /// Lock the drawn row's lock class once drawn.
    pub lock_equal_products: bool,
    /// Disjunction of range conjunctions; empty means unrestricted.
    pub raw: Vec<Vec<FieldBound>>,
}

impl DrawConstraint {
    pub fn bound(mut self, field: &str, min: Option<Value>, max: Option<Value>) -> Self {
        self.bounds.push(FieldBound::new(field, min, max));
        self
    }

    pub fn pin(mut self, field: &str, value: Value) -> Self {
        self.pinned.push((field.to_string(), value));
        self
    }

    pub fn exclude(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.not_in.extend(values);
        self
    }

    pub fn avoid_recent(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.recent.extend(values);
        self
    }

    /// The same constraint without the last-draw exclusion.
    pub fn without_recent(&self) -> Self {
        DrawConstraint { recent: Vec::new(), ..self.clone() }
    }

    pub fn prevail(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.prevails.extend(values);
        self
    }

    pub fn either(mut self, f1: &str, f2: &str, values: Vec<Value>) -> Self {
        self.either_in = Some(EitherIn { fields: (f1.to_string(), f2.to_string()), values });
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// `not_in` and `recent`, minus pinned and prevailing values.
    pub fn excluded_values(&self) -> Vec<&Value> {
        self.not_in
            .iter()
            .chain(&self.recent)
            .filter(|v| !self.pinned.iter().any(|(_, p)| num_eq(p, v)))
            .filter(|v| !self.prevails.iter().any(|p| num_eq(p, v)))
            .collect()
    }

    fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        fields.extend(self.bounds.iter().map(|b| b.field.as_str()));
        fields.extend(self.pinned.iter().map(|(f, _)| f.as_str()));
        if let Some(e) = &self.either_in {
            fields.push(&e.fields.0);
            fields.push(&e.fields.1);
        }
        if self.coprime_to.is_some() {
            fields.extend(["nb1", "nb2"]);
        }
        for shape in &self.shapes {
            match shape {
                Shape::TriangleInequality { field, .. } => fields.push(field),
                _ => fields.extend(["nb1", "nb2"]),
            }
        }
        fields.extend(self.raw.iter().flatten().map(|b| b.field.as_str()));
        fields
    }

    /// Every field named by the constraint must exist in the pool.
    pub fn validate(&self, layout: &PoolLayout, pool: &str) -> Result<()> {
        match self.fields().into_iter().find(|f| layout.index_of(f).is_none()) {
            Some(field) => Err(SheetError::UnknownField {
                pool: pool.to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // In-memory evaluation
    // -----------------------------------------------------------------------

    pub fn matches(&self, layout: &PoolLayout, row: &PoolRow) -> bool {
        let cell = |field: &str| layout.index_of(field).and_then(|i| row.values.get(i));
        let int = |field: &str| cell(field).and_then(Value::as_int);

        let in_bound = |b: &FieldBound| match cell(b.field.as_str()) {
            Some(v) => {
                b.min.as_ref().map_or(true, |m| num_cmp(v, m) != Some(Ordering::Less))
                    && b.max.as_ref().map_or(true, |m| num_cmp(v, m) != Some(Ordering::Greater))
            }
            None => false,
        };

        if !self.bounds.iter().all(|b| in_bound(b)) {
            return false;
        }
        if !self.pinned.iter().all(|(f, p)| cell(f.as_str()).map_or(false, |v| num_eq(v, p))) {
            return false;
        }
        let excluded = self.excluded_values();
        if row.values.iter().any(|v| excluded.iter().any(|x| num_eq(v, x))) {
            return false;
        }
        if let Some(e) = &self.either_in {
            let hit = |f: &str| cell(f).map_or(false, |v| e.values.iter().any(|x| num_eq(v, x)));
            if !(hit(e.fields.0.as_str()) || hit(e.fields.1.as_str())) {
                return false;
            }
        }
        if let Some(n) = self.coprime_to {
            if !(row.coprime && (int("nb1") == Some(n) || int("nb2") == Some(n))) {
                return false;
            }
        }
        for shape in &self.shapes {
            let ok = match shape {
                Shape::Rectangle => cell("nb1") != cell("nb2"),
                Shape::Square => cell("nb1") == cell("nb2"),
                Shape::Diff7AtLeast => match (int("nb1"), int("nb2")) {
                    (Some(a), Some(b)) => b - a >= 7,
                    _ => false,
                },
                Shape::TriangleInequality { a, b, field } => {
                    let (lo, hi) = triangle_range(*a, *b);
                    int(field.as_str()).map_or(false, |v| lo <= v && v <= hi)
                }
            };
            if !ok {
                return false;
            }
        }
        if self.suits_for_deci1 && !row.suits_for_deci1 {
            return false;
        }
        if self.suits_for_deci2 && !row.suits_for_deci2 {
            return false;
        }
        self.raw.is_empty() || self.raw.iter().any(|clause| clause.iter().all(|b| in_bound(b)))
    }

    // -----------------------------------------------------------------------
    // SQL translation
    // -----------------------------------------------------------------------

    /// WHERE fragment and its positional parameters. Field names are mapped
    /// through `layout`, so only known column names reach the SQL text.
    pub fn to_sql(&self, layout: &PoolLayout) -> (String, Vec<SqlValue>) {
        let col = |field: &str| {
            layout
                .index_of(field)
                .map_or("NULL", |i| layout.columns[i].name)
        };
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        let push_bound = |b: &FieldBound, clauses: &mut Vec<String>, params: &mut Vec<SqlValue>| {
            if let Some(min) = &b.min {
                clauses.push(format!("{} >= ?", col(b.field.as_str())));
                params.push(sql_value(min));
            }
            if let Some(max) = &b.max {
                clauses.push(format!("{} <= ?", col(b.field.as_str())));
                params.push(sql_value(max));
            }
        };

        for b in &self.bounds {
            push_bound(b, &mut clauses, &mut params);
        }
        for (f, v) in &self.pinned {
            clauses.push(format!("{} = ?", col(f.as_str())));
            params.push(sql_value(v));
        }
        let excluded = self.excluded_values();
        if !excluded.is_empty() {
            let marks = placeholders(excluded.len());
            for c in &layout.columns {
                clauses.push(format!("{} NOT IN ({marks})", c.name));
                params.extend(excluded.iter().map(|v| sql_value(v)));
            }
        }
        if let Some(e) = &self.either_in {
            if e.values.is_empty() {
                clauses.push("0".to_string());
            } else {
                let marks = placeholders(e.values.len());
                clauses.push(format!(
                    "({} IN ({marks}) OR {} IN ({marks}))",
                    col(e.fields.0.as_str()),
                    col(e.fields.1.as_str())
                ));
                params.extend(e.values.iter().map(sql_value));
                params.extend(e.values.iter().map(sql_value));
            }
        }
        if let Some(n) = self.coprime_to {
            clauses.push("(nb1 = ? OR nb2 = ?) AND coprime = 1".to_string());
            params.push(SqlValue::Integer(n));
            params.push(SqlValue::Integer(n));
        }
        for shape in &self.shapes {
            match shape {
                Shape::Rectangle    => clauses.push("nb1 <> nb2".to_string()),
                Shape::Square       => clauses.push("nb1 = nb2".to_string()),
                Shape::Diff7AtLeast => clauses.push("nb2 - nb1 >= 7".to_string()),
                Shape::TriangleInequality { a, b, field } => {
                    let (lo, hi) = triangle_range(*a, *b);
                    clauses.push(format!("{} BETWEEN ? AND ?", col(field.as_str())));
                    params.push(SqlValue::Integer(lo));
                    params.push(SqlValue::Integer(hi));
                }
            }
        }
        if self.suits_for_deci1 {
            clauses.push("suits_for_deci1 = 1".to_string());
        }
        if self.suits_for_deci2 {
            clauses.push("suits_for_deci2 = 1".to_string());
        }
        if !self.raw.is_empty() {
            let mut alternatives = Vec::new();
            for clause in &self.raw {
                let mut parts = Vec::new();
                for b in clause {
                    push_bound(b, &mut parts, &mut params);
                }
                if parts.is_empty() {
                    parts.push("1".to_string());
                }
                alternatives.push(format!("({})", parts.join(" AND ")));
            }
            clauses.push(format!("({})", alternatives.join(" OR ")));
        }

        if clauses.is_empty() {
            ("1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

pub(crate) fn triangle_range(a: i64, b: i64) -> (i64, i64) {
    ((a - b).abs() + 1, a + b - 1)
}

/// Numeric comparison across ints and decimals; text only compares to text.
fn num_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        _ => Some(a.as_decimal()?.cmp(&b.as_decimal()?)),
    }
}

fn num_eq(a: &Value, b: &Value) -> bool {
    num_cmp(a, b) == Some(Ordering::Equal)
}

pub(crate) fn sql_value(v: &Value) -> SqlValue {
    match v {
        Value::Int(n)     => SqlValue::Integer(*n),
        Value::Decimal(d) => SqlValue::Real(d.to_f64()),
        Value::Text(s)    => SqlValue::Text(s.clone()),
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_engine::pool::ColumnKind;

    fn layout() -> PoolLayout {
        PoolLayout::new(&[("nb1", ColumnKind::Int), ("nb2", ColumnKind::Int)])
    }

    fn row(a: i64, b: i64) -> PoolRow {
        let mut r = PoolRow::new(0, vec![Value::Int(a), Value::Int(b)]);
        r.coprime = crate::sheet_engine::number::gcd(a, b) == 1;
        r
    }

    #[test]
    fn not_in_applies_to_every_column() {
        let c = DrawConstraint::default().exclude([Value::Int(3)]);
        assert!(!c.matches(&layout(), &row(3, 8)));
        assert!(!c.matches(&layout(), &row(2, 3)));
        assert!(c.matches(&layout(), &row(2, 8)));
    }

    #[test]
    fn pinned_and_prevailing_values_survive_exclusion() {
        let pinned = DrawConstraint::default()
            .exclude([Value::Int(3), Value::Int(4)])
            .pin("nb1", Value::Int(3));
        assert!(pinned.matches(&layout(), &row(3, 8)));
        assert!(!pinned.matches(&layout(), &row(3, 4)));

        let prevailing = DrawConstraint::default()
            .exclude([Value::Int(5)])
            .prevail([Value::Int(5)]);
        assert!(prevailing.matches(&layout(), &row(5, 6)));
    }

    #[test]
    fn recent_values_are_excluded_until_dropped() {
        let c = DrawConstraint::default().avoid_recent([Value::Int(2), Value::Int(3)]);
        assert!(!c.matches(&layout(), &row(2, 2)));
        assert!(c.matches(&layout(), &row(4, 5)));
        let relaxed = c.without_recent();
        assert!(relaxed.matches(&layout(), &row(2, 2)));
        assert_eq!(c.to_sql(&layout()).1.len(), 4);
        assert!(relaxed.to_sql(&layout()).1.is_empty());
    }

    #[test]
    fn either_in_is_an_or_across_fields() {
        let c = DrawConstraint::default().either("nb1", "nb2", vec![Value::Int(6)]);
        assert!(c.matches(&layout(), &row(6, 9)));
        assert!(c.matches(&layout(), &row(2, 6)));
        assert!(!c.matches(&layout(), &row(2, 7)));
    }

    #[test]
    fn shapes_and_coprimality() {
        let rect = DrawConstraint::default().shape(Shape::Rectangle);
        assert!(!rect.matches(&layout(), &row(4, 4)));
        let square = DrawConstraint::default().shape(Shape::Square);
        assert!(square.matches(&layout(), &row(4, 4)));
        let diff = DrawConstraint::default().shape(Shape::Diff7AtLeast);
        assert!(diff.matches(&layout(), &row(2, 9)));
        assert!(!diff.matches(&layout(), &row(3, 9)));
        let tri = DrawConstraint::default().shape(Shape::TriangleInequality {
            a: 3, b: 5, field: "nb1".into(),
        });
        assert!(tri.matches(&layout(), &row(3, 9)));
        assert!(tri.matches(&layout(), &row(7, 9)));
        assert!(!tri.matches(&layout(), &row(8, 9)));
        let mut coprime = DrawConstraint::default();
        coprime.coprime_to = Some(4);
        assert!(coprime.matches(&layout(), &row(4, 9)));
        assert!(!coprime.matches(&layout(), &row(4, 6)));
    }

    #[test]
    fn raw_clauses_form_a_union() {
        let mut c = DrawConstraint::default();
        c.raw = vec![
            vec![FieldBound::new("nb1", Some(Value::Int(2)), Some(Value::Int(3)))],
            vec![FieldBound::new("nb1", Some(Value::Int(8)), None)],
        ];
        assert!(c.matches(&layout(), &row(3, 5)));
        assert!(c.matches(&layout(), &row(9, 9)));
        assert!(!c.matches(&layout(), &row(5, 9)));
    }

    #[test]
    fn sql_translation_counts_its_parameters() {
        let c = DrawConstraint::default()
            .bound("nb1", Some(Value::Int(2)), Some(Value::Int(9)))
            .exclude([Value::Int(3), Value::Int(4)])
            .either("nb1", "nb2", vec![Value::Int(5)]);
        let (sql, params) = c.to_sql(&layout());
        assert_eq!(sql.matches('?').count(), params.len());
        assert!(sql.contains("nb2 NOT IN (?, ?)"));
        assert_eq!(DrawConstraint::default().to_sql(&layout()).0, "1");
    }
}
