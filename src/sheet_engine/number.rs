use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Exact decimals
// ---------------------------------------------------------------------------

/// Most fractional digits `parse_number` accepts; `10^18` still fits an `i64`.
pub const MAX_PLACES: u32 = 18;

/// Exact fixed-point decimal worth `units / 10^places`.
///
/// Always normalised: `units` never ends with a zero while `places > 0`, so
/// derived equality and hashing compare numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    units: i64,
    places: u32,
}

impl Decimal {
    pub fn new(units: i64, places: u32) -> Self {
        let (mut units, mut places) = (units, places);
        while places > 0 && units % 10 == 0 {
            units /= 10;
            places -= 1;
        }
        Decimal { units, places }
    }

    pub fn from_int(n: i64) -> Self {
        Decimal { units: n, places: 0 }
    }

    /// Rebuild a decimal read back from a floating-point column.
    pub fn from_f64(x: f64, places: u32) -> Self {
        Decimal::new((x * 10f64.powi(places as i32)).round() as i64, places)
    }

    pub fn units(self) -> i64 {
        self.units
    }

    pub fn places(self) -> u32 {
        self.places
    }

    pub fn is_integer(self) -> bool {
        self.places == 0
    }

    pub fn to_f64(self) -> f64 {
        self.units as f64 / 10f64.powi(self.places as i32)
    }

    /// `units` rescaled to `places` digits, `None` past the `i128` range.
    fn scaled(self, places: u32) -> Option<i128> {
        10i128
            .checked_pow(places.checked_sub(self.places)?)?
            .checked_mul(self.units as i128)
    }

    pub fn checked_add(self, other: Decimal) -> Option<Decimal> {
        let p = self.places.max(other.places);
        let sum = self.scaled(p)?.checked_add(other.scaled(p)?)?;
        i64::try_from(sum).ok().map(|u| Decimal::new(u, p))
    }

    pub fn checked_sub(self, other: Decimal) -> Option<Decimal> {
        let p = self.places.max(other.places);
        let diff = self.scaled(p)?.checked_sub(other.scaled(p)?)?;
        i64::try_from(diff).ok().map(|u| Decimal::new(u, p))
    }

    pub fn checked_mul(self, other: Decimal) -> Option<Decimal> {
        let product = self.units as i128 * other.units as i128;
        i64::try_from(product)
            .ok()
            .zip(self.places.checked_add(other.places))
            .map(|(u, places)| Decimal::new(u, places))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let p = self.places.max(other.places);
        match (self.scaled(p), other.scaled(p)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.places == 0 {
            return write!(f, "{}", self.units);
        }
        let sign = if self.units < 0 { "-" } else { "" };
        let places = self.places as usize;
        let digits = format!("{:0>width$}", self.units.unsigned_abs(), width = places + 1);
        let (whole, frac) = digits.split_at(digits.len() - places);
        write!(f, "{sign}{whole}.{frac}")
    }
}

// ---------------------------------------------------------------------------
// Pool values
// ---------------------------------------------------------------------------

/// One cell of a pool row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Int(i64),
    Decimal(Decimal),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Decimal(d) if d.is_integer() => Some(d.units()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(n) => Some(Decimal::from_int(*n)),
            Value::Decimal(d) => Some(*d),
            Value::Text(_) => None,
        }
    }

    pub fn checked_mul(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int),
            _ => Some(Value::Decimal(self.as_decimal()?.checked_mul(other.as_decimal()?)?)),
        }
    }

    pub fn checked_add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int),
            _ => Some(Value::Decimal(self.as_decimal()?.checked_add(other.as_decimal()?)?)),
        }
    }

    pub fn checked_sub(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int),
            _ => Some(Value::Decimal(self.as_decimal()?.checked_sub(other.as_decimal()?)?)),
        }
    }

    /// `"12"` or `"-0.25"`; anything else is `None`.
    pub fn parse_number(text: &str) -> Option<Value> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Some(Value::Int(n));
        }
        let (whole, frac) = text.split_once('.')?;
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let negative = whole.starts_with('-');
        let digits = whole.trim_start_matches(['-', '+']);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let places = u32::try_from(frac.len()).ok().filter(|&p| p <= MAX_PLACES)?;
        let units: i64 = format!("{digits}{frac}").parse().ok()?;
        let d = Decimal::new(if negative { -units } else { units }, places);
        Some(if d.is_integer() { Value::Int(d.units()) } else { Value::Decimal(d) })
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n)     => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s)    => write!(f, "{s}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// What a pool hands back: the bare value when the pool has a single value
/// column, the whole tuple otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drawn {
    Scalar(Value),
    Tuple(Vec<Value>),
}

impl Drawn {
    pub fn from_values(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            Drawn::Scalar(values.remove(0))
        } else {
            Drawn::Tuple(values)
        }
    }

    pub fn values(&self) -> &[Value] {
        match self {
            Drawn::Scalar(v) => std::slice::from_ref(v),
            Drawn::Tuple(vs) => vs,
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Drawn::Scalar(v) => vec![v],
            Drawn::Tuple(vs) => vs,
        }
    }
}

pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_are_normalised() {
        assert_eq!(Decimal::new(250, 2), Decimal::new(25, 1));
        assert_eq!(Decimal::new(300, 2), Decimal::from_int(3));
        assert_eq!(Decimal::new(25, 1).to_string(), "2.5");
        assert_eq!(Decimal::new(-5, 2).to_string(), "-0.05");
    }

    #[test]
    fn decimal_arithmetic_is_exact() {
        let a = Decimal::new(1, 1);
        let b = Decimal::new(2, 1);
        assert_eq!(a.checked_add(b), Some(Decimal::new(3, 1)));
        assert_eq!(Decimal::new(37, 1).checked_mul(Decimal::from_int(100)), Some(Decimal::from_int(370)));
        assert!(Decimal::new(1, 1) < Decimal::new(11, 2));
        assert!(Decimal::new(9, 2) < Decimal::new(1, 1));
    }

    #[test]
    fn value_arithmetic_mixes_ints_and_decimals() {
        let v = Value::Int(4).checked_mul(&Value::Decimal(Decimal::new(25, 1))).unwrap();
        assert_eq!(v, Value::Decimal(Decimal::from_int(10)));
        assert_eq!(v.as_int(), Some(10));
        assert_eq!(Value::Int(7).checked_sub(&Value::Int(9)), Some(Value::Int(-2)));
        assert_eq!(Value::Text("ten".into()).checked_add(&Value::Int(1)), None);
    }

    #[test]
    fn numbers_parse_from_option_text() {
        assert_eq!(Value::parse_number("12"), Some(Value::Int(12)));
        assert_eq!(Value::parse_number(" -0.25 "), Some(Value::Decimal(Decimal::new(-25, 2))));
        assert_eq!(Value::parse_number("3.0"), Some(Value::Int(3)));
        assert_eq!(Value::parse_number("3."), None);
        assert_eq!(Value::parse_number("twelve"), None);
    }

    #[test]
    fn overlong_fractions_are_not_numbers() {
        let tiny = format!("0.{}1", "0".repeat(38));
        assert_eq!(Value::parse_number(&tiny), None);
        assert_eq!(
            Value::parse_number("0.000000000000000001"),
            Some(Value::Decimal(Decimal::new(1, 18)))
        );
    }

    #[test]
    fn extreme_places_compare_and_display_without_overflow() {
        let tiny = Decimal::new(1, 40);
        assert!(tiny < Decimal::from_int(1));
        assert!(Decimal::from_int(-1) < tiny);
        assert_eq!(tiny.checked_add(Decimal::from_int(1)), None);
        assert_eq!(tiny.to_string(), format!("0.{}1", "0".repeat(39)));
    }

    #[test]
    fn drawn_collapses_single_column() {
        assert_eq!(Drawn::from_values(vec![Value::Int(3)]), Drawn::Scalar(Value::Int(3)));
        let pair = Drawn::from_values(vec![Value::Int(3), Value::Int(4)]);
        assert_eq!(pair.values().len(), 2);
    }

    #[test]
    fn gcd_handles_signs_and_zero() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(-4, 6), 2);
        assert_eq!(gcd(7, 0), 7);
    }
}
