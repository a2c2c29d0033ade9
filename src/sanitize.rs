use chrono::NaiveDate;
use serde::Serialize;

/// A scalar cell on its way to the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(Value::Int).unwrap_or(Value::Float(v as f64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rows that went through [`sanitize`]. The gateway only accepts this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedRows {
    rows: Vec<Vec<Value>>,
}

impl SanitizedRows {
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

/// Integral floats become ints; `NaN` and the literal `"nan"` become `Null`.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::Float(f) if f.is_nan() => Value::Null,
        Value::Float(f) if is_integral(f) => Value::Int(f as i64),
        Value::Text(s) if s == "nan" => Value::Null,
        other => other,
    }
}

pub fn sanitize(rows: Vec<Vec<Value>>) -> SanitizedRows {
    let rows = rows
        .into_iter()
        .map(|row| row.into_iter().map(sanitize_value).collect())
        .collect();
    SanitizedRows { rows }
}

/// Flattens records through their row projection and sanitizes the result.
pub fn sanitize_records<T: ToRow>(records: &[T]) -> SanitizedRows {
    sanitize(records.iter().map(ToRow::to_row).collect())
}

/// Projection of a record onto its collection's column order.
pub trait ToRow {
    const COLUMNS: &'static [&'static str];

    fn to_row(&self) -> Vec<Value>;
}

fn is_integral(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_become_ints() {
        assert_eq!(sanitize_value(Value::Float(12.0)), Value::Int(12));
        assert_eq!(sanitize_value(Value::Float(-3.0)), Value::Int(-3));
        assert_eq!(sanitize_value(Value::Float(0.5)), Value::Float(0.5));
    }

    #[test]
    fn nan_markers_become_null() {
        assert_eq!(sanitize_value(Value::Float(f64::NAN)), Value::Null);
        assert_eq!(sanitize_value(Value::from("nan")), Value::Null);
        assert_eq!(sanitize_value(Value::from("NaNa")), Value::from("NaNa"));
    }

    #[test]
    fn other_values_pass_through() {
        let rows = vec![vec![
            Value::from("Totals"),
            Value::Bool(true),
            Value::Int(7),
            Value::Null,
            Value::Float(f64::INFINITY),
        ]];
        let out = sanitize(rows.clone());
        assert_eq!(out.rows(), rows.as_slice());
    }

    #[test]
    fn sanitized_grid_has_no_nan_survivors() {
        let rows = vec![
            vec![Value::Float(f64::NAN), Value::from("nan"), Value::Float(4.0)],
            vec![Value::Float(2.25), Value::from("x"), Value::Float(1e3)],
        ];
        let out = sanitize(rows);
        for row in out.rows() {
            for cell in row {
                match cell {
                    Value::Float(f) => {
                        assert!(!f.is_nan());
                        assert!(f.fract() != 0.0);
                    }
                    Value::Text(s) => assert_ne!(s, "nan"),
                    _ => {}
                }
            }
        }
        assert_eq!(out.rows()[1][2], Value::Int(1000));
    }
}
