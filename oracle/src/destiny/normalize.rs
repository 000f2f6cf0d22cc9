//! Coerces raw model output into the canonical `{chartData, analysis}` shape.
//!
//! Never fails: anything it cannot coerce is passed through for the validator to report.

use common::transforms::numbers::normalize_score;
use common::{ANALYSIS_SCORE_FIELDS, ANALYSIS_TEXT_FIELDS};
use serde_json::{Map, Value};

/// The two top-level shapes accepted from the model.
#[derive(Debug, Clone, Copy)]
pub enum RawShape<'a> {
    /// `{chartData, analysis}`, already canonical.
    Nested {
        chart_data: &'a Value,
        analysis: &'a Value,
    },
    /// Analysis fields spread at top level, points under `chartPoints` or `chartData`.
    Flat(&'a Value),
}

impl<'a> RawShape<'a> {
    /// The nested shape is checked first, anything else is read as flat.
    pub fn detect(raw: &'a Value) -> Self {
        match (field(raw, "chartData"), field(raw, "analysis")) {
            (Some(chart_data), Some(analysis)) if is_truthy(chart_data) && is_truthy(analysis) => {
                RawShape::Nested {
                    chart_data,
                    analysis,
                }
            }
            _ => RawShape::Flat(raw),
        }
    }
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|obj| obj.get(key))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Folds a raw score onto the 0-10 scale.
///
/// Missing and falsy scores become 0, values above 10 are divided by 10 and rounded,
/// everything else, including non-numbers, is kept as is.
pub fn normalize_score_value(value: Option<&Value>) -> Value {
    match value {
        None => Value::from(0),
        Some(v) if !is_truthy(v) => Value::from(0),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f > 10.0 => Value::from(normalize_score(f) as i64),
            _ => Value::Number(n.clone()),
        },
        Some(other) => other.clone(),
    }
}

fn normalize_point(point: &Value) -> Value {
    match point {
        Value::Object(obj) => {
            let mut out = obj.clone();
            out.insert("score".into(), normalize_score_value(obj.get("score")));
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn normalize_points(points: &Value) -> Value {
    match points {
        Value::Array(items) => Value::Array(items.iter().map(normalize_point).collect()),
        other => other.clone(),
    }
}

fn normalize_analysis_scores(analysis: &mut Map<String, Value>, source: &Value) {
    for key in ANALYSIS_SCORE_FIELDS {
        analysis.insert(key.into(), normalize_score_value(field(source, key)));
    }
}

fn or_default(value: Option<&Value>, default: Value) -> Value {
    match value {
        Some(v) if is_truthy(v) => v.clone(),
        _ => default,
    }
}

/// Canonical result object for any parsed model output.
pub fn normalize(raw: &Value) -> Value {
    let (chart_data, analysis) = match RawShape::detect(raw) {
        RawShape::Nested {
            chart_data,
            analysis,
        } => {
            let mut out = analysis.as_object().cloned().unwrap_or_default();
            normalize_analysis_scores(&mut out, analysis);
            (normalize_points(chart_data), out)
        }
        RawShape::Flat(raw) => {
            let points = field(raw, "chartPoints")
                .filter(|v| is_truthy(v))
                .or_else(|| field(raw, "chartData").filter(|v| is_truthy(v)));
            let chart_data = points
                .map(normalize_points)
                .unwrap_or_else(|| Value::Array(Vec::new()));

            let mut out = Map::new();
            out.insert(
                "bazi".into(),
                or_default(field(raw, "bazi"), Value::Array(Vec::new())),
            );
            for key in ANALYSIS_TEXT_FIELDS {
                out.insert(key.into(), or_default(field(raw, key), Value::from("")));
            }
            normalize_analysis_scores(&mut out, raw);
            if let Some(levels) = field(raw, "supportPressureLevels").filter(|v| is_truthy(v)) {
                out.insert("supportPressureLevels".into(), levels.clone());
            }
            (chart_data, out)
        }
    };

    let mut result = Map::new();
    result.insert("chartData".into(), chart_data);
    result.insert("analysis".into(), Value::Object(analysis));
    Value::Object(result)
}
