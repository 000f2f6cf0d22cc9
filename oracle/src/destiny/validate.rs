use common::{
    LevelStrength, LevelType, LifeDestinyResult, SchemaVersion, TenGod, ANALYSIS_SCORE_FIELDS,
    LEVEL_MAX_AGE,
};
use serde_json::{Map, Value};
use std::str::FromStr;
use strum::IntoEnumIterator;
use thiserror::Error;

/// First failed check, with the offending field path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{path} {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

type Check<T = ()> = Result<T, ValidationError>;

fn fail<T>(path: impl Into<String>, message: impl Into<String>) -> Check<T> {
    Err(ValidationError {
        path: path.into(),
        message: message.into(),
    })
}

/// Renders a number the way it would appear in JSON: `55`, not `55.0`.
fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(Value::Number(n)) => n.as_f64().map(fmt_num).unwrap_or_else(|| n.to_string()),
        Some(other) => other.to_string(),
    }
}

/// Optional fields treat an explicit null as absent.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn number_in(obj: &Map<String, Value>, key: &str, path: &str, min: f64, max: f64) -> Check<f64> {
    let value = obj.get(key);
    match value.and_then(Value::as_f64) {
        Some(n) if n >= min && n <= max => Ok(n),
        _ => fail(
            format!("{path}.{key}"),
            format!(
                "must be a number within {}-{} (got {})",
                fmt_num(min),
                fmt_num(max),
                describe(value)
            ),
        ),
    }
}

fn non_empty_string(obj: &Map<String, Value>, key: &str, path: &str) -> Check {
    match obj.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(()),
        _ => fail(format!("{path}.{key}"), "must be a non-empty string"),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, path: &str) -> Check {
    match present(obj, key) {
        None | Some(Value::String(_)) => Ok(()),
        Some(other) => fail(
            format!("{path}.{key}"),
            format!("must be a string (got {})", other),
        ),
    }
}

fn optional_ten_god(obj: &Map<String, Value>, path: &str) -> Check {
    let Some(value) = present(obj, "tenGod") else {
        return Ok(());
    };
    match value.as_str().map(TenGod::from_str) {
        Some(Ok(_)) => Ok(()),
        _ => {
            let labels: Vec<String> = TenGod::iter().map(|g| g.to_string()).collect();
            fail(
                format!("{path}.tenGod"),
                format!("must be one of {} (got {})", labels.join(", "), value),
            )
        }
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Check<&'a Map<String, Value>> {
    match value.as_object() {
        Some(obj) => Ok(obj),
        None => fail(path, "must be an object"),
    }
}

fn string_list(obj: &Map<String, Value>, key: &str, path: &str, expected: usize) -> Check {
    let ok = obj
        .get(key)
        .and_then(Value::as_array)
        .is_some_and(|items| {
            items.len() == expected
                && items
                    .iter()
                    .all(|item| item.as_str().is_some_and(|s| !s.is_empty()))
        });
    if ok {
        Ok(())
    } else {
        fail(
            format!("{path}.{key}"),
            format!("must be exactly {expected} non-empty strings"),
        )
    }
}

fn validate_energy_score(point: &Map<String, Value>, path: &str) -> Check {
    let Some(value) = present(point, "energyScore") else {
        return Ok(());
    };
    let path = format!("{path}.energyScore");
    let energy = as_object(value, &path)?;
    for key in ["total", "monthCoefficient", "dayRelation", "hourFluctuation"] {
        number_in(energy, key, &path, 0.0, 10.0)?;
    }
    if !energy.get("isBelowSupport").is_some_and(Value::is_boolean) {
        return fail(format!("{path}.isBelowSupport"), "must be a boolean");
    }
    Ok(())
}

fn validate_action_advice(point: &Map<String, Value>, path: &str) -> Check {
    let Some(value) = present(point, "actionAdvice") else {
        return Ok(());
    };
    let path = format!("{path}.actionAdvice");
    let advice = as_object(value, &path)?;
    string_list(advice, "suggestions", &path, 3)?;
    string_list(advice, "warnings", &path, 2)?;
    optional_string(advice, "basis", &path)?;
    optional_string(advice, "scenario", &path)
}

fn validate_point(value: &Value, index: usize, max_age: f64) -> Check {
    let path = format!("chartData[{index}]");
    let point = as_object(value, &path)?;

    if !point.get("age").is_some_and(Value::is_number) {
        return fail(format!("{path}.age"), "must be a number");
    }
    number_in(point, "age", &path, 1.0, max_age)?;
    if !point.get("year").is_some_and(Value::is_number) {
        return fail(format!("{path}.year"), "must be a number");
    }
    non_empty_string(point, "ganZhi", &path)?;

    let open = number_in(point, "open", &path, 0.0, 100.0)?;
    let close = number_in(point, "close", &path, 0.0, 100.0)?;
    let high = number_in(point, "high", &path, 0.0, 100.0)?;
    let low = number_in(point, "low", &path, 0.0, 100.0)?;
    number_in(point, "score", &path, 0.0, 10.0)?;
    non_empty_string(point, "reason", &path)?;

    let max_oc = open.max(close);
    let min_oc = open.min(close);
    if high < max_oc {
        return fail(
            format!("{path}.high"),
            format!(
                "({}) must be >= max(open, close) ({})",
                fmt_num(high),
                fmt_num(max_oc)
            ),
        );
    }
    if low > min_oc {
        return fail(
            format!("{path}.low"),
            format!(
                "({}) must be <= min(open, close) ({})",
                fmt_num(low),
                fmt_num(min_oc)
            ),
        );
    }

    optional_ten_god(point, &path)?;
    validate_energy_score(point, &path)?;
    validate_action_advice(point, &path)
}

fn validate_level(value: &Value, index: usize) -> Check {
    let path = format!("analysis.supportPressureLevels[{index}]");
    let level = as_object(value, &path)?;

    number_in(level, "age", &path, 1.0, LEVEL_MAX_AGE as f64)?;
    number_in(level, "value", &path, 0.0, 10.0)?;
    if !level
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|s| LevelType::from_str(s).is_ok())
    {
        return fail(
            format!("{path}.type"),
            format!(
                "must be support or pressure (got {})",
                describe(level.get("type"))
            ),
        );
    }
    if !level
        .get("strength")
        .and_then(Value::as_str)
        .is_some_and(|s| LevelStrength::from_str(s).is_ok())
    {
        return fail(
            format!("{path}.strength"),
            format!(
                "must be weak, medium or strong (got {})",
                describe(level.get("strength"))
            ),
        );
    }
    non_empty_string(level, "reason", &path)?;
    optional_ten_god(level, &path)
}

/// Checks a normalized result against the schema, stopping at the first failure.
///
/// Checks run in a fixed order so the reported failure is deterministic: top-level
/// object, analysis, bazi, chart length, every point in order, analysis scores, then
/// support and pressure levels.
pub fn validate(result: &Value, schema: SchemaVersion) -> Check {
    let Some(root) = result.as_object() else {
        return fail("result", "must be a JSON object");
    };

    let Some(analysis) = root.get("analysis").filter(|v| !v.is_null()) else {
        return fail("analysis", "is missing");
    };
    let analysis = as_object(analysis, "analysis")?;

    if !analysis
        .get("bazi")
        .and_then(Value::as_array)
        .is_some_and(|b| b.len() == 4)
    {
        return fail(
            "analysis.bazi",
            "must be an array of 4 pillars (year, month, day, hour)",
        );
    }

    let Some(points) = root.get("chartData").and_then(Value::as_array) else {
        return fail("chartData", "is missing or not an array");
    };
    let expected = schema.chart_len();
    if points.len() != expected {
        return fail(
            "chartData",
            format!("must contain {} points (got {})", expected, points.len()),
        );
    }

    let max_age = schema.max_age() as f64;
    for (index, point) in points.iter().enumerate() {
        validate_point(point, index, max_age)?;
    }

    for key in ANALYSIS_SCORE_FIELDS {
        number_in(analysis, key, "analysis", 0.0, 10.0)?;
    }

    match present(analysis, "supportPressureLevels") {
        None => {}
        Some(Value::Array(levels)) => {
            for (index, level) in levels.iter().enumerate() {
                validate_level(level, index)?;
            }
        }
        Some(_) => return fail("analysis.supportPressureLevels", "must be an array"),
    }

    Ok(())
}

/// Validates, then converts into the typed result.
pub fn validate_into(result: Value, schema: SchemaVersion) -> Check<LifeDestinyResult> {
    validate(&result, schema)?;
    serde_json::from_value(result).or_else(|e| {
        fail(
            "result",
            format!("does not match the result structure: {}", e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(age: u32) -> Value {
        json!({
            "age": age, "year": 1989 + age, "ganZhi": "庚午",
            "open": 50, "close": 55, "high": 60, "low": 45,
            "score": 5.5, "reason": "平稳"
        })
    }

    fn result(n: u32) -> Value {
        let points: Vec<Value> = (1..=n).map(point).collect();
        let mut analysis = json!({"bazi": ["庚午", "辛巳", "庚辰", "壬午"]});
        for key in ANALYSIS_SCORE_FIELDS {
            analysis[key] = json!(7);
        }
        json!({"chartData": points, "analysis": analysis})
    }

    fn err(value: &Value) -> String {
        validate(value, SchemaVersion::ThirtyYears)
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn test_valid_result_passes() {
        assert!(validate(&result(30), SchemaVersion::ThirtyYears).is_ok());
        assert!(validate(&result(100), SchemaVersion::Century).is_ok());
        let typed = validate_into(result(30), SchemaVersion::ThirtyYears).unwrap();
        assert_eq!(typed.chart_data.len(), 30);
    }

    #[test]
    fn test_top_level_checks_in_order() {
        assert_eq!(err(&json!([])), "result must be a JSON object");
        assert_eq!(err(&json!({"chartData": []})), "analysis is missing");
        assert_eq!(
            err(&json!({"analysis": {"bazi": ["a"]}})),
            "analysis.bazi must be an array of 4 pillars (year, month, day, hour)"
        );
        assert_eq!(
            err(&json!({"analysis": {"bazi": [1, 2, 3, 4]}})),
            "chartData is missing or not an array"
        );
        assert_eq!(
            err(&result(29)),
            "chartData must contain 30 points (got 29)"
        );
        // Length is configured: a 30-point result fails the century schema
        let e = validate(&result(30), SchemaVersion::Century).unwrap_err();
        assert_eq!(e.path, "chartData");
    }

    #[test]
    fn test_candle_invariant() {
        let mut r = result(30);
        r["chartData"][3]["open"] = json!(50);
        r["chartData"][3]["close"] = json!(60);
        r["chartData"][3]["high"] = json!(55);
        let e = validate(&r, SchemaVersion::ThirtyYears).unwrap_err();
        assert_eq!(e.path, "chartData[3].high");
        assert_eq!(
            e.to_string(),
            "chartData[3].high (55) must be >= max(open, close) (60)"
        );

        let mut r = result(30);
        r["chartData"][0]["low"] = json!(52.5);
        assert_eq!(
            err(&r),
            "chartData[0].low (52.5) must be <= min(open, close) (50)"
        );
    }

    #[test]
    fn test_point_field_checks() {
        let mut r = result(30);
        r["chartData"][2]["age"] = json!("3");
        assert_eq!(err(&r), "chartData[2].age must be a number");

        let mut r = result(30);
        r["chartData"][2]["age"] = json!(31);
        assert_eq!(
            err(&r),
            "chartData[2].age must be a number within 1-30 (got 31)"
        );

        let mut r = result(30);
        r["chartData"][5]["ganZhi"] = json!("");
        assert_eq!(err(&r), "chartData[5].ganZhi must be a non-empty string");

        let mut r = result(30);
        r["chartData"][5]["open"] = json!(101);
        assert_eq!(
            err(&r),
            "chartData[5].open must be a number within 0-100 (got 101)"
        );

        let mut r = result(30);
        r["chartData"][5]["score"] = json!(55);
        assert_eq!(
            err(&r),
            "chartData[5].score must be a number within 0-10 (got 55)"
        );

        let mut r = result(30);
        r["chartData"][5].as_object_mut().unwrap().remove("reason");
        assert_eq!(err(&r), "chartData[5].reason must be a non-empty string");

        let mut r = result(30);
        r["chartData"][7] = json!(5);
        assert_eq!(err(&r), "chartData[7] must be an object");
    }

    #[test]
    fn test_optional_point_structures() {
        let mut r = result(30);
        r["chartData"][1]["tenGod"] = json!("正官");
        r["chartData"][1]["energyScore"] = json!({
            "total": 6.5, "monthCoefficient": 7, "dayRelation": 6,
            "hourFluctuation": 5, "isBelowSupport": false
        });
        r["chartData"][1]["actionAdvice"] = json!({
            "suggestions": ["a", "b", "c"], "warnings": ["d", "e"], "scenario": "事业"
        });
        assert!(validate(&r, SchemaVersion::ThirtyYears).is_ok());

        let mut bad = r.clone();
        bad["chartData"][1]["tenGod"] = json!("财星");
        assert!(err(&bad).starts_with("chartData[1].tenGod must be one of 比肩, 劫财"));

        let mut bad = r.clone();
        bad["chartData"][1]["energyScore"]["dayRelation"] = json!(11);
        assert!(err(&bad).starts_with("chartData[1].energyScore.dayRelation"));

        let mut bad = r.clone();
        bad["chartData"][1]["energyScore"]["isBelowSupport"] = json!("no");
        assert_eq!(
            err(&bad),
            "chartData[1].energyScore.isBelowSupport must be a boolean"
        );

        let mut bad = r.clone();
        bad["chartData"][1]["actionAdvice"]["suggestions"] = json!(["a", "", "c"]);
        assert_eq!(
            err(&bad),
            "chartData[1].actionAdvice.suggestions must be exactly 3 non-empty strings"
        );

        let mut bad = r.clone();
        bad["chartData"][1]["actionAdvice"]["warnings"] = json!(["d"]);
        assert_eq!(
            err(&bad),
            "chartData[1].actionAdvice.warnings must be exactly 2 non-empty strings"
        );

        let mut bad = r;
        bad["chartData"][1]["actionAdvice"]["basis"] = json!(3);
        assert_eq!(
            err(&bad),
            "chartData[1].actionAdvice.basis must be a string (got 3)"
        );
    }

    #[test]
    fn test_analysis_scores() {
        let mut r = result(30);
        r["analysis"]["fengShuiScore"] = json!(12);
        assert_eq!(
            err(&r),
            "analysis.fengShuiScore must be a number within 0-10 (got 12)"
        );
        let mut r = result(30);
        r["analysis"]
            .as_object_mut()
            .unwrap()
            .remove("cryptoScore");
        assert_eq!(
            err(&r),
            "analysis.cryptoScore must be a number within 0-10 (got missing)"
        );
    }

    #[test]
    fn test_support_pressure_levels() {
        let level = json!({
            "age": 25, "type": "support", "value": 6.5,
            "strength": "strong", "reason": "正印护身", "tenGod": "正印"
        });
        let mut r = result(30);
        r["analysis"]["supportPressureLevels"] = json!([level.clone()]);
        assert!(validate(&r, SchemaVersion::ThirtyYears).is_ok());

        let mut bad = level.clone();
        bad["age"] = json!(31);
        r["analysis"]["supportPressureLevels"] = json!([level.clone(), bad]);
        let e = validate(&r, SchemaVersion::ThirtyYears).unwrap_err();
        assert_eq!(e.path, "analysis.supportPressureLevels[1].age");

        let mut bad = level.clone();
        bad["type"] = json!("resistance");
        r["analysis"]["supportPressureLevels"] = json!([bad]);
        assert_eq!(
            err(&r),
            "analysis.supportPressureLevels[0].type must be support or pressure (got \"resistance\")"
        );

        let mut bad = level.clone();
        bad["strength"] = json!("huge");
        r["analysis"]["supportPressureLevels"] = json!([bad]);
        assert!(err(&r).starts_with("analysis.supportPressureLevels[0].strength"));

        let mut bad = level;
        bad["reason"] = json!("");
        r["analysis"]["supportPressureLevels"] = json!([bad]);
        assert_eq!(
            err(&r),
            "analysis.supportPressureLevels[0].reason must be a non-empty string"
        );
    }

    #[test]
    fn test_level_ages_stay_within_thirty_for_century_charts() {
        let level = json!({
            "age": 30, "type": "pressure", "value": 4,
            "strength": "medium", "reason": "七杀攻身"
        });
        let mut r = result(100);
        r["analysis"]["supportPressureLevels"] = json!([level.clone()]);
        assert!(validate(&r, SchemaVersion::Century).is_ok());

        let mut late = level;
        late["age"] = json!(35);
        r["analysis"]["supportPressureLevels"] = json!([late]);
        let e = validate(&r, SchemaVersion::Century).unwrap_err();
        assert_eq!(
            e.to_string(),
            "analysis.supportPressureLevels[0].age must be a number within 1-30 (got 35)"
        );
    }

    #[test]
    fn test_null_optional_fields_count_as_absent() {
        let mut r = result(30);
        r["chartData"][4]["tenGod"] = Value::Null;
        r["chartData"][4]["energyScore"] = Value::Null;
        r["chartData"][4]["actionAdvice"] = Value::Null;
        r["chartData"][5]["actionAdvice"] = json!({
            "suggestions": ["a", "b", "c"], "warnings": ["d", "e"],
            "basis": null, "scenario": null
        });
        r["analysis"]["supportPressureLevels"] = json!([{
            "age": 3, "type": "support", "value": 5,
            "strength": "weak", "reason": "印星", "tenGod": null
        }]);
        let typed = validate_into(r, SchemaVersion::ThirtyYears).unwrap();
        let point = &typed.chart_data[4];
        assert!(point.ten_god.is_none());
        assert!(point.energy_score.is_none());
        assert!(point.action_advice.is_none());
        let advice = typed.chart_data[5].action_advice.as_ref().unwrap();
        assert!(advice.basis.is_none() && advice.scenario.is_none());

        let mut r = result(30);
        r["analysis"]["supportPressureLevels"] = Value::Null;
        assert!(validate(&r, SchemaVersion::ThirtyYears).is_ok());
    }

    #[test]
    fn test_validate_into_rejects_fractional_age() {
        let mut r = result(30);
        r["chartData"][0]["age"] = json!(1.5);
        let e = validate_into(r, SchemaVersion::ThirtyYears).unwrap_err();
        assert_eq!(e.path, "result");
    }
}
