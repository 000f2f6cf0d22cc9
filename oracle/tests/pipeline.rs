use almanac::AstronomicalCalendar;
use anyhow::Result;
use common::{BirthRequest, SchemaVersion, ANALYSIS_SCORE_FIELDS};
use oracle::{
    export_result, generate_destiny, import_result, normalize, validate, AiProvider, Completion,
    ImportError, TokenUsage,
};
use serde_json::{json, Value};
use std::cell::RefCell;

/// Flat output as the model is instructed to produce it, scores on a 100 scale.
fn flat_output(points: u32) -> Value {
    let chart_points: Vec<Value> = (1..=points)
        .map(|age| {
            let open = 40 + (age * 7) % 30;
            let close = 40 + (age * 11) % 30;
            let da_yun = if age < 5 { "童限" } else { "壬午" };
            json!({
                "age": age,
                "year": 1989 + age,
                "daYun": da_yun,
                "ganZhi": "庚午",
                "tenGod": "偏印",
                "open": open,
                "close": close,
                "high": open.max(close) + 5,
                "low": open.min(close) - 5,
                "score": 55,
                "reason": "开局平稳，家庭呵护",
            })
        })
        .collect();

    let mut raw = json!({
        "bazi": ["庚午", "辛巳", "庚辰", "壬午"],
        "summary": "命理总评",
        "personality": "性格分析",
        "industry": "事业分析",
        "fengShui": "风水建议",
        "wealth": "财富分析",
        "marriage": "婚姻分析",
        "health": "健康分析",
        "family": "六亲分析",
        "crypto": "币圈分析",
        "cryptoYear": "2030",
        "cryptoStyle": "现货定投",
        "chartPoints": chart_points,
        "supportPressureLevels": [
            {"age": 25, "type": "support", "value": 6.5, "strength": "strong", "reason": "正印护身", "tenGod": "正印"},
            {"age": 28, "type": "pressure", "value": 4.0, "strength": "medium", "reason": "七杀攻身"}
        ]
    });
    for key in ANALYSIS_SCORE_FIELDS {
        raw[key] = json!(85);
    }
    raw
}

fn fenced_text(text: &str) -> String {
    format!("```json\n{}\n```", text)
}

fn fenced(value: &Value) -> String {
    fenced_text(&serde_json::to_string_pretty(value).unwrap())
}

#[test]
fn test_flat_output_round_trip() {
    let result = import_result(&fenced(&flat_output(30)), SchemaVersion::ThirtyYears).unwrap();
    assert_eq!(result.chart_data.len(), 30);
    assert_eq!(result.chart_data[0].score, 6.0);
    assert_eq!(result.analysis.wealth_score, 9.0);
    assert_eq!(result.analysis.support_pressure_levels.as_ref().unwrap().len(), 2);

    let exported = export_result(&result).unwrap();
    let again = import_result(&exported, SchemaVersion::ThirtyYears).unwrap();
    assert_eq!(again, result);
}

#[test]
fn test_normalize_is_idempotent() {
    let once = normalize(&flat_output(30));
    let twice = normalize(&once);
    assert_eq!(once, twice);
    assert!(validate(&twice, SchemaVersion::ThirtyYears).is_ok());
}

#[test]
fn test_score_boundaries() {
    let mut raw = flat_output(30);
    raw["chartPoints"][0]["score"] = json!(10);
    raw["chartPoints"][1]["score"] = json!(11);
    raw["chartPoints"][2]["score"] = json!(100);
    raw["chartPoints"][3]["score"] = json!(0);
    let out = normalize(&raw);
    assert_eq!(out["chartData"][0]["score"], json!(10));
    assert_eq!(out["chartData"][1]["score"], json!(1));
    assert_eq!(out["chartData"][2]["score"], json!(10));
    assert_eq!(out["chartData"][3]["score"], json!(0));
}

#[test]
fn test_candle_violation_is_reported_by_path() {
    let mut raw = flat_output(30);
    raw["chartPoints"][12]["open"] = json!(50);
    raw["chartPoints"][12]["close"] = json!(60);
    raw["chartPoints"][12]["high"] = json!(55);
    raw["chartPoints"][12]["low"] = json!(45);
    let err = import_result(&raw.to_string(), SchemaVersion::ThirtyYears).unwrap_err();
    match err {
        ImportError::Validation(e) => {
            assert_eq!(e.path, "chartData[12].high");
            assert!(e.to_string().contains("must be >= max(open, close) (60)"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_level_age_outside_chart() {
    let mut raw = flat_output(30);
    raw["supportPressureLevels"][1]["age"] = json!(31);
    let err = validate(&normalize(&raw), SchemaVersion::ThirtyYears).unwrap_err();
    assert_eq!(err.path, "analysis.supportPressureLevels[1].age");
}

#[test]
fn test_wrong_length_and_bad_json() {
    let err = import_result(&flat_output(29).to_string(), SchemaVersion::ThirtyYears).unwrap_err();
    assert_eq!(
        err.to_string(),
        "validation failed: chartData must contain 30 points (got 29)"
    );

    let century = import_result(&flat_output(100).to_string(), SchemaVersion::Century).unwrap();
    assert_eq!(century.chart_data.len(), 100);

    let err = import_result("这不是JSON", SchemaVersion::ThirtyYears).unwrap_err();
    assert!(matches!(err, ImportError::Parse(_)));
}

#[test]
fn test_trailing_commas_are_tolerated() {
    let compact = flat_output(30).to_string();
    let text = format!("{},}}", &compact[..compact.len() - 1]).replace("\"壬午\"]", "\"壬午\", ]");
    assert!(serde_json::from_str::<Value>(&text).is_err());
    assert!(import_result(&fenced_text(&text), SchemaVersion::ThirtyYears).is_ok());
}

struct MockProvider {
    reply: String,
    prompts: RefCell<Vec<String>>,
}

impl AiProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(Completion {
            text: self.reply.clone(),
            usage: Some(TokenUsage {
                input_tokens: 1200,
                output_tokens: 8000,
            }),
        })
    }
}

fn request() -> BirthRequest {
    BirthRequest {
        year: 1990,
        month: 5,
        day: 20,
        time_slot: "午时".to_string(),
        gender: "Male".to_string(),
    }
}

#[tokio::test]
async fn test_generate_destiny_with_mock_provider() {
    let _ = env_logger::builder().is_test(true).try_init();
    let provider = MockProvider {
        reply: fenced(&flat_output(30)),
        prompts: RefCell::new(Vec::new()),
    };
    let calendar = AstronomicalCalendar::new();
    let generated = generate_destiny(&provider, &calendar, &request(), SchemaVersion::ThirtyYears)
        .await
        .unwrap();

    let prompts = provider.prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("- 四柱: 庚午年 辛巳月"));
    assert!(prompts[0].contains("- 大运方向: 顺行"));
    assert_eq!(generated.prompt_hash, oracle::prompt_hash(&prompts[0]));
    assert_eq!(generated.usage.unwrap().output_tokens, 8000);
    assert_eq!(generated.result.chart_data.len(), 30);
}

#[tokio::test]
async fn test_generate_destiny_surfaces_validation_message() {
    let mut raw = flat_output(30);
    raw["chartPoints"][3]["score"] = json!("high");
    let provider = MockProvider {
        reply: raw.to_string(),
        prompts: RefCell::new(Vec::new()),
    };
    let calendar = AstronomicalCalendar::new();
    let err = generate_destiny(&provider, &calendar, &request(), SchemaVersion::ThirtyYears)
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("chartData[3].score must be a number within 0-10"));
}

#[tokio::test]
async fn test_generate_rejects_bad_input_before_calling() {
    let provider = MockProvider {
        reply: String::new(),
        prompts: RefCell::new(Vec::new()),
    };
    let mut bad = request();
    bad.time_slot = "早上".to_string();
    let calendar = AstronomicalCalendar::new();
    assert!(
        generate_destiny(&provider, &calendar, &bad, SchemaVersion::ThirtyYears)
            .await
            .is_err()
    );
    assert!(provider.prompts.borrow().is_empty());
}
