use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Analysis score keys, each paired with a narrative field of the same stem.
pub const ANALYSIS_SCORE_FIELDS: [&str; 9] = [
    "summaryScore",
    "personalityScore",
    "industryScore",
    "fengShuiScore",
    "wealthScore",
    "marriageScore",
    "healthScore",
    "familyScore",
    "cryptoScore",
];

/// Analysis text keys, including the crypto timing hints.
pub const ANALYSIS_TEXT_FIELDS: [&str; 11] = [
    "summary",
    "personality",
    "industry",
    "fengShui",
    "wealth",
    "marriage",
    "health",
    "family",
    "crypto",
    "cryptoYear",
    "cryptoStyle",
];

/// Number of yearly points a result carries. The age bound on levels follows the same number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
pub enum SchemaVersion {
    #[default]
    #[strum(serialize = "30")]
    ThirtyYears,
    #[strum(serialize = "100")]
    Century,
}

/// Highest age a support or pressure level may refer to, whatever the chart length.
pub const LEVEL_MAX_AGE: u32 = 30;

impl SchemaVersion {
    pub fn chart_len(self) -> usize {
        match self {
            SchemaVersion::ThirtyYears => 30,
            SchemaVersion::Century => 100,
        }
    }

    pub fn max_age(self) -> u32 {
        self.chart_len() as u32
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
pub enum TenGod {
    #[strum(serialize = "比肩")]
    #[serde(rename = "比肩")]
    BiJian,
    #[strum(serialize = "劫财")]
    #[serde(rename = "劫财")]
    JieCai,
    #[strum(serialize = "食神")]
    #[serde(rename = "食神")]
    ShiShen,
    #[strum(serialize = "伤官")]
    #[serde(rename = "伤官")]
    ShangGuan,
    #[strum(serialize = "偏财")]
    #[serde(rename = "偏财")]
    PianCai,
    #[strum(serialize = "正财")]
    #[serde(rename = "正财")]
    ZhengCai,
    #[strum(serialize = "七杀")]
    #[serde(rename = "七杀")]
    QiSha,
    #[strum(serialize = "正官")]
    #[serde(rename = "正官")]
    ZhengGuan,
    #[strum(serialize = "偏印")]
    #[serde(rename = "偏印")]
    PianYin,
    #[strum(serialize = "正印")]
    #[serde(rename = "正印")]
    ZhengYin,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnergyScore {
    pub total: f64,
    pub month_coefficient: f64,
    pub day_relation: f64,
    pub hour_fluctuation: f64,
    pub is_below_support: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActionAdvice {
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

/// One year of the life chart, styled as a candlestick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KLinePoint {
    pub age: u32,
    pub year: i32,
    pub gan_zhi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub da_yun: Option<String>,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub score: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ten_god: Option<TenGod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_score: Option<EnergyScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_advice: Option<ActionAdvice>,
}

impl KLinePoint {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LevelType {
    Support,
    Pressure,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LevelStrength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupportPressureLevel {
    pub age: u32,
    #[serde(rename = "type")]
    pub level_type: LevelType,
    pub value: f64,
    pub strength: LevelStrength,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ten_god: Option<TenGod>,
}

/// Text fields the model left out deserialize as empty strings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisData {
    pub bazi: Vec<String>,
    pub summary: String,
    pub summary_score: f64,
    pub personality: String,
    pub personality_score: f64,
    pub industry: String,
    pub industry_score: f64,
    pub feng_shui: String,
    pub feng_shui_score: f64,
    pub wealth: String,
    pub wealth_score: f64,
    pub marriage: String,
    pub marriage_score: f64,
    pub health: String,
    pub health_score: f64,
    pub family: String,
    pub family_score: f64,
    pub crypto: String,
    pub crypto_score: f64,
    pub crypto_year: String,
    pub crypto_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_pressure_levels: Option<Vec<SupportPressureLevel>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeDestinyResult {
    pub chart_data: Vec<KLinePoint>,
    pub analysis: AnalysisData,
}

impl LifeDestinyResult {
    pub fn point_at_age(&self, age: u32) -> Option<&KLinePoint> {
        self.chart_data.iter().find(|p| p.age == age)
    }
}

/// A daily or weekly point derived from the yearly chart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedKLinePoint {
    #[serde(flatten)]
    pub point: KLinePoint,
    pub date: NaiveDate,
    pub is_interpolated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_point_wire_names() {
        let json = r#"{
            "age": 1, "year": 1990, "ganZhi": "庚午", "daYun": "童限",
            "open": 50, "close": 55, "high": 60, "low": 45, "score": 5.5,
            "reason": "开局平稳", "tenGod": "正官"
        }"#;
        let p: KLinePoint = serde_json::from_str(json).unwrap();
        assert_eq!(p.ten_god, Some(TenGod::ZhengGuan));
        assert_eq!(p.da_yun.as_deref(), Some("童限"));
        assert!(p.is_bullish());
        assert_eq!(p.body_top(), 55.0);

        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["ganZhi"], "庚午");
        assert!(v.get("energyScore").is_none());
    }

    #[test]
    fn test_level_enums() {
        assert_eq!(LevelType::from_str("support").unwrap(), LevelType::Support);
        assert!(LevelType::from_str("resistance").is_err());
        assert_eq!(LevelStrength::Strong.to_string(), "strong");
        assert_eq!(TenGod::from_str("七杀").unwrap(), TenGod::QiSha);
        assert!(TenGod::from_str("财星").is_err());
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(SchemaVersion::default().chart_len(), 30);
        assert_eq!(SchemaVersion::from_str("100").unwrap(), SchemaVersion::Century);
        assert_eq!(SchemaVersion::Century.max_age(), 100);
    }
}
