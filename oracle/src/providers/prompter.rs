use crate::providers::instructions::{
    bazi_system_instruction, OUTPUT_FORMAT_INSTRUCTION, USER_SECTION_TITLE,
};
use almanac::{FourPillars, FourPillarsResult, LuckDirection, ManualChart};
use common::{Gender, SchemaVersion};
use log::debug;

/// Builds the chart request: fixed instructions followed by the user's chart.
pub fn build_prompt(
    pillars: &FourPillars,
    gender: Gender,
    birth_year: i32,
    start_age: u8,
    schema: SchemaVersion,
) -> String {
    let direction = LuckDirection::of(pillars.year_pillar, gender);
    let FourPillars {
        year_pillar,
        month_pillar,
        day_pillar,
        hour_pillar,
    } = pillars;

    let system_instruction = bazi_system_instruction(schema.chart_len());
    let gender_label = gender.chart_label();

    let prompt = format!(
        r#"{system_instruction}

---

{USER_SECTION_TITLE}
- 性别: {gender_label}
- 出生年份: {birth_year}
- 四柱: {year_pillar}年 {month_pillar}月 {day_pillar}日 {hour_pillar}时
- 起运年龄: {start_age}岁（虚岁）
- 大运方向: {direction}

{OUTPUT_FORMAT_INSTRUCTION}"#
    );

    debug!("Prompt built: {} chars, {}", prompt.chars().count(), direction);
    prompt
}

pub fn build_prompt_for_chart(
    chart: &FourPillarsResult,
    gender: Gender,
    birth_year: i32,
    schema: SchemaVersion,
) -> String {
    build_prompt(&chart.pillars, gender, birth_year, chart.start_age, schema)
}

pub fn build_prompt_for_manual(
    chart: &ManualChart,
    gender: Gender,
    birth_year: i32,
    schema: SchemaVersion,
) -> String {
    build_prompt(&chart.pillars, gender, birth_year, chart.start_age, schema)
}

/// Hex md5 of a prompt, used to tag generated results.
pub fn prompt_hash(prompt: &str) -> String {
    format!("{:x}", md5::compute(prompt.as_bytes()))
}
