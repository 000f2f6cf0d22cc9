use common::{ActionAdvice, KLinePoint, LevelType, SupportPressureLevel};
use serde::Serialize;

/// Scenario used for advice that names none.
pub const DEFAULT_SCENARIO: &str = "综合";

// A zero total reads as unscored and ranks as a full 10
const UNSCORED_TOTAL: f64 = 10.0;

/// The weakest year flagged as below support: lowest `energyScore.total`, first wins ties.
pub fn lowest_energy_below_support(points: &[KLinePoint]) -> Option<&KLinePoint> {
    points
        .iter()
        .filter_map(|p| {
            p.energy_score
                .as_ref()
                .filter(|e| e.is_below_support)
                .map(|e| {
                    let total = if e.total == 0.0 || e.total.is_nan() {
                        UNSCORED_TOTAL
                    } else {
                        e.total
                    };
                    (p, total)
                })
        })
        .fold(None, |lowest: Option<(&KLinePoint, f64)>, (p, total)| match lowest {
            Some((_, min)) if min <= total => lowest,
            _ => Some((p, total)),
        })
        .map(|(p, _)| p)
}

/// Support and pressure lines worth drawing over a chart.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeyLevels<'a> {
    pub support: Option<&'a SupportPressureLevel>,
    pub pressure: Option<&'a SupportPressureLevel>,
}

/// Highest support at or below the chart's lowest low and lowest pressure at or
/// above its highest high. Level values are on the 0-10 scale, prices on 0-100.
pub fn key_levels(levels: &[SupportPressureLevel], min_low: f64, max_high: f64) -> KeyLevels<'_> {
    let support = levels
        .iter()
        .filter(|l| l.level_type == LevelType::Support && l.value * 10.0 <= min_low)
        .fold(None, |best: Option<&SupportPressureLevel>, l| match best {
            Some(b) if b.value >= l.value => best,
            _ => Some(l),
        });
    let pressure = levels
        .iter()
        .filter(|l| l.level_type == LevelType::Pressure && l.value * 10.0 >= max_high)
        .fold(None, |best: Option<&SupportPressureLevel>, l| match best {
            Some(b) if b.value <= l.value => best,
            _ => Some(l),
        });
    KeyLevels { support, pressure }
}

/// Lowest low and highest high of a series, `None` when empty.
pub fn price_bounds(points: &[KLinePoint]) -> Option<(f64, f64)> {
    points.iter().fold(None, |bounds, p| match bounds {
        None => Some((p.low, p.high)),
        Some((low, high)) => Some((low.min(p.low), high.max(p.high))),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceEntry<'a> {
    pub age: u32,
    pub year: i32,
    pub advice: &'a ActionAdvice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceGroup<'a> {
    pub scenario: String,
    pub entries: Vec<AdviceEntry<'a>>,
}

/// Points carrying advice, grouped by scenario in order of first appearance.
pub fn group_advice_by_scenario(points: &[KLinePoint]) -> Vec<AdviceGroup<'_>> {
    let mut groups: Vec<AdviceGroup<'_>> = Vec::new();
    for point in points {
        let Some(advice) = point.action_advice.as_ref() else {
            continue;
        };
        let scenario = advice
            .scenario
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCENARIO);
        let entry = AdviceEntry {
            age: point.age,
            year: point.year,
            advice,
        };
        match groups.iter_mut().find(|g| g.scenario == scenario) {
            Some(group) => group.entries.push(entry),
            None => groups.push(AdviceGroup {
                scenario: scenario.to_string(),
                entries: vec![entry],
            }),
        }
    }
    groups
}
