use crate::calendar::Calendar;
use crate::error::{CalendarError, CalendarResult};
use chrono::{NaiveDateTime, Timelike};
use common::{BirthInstant, BirthRequest, GanZhi, Gender};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Starting luck age used when the engine cannot derive one.
pub const FALLBACK_START_AGE: u8 = 3;
pub const MAX_START_AGE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FourPillars {
    pub year_pillar: GanZhi,
    pub month_pillar: GanZhi,
    pub day_pillar: GanZhi,
    pub hour_pillar: GanZhi,
}

impl FourPillars {
    pub fn to_strings(&self) -> [String; 4] {
        [
            self.year_pillar.to_string(),
            self.month_pillar.to_string(),
            self.day_pillar.to_string(),
            self.hour_pillar.to_string(),
        ]
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
pub enum LuckDirection {
    #[strum(serialize = "顺行")]
    Forward,
    #[strum(serialize = "逆行")]
    Reverse,
}

impl LuckDirection {
    /// Yang year stem with a male chart, or yin year stem with a female chart, runs forward.
    pub fn of(year_pillar: GanZhi, gender: Gender) -> Self {
        match (year_pillar.gan.is_yang(), gender) {
            (true, Gender::Male) | (false, Gender::Female) => LuckDirection::Forward,
            _ => LuckDirection::Reverse,
        }
    }

    pub fn is_forward(self) -> bool {
        self == LuckDirection::Forward
    }
}

/// Real time from birth to the start of the first luck period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LuckSpan {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

fn time_zhi_index(dt: &NaiveDateTime) -> i64 {
    if dt.hour() == 23 {
        11
    } else {
        ((dt.hour() as i64 + 1) / 2) % 12
    }
}

impl LuckSpan {
    /// Converts the interval between birth and the bounding 节 into a luck span:
    /// 3 days count as one year, one day as four months and one double-hour as ten days.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let mut hour_diff = time_zhi_index(&end) - time_zhi_index(&start);
        let mut day_diff = (end.date() - start.date()).num_days();
        if hour_diff < 0 {
            hour_diff += 12;
            day_diff -= 1;
        }
        let month_diff = hour_diff * 10 / 30;
        let total_months = (day_diff * 4 + month_diff).max(0);
        let days = (hour_diff * 10 - month_diff * 30).max(0);
        LuckSpan {
            years: (total_months / 12) as u32,
            months: (total_months % 12) as u32,
            days: days as u32,
        }
    }

    /// Virtual age at which luck starts: real years plus one, plus one more
    /// when six or more months remain, capped at 10.
    pub fn virtual_start_age(&self) -> u8 {
        let age = self.years + 1 + u32::from(self.months >= 6);
        age.min(MAX_START_AGE as u32) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LuckPillar {
    pub gan_zhi: GanZhi,
    pub start_age: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FourPillarsResult {
    pub pillars: FourPillars,
    pub lunar_year: i32,
    pub start_age: u8,
    pub direction: LuckDirection,
}

impl FourPillarsResult {
    /// Decade pillars stepping away from the month pillar in the luck direction.
    pub fn luck_pillars(&self, count: usize) -> Vec<LuckPillar> {
        let mut current = self.pillars.month_pillar;
        (0..count)
            .map(|i| {
                current = if self.direction.is_forward() {
                    current.next()
                } else {
                    current.prev()
                };
                LuckPillar {
                    gan_zhi: current,
                    start_age: self.start_age as u32 + 10 * i as u32,
                }
            })
            .collect()
    }
}

/// Four pillars, lunar year, luck direction and starting luck age of a birth.
///
/// The birth is re-validated first so a hand-built instant outside the supported
/// range never reaches the calendar.
pub fn compute_four_pillars<C: Calendar + ?Sized>(
    calendar: &C,
    birth: &BirthInstant,
) -> CalendarResult<FourPillarsResult> {
    let birth = BirthInstant::new(birth.date, birth.time_slot, birth.gender)?;
    let datetime = birth.datetime();

    let pillars = calendar.eight_char_of(datetime)?;
    let lunar = calendar.solar_to_lunar(birth.date)?;
    let direction = LuckDirection::of(pillars.year_pillar, birth.gender);

    let start_age = match calendar.luck_start(datetime, birth.gender) {
        Ok(span) => span.virtual_start_age(),
        Err(err) => {
            warn!(
                "Luck start failed for {}, using {}: {}",
                datetime, FALLBACK_START_AGE, err
            );
            FALLBACK_START_AGE
        }
    };

    debug!(
        "Pillars for {} {}: {:?} lunar year {} start age {}",
        datetime,
        birth.gender,
        pillars.to_strings(),
        lunar.year,
        start_age
    );

    Ok(FourPillarsResult {
        pillars,
        lunar_year: lunar.year,
        start_age,
        direction,
    })
}

/// Validates a raw request, then computes its pillars.
pub fn compute_four_pillars_for<C: Calendar + ?Sized>(
    calendar: &C,
    request: &BirthRequest,
) -> CalendarResult<FourPillarsResult> {
    let birth = BirthInstant::try_from(request)?;
    compute_four_pillars(calendar, &birth)
}

/// Pillars typed in by hand instead of computed from a birth date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPillars {
    pub year_pillar: String,
    pub month_pillar: String,
    pub day_pillar: String,
    pub hour_pillar: String,
    pub first_luck_pillar: String,
    pub start_age: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualChart {
    pub pillars: FourPillars,
    pub first_luck_pillar: GanZhi,
    pub start_age: u8,
}

impl ManualPillars {
    pub fn validate(&self) -> CalendarResult<ManualChart> {
        let parse = |label: &str, value: &str| -> CalendarResult<GanZhi> {
            value.parse::<GanZhi>().map_err(|_| {
                CalendarError::InvalidInput(format!(
                    "{} `{}` is not a valid stem-branch pair",
                    label, value
                ))
            })
        };
        let pillars = FourPillars {
            year_pillar: parse("year pillar", &self.year_pillar)?,
            month_pillar: parse("month pillar", &self.month_pillar)?,
            day_pillar: parse("day pillar", &self.day_pillar)?,
            hour_pillar: parse("hour pillar", &self.hour_pillar)?,
        };
        let first_luck_pillar = parse("first luck pillar", &self.first_luck_pillar)?;
        if !(0..=MAX_START_AGE as i64).contains(&self.start_age) {
            return Err(CalendarError::InvalidInput(format!(
                "start age must be within 0-{} (got {})",
                MAX_START_AGE, self.start_age
            )));
        }
        Ok(ManualChart {
            pillars,
            first_luck_pillar,
            start_age: self.start_age as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_luck_direction() {
        let jia_chen: GanZhi = "甲辰".parse().unwrap();
        let gui_mao: GanZhi = "癸卯".parse().unwrap();
        assert_eq!(LuckDirection::of(jia_chen, Gender::Male), LuckDirection::Forward);
        assert_eq!(LuckDirection::of(jia_chen, Gender::Female), LuckDirection::Reverse);
        assert_eq!(LuckDirection::of(gui_mao, Gender::Male), LuckDirection::Reverse);
        assert_eq!(LuckDirection::of(gui_mao, Gender::Female), LuckDirection::Forward);
        assert_eq!(LuckDirection::Forward.to_string(), "顺行");
        assert_eq!(LuckDirection::Reverse.as_ref(), "逆行");
    }

    #[test]
    fn test_luck_span_between() {
        // 10 days and one double-hour: 40 months + 0 = 3 years 4 months, 10 days
        let span = LuckSpan::between(at(2024, 1, 1, 0), at(2024, 1, 11, 2));
        assert_eq!(
            span,
            LuckSpan {
                years: 3,
                months: 4,
                days: 10
            }
        );
        assert_eq!(span.virtual_start_age(), 4);

        // Earlier clock on the end day borrows a day
        let span = LuckSpan::between(at(2024, 1, 1, 12), at(2024, 1, 20, 4));
        assert_eq!(span.years, 6);
        assert_eq!(span.months, 2);
        assert_eq!(span.days, 20);
        assert_eq!(span.virtual_start_age(), 7);
    }

    #[test]
    fn test_virtual_start_age_bounds() {
        let late = LuckSpan {
            years: 2,
            months: 6,
            days: 0,
        };
        assert_eq!(late.virtual_start_age(), 4);
        let early = LuckSpan {
            years: 2,
            months: 5,
            days: 29,
        };
        assert_eq!(early.virtual_start_age(), 3);
        let huge = LuckSpan {
            years: 12,
            months: 0,
            days: 0,
        };
        assert_eq!(huge.virtual_start_age(), 10);
    }

    #[test]
    fn test_manual_pillars() {
        let mut manual = ManualPillars {
            year_pillar: "甲辰".into(),
            month_pillar: "丙寅".into(),
            day_pillar: "甲辰".into(),
            hour_pillar: "甲子".into(),
            first_luck_pillar: "丁卯".into(),
            start_age: 4,
        };
        let chart = manual.validate().unwrap();
        assert_eq!(chart.start_age, 4);
        assert_eq!(chart.first_luck_pillar.to_string(), "丁卯");

        manual.start_age = 11;
        assert!(matches!(
            manual.validate(),
            Err(CalendarError::InvalidInput(_))
        ));

        manual.start_age = 4;
        manual.day_pillar = "甲丑".into();
        let err = manual.validate().unwrap_err();
        assert!(err.to_string().contains("day pillar"));
    }
}
