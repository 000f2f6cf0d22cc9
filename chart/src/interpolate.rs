use almanac::{Calendar, CalendarResult, ViewRange};
use chrono::{Datelike, NaiveDate};
use common::transforms::numbers::{lerp, round_to_tenth};
use common::{GanZhi, InterpolatedKLinePoint, KLinePoint};
use log::debug;
use std::collections::HashMap;

use crate::jitter::Jitter;

/// Characters of the yearly reason kept in a daily reason.
const REASON_PREFIX_CHARS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub score: f64,
}

/// Candle between two yearly points at `progress`, with jitter on open and close.
pub fn interpolate_candle<J: Jitter + ?Sized>(
    current: &KLinePoint,
    next: &KLinePoint,
    progress: f64,
    jitter: &mut J,
) -> Candle {
    let open = round_to_tenth(lerp(current.open, next.open, progress) * jitter.factor());
    let close = round_to_tenth(lerp(current.close, next.close, progress) * jitter.factor());

    let high = round_to_tenth(open.max(close) + jitter.wick());
    let low = round_to_tenth((open.min(close) - jitter.wick()).max(0.0));

    Candle {
        open,
        close,
        high,
        low,
        score: round_to_tenth(lerp(current.score, next.score, progress)),
    }
}

/// Lunar new year dates, looked up once per lunar year.
struct NewYearCache<'a, C: ?Sized> {
    calendar: &'a C,
    dates: HashMap<i32, NaiveDate>,
}

impl<'a, C: Calendar + ?Sized> NewYearCache<'a, C> {
    fn new(calendar: &'a C) -> Self {
        NewYearCache {
            calendar,
            dates: HashMap::new(),
        }
    }

    fn get(&mut self, lunar_year: i32) -> CalendarResult<NaiveDate> {
        if let Some(date) = self.dates.get(&lunar_year) {
            return Ok(*date);
        }
        let date = self.calendar.lunar_new_year(lunar_year)?;
        self.dates.insert(lunar_year, date);
        Ok(date)
    }

    /// Share of `lunar_year` elapsed at `date`, clamped to `[0, 1]`.
    fn progress(&mut self, lunar_year: i32, date: NaiveDate) -> CalendarResult<f64> {
        let start = self.get(lunar_year)?;
        let end = self.get(lunar_year + 1)?;
        let total = (end - start).num_days() as f64;
        if total <= 0.0 {
            return Ok(0.0);
        }
        let elapsed = (date - start).num_days() as f64;
        Ok((elapsed / total).clamp(0.0, 1.0))
    }
}

fn daily_reason(yearly: &str, lunar_day: &str) -> String {
    let prefix: String = yearly.chars().take(REASON_PREFIX_CHARS).collect();
    format!("{}（{}）", prefix, lunar_day)
}

/// Daily points for every day of `range` covered by the yearly `series`.
///
/// A day is skipped when its virtual age has no yearly point or the calendar
/// cannot place it; the result may therefore be sparse or empty.
pub fn interpolate<C, J>(
    calendar: &C,
    range: &ViewRange,
    birth_date: NaiveDate,
    series: &[KLinePoint],
    jitter: &mut J,
) -> Vec<InterpolatedKLinePoint>
where
    C: Calendar + ?Sized,
    J: Jitter + ?Sized,
{
    let birth_lunar_year = match calendar.solar_to_lunar(birth_date) {
        Ok(lunar) => lunar.year,
        Err(err) => {
            debug!("No lunar date for birth {}: {}", birth_date, err);
            return Vec::new();
        }
    };

    let mut new_years = NewYearCache::new(calendar);
    let mut points = Vec::with_capacity(range.len_days());

    for date in range.days() {
        let lunar = match calendar.solar_to_lunar(date) {
            Ok(lunar) => lunar,
            Err(err) => {
                debug!("Skipping {}: {}", date, err);
                continue;
            }
        };

        let age = lunar.year - birth_lunar_year + 1;
        let Some(current) = series.iter().find(|p| p.age as i32 == age) else {
            debug!("Skipping {}: no yearly point for age {}", date, age);
            continue;
        };
        let next = series
            .iter()
            .find(|p| p.age as i32 == age + 1)
            .unwrap_or(current);

        let progress = match new_years.progress(lunar.year, date) {
            Ok(progress) => progress,
            Err(err) => {
                debug!("Skipping {}: {}", date, err);
                continue;
            }
        };

        let candle = interpolate_candle(current, next, progress, jitter);

        points.push(InterpolatedKLinePoint {
            point: KLinePoint {
                age: current.age,
                year: date.year(),
                gan_zhi: GanZhi::of_day(date).to_string(),
                da_yun: current.da_yun.clone(),
                open: candle.open,
                close: candle.close,
                high: candle.high,
                low: candle.low,
                score: candle.score,
                reason: daily_reason(&current.reason, lunar.day_label()),
                ten_god: None,
                energy_score: None,
                action_advice: None,
            },
            date,
            is_interpolated: true,
        });
    }

    points
}
