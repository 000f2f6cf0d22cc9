use crate::calendar::Calendar;
use crate::error::CalendarResult;
use chrono::{Days, Months, NaiveDate};
use common::KLinePoint;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Virtual age: 1 at birth, plus one at every lunar new year crossed.
pub fn virtual_age<C: Calendar + ?Sized>(
    calendar: &C,
    birth_date: NaiveDate,
    date: NaiveDate,
) -> CalendarResult<i32> {
    let birth_year = calendar.solar_to_lunar(birth_date)?.year;
    let current_year = calendar.solar_to_lunar(date)?.year;
    Ok(current_year - birth_year + 1)
}

/// The yearly point whose age matches the virtual age at `date`.
pub fn year_data_for_date<'a, C: Calendar + ?Sized>(
    calendar: &C,
    date: NaiveDate,
    birth_date: NaiveDate,
    chart_data: &'a [KLinePoint],
) -> CalendarResult<Option<&'a KLinePoint>> {
    let age = virtual_age(calendar, birth_date, date)?;
    Ok(chart_data.iter().find(|p| p.age as i32 == age))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
}

/// Inclusive date range requested by a chart view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

impl ViewRange {
    pub fn new(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Self {
        Self {
            start,
            end,
            granularity,
        }
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date, Granularity::Day)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1).max(0) as usize
    }
}

/// Today ± 7 days.
pub fn daily_view(today: NaiveDate) -> ViewRange {
    let start = today.checked_sub_days(Days::new(7)).unwrap_or(today);
    let end = today.checked_add_days(Days::new(7)).unwrap_or(today);
    ViewRange::new(start, end, Granularity::Day)
}

/// Today ± one calendar month, clamped to month ends.
pub fn weekly_view(today: NaiveDate) -> ViewRange {
    let start = today.checked_sub_months(Months::new(1)).unwrap_or(today);
    let end = today.checked_add_months(Months::new(1)).unwrap_or(today);
    ViewRange::new(start, end, Granularity::Week)
}

pub fn view_for(granularity: Granularity, today: NaiveDate) -> ViewRange {
    match granularity {
        Granularity::Day => daily_view(today),
        Granularity::Week => weekly_view(today),
    }
}
