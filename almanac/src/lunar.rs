use crate::astro::{
    calendar_day_number, calendar_midnight, date_from_jdn, jdn_from_date, lunation_on_or_before,
    new_moon_day, solar_term_ut, sun_longitude_at,
};
use crate::error::{CalendarError, CalendarResult};
use chrono::{Datelike, NaiveDate};
use common::GanZhi;
use serde::{Deserialize, Serialize};
use std::fmt;

const DAY_LABELS: [&str; 30] = [
    "初一", "初二", "初三", "初四", "初五", "初六", "初七", "初八", "初九", "初十", "十一", "十二",
    "十三", "十四", "十五", "十六", "十七", "十八", "十九", "二十", "廿一", "廿二", "廿三", "廿四",
    "廿五", "廿六", "廿七", "廿八", "廿九", "三十",
];

const MONTH_LABELS: [&str; 12] = [
    "正", "二", "三", "四", "五", "六", "七", "八", "九", "十", "冬", "腊",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunarDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub is_leap: bool,
}

impl LunarDate {
    /// 初一 .. 三十
    pub fn day_label(&self) -> &'static str {
        DAY_LABELS[(self.day.clamp(1, 30) - 1) as usize]
    }

    /// 正月 .. 腊月, prefixed with 闰 for a leap month.
    pub fn month_label(&self) -> String {
        let name = MONTH_LABELS[(self.month.clamp(1, 12) - 1) as usize];
        if self.is_leap {
            format!("闰{}月", name)
        } else {
            format!("{}月", name)
        }
    }

    pub fn year_gan_zhi(&self) -> GanZhi {
        GanZhi::of_year(self.year)
    }
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}年{}{}",
            self.year_gan_zhi(),
            self.month_label(),
            self.day_label()
        )
    }
}

/// One lunar month, new moon to new moon, in civil day numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarMonth {
    pub start: i64,
    pub days: u8,
    pub number: u8,
    pub is_leap: bool,
    pub lunar_year: i32,
}

impl LunarMonth {
    pub fn contains(&self, day_number: i64) -> bool {
        day_number >= self.start && day_number < self.start + self.days as i64
    }
}

/// Lunation of month 11, the month holding the winter solstice of `year`.
fn month11_lunation(year: i32) -> i64 {
    let solstice = calendar_day_number(solar_term_ut(year, 270.0));
    lunation_on_or_before(solstice)
}

fn principal_term_sector(day_number: i64) -> i64 {
    (sun_longitude_at(calendar_midnight(day_number)) / 30.0).floor() as i64
}

fn has_principal_term(start: i64, end: i64) -> bool {
    principal_term_sector(start) != principal_term_sector(end)
}

/// Months from the month 11 of `year` up to, but excluding, the month 11 of `year + 1`.
///
/// A 13-month span makes its first month without a principal term (中气) the leap month.
pub fn months_from_solstice(year: i32) -> Vec<LunarMonth> {
    let k0 = month11_lunation(year);
    let k1 = month11_lunation(year + 1);
    let starts: Vec<i64> = (k0..=k1).map(new_moon_day).collect();
    let count = starts.len().saturating_sub(1);

    let leap_index = if count == 13 {
        (1..count).find(|&i| !has_principal_term(starts[i], starts[i + 1]))
    } else {
        None
    };

    let mut months = Vec::with_capacity(count);
    let mut number = 11u8;
    let mut lunar_year = year;
    for i in 0..count {
        let is_leap = Some(i) == leap_index;
        if i > 0 && !is_leap {
            number = number % 12 + 1;
        }
        if number == 1 && !is_leap {
            lunar_year = year + 1;
        }
        months.push(LunarMonth {
            start: starts[i],
            days: (starts[i + 1] - starts[i]) as u8,
            number,
            is_leap,
            lunar_year,
        });
    }
    months
}

pub fn lunar_date_of(date: NaiveDate) -> CalendarResult<LunarDate> {
    let day = jdn_from_date(date);
    let year = date.year();
    let span_year = if day >= new_moon_day(month11_lunation(year)) {
        year
    } else {
        year - 1
    };

    months_from_solstice(span_year)
        .into_iter()
        .find(|m| m.contains(day))
        .map(|m| LunarDate {
            year: m.lunar_year,
            month: m.number,
            day: (day - m.start + 1) as u8,
            is_leap: m.is_leap,
        })
        .ok_or_else(|| CalendarError::Computation(format!("no lunar month contains {}", date)))
}

pub fn lunar_new_year_of(lunar_year: i32) -> CalendarResult<NaiveDate> {
    months_from_solstice(lunar_year - 1)
        .into_iter()
        .find(|m| m.number == 1 && !m.is_leap)
        .and_then(|m| date_from_jdn(m.start))
        .ok_or_else(|| {
            CalendarError::Computation(format!("no first month found for lunar year {}", lunar_year))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lunar_new_years() {
        let cases = [
            (1916, date(1916, 2, 3)),
            (1928, date(1928, 1, 23)),
            (1990, date(1990, 1, 27)),
            (2000, date(2000, 2, 5)),
            (2001, date(2001, 1, 24)),
            (2020, date(2020, 1, 25)),
            (2023, date(2023, 1, 22)),
            (2024, date(2024, 2, 10)),
            (2025, date(2025, 1, 29)),
        ];
        for (year, expected) in cases {
            assert_eq!(lunar_new_year_of(year).unwrap(), expected, "lunar year {}", year);
        }
    }

    #[test]
    fn test_lunar_dates() {
        let d = lunar_date_of(date(2024, 2, 10)).unwrap();
        assert_eq!((d.year, d.month, d.day, d.is_leap), (2024, 1, 1, false));
        assert_eq!(d.to_string(), "甲辰年正月初一");

        let eve = lunar_date_of(date(2024, 2, 9)).unwrap();
        assert_eq!((eve.year, eve.month, eve.day), (2023, 12, 30));
        assert_eq!(eve.day_label(), "三十");
    }

    #[test]
    fn test_leap_months() {
        // 2020 has a leap fourth month starting 2020-05-23
        let d = lunar_date_of(date(2020, 5, 23)).unwrap();
        assert_eq!((d.year, d.month, d.day, d.is_leap), (2020, 4, 1, true));
        assert_eq!(d.month_label(), "闰四月");

        // 2023 has a leap second month starting 2023-03-22
        let d = lunar_date_of(date(2023, 3, 22)).unwrap();
        assert_eq!((d.month, d.is_leap), (2, true));

        let months = months_from_solstice(2019);
        assert_eq!(months.len(), 13);
        assert_eq!(months.iter().filter(|m| m.is_leap).count(), 1);
        assert_eq!(months_from_solstice(2020).len(), 12);
    }
}
