use crate::astro::{
    cst_from_jd, jd_from_cst, next_sun_crossing, normalize_degrees, prev_sun_crossing,
    sun_longitude_at,
};
use crate::error::{CalendarError, CalendarResult};
use crate::lunar::{lunar_date_of, lunar_new_year_of, LunarDate};
use crate::pillars::{FourPillars, LuckDirection, LuckSpan};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use common::{DiZhi, GanZhi, Gender, TianGan};

/// Solar to lunar conversion and stem-branch lookups.
///
/// Dates and times are civil China Standard Time.
pub trait Calendar {
    fn solar_to_lunar(&self, date: NaiveDate) -> CalendarResult<LunarDate>;

    /// Gregorian date of 正月初一 of `lunar_year`.
    fn lunar_new_year(&self, lunar_year: i32) -> CalendarResult<NaiveDate>;

    fn eight_char_of(&self, datetime: NaiveDateTime) -> CalendarResult<FourPillars>;

    /// Real time between birth and the start of the first luck period.
    fn luck_start(&self, datetime: NaiveDateTime, gender: Gender) -> CalendarResult<LuckSpan>;
}

// 立春, where the 寅 month and the stem-branch year begin
const LICHUN: f64 = 315.0;

/// Calendar computed from solar longitude and true new moons.
#[derive(Debug, Clone, Copy)]
pub struct AstronomicalCalendar {
    min_year: i32,
    max_year: i32,
}

impl Default for AstronomicalCalendar {
    fn default() -> Self {
        Self {
            min_year: 1899,
            max_year: 2101,
        }
    }
}

impl AstronomicalCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_year(&self, year: i32) -> CalendarResult<()> {
        if year < self.min_year || year > self.max_year {
            return Err(CalendarError::InvalidInput(format!(
                "year {} is outside the supported range {}-{}",
                year, self.min_year, self.max_year
            )));
        }
        Ok(())
    }

    /// Index of the solar month holding `jd_ut`: 0 = 寅 (from 立春) .. 11 = 丑.
    fn solar_month_offset(jd_ut: f64) -> i64 {
        let lon = sun_longitude_at(jd_ut);
        ((normalize_degrees(lon - LICHUN) / 30.0).floor() as i64).clamp(0, 11)
    }
}

impl Calendar for AstronomicalCalendar {
    fn solar_to_lunar(&self, date: NaiveDate) -> CalendarResult<LunarDate> {
        self.check_year(date.year())?;
        lunar_date_of(date)
    }

    fn lunar_new_year(&self, lunar_year: i32) -> CalendarResult<NaiveDate> {
        self.check_year(lunar_year)?;
        lunar_new_year_of(lunar_year)
    }

    fn eight_char_of(&self, datetime: NaiveDateTime) -> CalendarResult<FourPillars> {
        self.check_year(datetime.year())?;
        let jd = jd_from_cst(datetime);
        let offset = Self::solar_month_offset(jd);

        // January and early February sit in the 子/丑 months of the previous year
        let year = if datetime.month() <= 2 && offset >= 10 {
            datetime.year() - 1
        } else {
            datetime.year()
        };
        let year_pillar = GanZhi::of_year(year);

        let first_month_stem = (year_pillar.gan.0 % 5) * 2 + 2;
        let month_pillar = GanZhi {
            gan: TianGan::from_index(first_month_stem + offset as u8),
            zhi: DiZhi::from_index(offset as u8 + 2),
        };

        let day_pillar = GanZhi::of_day(datetime.date());

        // 23:00 opens the next day's 子 hour, whose stem follows the next day
        let hour_branch = ((datetime.hour() + 1) / 2 % 12) as u8;
        let stem_day = if datetime.hour() == 23 {
            day_pillar.next()
        } else {
            day_pillar
        };
        let hour_pillar = GanZhi {
            gan: TianGan::from_index((stem_day.gan.0 % 5) * 2 + hour_branch),
            zhi: DiZhi::from_index(hour_branch),
        };

        Ok(FourPillars {
            year_pillar,
            month_pillar,
            day_pillar,
            hour_pillar,
        })
    }

    fn luck_start(&self, datetime: NaiveDateTime, gender: Gender) -> CalendarResult<LuckSpan> {
        let pillars = self.eight_char_of(datetime)?;
        let jd = jd_from_cst(datetime);
        let offset = Self::solar_month_offset(jd);
        let current_jie = normalize_degrees(LICHUN + 30.0 * offset as f64);

        let (start, end) = if LuckDirection::of(pillars.year_pillar, gender).is_forward() {
            (jd, next_sun_crossing(jd, normalize_degrees(current_jie + 30.0)))
        } else {
            (prev_sun_crossing(jd, current_jie), jd)
        };

        let to_civil = |jd: f64| {
            cst_from_jd(jd).ok_or_else(|| {
                CalendarError::Computation(format!("julian day {} is out of range", jd))
            })
        };
        Ok(LuckSpan::between(to_civil(start)?, to_civil(end)?))
    }
}
