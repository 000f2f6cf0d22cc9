use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

pub const MIN_BIRTH_YEAR: i32 = 1900;
pub const MAX_BIRTH_YEAR: i32 = 2100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BirthError {
    #[error("birth date {year}-{month}-{day} is not a valid calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("birth year must be within {MIN_BIRTH_YEAR}-{MAX_BIRTH_YEAR} (got {0})")]
    YearOutOfRange(i32),
    #[error("gender must be Male or Female (got `{0}`)")]
    InvalidGender(String),
    #[error("time slot `{0}` is not one of the twelve double-hours")]
    InvalidTimeSlot(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// 乾造 is the male chart, 坤造 the female one.
    pub fn chart_label(self) -> &'static str {
        match self {
            Gender::Male => "乾造（男）",
            Gender::Female => "坤造（女）",
        }
    }

    /// Numeric code used by lunar almanac tables: 1 = male, 0 = female.
    pub fn code(self) -> u8 {
        match self {
            Gender::Male => 1,
            Gender::Female => 0,
        }
    }
}

/// The twelve two-hour periods (时辰) of the traditional day.
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
pub enum TimeSlot {
    #[strum(serialize = "子时")]
    #[serde(rename = "子时")]
    Zi,
    #[strum(serialize = "丑时")]
    #[serde(rename = "丑时")]
    Chou,
    #[strum(serialize = "寅时")]
    #[serde(rename = "寅时")]
    Yin,
    #[strum(serialize = "卯时")]
    #[serde(rename = "卯时")]
    Mao,
    #[strum(serialize = "辰时")]
    #[serde(rename = "辰时")]
    Chen,
    #[strum(serialize = "巳时")]
    #[serde(rename = "巳时")]
    Si,
    #[strum(serialize = "午时")]
    #[serde(rename = "午时")]
    Wu,
    #[strum(serialize = "未时")]
    #[serde(rename = "未时")]
    Wei,
    #[strum(serialize = "申时")]
    #[serde(rename = "申时")]
    Shen,
    #[strum(serialize = "酉时")]
    #[serde(rename = "酉时")]
    You,
    #[strum(serialize = "戌时")]
    #[serde(rename = "戌时")]
    Xu,
    #[strum(serialize = "亥时")]
    #[serde(rename = "亥时")]
    Hai,
}

impl TimeSlot {
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Representative clock hour: 子时 → 0, 丑时 → 2, ... 亥时 → 22.
    pub fn mid_hour(self) -> u32 {
        self.index() as u32 * 2
    }

    /// Clock range covered by the slot, e.g. "23:00-01:00" for 子时.
    pub fn clock_range(self) -> String {
        let start = (self.mid_hour() + 23) % 24;
        let end = (self.mid_hour() + 1) % 24;
        format!("{:02}:00-{:02}:00", start, end)
    }

    pub fn from_hour(hour: u32) -> Self {
        let i = ((hour % 24 + 1) / 2) % 12;
        SLOTS[i as usize]
    }
}

const SLOTS: [TimeSlot; 12] = [
    TimeSlot::Zi,
    TimeSlot::Chou,
    TimeSlot::Yin,
    TimeSlot::Mao,
    TimeSlot::Chen,
    TimeSlot::Si,
    TimeSlot::Wu,
    TimeSlot::Wei,
    TimeSlot::Shen,
    TimeSlot::You,
    TimeSlot::Xu,
    TimeSlot::Hai,
];

/// Raw birth input as submitted by a user form or CLI.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BirthRequest {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub time_slot: String,
    pub gender: String,
}

/// A validated birth moment: civil date in China Standard Time, double-hour and gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthInstant {
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub gender: Gender,
}

impl BirthInstant {
    pub fn new(date: NaiveDate, time_slot: TimeSlot, gender: Gender) -> Result<Self, BirthError> {
        use chrono::Datelike;
        let year = date.year();
        if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&year) {
            return Err(BirthError::YearOutOfRange(year));
        }
        Ok(BirthInstant {
            date,
            time_slot,
            gender,
        })
    }

    /// Wall-clock moment used for pillar math: the slot's mid hour on the birth date.
    pub fn datetime(&self) -> NaiveDateTime {
        self.date
            .and_hms_opt(self.time_slot.mid_hour(), 0, 0)
            .unwrap_or_else(|| self.date.and_time(chrono::NaiveTime::MIN))
    }
}

impl TryFrom<&BirthRequest> for BirthInstant {
    type Error = BirthError;

    fn try_from(req: &BirthRequest) -> Result<Self, Self::Error> {
        let date = NaiveDate::from_ymd_opt(req.year, req.month, req.day).ok_or(
            BirthError::InvalidDate {
                year: req.year,
                month: req.month,
                day: req.day,
            },
        )?;
        if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&req.year) {
            return Err(BirthError::YearOutOfRange(req.year));
        }
        let gender = Gender::from_str(&req.gender)
            .map_err(|_| BirthError::InvalidGender(req.gender.clone()))?;
        let time_slot = TimeSlot::from_str(&req.time_slot)
            .map_err(|_| BirthError::InvalidTimeSlot(req.time_slot.clone()))?;
        BirthInstant::new(date, time_slot, gender)
    }
}
