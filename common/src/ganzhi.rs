//! Heavenly stems, earthly branches and the sexagenary cycle.
//!
//! - 天干: 甲(0) 乙(1) 丙(2) 丁(3) 戊(4) 己(5) 庚(6) 辛(7) 壬(8) 癸(9)
//! - 地支: 子(0) 丑(1) 寅(2) 卯(3) 辰(4) 巳(5) 午(6) 未(7) 申(8) 酉(9) 戌(10) 亥(11)

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TIANGAN_CHARS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];
pub const DIZHI_CHARS: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];

/// Julian day number of 0001-01-01, minus one.
pub const JDN_CE_OFFSET: i64 = 1_721_425;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid gan-zhi `{0}`")]
pub struct ParseGanZhiError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TianGan(pub u8);

impl TianGan {
    pub fn from_index(index: u8) -> Self {
        TianGan(index % 10)
    }

    pub fn from_char(c: char) -> Option<Self> {
        TIANGAN_CHARS
            .iter()
            .position(|&x| x == c)
            .map(|i| TianGan(i as u8))
    }

    pub fn to_char(self) -> char {
        TIANGAN_CHARS[(self.0 % 10) as usize]
    }

    /// 甲丙戊庚壬
    pub fn is_yang(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for TianGan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiZhi(pub u8);

impl DiZhi {
    pub fn from_index(index: u8) -> Self {
        DiZhi(index % 12)
    }

    pub fn from_char(c: char) -> Option<Self> {
        DIZHI_CHARS
            .iter()
            .position(|&x| x == c)
            .map(|i| DiZhi(i as u8))
    }

    pub fn to_char(self) -> char {
        DIZHI_CHARS[(self.0 % 12) as usize]
    }
}

impl fmt::Display for DiZhi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// One of the sixty stem-branch pairs. Stem and branch always share parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GanZhi {
    pub gan: TianGan,
    pub zhi: DiZhi,
}

impl GanZhi {
    /// 0 = 甲子, 59 = 癸亥. Any integer is reduced into the cycle.
    pub fn from_cycle_index(index: i64) -> Self {
        let i = index.rem_euclid(60);
        GanZhi {
            gan: TianGan((i % 10) as u8),
            zhi: DiZhi((i % 12) as u8),
        }
    }

    pub fn cycle_index(self) -> u8 {
        // i ≡ gan (mod 10) and i ≡ zhi (mod 12)
        (6 * self.gan.0 as i64 - 5 * self.zhi.0 as i64).rem_euclid(60) as u8
    }

    pub fn next(self) -> Self {
        Self::from_cycle_index(self.cycle_index() as i64 + 1)
    }

    pub fn prev(self) -> Self {
        Self::from_cycle_index(self.cycle_index() as i64 - 1)
    }

    /// Day pillar of a civil date. Day pillars change at local midnight.
    pub fn of_day(date: NaiveDate) -> Self {
        let jdn = date.num_days_from_ce() as i64 + JDN_CE_OFFSET;
        Self::from_cycle_index(jdn + 49)
    }

    /// Sexagenary year name, counted from 甲子 in year 4.
    pub fn of_year(year: i32) -> Self {
        Self::from_cycle_index(year as i64 - 4)
    }
}

impl fmt::Display for GanZhi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.gan, self.zhi)
    }
}

impl FromStr for GanZhi {
    type Err = ParseGanZhiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (Some(g), Some(z), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseGanZhiError(s.to_string()));
        };
        let gan = TianGan::from_char(g).ok_or_else(|| ParseGanZhiError(s.to_string()))?;
        let zhi = DiZhi::from_char(z).ok_or_else(|| ParseGanZhiError(s.to_string()))?;
        if gan.0 % 2 != zhi.0 % 2 {
            return Err(ParseGanZhiError(s.to_string()));
        }
        Ok(GanZhi { gan, zhi })
    }
}

impl Serialize for GanZhi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GanZhi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_index_roundtrip() {
        for i in 0..60 {
            assert_eq!(GanZhi::from_cycle_index(i).cycle_index() as i64, i);
        }
        assert_eq!(GanZhi::from_cycle_index(-1).to_string(), "癸亥");
        assert_eq!(GanZhi::from_cycle_index(0).prev().to_string(), "癸亥");
        assert_eq!(GanZhi::from_cycle_index(59).next().to_string(), "甲子");
    }

    #[test]
    fn test_day_pillar() {
        let d = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(GanZhi::of_day(d).to_string(), "戊午");
        let d = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(GanZhi::of_day(d).to_string(), "甲辰");
    }

    #[test]
    fn test_year_name() {
        assert_eq!(GanZhi::of_year(1984).to_string(), "甲子");
        assert_eq!(GanZhi::of_year(2024).to_string(), "甲辰");
        assert_eq!(GanZhi::of_year(1900).to_string(), "庚子");
    }

    #[test]
    fn test_parse() {
        assert_eq!("戊午".parse::<GanZhi>().unwrap().cycle_index(), 54);
        assert!("甲丑".parse::<GanZhi>().is_err());
        assert!("甲".parse::<GanZhi>().is_err());
        assert!("甲子年".parse::<GanZhi>().is_err());
        assert!(TianGan(0).is_yang());
        assert!(!TianGan(9).is_yang());
    }
}
