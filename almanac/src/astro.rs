//! Solar and lunar ephemeris (Meeus, *Astronomical Algorithms*).
//!
//! Instants are Julian days on the UT scale unless a function says otherwise.
//! Civil dates are China Standard Time (UTC+8).

use crate::vsop87::earth_position;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common::JDN_CE_OFFSET;

pub const J2000: f64 = 2_451_545.0;
pub const TROPICAL_YEAR: f64 = 365.2422;
pub const SYNODIC_MONTH: f64 = 29.530588861;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// China Standard Time offset, in days.
pub const CST_OFFSET: f64 = 8.0 / 24.0;

/// Beijing local mean time offset (116°25′ E), in days.
pub const BEIJING_MEAN_TIME_OFFSET: f64 = (116.0 + 25.0 / 60.0) / 360.0;

// 1929-01-01 0h UT; lunar calendars before it were reckoned in Beijing mean time
const STANDARD_TIME_ADOPTED: f64 = 2_425_612.5;

pub fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Angle folded into (-180, 180].
pub fn normalize_to_pm180(deg: f64) -> f64 {
    let d = normalize_degrees(deg);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Julian day of a wall-clock time read as UTC.
pub fn jd_from_naive(dt: NaiveDateTime) -> f64 {
    let utc = dt.and_utc();
    let secs = utc.timestamp() as f64 + utc.timestamp_subsec_nanos() as f64 / 1e9;
    secs / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// UT Julian day of a China Standard Time wall-clock time.
pub fn jd_from_cst(dt: NaiveDateTime) -> f64 {
    jd_from_naive(dt) - CST_OFFSET
}

/// China Standard Time wall clock of a UT Julian day, to the second.
pub fn cst_from_jd(jd_ut: f64) -> Option<NaiveDateTime> {
    let secs = ((jd_ut + CST_OFFSET - UNIX_EPOCH_JD) * SECONDS_PER_DAY).round() as i64;
    DateTime::from_timestamp(secs, 0).map(|d| d.naive_utc())
}

pub fn jdn_from_date(date: NaiveDate) -> i64 {
    use chrono::Datelike;
    date.num_days_from_ce() as i64 + JDN_CE_OFFSET
}

pub fn date_from_jdn(jdn: i64) -> Option<NaiveDate> {
    let days = i32::try_from(jdn - JDN_CE_OFFSET).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days)
}

/// Julian day number of the China Standard Time civil date containing a UT instant.
pub fn cst_day_number(jd_ut: f64) -> i64 {
    (jd_ut + 0.5 + CST_OFFSET).floor() as i64
}

/// UT instant of local midnight starting a China Standard Time civil day.
pub fn cst_midnight(day_number: i64) -> f64 {
    day_number as f64 - 0.5 - CST_OFFSET
}

/// Offset of the time scale the lunar calendar was reckoned in at a UT instant.
pub fn calendar_offset(jd_ut: f64) -> f64 {
    if jd_ut < STANDARD_TIME_ADOPTED {
        BEIJING_MEAN_TIME_OFFSET
    } else {
        CST_OFFSET
    }
}

/// Julian day number of the lunar-calendar civil date containing a UT instant.
pub fn calendar_day_number(jd_ut: f64) -> i64 {
    (jd_ut + 0.5 + calendar_offset(jd_ut)).floor() as i64
}

/// UT instant of the lunar-calendar midnight starting a civil day.
pub fn calendar_midnight(day_number: i64) -> f64 {
    day_number as f64 - 0.5 - calendar_offset(cst_midnight(day_number))
}

/// ΔT = TT − UT in seconds (Espenak & Meeus polynomials, 1900–2150).
pub fn delta_t(year: f64) -> f64 {
    if year < 1920.0 {
        let t = year - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t.powi(2) + 0.0061966 * t.powi(3)
            - 0.000197 * t.powi(4)
    } else if year < 1941.0 {
        let t = year - 1920.0;
        21.20 + 0.84493 * t - 0.076100 * t.powi(2) + 0.0020936 * t.powi(3)
    } else if year < 1961.0 {
        let t = year - 1950.0;
        29.07 + 0.407 * t - t.powi(2) / 233.0 + t.powi(3) / 2547.0
    } else if year < 1986.0 {
        let t = year - 1975.0;
        45.45 + 1.067 * t - t.powi(2) / 260.0 - t.powi(3) / 718.0
    } else if year < 2005.0 {
        let t = year - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t.powi(2)
            + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if year < 2050.0 {
        let t = year - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t.powi(2)
    } else {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u.powi(2) - 0.5628 * (2150.0 - year)
    }
}

fn decimal_year(jd: f64) -> f64 {
    2000.0 + (jd - J2000) / 365.25
}

pub fn ut_to_tt(jd_ut: f64) -> f64 {
    jd_ut + delta_t(decimal_year(jd_ut)) / SECONDS_PER_DAY
}

pub fn tt_to_ut(jde: f64) -> f64 {
    jde - delta_t(decimal_year(jde)) / SECONDS_PER_DAY
}

/// Nutation in longitude, in degrees (Meeus ch. 22, accurate to 0.5").
pub fn nutation_in_longitude(t: f64) -> f64 {
    let omega = (125.04452 - 1934.136261 * t).to_radians();
    let sun = (280.4665 + 36_000.7698 * t).to_radians();
    let moon = (218.3165 + 481_267.8813 * t).to_radians();
    let arcsec = -17.20 * omega.sin() - 1.32 * (2.0 * sun).sin() - 0.23 * (2.0 * moon).sin()
        + 0.21 * (2.0 * omega).sin();
    arcsec / 3600.0
}

/// Apparent geocentric ecliptic longitude of the Sun in degrees, for a TT Julian day.
///
/// VSOP87 Earth position turned geocentric, moved to the FK5 frame, then
/// corrected for nutation and aberration (Meeus ch. 25).
pub fn sun_apparent_longitude(jde: f64) -> f64 {
    let tau = (jde - J2000) / 365_250.0;
    let t = tau * 10.0;
    let (l, _, r) = earth_position(tau);
    let theta = l.to_degrees() + 180.0;
    let fk5 = -0.09033 / 3600.0;
    let aberration = -20.4898 / 3600.0 / r;
    normalize_degrees(theta + fk5 + nutation_in_longitude(t) + aberration)
}

/// Sun longitude at a UT instant.
pub fn sun_longitude_at(jd_ut: f64) -> f64 {
    sun_apparent_longitude(ut_to_tt(jd_ut))
}

/// Refines a TT guess to the instant the Sun reaches `target` degrees.
fn refine_sun_crossing(target: f64, mut jde: f64) -> f64 {
    for _ in 0..20 {
        let diff = normalize_to_pm180(target - sun_apparent_longitude(jde));
        jde += diff * TROPICAL_YEAR / 360.0;
        if diff.abs() < 1e-7 {
            break;
        }
    }
    jde
}

/// UT instant at which the Sun reaches `target` degrees within Gregorian `year`.
///
/// 285° (小寒) falls in early January and 270° (冬至) in late December, so every
/// target has exactly one crossing per calendar year.
pub fn solar_term_ut(year: i32, target: f64) -> f64 {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|d| jdn_from_date(d) as f64 - 0.5)
        .unwrap_or(J2000);
    let jde0 = ut_to_tt(jan1);
    let ahead = normalize_degrees(target - sun_apparent_longitude(jde0));
    let guess = jde0 + ahead * TROPICAL_YEAR / 360.0;
    tt_to_ut(refine_sun_crossing(target, guess))
}

/// Next UT instant strictly after `jd_ut` at which the Sun reaches `target`.
pub fn next_sun_crossing(jd_ut: f64, target: f64) -> f64 {
    let jde = ut_to_tt(jd_ut);
    let mut ahead = normalize_degrees(target - sun_apparent_longitude(jde));
    if ahead == 0.0 {
        ahead = 360.0;
    }
    tt_to_ut(refine_sun_crossing(target, jde + ahead * TROPICAL_YEAR / 360.0))
}

/// Last UT instant at or before `jd_ut` at which the Sun reached `target`.
pub fn prev_sun_crossing(jd_ut: f64, target: f64) -> f64 {
    let jde = ut_to_tt(jd_ut);
    let behind = normalize_degrees(sun_apparent_longitude(jde) - target);
    tt_to_ut(refine_sun_crossing(target, jde - behind * TROPICAL_YEAR / 360.0))
}

/// TT instant of the true new moon with lunation number `k` (k = 0 near 2000-01-06).
pub fn new_moon_jde(k: f64) -> f64 {
    let t = k / 1236.85;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let jde = 2_451_550.09766 + SYNODIC_MONTH * k + 0.000_154_37 * t2 - 0.000_000_150 * t3
        + 0.000_000_000_73 * t4;
    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;

    let m = (2.5534 + 29.105_356_70 * k - 0.000_001_4 * t2 - 0.000_000_11 * t3).to_radians();
    let mp = (201.5643 + 385.816_935_28 * k + 0.010_758_2 * t2 + 0.000_012_38 * t3
        - 0.000_000_058 * t4)
        .to_radians();
    let f = (160.7108 + 390.670_502_84 * k - 0.001_611_8 * t2 - 0.000_002_27 * t3
        + 0.000_000_011 * t4)
        .to_radians();
    let om = (124.7746 - 1.563_755_88 * k + 0.002_067_2 * t2 + 0.000_002_15 * t3).to_radians();

    let periodic = -0.40720 * mp.sin() + 0.17241 * e * m.sin() + 0.01608 * (2.0 * mp).sin()
        + 0.01039 * (2.0 * f).sin()
        + 0.00739 * e * (mp - m).sin()
        - 0.00514 * e * (mp + m).sin()
        + 0.00208 * e * e * (2.0 * m).sin()
        - 0.00111 * (mp - 2.0 * f).sin()
        - 0.00057 * (mp + 2.0 * f).sin()
        + 0.00056 * e * (2.0 * mp + m).sin()
        - 0.00042 * (3.0 * mp).sin()
        + 0.00042 * e * (m + 2.0 * f).sin()
        + 0.00038 * e * (m - 2.0 * f).sin()
        - 0.00024 * e * (2.0 * mp - m).sin()
        - 0.00017 * om.sin()
        - 0.00007 * (mp + 2.0 * m).sin()
        + 0.00004 * (2.0 * mp - 2.0 * f).sin()
        + 0.00004 * (3.0 * m).sin()
        + 0.00003 * (mp + m - 2.0 * f).sin()
        + 0.00003 * (2.0 * mp + 2.0 * f).sin()
        - 0.00003 * (mp + m + 2.0 * f).sin()
        + 0.00003 * (mp - m + 2.0 * f).sin()
        - 0.00002 * (mp - m - 2.0 * f).sin()
        - 0.00002 * (3.0 * mp + m).sin()
        + 0.00002 * (4.0 * mp).sin();

    // Planetary arguments A1..A14 and their coefficients
    const PLANETARY: [(f64, f64, f64); 14] = [
        (299.77, 0.107408, 0.000325),
        (251.88, 0.016321, 0.000165),
        (251.83, 26.651886, 0.000164),
        (349.42, 36.412478, 0.000126),
        (84.66, 18.206239, 0.000110),
        (141.74, 53.303771, 0.000062),
        (207.14, 2.453732, 0.000060),
        (154.84, 7.306860, 0.000056),
        (34.52, 27.261239, 0.000047),
        (207.19, 0.121824, 0.000042),
        (291.34, 1.844379, 0.000040),
        (161.72, 24.198154, 0.000037),
        (239.56, 25.513099, 0.000035),
        (331.55, 3.592518, 0.000023),
    ];
    let planetary: f64 = PLANETARY
        .iter()
        .enumerate()
        .map(|(i, &(a0, rate, coeff))| {
            let mut arg = a0 + rate * k;
            if i == 0 {
                arg -= 0.009173 * t2;
            }
            coeff * arg.to_radians().sin()
        })
        .sum();

    jde + periodic + planetary
}

/// UT instant of new moon `k`.
pub fn new_moon_ut(k: i64) -> f64 {
    tt_to_ut(new_moon_jde(k as f64))
}

/// Lunar-calendar civil day number on which new moon `k` falls.
pub fn new_moon_day(k: i64) -> i64 {
    calendar_day_number(new_moon_ut(k))
}

/// Lunation whose new-moon civil day is the last one on or before `day_number`.
pub fn lunation_on_or_before(day_number: i64) -> i64 {
    let mut k = ((day_number as f64 - 2_451_550.09766) / SYNODIC_MONTH).floor() as i64;
    while new_moon_day(k) > day_number {
        k -= 1;
    }
    while new_moon_day(k + 1) <= day_number {
        k += 1;
    }
    k
}
