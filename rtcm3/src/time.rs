//! GNSS time handling.
//!
//! RTCM 3 messages carry truncated times in several scales: GPS time of
//! week, GLONASS time of day (UTC(SU) + 3h), BeiDou time of week, and
//! 10/12/13-bit week numbers. Every decoded time is resolved against a
//! nearby reference and stored as [GpsTime].

use chrono::{DateTime, Utc};

pub(crate) const SECONDS_PER_WEEK: f64 = 604_800.0;
pub(crate) const SECONDS_PER_DAY: f64 = 86_400.0;

/// 1980-01-06 00:00:00, seconds since 1970-01-01
const GPS_EPOCH: i64 = 315_964_800;
/// 2006-01-01 00:00:00 BDT
const BDT_EPOCH: i64 = 1_136_073_600;
/// BDT = GPST - 14 s
const BDT_OFFSET: f64 = 14.0;
/// GLONASS time is UTC(SU) + 3 h
const GLONASS_OFFSET: f64 = 10_800.0;
/// Galileo week 0 starts 1024 weeks after GPS week 0
const GST_WEEK_OFFSET: i64 = 1024;
/// Weeks below this are never produced by week roll-over resolution
pub(crate) const MIN_REFERENCE_WEEK: i64 = 1560;

/// (UTC start of validity, GPST - UTC)
const LEAP_SECONDS: [(i64, f64); 18] = [
    (1_483_228_800, 18.0),
    (1_435_708_800, 17.0),
    (1_341_100_800, 16.0),
    (1_230_768_000, 15.0),
    (1_136_073_600, 14.0),
    (915_148_800, 13.0),
    (867_715_200, 12.0),
    (820_454_400, 11.0),
    (773_020_800, 10.0),
    (741_484_800, 9.0),
    (709_948_800, 8.0),
    (662_688_000, 7.0),
    (631_152_000, 6.0),
    (567_993_600, 5.0),
    (489_024_000, 4.0),
    (425_865_600, 3.0),
    (394_329_600, 2.0),
    (362_793_600, 1.0),
];

/// A time in the GPS time scale: whole seconds since 1970-01-01 (without
/// leap seconds) plus a fraction in `[0, 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsTime {
    pub seconds: i64,
    pub fraction: f64,
}

impl GpsTime {
    pub fn new(seconds: i64, fraction: f64) -> Self {
        let whole = fraction.floor();
        Self {
            seconds: seconds + whole as i64,
            fraction: fraction - whole,
        }
    }

    /// GPS week and time of week (s)
    pub fn from_week_tow(week: i64, tow: f64) -> Self {
        let tow = if tow.is_finite() { tow } else { 0.0 };
        Self::new(GPS_EPOCH + week * 604_800, tow)
    }

    /// Galileo system time week (GST) and time of week
    pub fn from_galileo_week_tow(week: i64, tow: f64) -> Self {
        Self::from_week_tow(week + GST_WEEK_OFFSET, tow)
    }

    /// BeiDou time week and second of week
    pub fn from_beidou_week_sow(week: i64, sow: f64) -> Self {
        let sow = if sow.is_finite() { sow } else { 0.0 };
        Self::new(BDT_EPOCH + week * 604_800, sow).add_seconds(BDT_OFFSET)
    }

    /// GPS week and time of week
    pub fn week_tow(&self) -> (i64, f64) {
        let since = self.seconds - GPS_EPOCH;
        let week = since.div_euclid(604_800);
        let tow = since.rem_euclid(604_800) as f64 + self.fraction;
        (week, tow)
    }

    /// BeiDou week and second of week
    pub fn beidou_week_sow(&self) -> (i64, f64) {
        let bdt = self.add_seconds(-BDT_OFFSET);
        let since = bdt.seconds - BDT_EPOCH;
        (
            since.div_euclid(604_800),
            since.rem_euclid(604_800) as f64 + bdt.fraction,
        )
    }

    pub fn add_seconds(&self, seconds: f64) -> Self {
        let whole = seconds.floor();
        Self::new(self.seconds + whole as i64, self.fraction + (seconds - whole))
    }

    /// `self - other` in seconds
    pub fn diff(&self, other: &GpsTime) -> f64 {
        (self.seconds - other.seconds) as f64 + (self.fraction - other.fraction)
    }

    pub fn is_unset(&self) -> bool {
        self.seconds == 0 && self.fraction == 0.0
    }

    /// Same instant expressed in UTC, still counted from 1970-01-01
    pub(crate) fn to_utc_scale(self) -> GpsTime {
        for (start, offset) in LEAP_SECONDS {
            let utc = self.add_seconds(-offset);
            if utc.diff(&GpsTime::new(start, 0.0)) >= 0.0 {
                return utc;
            }
        }
        self
    }

    /// Inverse of [GpsTime::to_utc_scale]
    pub(crate) fn from_utc_scale(utc: GpsTime) -> GpsTime {
        for (start, offset) in LEAP_SECONDS {
            if utc.diff(&GpsTime::new(start, 0.0)) >= 0.0 {
                return utc.add_seconds(offset);
            }
        }
        utc
    }

    /// Leap seconds (GPST - UTC) in effect at this instant
    pub fn leap_seconds(&self) -> f64 {
        -self.to_utc_scale().diff(self)
    }

    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let utc = self.to_utc_scale();
        let nanos = (utc.fraction * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(utc.seconds, nanos)
    }

    pub fn from_utc(datetime: DateTime<Utc>) -> Self {
        let utc = GpsTime::new(
            datetime.timestamp(),
            f64::from(datetime.timestamp_subsec_nanos()) * 1e-9,
        );
        Self::from_utc_scale(utc)
    }

    /// Current time from the system clock
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }
}

impl core::fmt::Display for GpsTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (week, tow) = self.week_tow();
        write!(f, "{week}:{tow:.3}")
    }
}

/// Resolves a time of week (s) to the week nearest to `reference`.
pub(crate) fn resolve_tow(reference: GpsTime, tow: f64) -> GpsTime {
    let (week, reference_tow) = reference.week_tow();
    let mut tow = tow;
    if tow < reference_tow - SECONDS_PER_WEEK / 2.0 {
        tow += SECONDS_PER_WEEK;
    } else if tow > reference_tow + SECONDS_PER_WEEK / 2.0 {
        tow -= SECONDS_PER_WEEK;
    }
    GpsTime::from_week_tow(week, tow)
}

/// Resolves a GLONASS time of day (s, Moscow time) to the day nearest to
/// `reference`.
pub(crate) fn resolve_glonass_tod(reference: GpsTime, tod: f64) -> GpsTime {
    let glonass = reference.to_utc_scale().add_seconds(GLONASS_OFFSET);
    let (week, tow) = glonass.week_tow();
    let reference_tod = tow % SECONDS_PER_DAY;
    let day_start = tow - reference_tod;
    let mut tod = tod;
    if tod < reference_tod - SECONDS_PER_DAY / 2.0 {
        tod += SECONDS_PER_DAY;
    } else if tod > reference_tod + SECONDS_PER_DAY / 2.0 {
        tod -= SECONDS_PER_DAY;
    }
    let glonass = GpsTime::from_week_tow(week, day_start + tod);
    GpsTime::from_utc_scale(glonass.add_seconds(-GLONASS_OFFSET))
}

/// Expands a 10-bit GPS week number (modulo 1024).
pub(crate) fn resolve_gps_week(reference: GpsTime, week: u32) -> i64 {
    let current = reference.week_tow().0.max(MIN_REFERENCE_WEEK);
    let week = i64::from(week);
    week + (current - week + 512).div_euclid(1024) * 1024
}

/// Expands a 13-bit BeiDou week number (modulo 8192).
pub(crate) fn resolve_beidou_week(reference: GpsTime, week: u32) -> i64 {
    let current = reference.beidou_week_sow().0.max(1);
    let week = i64::from(week);
    week + (current - week + 4096).div_euclid(8192) * 8192
}
