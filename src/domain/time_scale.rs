// Time axis scale: domain, tick selection and tick labels
use super::dataset::Dataset;
use super::graph::ScaleDomain;
use chrono::{DateTime, Datelike, FixedOffset, Local, Months, NaiveDate, TimeZone, Timelike, Utc, Weekday};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Candidate tick intervals, shortest first
const INTERVALS: [Interval; 18] = [
    Interval::Seconds(1),
    Interval::Seconds(5),
    Interval::Seconds(15),
    Interval::Seconds(30),
    Interval::Seconds(MINUTE),
    Interval::Seconds(5 * MINUTE),
    Interval::Seconds(15 * MINUTE),
    Interval::Seconds(30 * MINUTE),
    Interval::Seconds(HOUR),
    Interval::Seconds(3 * HOUR),
    Interval::Seconds(6 * HOUR),
    Interval::Seconds(12 * HOUR),
    Interval::Seconds(DAY),
    Interval::Seconds(2 * DAY),
    Interval::Seconds(WEEK),
    Interval::Months(1),
    Interval::Months(3),
    Interval::Months(12),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Interval {
    Seconds(i64),
    Months(u32),
}

impl Interval {
    fn approx_seconds(self) -> i64 {
        match self {
            Interval::Seconds(s) => s,
            Interval::Months(m) if m >= 12 => (m as i64 / 12) * YEAR,
            Interval::Months(m) => m as i64 * MONTH,
        }
    }
}

/// Zone that tick labels and backend requests are expressed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timezone {
    /// The host's zone, resolved again on every call so DST changes apply
    Local,
    Fixed(FixedOffset),
}

impl Timezone {
    pub fn offset(self) -> FixedOffset {
        match self {
            Timezone::Local => *Local::now().offset(),
            Timezone::Fixed(offset) => offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    min: i64,
    max: i64,
    offset: FixedOffset,
}

impl TimeScale {
    /// Bounds are clamped to the instants a calendar date exists for
    pub fn new(min: i64, max: i64, offset: FixedOffset) -> Self {
        let clamp = |ts: i64| {
            ts.clamp(
                DateTime::<Utc>::MIN_UTC.timestamp(),
                DateTime::<Utc>::MAX_UTC.timestamp(),
            )
        };
        let (min, max) = (clamp(min), clamp(max));
        Self {
            min: min.min(max),
            max: max.max(min),
            offset,
        }
    }

    /// Scale spanning every x coordinate in the dataset
    pub fn from_dataset(dataset: &Dataset, offset: FixedOffset) -> Self {
        let time_vals = dataset.time_vals();
        let all = time_vals.iter().flatten().copied();
        let min = all.clone().min().unwrap_or(0);
        let max = all.max().unwrap_or(0);
        Self::new(min, max, offset)
    }

    /// The graph's fixed scale if it has one, else the dataset's extent
    pub fn for_graph(fixed: Option<ScaleDomain>, dataset: &Dataset, offset: FixedOffset) -> Self {
        match fixed {
            Some(domain) => Self::new(domain.min, domain.max, offset),
            None => Self::from_dataset(dataset, offset),
        }
    }

    pub fn domain(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    fn local(&self, ts: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&self.offset))
    }

    /// Label a tick with the coarsest unit it falls on: `:%S` for odd seconds,
    /// up to `%Y` for the first instant of a year.
    pub fn tick_format(&self, ts: i64) -> String {
        let Some(dt) = self.local(ts) else {
            return ts.to_string();
        };

        let pattern = if dt.second() != 0 {
            ":%S"
        } else if dt.minute() != 0 {
            "%I:%M"
        } else if dt.hour() != 0 {
            "%I %p"
        } else if dt.day() != 1 && dt.weekday() != Weekday::Sun {
            "%a %d"
        } else if dt.day() != 1 {
            "%b %d"
        } else if dt.month() != 1 {
            "%B"
        } else {
            "%Y"
        };

        dt.format(pattern).to_string()
    }

    /// Roughly `count` evenly spaced, calendar-aligned ticks within the domain
    pub fn ticks(&self, count: usize) -> Vec<i64> {
        if count == 0 {
            return Vec::new();
        }

        let span = self.max.saturating_sub(self.min);
        if span == 0 {
            return vec![self.min];
        }

        let target = span as f64 / count as f64;
        let interval = match INTERVALS
            .iter()
            .position(|i| i.approx_seconds() as f64 >= target)
        {
            None => {
                let years = (target / YEAR as f64).ceil().clamp(1.0, u32::MAX as f64) as u32;
                Interval::Months(years.saturating_mul(12))
            }
            Some(0) => INTERVALS[0],
            Some(i) => {
                let below = INTERVALS[i - 1].approx_seconds() as f64;
                let above = INTERVALS[i].approx_seconds() as f64;
                if target / below < above / target {
                    INTERVALS[i - 1]
                } else {
                    INTERVALS[i]
                }
            }
        };

        match interval {
            Interval::Seconds(step) => self.fixed_ticks(step),
            Interval::Months(step) => self.month_ticks(step),
        }
    }

    fn fixed_ticks(&self, step: i64) -> Vec<i64> {
        let offset = self.offset.local_minus_utc() as i64;
        // weeks start on Sunday, three days after the epoch's Thursday
        let anchor = if step == WEEK { 3 * DAY } else { 0 };

        let shift = offset - anchor;
        let local_min = self.min.saturating_add(shift);
        let first = (local_min.div_euclid(step) * step)
            .saturating_add(if local_min.rem_euclid(step) == 0 { 0 } else { step });

        (0i64..)
            .map_while(|n| {
                n.checked_mul(step)
                    .and_then(|d| first.checked_add(d))
                    .and_then(|local| local.checked_sub(shift))
            })
            .take_while(|&ts| ts <= self.max)
            .collect()
    }

    fn month_ticks(&self, step: u32) -> Vec<i64> {
        let Some(start) = self.local(self.min) else {
            return Vec::new();
        };

        // first month on or after the domain start's month that lies on the step
        let (year, month0) = if step >= 12 {
            let years = (step / 12).min(i32::MAX as u32) as i32;
            let year = start.year();
            (year + (years - year.rem_euclid(years)) % years, 0)
        } else {
            let month0 = start.month0().div_ceil(step) * step;
            if month0 >= 12 {
                (start.year() + 1, month0 - 12)
            } else {
                (start.year(), month0)
            }
        };

        let Some(mut month) = NaiveDate::from_ymd_opt(year, month0 + 1, 1) else {
            return Vec::new();
        };

        let mut ticks = Vec::new();
        while let Some(ts) = self.month_start(month) {
            if ts > self.max {
                break;
            }
            if ts >= self.min {
                ticks.push(ts);
            }
            match month.checked_add_months(Months::new(step)) {
                Some(next) => month = next,
                None => break,
            }
        }

        ticks
    }

    fn month_start(&self, date: NaiveDate) -> Option<i64> {
        let naive = date.and_hms_opt(0, 0, 0)?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.timestamp())
    }
}
