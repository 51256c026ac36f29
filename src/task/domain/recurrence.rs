//! Recurrence rules and next-occurrence calculation.
//!
//! Two rule shapes are understood. Structured rules are a subset of the
//! iCalendar `RRULE` grammar (`FREQ`, `INTERVAL`, `BYDAY`, `BYMONTHDAY`,
//! `UNTIL`). Anything else falls back to a fixed step chosen by the first
//! frequency keyword (`DAILY`, `WEEKLY`, `MONTHLY`, `YEARLY`) found in the
//! rule text.

use super::RecurrenceRuleError;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base frequency of a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every week.
    Weekly,
    /// Every calendar month.
    Monthly,
    /// Every calendar year.
    Yearly,
}

impl Frequency {
    /// Keyword order used by the fallback heuristic.
    const KEYWORD_ORDER: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    /// Returns the `RRULE` keyword for this frequency.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Finds the first frequency keyword contained in free-form rule text.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        let upper = text.to_ascii_uppercase();
        Self::KEYWORD_ORDER
            .into_iter()
            .find(|frequency| upper.contains(frequency.as_str()))
    }

    /// Advances a timestamp by one fixed step of this frequency.
    ///
    /// Month and year steps are calendar-aware and clamp to the last day of
    /// shorter months.
    #[must_use]
    pub fn advance(self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Daily => from.checked_add_signed(TimeDelta::days(1)),
            Self::Weekly => from.checked_add_signed(TimeDelta::days(7)),
            Self::Monthly => from.checked_add_months(Months::new(1)),
            Self::Yearly => from.checked_add_months(Months::new(12)),
        }
    }

    fn parse(value: &str) -> Result<Self, RecurrenceRuleError> {
        let upper = value.trim().to_ascii_uppercase();
        Self::KEYWORD_ORDER
            .into_iter()
            .find(|frequency| frequency.as_str() == upper)
            .ok_or_else(|| RecurrenceRuleError::UnsupportedFrequency(value.to_owned()))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed structured recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    by_day: Vec<Weekday>,
    by_month_day: Option<u32>,
    until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// Parses a structured rule such as `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,TH`.
    ///
    /// An optional `RRULE:` prefix is accepted. `COUNT` and unknown keys are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceRuleError`] when the text is empty, a part is not
    /// `KEY=VALUE`, `FREQ` is missing or unsupported, or a recognised value
    /// is malformed.
    pub fn parse(text: &str) -> Result<Self, RecurrenceRuleError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RecurrenceRuleError::Empty);
        }
        let body = trimmed
            .get(..6)
            .filter(|prefix| prefix.eq_ignore_ascii_case("RRULE:"))
            .and_then(|_| trimmed.get(6..))
            .unwrap_or(trimmed);

        let mut frequency = None;
        let mut interval = 1;
        let mut by_day = Vec::new();
        let mut by_month_day = None;
        let mut until = None;

        for part in body.split(';').map(str::trim).filter(|part| !part.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| RecurrenceRuleError::MalformedPart(part.to_owned()))?;
            match key.trim().to_ascii_uppercase().as_str() {
                "FREQ" => frequency = Some(Frequency::parse(value)?),
                "INTERVAL" => interval = parse_interval(value)?,
                "BYDAY" => by_day = parse_weekdays(value)?,
                "BYMONTHDAY" => by_month_day = Some(parse_month_day(value)?),
                "UNTIL" => until = Some(parse_until(value)?),
                _ => {}
            }
        }

        Ok(Self {
            frequency: frequency.ok_or(RecurrenceRuleError::MissingFrequency)?,
            interval,
            by_day,
            by_month_day,
            until,
        })
    }

    /// Returns the rule frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Returns the step multiplier.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns the first occurrence strictly after `after` and no later
    /// than `horizon`.
    ///
    /// `after` anchors the series: occurrences keep its time of day and the
    /// interval counts from its day, week, month, or year.
    #[must_use]
    pub fn next_after(
        &self,
        after: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let window = OccurrenceWindow {
            after,
            horizon: self.until.map_or(horizon, |until| until.min(horizon)),
        };
        match self.frequency {
            Frequency::Daily => self.next_by_day_step(&window, 1),
            Frequency::Weekly if self.by_day.is_empty() => self.next_by_day_step(&window, 7),
            Frequency::Weekly => self.next_weekly_by_day(&window),
            Frequency::Monthly => self.next_monthly(&window),
            Frequency::Yearly => self.next_yearly(&window),
        }
    }

    fn next_by_day_step(
        &self,
        window: &OccurrenceWindow,
        days_per_step: u64,
    ) -> Option<DateTime<Utc>> {
        let start = window.after.date_naive();
        let step = u64::from(self.interval).checked_mul(days_per_step)?;
        let mut offset = step;
        loop {
            let candidate = window.at(start.checked_add_days(Days::new(offset))?);
            if !window.contains(candidate) {
                return None;
            }
            if self.by_day.is_empty() || self.by_day.contains(&candidate.weekday()) {
                return Some(candidate);
            }
            offset = offset.checked_add(step)?;
        }
    }

    fn next_weekly_by_day(&self, window: &OccurrenceWindow) -> Option<DateTime<Utc>> {
        let start = window.after.date_naive();
        let week_start = start.checked_sub_days(Days::new(u64::from(
            start.weekday().num_days_from_monday(),
        )))?;
        let interval = i64::from(self.interval);
        let mut offset = 1;
        loop {
            let date = start.checked_add_days(Days::new(offset))?;
            let candidate = window.at(date);
            if !window.contains(candidate) {
                return None;
            }
            let week_index = (date - week_start).num_days().div_euclid(7);
            if week_index.rem_euclid(interval) == 0 && self.by_day.contains(&date.weekday()) {
                return Some(candidate);
            }
            offset += 1;
        }
    }

    fn next_monthly(&self, window: &OccurrenceWindow) -> Option<DateTime<Utc>> {
        let after = window.after;
        let day = self.by_month_day.unwrap_or_else(|| after.day());
        let first_of_anchor = NaiveDate::from_ymd_opt(after.year(), after.month(), 1)?;
        let mut months = 0_u32;
        loop {
            let first_of_month = first_of_anchor.checked_add_months(Months::new(months))?;
            if window.at(first_of_month) > window.horizon {
                return None;
            }
            let candidate =
                NaiveDate::from_ymd_opt(first_of_month.year(), first_of_month.month(), day)
                    .map(|date| window.at(date))
                    .filter(|candidate| *candidate > after);
            if let Some(found) = candidate {
                return window.contains(found).then_some(found);
            }
            months = months.checked_add(self.interval)?;
        }
    }

    fn next_yearly(&self, window: &OccurrenceWindow) -> Option<DateTime<Utc>> {
        let after = window.after;
        let interval = i32::try_from(self.interval).ok()?;
        let mut year = after.year().checked_add(interval)?;
        loop {
            if window.at(NaiveDate::from_ymd_opt(year, 1, 1)?) > window.horizon {
                return None;
            }
            if let Some(date) = NaiveDate::from_ymd_opt(year, after.month(), after.day()) {
                let candidate = window.at(date);
                return window.contains(candidate).then_some(candidate);
            }
            year = year.checked_add(interval)?;
        }
    }
}

struct OccurrenceWindow {
    after: DateTime<Utc>,
    horizon: DateTime<Utc>,
}

impl OccurrenceWindow {
    fn at(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(self.after.time()).and_utc()
    }

    fn contains(&self, candidate: DateTime<Utc>) -> bool {
        candidate > self.after && candidate <= self.horizon
    }
}

fn parse_interval(value: &str) -> Result<u32, RecurrenceRuleError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|interval| *interval > 0)
        .ok_or_else(|| RecurrenceRuleError::InvalidInterval(value.to_owned()))
}

fn parse_weekdays(value: &str) -> Result<Vec<Weekday>, RecurrenceRuleError> {
    value
        .split(',')
        .map(|entry| match entry.trim().to_ascii_uppercase().as_str() {
            "MO" => Ok(Weekday::Mon),
            "TU" => Ok(Weekday::Tue),
            "WE" => Ok(Weekday::Wed),
            "TH" => Ok(Weekday::Thu),
            "FR" => Ok(Weekday::Fri),
            "SA" => Ok(Weekday::Sat),
            "SU" => Ok(Weekday::Sun),
            _ => Err(RecurrenceRuleError::InvalidWeekday(entry.to_owned())),
        })
        .collect()
}

fn parse_month_day(value: &str) -> Result<u32, RecurrenceRuleError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|day| (1..=31).contains(day))
        .ok_or_else(|| RecurrenceRuleError::InvalidMonthDay(value.to_owned()))
}

fn parse_until(value: &str) -> Result<DateTime<Utc>, RecurrenceRuleError> {
    let trimmed = value.trim();
    let date_time = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    if let Ok(parsed) = NaiveDateTime::parse_from_str(date_time, "%Y%m%dT%H%M%S") {
        return Ok(parsed.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|end_of_day| end_of_day.and_utc())
        .ok_or_else(|| RecurrenceRuleError::InvalidUntil(value.to_owned()))
}

/// Returns `true` when the rule text can drive regeneration, either as a
/// structured rule or through the keyword fallback.
#[must_use]
pub fn is_usable_rule(text: &str) -> bool {
    RecurrenceRule::parse(text).is_ok() || Frequency::from_keyword(text).is_some()
}

/// Calculates the next due date of a recurring task.
///
/// The structured rule is consulted first, looking no further than
/// `lookahead` past `due`. When the rule does not parse or yields nothing in
/// that window, the first frequency keyword in the text decides a fixed
/// step. Returns `None` when neither approach produces a date.
#[must_use]
pub fn calculate_next_occurrence(
    rule: &str,
    due: DateTime<Utc>,
    lookahead: TimeDelta,
) -> Option<DateTime<Utc>> {
    let structured = due.checked_add_signed(lookahead).and_then(|horizon| {
        RecurrenceRule::parse(rule)
            .ok()
            .and_then(|parsed| parsed.next_after(due, horizon))
    });
    structured
        .or_else(|| Frequency::from_keyword(rule).and_then(|frequency| frequency.advance(due)))
}
