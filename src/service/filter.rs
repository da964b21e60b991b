//! Party listing filters: free-text search, genre, location and date range.
//!
//! All predicates are conjunctive and the result keeps input order.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{errors::AppError, models::Party};

/// Selector value that disables the genre and location filters.
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Tomorrow,
    Week,
    Month,
    #[default]
    All,
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        self.start <= *dt && *dt < self.end
    }
}

impl DateRange {
    /// Computes the window relative to `now`, in `now`'s time zone.
    /// `All` has no window.
    pub fn window<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<DateWindow> {
        let tz = now.timezone();
        let today = now.date_naive();
        let start_of_today = start_of_day(&tz, today)?;
        let (start, end) = match self {
            DateRange::All => return None,
            DateRange::Today => (start_of_today, start_of_day(&tz, today.succ_opt()?)?),
            DateRange::Tomorrow => {
                let tomorrow = today.succ_opt()?;
                (start_of_day(&tz, tomorrow)?, start_of_day(&tz, tomorrow.succ_opt()?)?)
            }
            DateRange::Week => (start_of_today, start_of_today + Duration::days(7)),
            DateRange::Month => (start_of_today, start_of_day(&tz, first_of_next_month(today)?)?),
        };
        Some(DateWindow { start, end })
    }
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    // Midnight may not exist on a DST switch day; the first hour then starts the day.
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&date.and_hms_opt(1, 0, 0)?)
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

/// Lowercases and strips diacritics so that `"zuri"` finds `"Zürich"`.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartyFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: DateRange,
    /// Caller's UTC offset in minutes east of Greenwich (`120` for UTC+2).
    #[serde(default)]
    pub tz_offset_minutes: Option<i32>,
}

impl PartyFilter {
    pub fn search(term: impl Into<String>) -> Self {
        PartyFilter {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    /// `utc_now` seen from the caller's offset, or from the server's local
    /// offset when the caller sent none.
    pub fn caller_now(&self, utc_now: DateTime<Utc>) -> Result<DateTime<FixedOffset>, AppError> {
        let offset = match self.tz_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| AppError::bad_request("tz_offset_minutes out of range"))?,
            None => *utc_now.with_timezone(&Local).offset(),
        };
        Ok(utc_now.with_timezone(&offset))
    }

    pub fn is_cleared(&self) -> bool {
        active_term(&self.search).is_none()
            && active_selector(&self.genre).is_none()
            && active_selector(&self.location).is_none()
            && self.date == DateRange::All
    }

    /// Keeps the parties that pass every active filter, in input order.
    pub fn apply<Tz: TimeZone>(&self, parties: Vec<Party>, now: &DateTime<Tz>) -> Vec<Party> {
        if self.is_cleared() {
            return parties;
        }
        let matcher = Matcher {
            term: active_term(&self.search).map(fold),
            genre: active_selector(&self.genre).map(fold),
            location: active_selector(&self.location).map(fold),
            window: self.date.window(now),
        };
        parties.into_iter().filter(|p| matcher.matches(p)).collect()
    }
}

fn active_term(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn active_selector(value: &Option<String>) -> Option<&str> {
    active_term(value).filter(|v| !v.eq_ignore_ascii_case(ALL))
}

struct Matcher {
    term: Option<String>,
    genre: Option<String>,
    location: Option<String>,
    window: Option<DateWindow>,
}

impl Matcher {
    fn matches(&self, party: &Party) -> bool {
        if let Some(term) = &self.term {
            let hit = fold(&party.title).contains(term.as_str())
                || party
                    .description
                    .as_deref()
                    .is_some_and(|d| fold(d).contains(term.as_str()))
                || fold(&party.location).contains(term.as_str());
            if !hit {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            match party.genre.as_deref() {
                Some(g) if fold(g.trim()) == *genre => {}
                _ => return false,
            }
        }
        if let Some(location) = &self.location {
            if fold(party.location.trim()) != *location {
                return false;
            }
        }
        match &self.window {
            Some(window) => window.contains(&party.datetime),
            None => true,
        }
    }
}
