//! Free-time computation from a free/busy calendar feed. Collaborator
//! utility: availability filtering inside the engine reads precomputed
//! bitsets; this module exists to cross-check against a live calendar export
//! when one is supplied.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Google-freebusy-shaped response: calendars keyed by id, each with a list
/// of busy periods.
#[derive(Debug, Deserialize)]
pub struct FreeBusyResponse {
    pub calendars: BTreeMap<String, CalendarBusy>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarBusy {
    #[serde(default)]
    pub busy: Vec<BusyPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct BusyPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// Flatten every calendar's busy periods into one interval list.
pub fn parse_freebusy(json: &str) -> Result<Vec<Interval>> {
    let response: FreeBusyResponse =
        serde_json::from_str(json).context("parse freebusy response")?;
    let mut intervals = Vec::new();
    for busy in response.calendars.values() {
        for period in &busy.busy {
            let start = OffsetDateTime::parse(&period.start, &Rfc3339)
                .with_context(|| format!("bad start timestamp {}", period.start))?;
            let end = OffsetDateTime::parse(&period.end, &Rfc3339)
                .with_context(|| format!("bad end timestamp {}", period.end))?;
            intervals.push(Interval { start, end });
        }
    }
    Ok(intervals)
}

/// Free intervals inside `[window_start, window_end]` after merging
/// overlapping busy intervals, keeping only those at least
/// `min_duration_minutes` long.
pub fn find_free_time(
    mut busy: Vec<Interval>,
    window_start: OffsetDateTime,
    window_end: OffsetDateTime,
    min_duration_minutes: i64,
) -> Vec<Interval> {
    let long_enough = |iv: &Interval| (iv.end - iv.start).whole_minutes() >= min_duration_minutes;

    if busy.is_empty() {
        let whole = Interval { start: window_start, end: window_end };
        return if long_enough(&whole) { vec![whole] } else { Vec::new() };
    }

    busy.sort_by_key(|iv| iv.start);
    let mut merged: Vec<Interval> = Vec::new();
    for iv in busy {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end => {
                if iv.end > last.end {
                    last.end = iv.end;
                }
            }
            _ => merged.push(iv),
        }
    }

    let mut free = Vec::new();
    let mut pointer = window_start;
    for iv in &merged {
        let busy_start = iv.start.max(window_start);
        let busy_end = iv.end.min(window_end);
        if pointer < busy_start {
            free.push(Interval { start: pointer, end: busy_start });
        }
        pointer = pointer.max(busy_end);
    }
    if pointer < window_end {
        free.push(Interval { start: pointer, end: window_end });
    }

    free.into_iter().filter(|iv| long_enough(iv)).collect()
}
