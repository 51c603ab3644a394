use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, YardworkError};

/// Wire format of every status timestamp. Always UTC, no zone suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed Eastern offset used for display. Daylight saving is ignored.
const EASTERN_OFFSET_HOURS: i64 = 5;

/// Current UTC time truncated to whole seconds, matching what the log can store.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Position of a job in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Pending,
    Accepted,
    Completed,
}

impl Stage {
    const ORDER: [Stage; 3] = [Stage::Pending, Stage::Accepted, Stage::Completed];

    /// Stage that follows this one, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Pending => Some(Stage::Accepted),
            Stage::Accepted => Some(Stage::Completed),
            Stage::Completed => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Pending => write!(f, "Pending"),
            Stage::Accepted => write!(f, "Accepted"),
            Stage::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Stage::Pending),
            "Accepted" => Ok(Stage::Accepted),
            "Completed" => Ok(Stage::Completed),
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

/// One timestamped entry of a job's status log, rendered as `"<Stage>: <timestamp>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub stage: Stage,
    pub at: DateTime<Utc>,
}

impl StatusEntry {
    pub fn new(stage: Stage, at: DateTime<Utc>) -> Self {
        Self {
            stage,
            at: at.trunc_subsecs(0),
        }
    }

    /// The entry time shifted to Eastern Standard Time for display.
    pub fn eastern(&self) -> NaiveDateTime {
        self.at.naive_utc() - Duration::hours(EASTERN_OFFSET_HOURS)
    }
}

impl std::fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.stage, self.at.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for StatusEntry {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (stage, timestamp) = s
            .split_once(": ")
            .ok_or_else(|| format!("malformed status entry '{}'", s))?;
        let at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| format!("bad timestamp in '{}': {}", s, e))?
            .and_utc();
        Ok(Self {
            stage: stage.parse()?,
            at,
        })
    }
}

/// Newest-first log of the stages a job has reached.
///
/// Always holds between one and three entries whose stages, read oldest
/// first, are exactly a prefix of Pending, Accepted, Completed. Index 0 is
/// the current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLog(Vec<StatusEntry>);

impl StatusLog {
    /// A fresh log for a job placed at `at`.
    pub fn pending(at: DateTime<Utc>) -> Self {
        Self(vec![StatusEntry::new(Stage::Pending, at)])
    }

    /// Build a log from newest-first entries, checking the stage ordering.
    pub fn from_entries(entries: Vec<StatusEntry>) -> std::result::Result<Self, String> {
        if entries.is_empty() || entries.len() > Stage::ORDER.len() {
            return Err(format!(
                "status log must hold 1 to 3 entries, got {}",
                entries.len()
            ));
        }
        let oldest_first = entries.iter().rev().map(|e| e.stage);
        if !oldest_first.eq(Stage::ORDER[..entries.len()].iter().copied()) {
            return Err("status log stages are out of order".to_string());
        }
        Ok(Self(entries))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed log.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent entry.
    pub fn current(&self) -> &StatusEntry {
        &self.0[0]
    }

    pub fn stage(&self) -> Stage {
        self.current().stage
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[StatusEntry] {
        &self.0
    }

    /// The entry recorded when the job reached `stage`, if it has.
    pub fn entry(&self, stage: Stage) -> Option<&StatusEntry> {
        self.0.iter().find(|e| e.stage == stage)
    }

    /// When the job was originally placed.
    pub fn placed_at(&self) -> DateTime<Utc> {
        self.0[self.0.len() - 1].at
    }

    /// A copy of this log with the next stage prepended.
    pub fn advanced(&self, at: DateTime<Utc>) -> Result<Self> {
        let next = self.stage().next().ok_or_else(|| {
            YardworkError::InvalidTransition(
                "Job status cannot be updated. This job is already completed.".to_string(),
            )
        })?;
        let mut entries = Vec::with_capacity(self.0.len() + 1);
        entries.push(StatusEntry::new(next, at));
        entries.extend_from_slice(&self.0);
        Ok(Self(entries))
    }

    /// A copy of this log with the Accepted entry removed.
    pub fn reverted(&self) -> Result<Self> {
        if self.stage() != Stage::Accepted {
            return Err(YardworkError::InvalidTransition(format!(
                "Only an accepted job can be cancelled, this job is {}.",
                self.stage()
            )));
        }
        Ok(Self(self.0[1..].to_vec()))
    }

    /// The byte-compatible string form, newest first.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl Serialize for StatusLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(ToString::to_string))
    }
}

impl<'de> Deserialize<'de> for StatusLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        let entries = raw
            .iter()
            .map(|s| s.parse::<StatusEntry>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(serde::de::Error::custom)?;
        StatusLog::from_entries(entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 5, h, m, s).unwrap()
    }

    #[test]
    fn entry_renders_wire_format() {
        let entry = StatusEntry::new(Stage::Accepted, at(14, 3, 9));
        assert_eq!(entry.to_string(), "Accepted: 2025-01-05 14:03:09");
    }

    #[test]
    fn entry_parses_wire_format() {
        let entry: StatusEntry = "Completed: 2025-01-05 01:02:03".parse().unwrap();
        assert_eq!(entry.stage, Stage::Completed);
        assert_eq!(entry.at, at(1, 2, 3));
    }

    #[test]
    fn entry_rejects_garbage() {
        assert!("Completed 2025-01-05 01:02:03".parse::<StatusEntry>().is_err());
        assert!("Shipped: 2025-01-05 01:02:03".parse::<StatusEntry>().is_err());
        assert!("Pending: yesterday".parse::<StatusEntry>().is_err());
    }

    #[test]
    fn subseconds_are_dropped() {
        let precise = at(8, 0, 0) + Duration::milliseconds(750);
        let entry = StatusEntry::new(Stage::Pending, precise);
        assert_eq!(entry.at, at(8, 0, 0));
    }

    #[test]
    fn eastern_is_five_hours_behind() {
        let entry = StatusEntry::new(Stage::Completed, at(3, 30, 0));
        assert_eq!(
            entry.eastern().format("%Y-%m-%d %H:%M").to_string(),
            "2025-01-04 22:30"
        );
    }

    #[test]
    fn advance_prepends_until_completed() {
        let log = StatusLog::pending(at(9, 0, 0));
        let log = log.advanced(at(9, 5, 0)).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.stage(), Stage::Accepted);

        let log = log.advanced(at(10, 0, 0)).unwrap();
        assert_eq!(
            log.to_strings(),
            vec![
                "Completed: 2025-01-05 10:00:00",
                "Accepted: 2025-01-05 09:05:00",
                "Pending: 2025-01-05 09:00:00",
            ]
        );
        assert_eq!(log.placed_at(), at(9, 0, 0));

        let err = log.advanced(at(11, 0, 0)).unwrap_err();
        assert!(matches!(err, YardworkError::InvalidTransition(_)));
    }

    #[test]
    fn revert_only_from_accepted() {
        let pending = StatusLog::pending(at(9, 0, 0));
        assert!(pending.reverted().is_err());

        let accepted = pending.advanced(at(9, 1, 0)).unwrap();
        assert_eq!(accepted.reverted().unwrap(), pending);

        let completed = accepted.advanced(at(9, 2, 0)).unwrap();
        assert!(completed.reverted().is_err());
    }

    #[test]
    fn from_entries_checks_order_and_length() {
        let p = StatusEntry::new(Stage::Pending, at(1, 0, 0));
        let a = StatusEntry::new(Stage::Accepted, at(2, 0, 0));
        let c = StatusEntry::new(Stage::Completed, at(3, 0, 0));

        assert!(StatusLog::from_entries(vec![]).is_err());
        assert!(StatusLog::from_entries(vec![a]).is_err());
        assert!(StatusLog::from_entries(vec![p, a]).is_err());
        assert!(StatusLog::from_entries(vec![c, a, p, p]).is_err());
        assert!(StatusLog::from_entries(vec![c, a, p]).is_ok());
    }

    #[test]
    fn serde_uses_string_list() {
        let log = StatusLog::pending(at(12, 0, 0)).advanced(at(12, 30, 0)).unwrap();
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["Accepted: 2025-01-05 12:30:00", "Pending: 2025-01-05 12:00:00"])
        );
        let back: StatusLog = serde_json::from_value(json).unwrap();
        assert_eq!(back, log);

        let bad = serde_json::json!(["Completed: 2025-01-05 12:30:00"]);
        assert!(serde_json::from_value::<StatusLog>(bad).is_err());
    }
}
