use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A persisted note record as it travels over the wire. The external API
/// uses `Created_date` with exactly that casing, so the rename is load-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "Created_date")]
    pub created_date: String,
    pub id: String,
}

/// Partial field set for a PUT-style update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryUpdate {
    pub name: Option<String>,
    pub created_date: Option<String>,
}

/// Normalizes a date string to the store's canonical ISO-8601 UTC instant,
/// e.g. `2024-02-29T00:00:00.000Z`. Accepts RFC 3339 instants (any offset)
/// and bare `YYYY-MM-DD` calendar dates, which become midnight UTC.
/// Idempotent on already-canonical input.
pub fn canonical_instant(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(format_instant(&instant.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .with_context(|| format!("invalid date: {trimmed}"))?;
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    Ok(format_instant(&midnight))
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// In-process mock persistence for note entries. One store per test
/// context; never share an instance across parallel tests, since id
/// assignment depends on the current entry count.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Appends a new entry. The date is canonicalized on the way in; an
    /// unparseable date is stored verbatim because validation belongs to
    /// the router, not this layer. When `id` is omitted the entry gets
    /// `(current count + 1)` as a decimal string.
    pub fn add(&mut self, name: &str, created_date: &str, id: Option<&str>) -> Entry {
        let created_date =
            canonical_instant(created_date).unwrap_or_else(|_| created_date.to_string());
        let id = match id {
            Some(explicit) => explicit.to_string(),
            None => (self.entries.len() + 1).to_string(),
        };
        let entry = Entry {
            name: name.to_string(),
            created_date,
            id,
        };
        self.entries.push(entry.clone());
        entry
    }

    /// Defensive copy of every entry, insertion order.
    pub fn list_all(&self) -> Vec<Entry> {
        self.entries.clone()
    }

    /// Entries whose canonical date matches the canonicalized query date
    /// exactly. Different spellings of the same calendar date match; an
    /// unparseable query date is an error for the caller to shape.
    pub fn find_by_date(&self, date: &str) -> Result<Vec<Entry>> {
        let wanted = canonical_instant(date)?;
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.created_date == wanted)
            .cloned()
            .collect())
    }

    pub fn find_by_id(&self, id: &str) -> Option<Entry> {
        self.entries.iter().find(|entry| entry.id == id).cloned()
    }

    /// Merges the supplied fields into the matching entry. A supplied date
    /// is canonicalized the same way `add` does. Returns false when no
    /// entry has that id.
    pub fn update(&mut self, id: &str, updates: &EntryUpdate) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) else {
            return false;
        };
        if let Some(name) = &updates.name {
            entry.name = name.clone();
        }
        if let Some(date) = &updates.created_date {
            entry.created_date = canonical_instant(date).unwrap_or_else(|_| date.clone());
        }
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() < before
    }

    /// Empties the store. Test-isolation hook, not a production operation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
