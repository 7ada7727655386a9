use crate::mock::store::{Entry, EntryStore};

/// Note payloads the suite exercises, from two-character saves up to
/// markup the frontend must sanitize on render.
#[derive(Debug, Clone, Copy)]
pub struct TestNotes {
    pub short: &'static str,
    pub medium: &'static str,
    pub long: &'static str,
    pub special: &'static str,
    pub multiline: &'static str,
    pub unicode: &'static str,
    pub html: &'static str,
    pub emoji: &'static str,
}

pub const TEST_NOTES: TestNotes = TestNotes {
    short: "GB",
    medium: "This is a test note",
    long: "This is a very long note that should test the character limit of the text field. It contains multiple sentences and should be properly saved and retrieved.",
    special: "Special chars: !@#$%^&*()_+",
    multiline: "Line 1\nLine 2\nLine 3",
    unicode: "Unicode test: 你好, こんにちは, Привет",
    html: "<script>alert('test')</script><p>Test</p>",
    emoji: "Test with emojis 😀 🎉 🌟",
};

#[derive(Debug, Clone, Copy)]
pub struct TestDates {
    pub leap_year: &'static str,
    pub month_ends: [&'static str; 5],
    pub invalid_date: &'static str,
    pub test_date: &'static str,
    pub future_date: &'static str,
}

pub const TEST_DATES: TestDates = TestDates {
    leap_year: "2024-02-29",
    month_ends: [
        "2024-01-31",
        "2024-04-30",
        "2024-06-30",
        "2024-09-30",
        "2024-11-30",
    ],
    invalid_date: "2013-13-45",
    test_date: "2013-09-25",
    future_date: "2025-04-14",
};

/// The four entries the mock backend starts with in seeded scenarios.
pub fn seed_entries() -> Vec<Entry> {
    vec![
        Entry {
            name: TEST_NOTES.short.to_string(),
            created_date: "2025-04-14T00:00:00.000Z".to_string(),
            id: "1".to_string(),
        },
        Entry {
            name: TEST_NOTES.medium.to_string(),
            created_date: "2013-09-25T00:00:00.000Z".to_string(),
            id: "2".to_string(),
        },
        Entry {
            name: TEST_NOTES.long.to_string(),
            created_date: "2024-01-01T00:00:00.000Z".to_string(),
            id: "3".to_string(),
        },
        Entry {
            name: TEST_NOTES.special.to_string(),
            created_date: "2024-02-15T00:00:00.000Z".to_string(),
            id: "4".to_string(),
        },
    ]
}

pub fn seeded_store() -> EntryStore {
    EntryStore::with_entries(seed_entries())
}
