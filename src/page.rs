use anyhow::Result;

/// The frontend surface the orchestrator drives: a text control, a date
/// control, a save trigger, and optional loading/error regions. Implemented
/// by whatever stands in for the app under test; the orchestrator never
/// assumes more than this.
pub trait NotesPage {
    fn fill_text(&mut self, content: &str) -> Result<()>;

    /// Sets the date control to a `YYYY-MM-DD` value.
    fn set_date(&mut self, date: &str) -> Result<()>;

    /// Presses the save control. Fails if the control is disabled.
    fn click_save(&mut self) -> Result<()>;

    /// Full page reload; outstanding effects run to completion first.
    fn reload(&mut self) -> Result<()>;

    /// Out-of-band date-selection signal, bypassing the date control. Used
    /// to hit the frontend's own validation path with malformed input.
    fn dispatch_date_event(&mut self, date: &str) -> Result<()>;

    fn text_value(&self) -> String;

    fn date_value(&self) -> String;

    fn save_enabled(&self) -> bool;

    /// `None` when the page has no loading-indicator region at all, in
    /// which case callers fall back to a fixed wait.
    fn loading_visible(&self) -> Option<bool>;

    fn error_message(&self) -> Option<String>;
}
