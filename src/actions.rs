use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};

use crate::page::NotesPage;

/// Fixed wait used when the page exposes no loading indicator to observe.
pub const SETTLE_FALLBACK: Duration = Duration::from_millis(1000);

/// Upper bound on waiting for an observed loading indicator to clear.
pub const SETTLE_DEADLINE: Duration = Duration::from_secs(10);

const SETTLE_POLL: Duration = Duration::from_millis(10);

/// Sequences composite save/reload flows from the primitive page operations.
/// Every action is attempted exactly once; failures surface to the calling
/// test rather than being retried here.
pub struct PageActions<P: NotesPage> {
    page: P,
}

impl<P: NotesPage> PageActions<P> {
    pub fn new(page: P) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Fill the text control, press save, and wait for the save to settle.
    pub fn fill_and_save(&mut self, content: &str) -> Result<()> {
        self.page.fill_text(content)?;
        self.page.click_save()?;
        self.await_settle()
    }

    /// Pick a date, fill the text control, save, and wait for settle.
    pub fn fill_date_and_save(&mut self, date: &str, content: &str) -> Result<()> {
        self.page.set_date(date)?;
        self.page.fill_text(content)?;
        self.page.click_save()?;
        self.await_settle()
    }

    /// Reload the page and give it a fixed window to repopulate. Asserting
    /// after this proves the state came back from the backend, not from
    /// whatever the controls held before the reload.
    pub fn reload_and_wait(&mut self, timeout: Duration) -> Result<()> {
        self.page.reload()?;
        thread::sleep(timeout);
        Ok(())
    }

    /// Pushes a malformed date at the frontend's validation path without
    /// going through the date control.
    pub fn trigger_invalid_date_event(&mut self, date: &str) -> Result<()> {
        self.page.dispatch_date_event(date)
    }

    /// Settle = the loading indicator has gone away, or the fallback wait
    /// has elapsed on pages without one. Indicator still visible at the
    /// deadline is a harness failure, not something to retry.
    fn await_settle(&self) -> Result<()> {
        if self.page.loading_visible().is_none() {
            thread::sleep(SETTLE_FALLBACK);
            return Ok(());
        }
        let deadline = Instant::now() + SETTLE_DEADLINE;
        loop {
            match self.page.loading_visible() {
                Some(false) | None => return Ok(()),
                Some(true) if Instant::now() > deadline => {
                    bail!("loading indicator did not settle within {SETTLE_DEADLINE:?}");
                }
                Some(true) => thread::sleep(SETTLE_POLL),
            }
        }
    }
}
