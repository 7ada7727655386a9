mod support;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use notes_harness::actions::PageActions;
use notes_harness::fixtures::TEST_NOTES;
use notes_harness::mock::netsim::{DEFAULT_DELAY, NetworkProfile};
use notes_harness::mock::router::EntryRouter;
use notes_harness::mock::store::EntryStore;
use notes_harness::page::NotesPage;
use support::fake_page::FakePage;

fn actions_with_profile(
    profile: NetworkProfile,
) -> (Arc<Mutex<EntryRouter>>, PageActions<FakePage<EntryRouter>>) {
    let router = Arc::new(Mutex::new(EntryRouter::with_profile(
        EntryStore::new(),
        profile,
    )));
    let page = FakePage::new(Arc::clone(&router));
    (router, PageActions::new(page))
}

#[test]
fn default_profile_waits_about_a_hundred_milliseconds() {
    assert_eq!(NetworkProfile::default().delay(), DEFAULT_DELAY);
    assert!(!NetworkProfile::default().should_fail());

    let started = Instant::now();
    NetworkProfile::default().wait();
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[test]
fn failed_save_shows_error_and_leaves_store_unchanged() {
    let (router, mut actions) = actions_with_profile(NetworkProfile::failing());

    actions
        .fill_and_save(TEST_NOTES.medium)
        .expect("the action itself runs; the failure lands in the error region");

    let message = actions
        .page()
        .error_message()
        .expect("failure message within the settle wait");
    assert!(message.contains("Failed to save"), "got: {message}");
    assert!(router.lock().expect("router").store().is_empty());
}

#[test]
fn slow_failure_still_surfaces_within_a_bounded_wait() {
    let (router, mut actions) =
        actions_with_profile(NetworkProfile::slow_failing(Duration::from_millis(300)));

    let started = Instant::now();
    actions
        .fill_and_save(TEST_NOTES.medium)
        .expect("fill and save");
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(actions.page().error_message().is_some());
    assert!(router.lock().expect("router").store().is_empty());
}

#[test]
fn slow_save_cycles_the_loading_indicator() {
    let (router, mut actions) =
        actions_with_profile(NetworkProfile::slow(Duration::from_millis(1000)));

    actions
        .page_mut()
        .fill_text(TEST_NOTES.medium)
        .expect("fill text");
    actions.page_mut().click_save().expect("click save");

    // Visible before fulfillment...
    assert_eq!(actions.page().loading_visible(), Some(true));

    // ...and gone once the save settles.
    let deadline = Instant::now() + Duration::from_secs(5);
    while actions.page().loading_visible() == Some(true) {
        assert!(Instant::now() < deadline, "indicator never cleared");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(actions.page().loading_visible(), Some(false));
    assert_eq!(router.lock().expect("router").store().len(), 1);
}

#[test]
fn concurrent_saves_are_each_processed_completely() {
    let (router, mut actions) =
        actions_with_profile(NetworkProfile::slow(Duration::from_millis(100)));

    // Fire two saves without waiting for the first to settle.
    actions.page_mut().fill_text("first draft").expect("fill");
    actions.page_mut().click_save().expect("first save");
    actions.page_mut().fill_text("second draft").expect("fill");
    actions.page_mut().click_save().expect("second save");

    actions.page_mut().settle_pending();

    let router = router.lock().expect("router");
    let entries = router.store().list_all();
    assert_eq!(entries.len(), 2);

    let names: HashSet<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
    assert!(names.contains("first draft"));
    assert!(names.contains("second draft"));

    // Ids follow interception order, whatever order the clicks landed in.
    let ids: HashSet<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids.len(), 2, "every save must get its own id");
    assert!(ids.contains("1") && ids.contains("2"));
}

#[test]
fn slow_success_persists_after_the_wait() {
    let (_, mut actions) = actions_with_profile(NetworkProfile::slow(Duration::from_millis(500)));

    actions
        .fill_and_save(TEST_NOTES.medium)
        .expect("slow fill and save");
    actions
        .reload_and_wait(Duration::from_millis(50))
        .expect("reload");
    assert_eq!(actions.page().text_value(), TEST_NOTES.medium);
}
