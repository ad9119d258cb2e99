//! Integration tests for the offer screen: countdown, reveal and tracking.

use std::rc::Rc;

use quizfunnel_core::storage::CheckoutLink;
use quizfunnel_core::timer::{format_mm_ss, remaining};
use quizfunnel_core::{
    CountdownTimer, Funnel, FunnelConfig, KeyValueStore, ManualClock, MemoryStore,
    QuizDefinition, QuizPhase, RecordingTracker, StorageKeys,
};

const MINUTE: u64 = 60_000;

#[test]
fn test_countdown_expires_without_going_negative() {
    let t0 = 1_700_000_000_000;
    let clock = ManualClock::new(t0);
    let store = Rc::new(MemoryStore::new());
    let mut countdown = CountdownTimer::new(
        store,
        Rc::new(clock.clone()),
        &StorageKeys::default(),
        20 * MINUTE,
    );
    assert_eq!(countdown.get_or_init_start(), t0);
    clock.advance(25 * MINUTE);
    assert_eq!(countdown.remaining_now(), 0);
    assert_eq!(countdown.display(), "00:00");
    assert_eq!(remaining(t0 + 25 * MINUTE, t0, 20 * MINUTE), 0);
}

#[test]
fn test_countdown_start_is_shared_across_mounts() {
    let clock = ManualClock::new(5_000);
    let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
    let keys = StorageKeys::default();
    let mut first = CountdownTimer::new(store.clone(), Rc::new(clock.clone()), &keys, 20 * MINUTE);
    first.get_or_init_start();

    clock.advance(3 * MINUTE);
    let mut second = CountdownTimer::new(store, Rc::new(clock.clone()), &keys, 20 * MINUTE);
    assert_eq!(second.get_or_init_start(), 5_000);
    assert_eq!(second.display(), format_mm_ss(17 * MINUTE));
}

#[test]
fn test_full_visit_tracks_funnel_events() {
    let clock = ManualClock::new(0);
    let store = Rc::new(MemoryStore::new());
    let rec = RecordingTracker::new();
    let mut config = FunnelConfig::default();
    config.offer.checkout.push(CheckoutLink {
        id: "annual".into(),
        label: "Annual plan".into(),
        url: "https://pay.example/annual".into(),
        price: Some(97.0),
    });

    let mut funnel = Funnel::new(
        QuizDefinition::default_funnel(),
        config,
        store,
        Rc::new(clock.clone()),
    )
    .with_video("https://video.example/vsl.m3u8", "vsl")
    .with_tracker(rec.clone());

    funnel.mount(Some("https://quiz.example/?utm_source=tiktok&utm_campaign=q3"));
    funnel.start();
    for (question, option) in [
        ("main_challenge", "no_time"),
        ("symptoms", "fatigue"),
        ("commitment", "full_transformation"),
        ("weight_loss_attempts", "few_times"),
    ] {
        funnel.answer(question, option);
        if question == "symptoms" {
            funnel.next();
        }
        clock.advance(500);
        funnel.tick();
    }
    while funnel.phase() != QuizPhase::Offer {
        clock.advance(100);
        funnel.tick();
    }

    assert!(!funnel.is_checkout_unlocked());
    let mut second = 0.0;
    while !funnel.is_checkout_unlocked() {
        second += 1.0;
        funnel.on_video_progress(second, 600.0);
    }
    assert_eq!(second, 230.0);
    assert!(funnel.click_checkout("annual").is_some());

    let names = rec.names();
    assert_eq!(names.first().map(String::as_str), Some("Page View"));
    assert_eq!(rec.count("Question Answered"), 4);
    assert_eq!(rec.count("Loading Started"), 1);
    assert_eq!(rec.count("Offer Page Viewed"), 1);
    assert_eq!(rec.count("Video Progress"), 3);
    assert_eq!(rec.count("Checkout Clicked"), 1);

    let (_, props) = rec.events().pop().unwrap();
    assert_eq!(props["offer_id"], "annual");
    assert_eq!(props["utm_source"], "tiktok");
    assert_eq!(props["funnel_step"], "checkout_intent");
}
