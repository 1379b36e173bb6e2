use std::time::{Duration, Instant};

use rust_carousel::carousel::Carousel;
use rust_carousel::config::{CarouselConfig, TransitionEffect};
use rust_carousel::events::{
    CarouselEvent, Command, Direction, SlideChanged, TransitionId, TransitionRequest,
};
use rust_carousel::schedule::ManualScheduler;
use rust_carousel::stage::{HeadlessStage, Stage, TransitionSupport, VendorPrefix};

const WIDTH: f32 = 800.0;

fn config(effect: TransitionEffect, autoplay: bool) -> CarouselConfig {
    CarouselConfig {
        transition_duration_ms: 100,
        transition_effect: effect,
        autoplay,
        autoplay_interval_ms: 4000,
    }
}

fn carousel(
    slides: usize,
    cfg: CarouselConfig,
    t0: Instant,
) -> Carousel<HeadlessStage, ManualScheduler> {
    Carousel::new(
        HeadlessStage::new(WIDTH, slides),
        cfg,
        Vec::new(),
        ManualScheduler::new(),
        t0,
    )
}

/// Drives frames until the in-flight transition completes.
fn settle<T>(carousel: &mut Carousel<HeadlessStage, T>, start: Instant) -> (Instant, SlideChanged)
where
    T: rust_carousel::schedule::Scheduler,
{
    let mut now = start;
    for _ in 0..100 {
        now += Duration::from_millis(13);
        if let Some(change) = carousel.on_frame(now) {
            return (now, change);
        }
    }
    panic!("transition did not complete");
}

fn assert_at_rest(carousel: &Carousel<HeadlessStage, ManualScheduler>) {
    let stage = carousel.stage();
    assert!(!carousel.is_animating());
    assert_eq!(stage.visible_slides(), vec![carousel.active_index()]);
    assert_eq!(stage.container_offset(), 0.0);
    for index in 0..stage.slide_count() {
        assert_eq!(stage.slide(index).unwrap().offset_px, 0.0, "slide {index}");
    }
    assert!(stage.container_styles().is_empty());
}

#[test]
fn construction_hides_all_but_first_slide() {
    let t0 = Instant::now();
    let carousel = carousel(4, config(TransitionEffect::Slide, false), t0);
    assert!(carousel.is_staged());
    assert_eq!(carousel.active_index(), 0);
    assert_eq!(carousel.stage().visible_slides(), vec![0]);
    assert_eq!(carousel.support(), TransitionSupport::Manual);
    assert!(!carousel.is_playing());
}

#[test]
fn next_walks_three_slides_and_wraps() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, false), t0);

    let mut now = t0;
    for expected in [1, 2, 0] {
        let from = carousel.active_index();
        carousel.next(now);
        assert!(carousel.is_animating());
        let (done, change) = settle(&mut carousel, now);
        assert_eq!(change, SlideChanged { from, to: expected });
        assert_eq!(carousel.active_index(), expected);
        assert_at_rest(&carousel);
        now = done;
    }
}

#[test]
fn previous_wraps_backwards() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, false), t0);

    carousel.previous(t0);
    let (now, change) = settle(&mut carousel, t0);
    assert_eq!(change, SlideChanged { from: 0, to: 2 });

    carousel.previous(now);
    settle(&mut carousel, now);
    assert_eq!(carousel.active_index(), 1);
    assert_at_rest(&carousel);
}

#[test]
fn index_arithmetic_holds_for_larger_carousels() {
    for count in 2..7 {
        let t0 = Instant::now();
        let mut carousel = carousel(count, config(TransitionEffect::Fade, false), t0);
        let mut now = t0;
        for _ in 0..count + 1 {
            let i = carousel.active_index();
            carousel.next(now);
            now = settle(&mut carousel, now).0;
            assert_eq!(carousel.active_index(), (i + 1) % count);
            carousel.previous(now);
            now = settle(&mut carousel, now).0;
            assert_eq!(carousel.active_index(), i);
            carousel.next(now);
            now = settle(&mut carousel, now).0;
        }
    }
}

#[test]
fn manual_slide_stages_target_and_moves_container() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, false), t0);

    carousel.next(t0);
    let stage = carousel.stage();
    assert_eq!(stage.visible_slides(), vec![0, 1]);
    assert_eq!(stage.slide(1).unwrap().offset_px, WIDTH);

    carousel.on_frame(t0 + Duration::from_millis(50));
    let mid = carousel.stage().container_offset();
    assert!(mid < 0.0 && mid > -WIDTH, "midway offset was {mid}");

    carousel.on_frame(t0 + Duration::from_millis(100));
    assert!(!carousel.is_animating());
    assert_eq!(carousel.stage().visible_slides(), vec![1]);

    carousel.previous(t0 + Duration::from_millis(200));
    assert_eq!(carousel.stage().slide(0).unwrap().offset_px, -WIDTH);
    carousel.on_frame(t0 + Duration::from_millis(250));
    assert!(carousel.stage().container_offset() > 0.0);
}

#[test]
fn native_slide_waits_for_transition_end() {
    let t0 = Instant::now();
    let stage = HeadlessStage::new(WIDTH, 3).with_supported_styles(["WebkitTransition"]);
    let mut carousel = Carousel::new(
        stage,
        config(TransitionEffect::Slide, false),
        Vec::new(),
        ManualScheduler::new(),
        t0,
    );
    assert_eq!(
        carousel.support(),
        TransitionSupport::Native(VendorPrefix::Webkit)
    );

    carousel.next(t0);
    let styles = carousel.stage().container_styles();
    assert_eq!(
        styles.get("WebkitTransform").map(String::as_str),
        Some("translate3d(-800px,0,0)")
    );
    assert_eq!(
        styles.get("WebkitTransitionDuration").map(String::as_str),
        Some("100ms")
    );
    assert_eq!(
        styles.get("WebkitTransitionTimingFunction").map(String::as_str),
        Some("ease")
    );

    assert!(carousel.on_frame(t0 + Duration::from_millis(50)).is_none());
    let id = carousel.transition_id().unwrap();
    assert_eq!(id, TransitionId(1));
    let change = carousel.handle(
        CarouselEvent::TransitionEnd(id),
        t0 + Duration::from_millis(60),
    );
    assert_eq!(change, Some(SlideChanged { from: 0, to: 1 }));
    assert_at_rest(&carousel);
    assert!(carousel.transition_id().is_none());

    assert!(carousel.transition_end(id).is_none(), "no transition in flight");
}

#[test]
fn late_transition_end_does_not_finish_the_next_slide() {
    let t0 = Instant::now();
    let stage = HeadlessStage::new(WIDTH, 3).with_supported_styles(["WebkitTransition"]);
    let mut carousel = Carousel::new(
        stage,
        config(TransitionEffect::Slide, false),
        Vec::new(),
        ManualScheduler::new(),
        t0,
    );

    carousel.next(t0);
    let first = carousel.transition_id().unwrap();
    // Frames finish the slide before the environment reports it.
    assert_eq!(
        carousel.on_frame(t0 + Duration::from_millis(113)),
        Some(SlideChanged { from: 0, to: 1 })
    );

    carousel.next(t0 + Duration::from_millis(120));
    let second = carousel.transition_id().unwrap();
    assert_ne!(first, second);

    let late = carousel.handle(
        CarouselEvent::TransitionEnd(first),
        t0 + Duration::from_millis(121),
    );
    assert!(late.is_none());
    assert!(carousel.is_animating(), "second slide still in flight");
    assert_eq!(carousel.active_index(), 1);
    assert!(!carousel.stage().container_styles().is_empty());

    let change = carousel.handle(
        CarouselEvent::TransitionEnd(second),
        t0 + Duration::from_millis(220),
    );
    assert_eq!(change, Some(SlideChanged { from: 1, to: 2 }));
    assert_at_rest(&carousel);
}

#[test]
fn native_slide_completes_on_frames_without_notification() {
    let t0 = Instant::now();
    let stage = HeadlessStage::new(WIDTH, 2).with_supported_styles(["OTransition"]);
    let mut carousel = Carousel::new(
        stage,
        config(TransitionEffect::Slide, false),
        Vec::new(),
        ManualScheduler::new(),
        t0,
    );
    carousel.previous(t0);
    assert_eq!(
        carousel
            .stage()
            .container_styles()
            .get("OTransform")
            .map(String::as_str),
        Some("translate3d(800px,0,0)")
    );
    let (_, change) = settle(&mut carousel, t0);
    assert_eq!(change, SlideChanged { from: 0, to: 1 });
    assert_at_rest(&carousel);
}

#[test]
fn fade_completes_only_after_both_halves() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Fade, false), t0);

    carousel.next(t0);
    let stage = carousel.stage();
    assert_eq!(stage.visible_slides(), vec![0, 1]);
    assert_eq!(stage.slide(1).unwrap().opacity, 0.0);
    assert_eq!(stage.slide(1).unwrap().offset_px, 0.0, "fade does not pre-position");

    assert!(carousel.on_frame(t0 + Duration::from_millis(50)).is_none());
    let stage = carousel.stage();
    let fading_in = stage.slide(1).unwrap().opacity;
    let fading_out = stage.slide(0).unwrap().opacity;
    assert!(fading_in > 0.0 && fading_in < 1.0);
    assert!((fading_in + fading_out - 1.0).abs() < 1e-4);

    let change = carousel.on_frame(t0 + Duration::from_millis(100));
    assert_eq!(change, Some(SlideChanged { from: 0, to: 1 }));
    assert_eq!(carousel.stage().slide(1).unwrap().opacity, 1.0);
    assert_eq!(carousel.stage().slide(0).unwrap().opacity, 0.0);
    assert_at_rest(&carousel);
}

#[test]
fn navigation_while_animating_is_dropped() {
    let t0 = Instant::now();
    let mut carousel = carousel(4, config(TransitionEffect::Slide, false), t0);

    carousel.next(t0);
    let during = t0 + Duration::from_millis(20);
    carousel.next(during);
    carousel.previous(during);
    carousel.goto_slide(2, during);
    assert_eq!(carousel.active_index(), 0);
    assert_eq!(carousel.stage().visible_slides(), vec![0, 1]);

    let (now, change) = settle(&mut carousel, during);
    assert_eq!(change, SlideChanged { from: 0, to: 1 });
    assert!(carousel.on_frame(now + Duration::from_millis(500)).is_none());
    assert_eq!(carousel.active_index(), 1);
}

// The exclusive bound is kept as-is: the first and last slide cannot be
// reached through goto_slide.
#[test]
fn goto_slide_excludes_first_and_last_slides() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, false), t0);

    carousel.goto_slide(0, t0);
    assert!(!carousel.is_animating());
    carousel.goto_slide(2, t0);
    assert!(!carousel.is_animating());
    carousel.goto_slide(7, t0);
    assert!(!carousel.is_animating());

    carousel.goto_slide(1, t0);
    assert!(carousel.is_animating());
    assert_eq!(carousel.stage().slide(1).unwrap().offset_px, WIDTH);
    let (_, change) = settle(&mut carousel, t0);
    assert_eq!(change, SlideChanged { from: 0, to: 1 });
    assert_at_rest(&carousel);
}

#[test]
fn goto_slide_direction_follows_index_order() {
    let t0 = Instant::now();
    let mut carousel = carousel(5, config(TransitionEffect::Slide, false), t0);

    carousel.goto_slide(3, t0);
    let (now, _) = settle(&mut carousel, t0);
    carousel.goto_slide(1, now);
    assert_eq!(
        carousel.stage().slide(1).unwrap().offset_px,
        -WIDTH,
        "backward travel stages the target on the left"
    );
    settle(&mut carousel, now);
    assert_eq!(carousel.active_index(), 1);

    carousel.goto_slide(1, now);
    assert!(!carousel.is_animating(), "goto to the active slide is a no-op");
    assert_at_rest(&carousel);
}

#[test]
fn per_call_speed_overrides_duration() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Fade, false), t0);
    carousel.navigate(
        TransitionRequest {
            to: 2,
            direction: Direction::Backward,
            speed: Some(Duration::from_millis(400)),
        },
        t0,
    );
    assert!(carousel.on_frame(t0 + Duration::from_millis(200)).is_none());
    assert!(carousel.on_frame(t0 + Duration::from_millis(400)).is_some());
    assert_eq!(carousel.active_index(), 2);

    carousel.navigate(
        TransitionRequest {
            to: 3,
            direction: Direction::Forward,
            speed: None,
        },
        t0,
    );
    assert!(!carousel.is_animating(), "out of range request ignored");
}

#[test]
fn single_slide_carousel_stays_passive() {
    let t0 = Instant::now();
    for count in [0, 1] {
        let mut carousel = carousel(count, config(TransitionEffect::Slide, true), t0);
        assert!(!carousel.is_staged());
        assert!(!carousel.is_playing());
        assert_eq!(carousel.scheduler().pending(), 0);
        carousel.next(t0);
        carousel.previous(t0);
        carousel.goto_slide(0, t0);
        carousel.play(t0);
        assert!(!carousel.is_animating());
        assert_eq!(carousel.scheduler().pending(), 0);
        assert_eq!(carousel.stage().visible_slides(), (0..count).collect::<Vec<_>>());
    }
}

#[test]
fn autoplay_arms_one_timer_at_construction() {
    let t0 = Instant::now();
    let carousel = carousel(3, config(TransitionEffect::Slide, true), t0);
    assert!(carousel.is_playing());
    let scheduler = carousel.scheduler();
    assert_eq!(scheduler.pending(), 1);
    let (_, at) = scheduler.next_deadline().unwrap();
    assert_eq!(at, t0 + Duration::from_millis(4000));
}

#[test]
fn autoplay_advances_once_per_interval() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, true), t0);

    carousel.fire_due_timers(t0 + Duration::from_millis(3999));
    assert!(!carousel.is_animating());

    let tick = t0 + Duration::from_millis(4000);
    carousel.fire_due_timers(tick);
    assert!(carousel.is_animating());
    assert_eq!(carousel.scheduler().pending(), 1, "next tick re-armed");
    let (_, at) = carousel.scheduler().next_deadline().unwrap();
    assert_eq!(at, tick + Duration::from_millis(4000));

    let (done, change) = settle(&mut carousel, tick);
    assert_eq!(change, SlideChanged { from: 0, to: 1 });
    carousel.fire_due_timers(done);
    assert!(!carousel.is_animating());

    carousel.fire_due_timers(tick + Duration::from_millis(4000));
    assert!(carousel.is_animating());
    settle(&mut carousel, tick + Duration::from_millis(4000));
    assert_eq!(carousel.active_index(), 2);
}

#[test]
fn play_and_pause_never_stack_timers() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, true), t0);

    carousel.play(t0);
    carousel.play(t0 + Duration::from_millis(10));
    assert_eq!(carousel.scheduler().pending(), 1);

    carousel.pause();
    carousel.pause();
    assert_eq!(carousel.scheduler().pending(), 0);
    assert!(!carousel.is_playing());

    carousel.play(t0);
    assert_eq!(carousel.scheduler().pending(), 1);

    carousel.handle(CarouselEvent::Command(Command::Pause), t0);
    assert_eq!(carousel.scheduler().pending(), 0);
    carousel.handle(CarouselEvent::Command(Command::Play), t0);
    assert_eq!(carousel.scheduler().pending(), 1);
}

#[test]
fn stale_autoplay_expiry_is_ignored() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, true), t0);
    let (first, _) = carousel.scheduler().next_deadline().unwrap();

    carousel.play(t0 + Duration::from_millis(10));
    let (second, at) = carousel.scheduler().next_deadline().unwrap();
    assert_ne!(first, second);

    let expired = t0 + Duration::from_millis(4000);
    carousel.handle(CarouselEvent::AutoplayElapsed(first), expired);
    assert!(!carousel.is_animating());
    assert_eq!(carousel.active_index(), 0);
    assert_eq!(carousel.scheduler().pending(), 1);
    assert_eq!(carousel.scheduler().next_deadline(), Some((second, at)));
    assert_eq!(at, t0 + Duration::from_millis(4010));
}

#[test]
fn manual_navigation_restarts_the_autoplay_countdown() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, true), t0);

    let click = t0 + Duration::from_millis(3000);
    carousel.next(click);
    let (_, at) = carousel.scheduler().next_deadline().unwrap();
    assert_eq!(at, click + Duration::from_millis(4000));

    // A dropped request still re-arms the countdown.
    let dropped = click + Duration::from_millis(10);
    carousel.previous(dropped);
    assert_eq!(carousel.scheduler().pending(), 1);
    let (_, at) = carousel.scheduler().next_deadline().unwrap();
    assert_eq!(at, dropped + Duration::from_millis(4000));
}

#[test]
fn pause_does_not_abort_in_flight_transition() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Fade, true), t0);
    carousel.next(t0);
    carousel.pause();
    assert!(carousel.is_animating());
    let (_, change) = settle(&mut carousel, t0);
    assert_eq!(change.to, 1);
    assert!(!carousel.is_playing());
}

#[test]
fn autoplay_disabled_never_schedules() {
    let t0 = Instant::now();
    let mut carousel = carousel(3, config(TransitionEffect::Slide, false), t0);
    carousel.play(t0);
    carousel.next(t0);
    assert_eq!(carousel.scheduler().pending(), 0);
}
