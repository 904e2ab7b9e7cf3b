use nextkey_types::{Clock, ManualClock, SystemClock};

#[test]
fn manual_clock_is_controllable() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now(), 1_000);
    clock.advance(3_601);
    assert_eq!(clock.now(), 4_601);
    clock.set(10);
    assert_eq!(clock.now(), 10);
}

#[test]
fn system_clock_tracks_wall_time() {
    let now = SystemClock.now();
    // 2020-01-01
    assert!(now > 1_577_836_800);
}

#[test]
fn clock_is_object_safe() {
    let clock: Box<dyn Clock> = Box::new(ManualClock::new(5));
    assert_eq!(clock.now(), 5);
}
