use super::*;

#[test]
fn animation_ends_exactly_on_final_tick() {
    for kind in [
        AnimationKind::MoveForward,
        AnimationKind::TurnLeft,
        AnimationKind::SwingRightTool,
        AnimationKind::Wait,
    ] {
        let mut controller = AnimationController::default();
        controller.begin(kind);
        assert!(controller.is_animating());
        let results: Vec<bool> = (0..controller.duration()).map(|_| controller.tick()).collect();
        let finished = results.iter().filter(|running| !**running).count();
        assert_eq!(finished, 1, "{kind:?}");
        assert_eq!(results.last(), Some(&false));
        assert!(!controller.is_animating());
        assert_eq!(controller.kind(), AnimationKind::None);
        assert_eq!(controller.progress(), 0);
    }
}

#[test]
fn short_wait_starts_half_way() {
    let mut controller = AnimationController::with_duration(8);
    controller.begin(AnimationKind::ShortWait);
    assert_eq!(controller.progress(), 4);
    assert!(controller.tick());
    assert!(controller.tick());
    assert!(controller.tick());
    assert!(!controller.tick());
}

#[test]
fn progress_is_monotonic_and_reported_as_fraction() {
    let mut controller = AnimationController::with_duration(8);
    assert_eq!(controller.snapshot().fraction, 0.0);
    controller.begin(AnimationKind::MoveUp);

    let mut last = controller.progress();
    for _ in 0..3 {
        controller.tick();
        assert!(controller.progress() > last);
        last = controller.progress();
    }
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.kind, AnimationKind::MoveUp);
    assert!((snapshot.fraction - 0.375).abs() < f32::EPSILON);
}

#[test]
fn tick_while_idle_reports_not_animating() {
    let mut controller = AnimationController::default();
    assert!(!controller.tick());
    assert_eq!(controller.progress(), 0);
}

#[test]
fn movement_kinds_are_classified() {
    assert!(AnimationKind::MoveDown.is_movement());
    assert!(!AnimationKind::TurnRight.is_movement());
    assert!(!AnimationKind::None.is_movement());
    assert_eq!(AnimationKind::SwingLeftTool.as_str(), "swing_left_tool");
}
