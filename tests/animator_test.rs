// ==========================================
// 路线动画集成测试
// ==========================================
// 使用 ManualScheduler（虚拟时钟）驱动
// ==========================================

use std::cell::RefCell;
use std::rc::Rc;
use warsztat_menager::domain::hall::Point;
use warsztat_menager::engine::host::ManualScheduler;
use warsztat_menager::engine::RouteAnimator;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Move(Point),
    Finish,
}

struct Harness {
    sched: Rc<ManualScheduler>,
    animator: RouteAnimator,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Harness {
    fn new() -> Self {
        let sched = Rc::new(ManualScheduler::new());
        Self {
            animator: RouteAnimator::new(sched.clone()),
            sched,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn animate(&self, route: Vec<Point>, delay_ms: u64) -> usize {
        let moves = self.calls.clone();
        let finish = self.calls.clone();
        self.animator.animate(
            route,
            move |p| {
                moves.borrow_mut().push(Call::Move(p));
                Ok(())
            },
            delay_ms,
            Some(Box::new(move || finish.borrow_mut().push(Call::Finish))),
        )
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

fn route3() -> Vec<Point> {
    vec![Point::new(0, 0), Point::new(4, 0), Point::new(8, 0)]
}

#[test]
fn test_moves_then_finish_in_order() {
    let h = Harness::new();
    assert_eq!(h.animate(route3(), 10), 3);

    h.sched.run_until_idle();
    assert_eq!(
        h.calls(),
        vec![
            Call::Move(Point::new(0, 0)),
            Call::Move(Point::new(4, 0)),
            Call::Move(Point::new(8, 0)),
            Call::Finish,
        ]
    );
}

#[test]
fn test_cancel_before_first_tick() {
    let h = Harness::new();
    h.animate(route3(), 10);
    h.animator.cancel_all();

    h.sched.run_until_idle();
    assert!(h.calls().is_empty());
    assert_eq!(h.sched.pending_count(), 0);
}

#[test]
fn test_cancel_midway_keeps_fired_steps() {
    let h = Harness::new();
    h.animate(route3(), 10);

    h.sched.advance(10);
    assert_eq!(h.calls().len(), 2);

    h.animator.cancel_all();
    h.sched.run_until_idle();
    assert_eq!(
        h.calls(),
        vec![Call::Move(Point::new(0, 0)), Call::Move(Point::new(4, 0))]
    );
}

#[test]
fn test_cancel_all_twice_is_noop() {
    let h = Harness::new();
    h.animate(route3(), 10);
    h.animator.cancel_all();
    h.animator.cancel_all();
    assert!(!h.animator.is_running());

    // 取消后仍可重新调度
    h.animate(vec![Point::new(1, 1)], 10);
    h.sched.run_until_idle();
    assert_eq!(h.calls(), vec![Call::Move(Point::new(1, 1)), Call::Finish]);
}

#[test]
fn test_second_animate_replaces_first() {
    let h = Harness::new();
    h.animate(route3(), 10);
    h.animate(vec![Point::new(40, 40), Point::new(44, 40)], 10);

    h.sched.run_until_idle();
    assert_eq!(
        h.calls(),
        vec![
            Call::Move(Point::new(40, 40)),
            Call::Move(Point::new(44, 40)),
            Call::Finish,
        ]
    );
}

#[test]
fn test_restart_while_running_does_not_interleave() {
    let h = Harness::new();
    h.animate(route3(), 10);
    h.sched.advance(0);
    assert_eq!(h.calls(), vec![Call::Move(Point::new(0, 0))]);

    h.animate(vec![Point::new(100, 0)], 10);
    h.sched.run_until_idle();
    assert_eq!(
        h.calls(),
        vec![Call::Move(Point::new(0, 0)), Call::Move(Point::new(100, 0)), Call::Finish]
    );
}

#[test]
fn test_lazy_route_iterator() {
    let h = Harness::new();
    let route = (0..4).map(|i| Point::new(i * 4, 0));
    let moves = h.calls.clone();
    let n = h.animator.animate(
        route,
        move |p| {
            moves.borrow_mut().push(Call::Move(p));
            Ok(())
        },
        5,
        None,
    );
    assert_eq!(n, 4);

    h.sched.advance(15);
    assert_eq!(h.calls().len(), 4);
    assert_eq!(h.sched.now(), 15);
}

#[test]
fn test_empty_route_no_finish() {
    let h = Harness::new();
    assert_eq!(h.animate(Vec::new(), 10), 0);
    h.sched.run_until_idle();
    assert!(h.calls().is_empty());
}
