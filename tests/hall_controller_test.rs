// ==========================================
// 车间视图控制器集成测试
// ==========================================
// 覆盖: 拖动吸附、故障派修动画、不可达机器、持久化
// ==========================================

mod helpers;
mod test_helpers;

use helpers::machine_builder::{wall, MachineBuilder};
use helpers::recording_view::RecordingView;
use std::rc::Rc;
use warsztat_menager::app::AppState;
use warsztat_menager::config::HallConfig;
use warsztat_menager::domain::hall::{Machine, Point, Wall};
use warsztat_menager::domain::types::{EditMode, MachineStatus};
use warsztat_menager::engine::host::ManualScheduler;
use warsztat_menager::engine::HallController;
use warsztat_menager::repository::MachineStore;

fn config(step: i32) -> HallConfig {
    HallConfig {
        route_step_px: step,
        anim_interval_ms: 10,
        service_point: Point::new(0, 0),
        ..HallConfig::default()
    }
}

fn setup(
    config: HallConfig,
    machines: Vec<Machine>,
    walls: Vec<Wall>,
) -> (Rc<ManualScheduler>, Rc<RecordingView>, HallController) {
    warsztat_menager::logging::init_test();
    let sched = Rc::new(ManualScheduler::new());
    let view = Rc::new(RecordingView::new());
    let ctl = HallController::new(config, machines, walls, sched.clone(), view.clone());
    (sched, view, ctl)
}

// ==========================================
// 拖动吸附
// ==========================================

#[test]
fn test_drag_snaps_to_grid() {
    let cfg = HallConfig {
        drag_snap_px: 10,
        ..HallConfig::default()
    };
    let (_sched, view, mut ctl) = setup(cfg, vec![MachineBuilder::new("1").at(0, 0).build()], Vec::new());

    ctl.set_mode(EditMode::Move);
    ctl.on_click("1");
    assert_eq!(ctl.on_drag(12, 17), Some(Point::new(10, 20)));
    assert_eq!(view.path_of("1"), vec![Point::new(10, 20)]);

    for (x, y) in [(3, 4), (-7, 26), (149, 151)] {
        let p = ctl.on_drag(x, y).expect("拖动中应返回位置");
        assert_eq!(p.x.rem_euclid(10), 0, "x 未吸附: {:?}", p);
        assert_eq!(p.y.rem_euclid(10), 0, "y 未吸附: {:?}", p);
    }

    ctl.on_drop();
    assert_eq!(ctl.dragging(), None);
    assert_eq!(ctl.on_drag(50, 50), None);
}

#[test]
fn test_leaving_move_mode_cancels_drag() {
    let (_sched, _view, mut ctl) = setup(
        HallConfig::default(),
        vec![MachineBuilder::new("1").at(0, 0).build()],
        Vec::new(),
    );
    ctl.set_mode(EditMode::Move);
    ctl.on_click("1");
    assert_eq!(ctl.dragging(), Some("1"));

    ctl.set_mode(EditMode::Select);
    assert_eq!(ctl.dragging(), None);
    ctl.on_click("1");
    assert_eq!(ctl.selected(), Some("1"));
}

// ==========================================
// 故障派修
// ==========================================

#[test]
fn test_failure_route_then_serwis() {
    let machines = vec![
        MachineBuilder::new("1").at(40, 40).build(),
        MachineBuilder::new("2").at(16, 8).failed().build(),
    ];
    let walls = vec![wall(8, 0, 8, 4)];
    let (sched, view, mut ctl) = setup(config(4), machines, walls);

    assert_eq!(ctl.handle_failures(), 1);
    assert!(ctl.is_animating());

    // 最后一步之前状态仍为 awaria
    sched.advance(10);
    assert_eq!(ctl.machine("2").unwrap().status, MachineStatus::Awaria);
    assert_eq!(view.path_of("serwisant:2").len(), 2);

    sched.run_until_idle();
    let path = view.path_of("serwisant:2");
    assert_eq!(path.first(), Some(&Point::new(0, 0)));
    assert_eq!(path.last(), Some(&Point::new(16, 8)));
    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan(&pair[1]), 4, "非相邻步: {:?}", pair);
    }
    assert!(!path.contains(&Point::new(8, 0)));
    assert!(!path.contains(&Point::new(8, 4)));

    let repaired = ctl.machine("2").unwrap();
    assert_eq!(repaired.status, MachineStatus::Serwis);
    let before = MachineBuilder::new("x").build().status_since;
    assert!(repaired.status_since > before, "status_since 应刷新");

    assert_eq!(ctl.machine("1").unwrap().status, MachineStatus::Sprawna);
    assert!(!ctl.is_animating());
    assert!(view.refreshes.get() >= 1);
}

#[test]
fn test_off_grid_machine_gets_final_waypoint() {
    let machines = vec![MachineBuilder::new("7").at(13, 6).failed().build()];
    let (sched, view, mut ctl) = setup(config(4), machines, Vec::new());

    ctl.handle_failures();
    sched.run_until_idle();

    let path = view.path_of("serwisant:7");
    assert_eq!(path.last(), Some(&Point::new(13, 6)));
    assert_eq!(path[path.len() - 2], Point::new(12, 4));
    assert_eq!(ctl.machine("7").unwrap().status, MachineStatus::Serwis);
}

#[test]
fn test_off_grid_service_point_respects_walls() {
    let cfg = HallConfig {
        service_point: Point::new(2, 2),
        ..config(4)
    };
    let machines = vec![MachineBuilder::new("5").at(18, 2).failed().build()];
    let walls = vec![wall(8, -40, 8, 40)];
    let (sched, view, mut ctl) = setup(cfg, machines, walls);

    assert_eq!(ctl.handle_failures(), 1);
    sched.run_until_idle();

    let path = view.path_of("serwisant:5");
    assert_eq!(path.first(), Some(&Point::new(2, 2)));
    assert_eq!(path.last(), Some(&Point::new(18, 2)));
    assert_eq!(path[1], Point::new(0, 0));
    assert!(
        path.iter().all(|p| !(p.x == 8 && (-40..=40).contains(&p.y))),
        "技术员穿过了 x=8 的墙: {:?}",
        path
    );
    // 首尾附加点之间全部是相邻网格点
    for pair in path[1..path.len() - 1].windows(2) {
        assert_eq!(pair[0].manhattan(&pair[1]), 4, "非相邻步: {:?}", pair);
    }
    assert_eq!(ctl.machine("5").unwrap().status, MachineStatus::Serwis);
}

#[test]
fn test_walls_follow_machine_hall_not_active_hall() {
    let mut hall2_wall = wall(8, -40, 8, 40);
    hall2_wall.hala = Some("2".to_string());
    let mut hall1_wall = wall(0, 8, 40, 8);
    hall1_wall.hala = Some("1".to_string());

    let machines = vec![MachineBuilder::new("6").hala("2").at(16, 0).failed().build()];
    let (sched, view, mut ctl) = setup(config(4), machines, vec![hall2_wall, hall1_wall]);
    ctl.set_active_hall(Some("1".to_string()));

    assert_eq!(ctl.handle_failures(), 1);
    sched.run_until_idle();

    let path = view.path_of("serwisant:6");
    assert_eq!(path.last(), Some(&Point::new(16, 0)));
    assert!(!path.contains(&Point::new(8, 0)), "穿过了 2 号车间的墙: {:?}", path);
    assert!(
        path.iter().all(|p| !(p.x == 8 && (-40..=40).contains(&p.y))),
        "穿过了 2 号车间的墙: {:?}",
        path
    );
    assert_eq!(ctl.machine("6").unwrap().status, MachineStatus::Serwis);
}

#[test]
fn test_unreachable_machine_stays_failed() {
    // 机器 (40, 40) 四周被墙围住
    let walls = vec![
        wall(36, 36, 44, 36),
        wall(36, 44, 44, 44),
        wall(36, 36, 36, 44),
        wall(44, 36, 44, 44),
    ];
    let machines = vec![MachineBuilder::new("3").at(40, 40).failed().build()];
    let (sched, view, mut ctl) = setup(config(4), machines, walls);

    assert_eq!(ctl.handle_failures(), 0);
    sched.run_until_idle();

    assert_eq!(ctl.machine("3").unwrap().status, MachineStatus::Awaria);
    assert!(view.path_of("serwisant:3").is_empty());
    let statuses = view.statuses.borrow();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].contains('3'), "状态栏应包含机器 id: {}", statuses[0]);
}

#[test]
fn test_delete_cancels_service_animation() {
    let machines = vec![MachineBuilder::new("2").at(40, 0).failed().build()];
    let (sched, view, mut ctl) = setup(config(4), machines, Vec::new());

    ctl.handle_failures();
    sched.advance(0);
    assert_eq!(view.path_of("serwisant:2").len(), 1);

    ctl.set_mode(EditMode::Delete);
    ctl.on_click("2");
    sched.run_until_idle();

    assert!(ctl.machine("2").is_none());
    assert_eq!(view.path_of("serwisant:2").len(), 1);
    assert!(!ctl.is_animating());
}

#[test]
fn test_cancel_all_keeps_failed_status() {
    let machines = vec![MachineBuilder::new("2").at(40, 0).failed().build()];
    let (sched, _view, mut ctl) = setup(config(4), machines, Vec::new());

    ctl.handle_failures();
    ctl.cancel_all();
    sched.run_until_idle();
    assert_eq!(ctl.machine("2").unwrap().status, MachineStatus::Awaria);
}

#[test]
fn test_place_machine_messages() {
    let (_sched, view, mut ctl) = setup(HallConfig::default(), Vec::new(), Vec::new());
    ctl.set_mode(EditMode::Add);
    ctl.set_active_hall(Some("1".to_string()));

    assert_eq!(ctl.place_machine("  ", 0, 0), None);
    assert_eq!(ctl.place_machine("5", 21, 30), Some(Point::new(20, 32)));
    assert_eq!(ctl.place_machine("5", 0, 0), None);
    assert_eq!(view.statuses.borrow().len(), 2);

    let m = ctl.machine("5").unwrap();
    assert_eq!(m.hala.as_deref(), Some("1"));
    assert_eq!(m.status, MachineStatus::Sprawna);
}

// ==========================================
// 持久化（样例数据目录）
// ==========================================

#[test]
fn test_fixture_service_persists_to_disk() {
    let dir = test_helpers::copy_fixture();
    let state = AppState::new(dir.path()).expect("样例数据加载失败");

    let sched = Rc::new(ManualScheduler::new());
    let view = Rc::new(RecordingView::new());
    let mut ctl = state.hall_controller(sched.clone(), view.clone());

    let ids: Vec<String> = ctl.machines().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["1", "2", "10"]);
    assert_eq!(ctl.halls().len(), 1);

    assert_eq!(ctl.handle_failures(), 1);
    sched.run_until_idle();

    let path = view.path_of("serwisant:2");
    assert_eq!(path.last(), Some(&Point::new(200, 80)));
    assert!(
        path.iter().all(|p| !(p.x == 120 && (0..=160).contains(&p.y))),
        "路线穿过了墙"
    );

    let saved = MachineStore::new(dir.path()).load(state.config.hall.machine_source);
    let m2 = saved.machines.iter().find(|m| m.id == "2").unwrap();
    assert_eq!(m2.status, MachineStatus::Serwis);
    assert_eq!(m2.nazwa.as_deref(), Some("Spawarka MIG"));
}

#[test]
fn test_fixture_drag_persists_position() {
    let dir = test_helpers::copy_fixture();
    let state = AppState::new(dir.path()).unwrap();
    let mut ctl = state.hall_controller(
        Rc::new(ManualScheduler::new()),
        Rc::new(RecordingView::new()),
    );

    ctl.set_mode(EditMode::Move);
    ctl.on_click("1");
    ctl.on_drag(81, 123);
    ctl.on_drop();

    let saved = test_helpers::read_json(&dir.path().join("maszyny.json"));
    let rows = saved.as_array().expect("主文件应为列表");
    let m1 = rows.iter().find(|r| r["id"] == "1").unwrap();
    assert_eq!(m1["pozycja"]["x"], 80);
    assert_eq!(m1["pozycja"]["y"], 124);
}
