// ==========================================
// Warsztat Menager - 车间视图控制器
// ==========================================
// 职责: 编辑模式、拖动吸附、增删机器、故障机器派修动画
// 执行: 全部操作运行在宿主 GUI 的协作式事件循环上
// 红线: 动画器不持有控制器；状态变更通过 on_finish 闭包完成
// 红线: 故障 → 维修 的状态变更只在最后一个动画步骤之后可见
// ==========================================

use crate::config::HallConfig;
use crate::domain::hall::{Hall, Machine, Point, Wall};
use crate::domain::types::{EditMode, MachineStatus};
use crate::engine::animator::RouteAnimator;
use crate::engine::host::{HallView, HostScheduler};
use crate::engine::path_planner::PathPlanner;
use crate::i18n::{t, t_with_args};
use crate::repository::MachineStore;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// 技术员标记名前缀（每台故障机器一个标记）
pub const SERVICE_MARKER_PREFIX: &str = "serwisant";

/// 点选命中半径（像素）
pub const HIT_RADIUS_PX: i32 = 5;

// ==========================================
// HallController
// ==========================================
pub struct HallController {
    config: HallConfig,
    machines: Rc<RefCell<Vec<Machine>>>,
    halls: Vec<Hall>,
    walls: Vec<Wall>,
    active_hall: Option<String>,
    mode: EditMode,
    selected: Option<String>,
    dragging: Option<String>,
    planner: PathPlanner,
    scheduler: Rc<dyn HostScheduler>,
    animators: HashMap<String, RouteAnimator>,
    view: Rc<dyn HallView>,
    store: Option<MachineStore>,
}

impl HallController {
    /// 构造函数
    ///
    /// # 参数
    /// - config: 车间配置快照
    /// - machines: 初始机器列表
    /// - walls: 墙体（路径规划障碍）
    /// - scheduler: 宿主延时调度
    /// - view: 宿主画布
    pub fn new(
        config: HallConfig,
        machines: Vec<Machine>,
        walls: Vec<Wall>,
        scheduler: Rc<dyn HostScheduler>,
        view: Rc<dyn HallView>,
    ) -> Self {
        let planner = PathPlanner::new(config.route_step_px, config.search_margin_steps);
        Self {
            config,
            machines: Rc::new(RefCell::new(machines)),
            halls: Vec::new(),
            walls,
            active_hall: None,
            mode: EditMode::default(),
            selected: None,
            dragging: None,
            planner,
            scheduler,
            animators: HashMap::new(),
            view,
            store: None,
        }
    }

    /// 启用持久化：拖放、删除、维修完成后写回机器文件
    pub fn with_store(mut self, store: MachineStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_halls(mut self, halls: Vec<Hall>) -> Self {
        self.halls = halls;
        self
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn config(&self) -> &HallConfig {
        &self.config
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn halls(&self) -> &[Hall] {
        &self.halls
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn active_hall(&self) -> Option<&str> {
        self.active_hall.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// 机器列表快照
    pub fn machines(&self) -> Vec<Machine> {
        self.machines.borrow().clone()
    }

    pub fn machine(&self, id: &str) -> Option<Machine> {
        self.machines.borrow().iter().find(|m| m.id == id).cloned()
    }

    /// 是否有派修动画在进行
    pub fn is_animating(&self) -> bool {
        self.animators.values().any(RouteAnimator::is_running)
    }

    // ==========================================
    // 模式与车间
    // ==========================================

    pub fn set_mode(&mut self, mode: EditMode) {
        if mode != EditMode::Move {
            self.dragging = None;
        }
        tracing::debug!(from = %self.mode, to = %mode, "切换编辑模式");
        self.mode = mode;
    }

    /// 设置当前显示的车间（None 显示全部）
    pub fn set_active_hall(&mut self, hala: Option<String>) {
        self.active_hall = hala.filter(|h| !h.trim().is_empty());
        self.dragging = None;
        self.view.refresh();
    }

    /// 点选命中测试：当前车间内距离 (x, y) 最近且在 5px 内的机器
    pub fn machine_at(&self, x: i32, y: i32) -> Option<String> {
        let radius_sq = i64::from(HIT_RADIUS_PX) * i64::from(HIT_RADIUS_PX);
        self.machines
            .borrow()
            .iter()
            .filter(|m| m.in_hall(self.active_hall.as_deref()))
            .map(|m| {
                let dx = i64::from(m.pozycja.x) - i64::from(x);
                let dy = i64::from(m.pozycja.y) - i64::from(y);
                (dx * dx + dy * dy, m)
            })
            .filter(|(dist, _)| *dist <= radius_sq)
            .min_by_key(|(dist, _)| *dist)
            .map(|(_, m)| m.id.clone())
    }

    // ==========================================
    // 鼠标交互
    // ==========================================

    /// 点击机器
    ///
    /// - move: 开始拖动
    /// - delete: 删除
    /// - select: 选中
    /// - add: 忽略（新增通过 place_machine）
    pub fn on_click(&mut self, item_id: &str) {
        if self.machine(item_id).is_none() {
            tracing::debug!(machine_id = %item_id, "点击的对象不是机器，忽略");
            return;
        }
        match self.mode {
            EditMode::Move => {
                tracing::debug!(machine_id = %item_id, "开始拖动");
                self.dragging = Some(item_id.to_string());
            }
            EditMode::Delete => {
                self.delete_machine(item_id);
            }
            EditMode::Select => {
                self.selected = Some(item_id.to_string());
            }
            EditMode::Add => {}
        }
    }

    /// 拖动中：更新机器位置（按 drag_snap_px 吸附）
    ///
    /// # 返回
    /// 吸附后的新位置；未处于拖动状态时为 None
    pub fn on_drag(&mut self, x: i32, y: i32) -> Option<Point> {
        let id = self.dragging.clone()?;
        let position = self.snap(Point::new(x, y));
        {
            let mut machines = self.machines.borrow_mut();
            let machine = machines.iter_mut().find(|m| m.id == id)?;
            machine.pozycja = position;
        }
        if let Err(e) = self.view.move_marker(&id, position) {
            tracing::warn!(machine_id = %id, error = %e, "画布标记移动失败");
        }
        Some(position)
    }

    /// 拖动结束
    pub fn on_drop(&mut self) {
        if let Some(id) = self.dragging.take() {
            tracing::info!(machine_id = %id, "机器位置已更新");
            self.persist();
        }
    }

    /// 在 add 模式下放置新机器（状态 sprawna，位置吸附）
    ///
    /// # 返回
    /// 放置位置；模式不符、id 为空或重复时为 None（状态栏提示）
    pub fn place_machine(&mut self, id: &str, x: i32, y: i32) -> Option<Point> {
        if self.mode != EditMode::Add {
            return None;
        }
        let id = id.trim();
        if id.is_empty() {
            self.view.show_status(&t("hall.empty_id"));
            return None;
        }
        if self.machine(id).is_some() {
            self.view
                .show_status(&t_with_args("hall.duplicate_id", &[("id", id)]));
            return None;
        }

        let position = self.snap(Point::new(x, y));
        let mut machine = Machine::new(id, position, MachineStatus::Sprawna);
        machine.hala = self.active_hall.clone();
        self.machines.borrow_mut().push(machine);

        tracing::info!(machine_id = %id, %position, "新增机器");
        self.view.refresh();
        self.persist();
        Some(position)
    }

    /// 删除机器（同时取消其派修动画）
    pub fn delete_machine(&mut self, id: &str) -> bool {
        let removed = {
            let mut machines = self.machines.borrow_mut();
            let before = machines.len();
            machines.retain(|m| m.id != id);
            machines.len() != before
        };
        if !removed {
            return false;
        }
        if let Some(animator) = self.animators.remove(id) {
            animator.cancel_all();
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.dragging.as_deref() == Some(id) {
            self.dragging = None;
        }

        tracing::info!(machine_id = %id, "删除机器");
        self.view
            .show_status(&t_with_args("hall.machine_deleted", &[("id", id)]));
        self.view.refresh();
        self.persist();
        true
    }

    // ==========================================
    // 故障派修
    // ==========================================

    /// 为每台故障机器规划技术员路线并播放动画
    ///
    /// 路线在以 0 为原点、间距 route_step_px 的网格上搜索（与墙体栅格一致）；
    /// 服务点与机器不在网格上时，真实位置作为首尾附加点。
    /// 每台机器只受其所在车间的墙体（以及未指定车间的墙体）阻挡。
    /// 动画结束时机器状态变为 serwis 并刷新 status_since；
    /// 不可达的机器保持 awaria，并在状态栏提示。
    ///
    /// # 返回
    /// 启动的动画数量
    pub fn handle_failures(&mut self) -> usize {
        let step = self.planner.step();

        let failed: Vec<(String, Point, Option<String>)> = self
            .machines
            .borrow()
            .iter()
            .filter(|m| m.status == MachineStatus::Awaria)
            .map(|m| (m.id.clone(), m.pozycja, m.hala.clone()))
            .collect();

        let origin = self.config.service_point;
        let start = lattice_cell(origin, step);
        let mut blocked_by_hall: HashMap<Option<String>, HashSet<Point>> = HashMap::new();
        let mut started = 0;

        for (id, position, hala) in failed {
            let blocked = blocked_by_hall
                .entry(hala.clone())
                .or_insert_with(|| blocked_cells_for_hall(&self.walls, hala.as_deref(), step));

            let goal = lattice_cell(position, step);
            let Some(lattice_route) = self.planner.find(start, goal, blocked) else {
                tracing::warn!(machine_id = %id, hala = ?hala, %origin, %position, "技术员无法到达故障机器，保持 awaria");
                self.view
                    .show_status(&t_with_args("hall.no_route", &[("id", &id)]));
                continue;
            };

            let mut route = Vec::with_capacity(lattice_route.len() + 2);
            if origin != start {
                route.push(origin);
            }
            route.extend(lattice_route);
            if position != goal {
                route.push(position);
            }

            let scheduler = Rc::clone(&self.scheduler);
            let animator = self
                .animators
                .entry(id.clone())
                .or_insert_with(|| RouteAnimator::new(scheduler));
            let marker = format!("{}:{}", SERVICE_MARKER_PREFIX, id);
            let move_view = Rc::clone(&self.view);
            let move_fn = move |p: Point| move_view.move_marker(&marker, p);
            let on_finish = service_finisher(
                id.clone(),
                Rc::clone(&self.machines),
                Rc::clone(&self.view),
                self.store.clone(),
            );

            tracing::info!(machine_id = %id, steps = route.len(), "派出技术员");
            animator.animate(route, move_fn, self.config.anim_interval_ms, Some(on_finish));
            started += 1;
        }
        started
    }

    /// 取消全部派修动画（已完成的步骤不回滚）
    pub fn cancel_all(&self) {
        for animator in self.animators.values() {
            animator.cancel_all();
        }
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn snap(&self, p: Point) -> Point {
        let grid = self.config.drag_snap_px;
        Point::new(snap_value(p.x, grid), snap_value(p.y, grid))
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            save_machines(store, &self.machines.borrow(), self.view.as_ref());
        }
    }
}

/// 派修动画结束回调
fn service_finisher(
    id: String,
    machines: Rc<RefCell<Vec<Machine>>>,
    view: Rc<dyn HallView>,
    store: Option<MachineStore>,
) -> Box<dyn FnOnce()> {
    Box::new(move || {
        let changed = {
            let mut list = machines.borrow_mut();
            match list.iter_mut().find(|m| m.id == id) {
                Some(machine) => machine.apply_status(MachineStatus::Serwis),
                None => {
                    tracing::debug!(machine_id = %id, "派修完成时机器已不存在");
                    return;
                }
            }
        };
        tracing::info!(machine_id = %id, changed, "技术员到达，机器进入 serwis");
        view.refresh();
        view.show_status(&t_with_args("hall.service_started", &[("id", &id)]));
        if let Some(store) = &store {
            save_machines(store, &machines.borrow(), view.as_ref());
        }
    })
}

fn save_machines(store: &MachineStore, machines: &[Machine], view: &dyn HallView) {
    if let Err(e) = store.save(machines) {
        tracing::error!(path = %store.primary_path().display(), error = %e, "机器文件保存失败");
        view.show_status(&t_with_args("hall.save_failed", &[("error", &e.to_string())]));
    }
}

/// 吸附到 grid 的整数倍（四舍五入，远离 0）；grid <= 0 时不吸附
pub fn snap_value(value: i32, grid: i32) -> i32 {
    if grid <= 0 {
        return value;
    }
    let snapped = (f64::from(value) / f64::from(grid)).round() * f64::from(grid);
    snapped as i32
}

/// 点所在的网格格子（向下取整到 step 的整数倍，与 Wall::blocked_cells 一致）
fn lattice_cell(p: Point, step: i32) -> Point {
    if step <= 0 {
        return p;
    }
    Point::new(p.x.div_euclid(step) * step, p.y.div_euclid(step) * step)
}

/// 某车间机器的阻挡格子: 该车间的墙体 + 未指定车间的墙体
fn blocked_cells_for_hall(walls: &[Wall], hala: Option<&str>, step: i32) -> HashSet<Point> {
    walls
        .iter()
        .filter(|w| w.hala.is_none() || w.hala.as_deref() == hala)
        .flat_map(|w| w.blocked_cells(step))
        .collect()
}
