// ==========================================
// Warsztat Menager - 路径规划 (A*)
// ==========================================
// 网格: 隐式 4 邻接，节点间距 step 像素
// 代价: 每条边 step；启发: 曼哈顿距离（与代价同单位，可采纳）
// 同 f 值: 先入队者先出（序号保证稳定）
// 搜索范围: start ∪ goal ∪ walls 的包围盒向外扩 margin_steps 格
// ==========================================

use crate::domain::hall::{Point, Route};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

pub const DEFAULT_STEP: i32 = 4;
pub const DEFAULT_MARGIN_STEPS: i32 = 16;

/// 搜索边界（闭区间，像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl Bounds {
    fn around<'a>(points: impl Iterator<Item = &'a Point>, margin: i64) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for p in points {
            let (x, y) = (i64::from(p.x), i64::from(p.y));
            bounds = Some(match bounds {
                None => Bounds { min_x: x, min_y: y, max_x: x, max_y: y },
                Some(b) => Bounds {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        }
        bounds.map(|b| Bounds {
            min_x: b.min_x - margin,
            min_y: b.min_y - margin,
            max_x: b.max_x + margin,
            max_y: b.max_y + margin,
        })
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

// ==========================================
// PathPlanner - A* 路径规划
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPlanner {
    step: i32,
    margin_steps: i32,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_STEP, DEFAULT_MARGIN_STEPS)
    }
}

impl PathPlanner {
    /// # 参数
    /// - step: 网格间距（像素），<= 0 时所有查询返回 None
    /// - margin_steps: 包围盒外扩格数（负值按 0）
    pub fn new(step: i32, margin_steps: i32) -> Self {
        Self {
            step,
            margin_steps: margin_steps.max(0),
        }
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// 查找从 start 到 goal 的最短路径
    ///
    /// # 参数
    /// - walls: 被阻挡的网格点（start / goal 本身不受阻挡）
    ///
    /// # 返回
    /// - Some(route): 首元素为 start，末元素为 goal，相邻点恰在一个轴上相差 step
    /// - None: 不可达、goal 不在以 start 为原点的网格上、或 step 非法
    pub fn find(&self, start: Point, goal: Point, walls: &HashSet<Point>) -> Option<Route> {
        if self.step <= 0 {
            tracing::warn!(step = self.step, "路径规划步长非法");
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let step = i64::from(self.step);
        let (dx, dy) = (
            i64::from(goal.x) - i64::from(start.x),
            i64::from(goal.y) - i64::from(start.y),
        );
        if dx % step != 0 || dy % step != 0 {
            tracing::debug!(%start, %goal, step, "目标点不在网格上");
            return None;
        }

        let margin = i64::from(self.margin_steps) * step;
        let bounds = Bounds::around(
            [start, goal].iter().chain(walls.iter()),
            margin,
        )?;

        let blocked = |p: &Point| *p != start && *p != goal && walls.contains(p);

        let mut open: BinaryHeap<Reverse<(i64, u64, Point)>> = BinaryHeap::new();
        let mut g_score: HashMap<Point, i64> = HashMap::new();
        let mut came_from: HashMap<Point, Point> = HashMap::new();
        let mut closed: HashSet<Point> = HashSet::new();
        let mut seq: u64 = 0;

        g_score.insert(start, 0);
        open.push(Reverse((start.manhattan(&goal), seq, start)));

        while let Some(Reverse((_f, _seq, current))) = open.pop() {
            if current == goal {
                let route = reconstruct(&came_from, current);
                tracing::debug!(%start, %goal, len = route.len(), expanded = closed.len(), "路径已找到");
                return Some(route);
            }
            // 同一节点可能多次入队，只处理第一次出队
            if !closed.insert(current) {
                continue;
            }
            let Some(&g) = g_score.get(&current) else {
                continue;
            };

            for (ox, oy) in [(step, 0), (-step, 0), (0, step), (0, -step)] {
                let nx = i64::from(current.x) + ox;
                let ny = i64::from(current.y) + oy;
                if !bounds.contains(nx, ny) {
                    continue;
                }
                let (Ok(x), Ok(y)) = (i32::try_from(nx), i32::try_from(ny)) else {
                    continue;
                };
                let next = Point::new(x, y);
                if closed.contains(&next) || blocked(&next) {
                    continue;
                }
                let tentative = g + step;
                if g_score.get(&next).map_or(true, |&old| tentative < old) {
                    g_score.insert(next, tentative);
                    came_from.insert(next, current);
                    seq += 1;
                    open.push(Reverse((tentative + next.manhattan(&goal), seq, next)));
                }
            }
        }

        tracing::debug!(%start, %goal, expanded = closed.len(), "开放集为空，无可达路径");
        None
    }
}

/// 沿回溯指针重建路径
fn reconstruct(came_from: &HashMap<Point, Point>, end: Point) -> Route {
    let mut route = vec![end];
    let mut cursor = end;
    while let Some(&prev) = came_from.get(&cursor) {
        route.push(prev);
        cursor = prev;
    }
    route.reverse();
    route
}

/// A* 便捷入口（默认外扩格数）
pub fn a_star(start: Point, goal: Point, walls: &HashSet<Point>, step: i32) -> Option<Route> {
    PathPlanner::new(step, DEFAULT_MARGIN_STEPS).find(start, goal, walls)
}
