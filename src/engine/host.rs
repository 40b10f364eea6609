// ==========================================
// Warsztat Menager - 宿主 GUI 接口
// ==========================================
// 职责: 定义核心对宿主 GUI 的全部依赖（延时回调调度 + 画布视图）
// 说明: 核心只依赖这里的 trait，具体 GUI 工具包由适配层实现
// 调度模型: 单线程协作式，宿主事件循环是唯一执行者
// ==========================================

use crate::domain::hall::Point;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use thiserror::Error;

/// 宿主分配的定时器标识
pub type TimerId = u64;

/// 延时回调
pub type HostCallback = Box<dyn FnOnce()>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("未知的定时器: {0}")]
    UnknownTimer(TimerId),

    #[error("宿主画布已销毁")]
    SurfaceDestroyed,
}

// ==========================================
// 调度接口
// ==========================================

/// 宿主延时调度接口（对应 after / after_cancel）
pub trait HostScheduler {
    /// delay_ms 毫秒后在事件循环上执行 callback
    fn after(&self, delay_ms: u64, callback: HostCallback) -> TimerId;

    /// 取消尚未执行的回调
    fn after_cancel(&self, id: TimerId) -> Result<(), HostError>;
}

// ==========================================
// 视图接口
// ==========================================

/// 车间画布视图
pub trait HallView {
    /// 移动画布上的标记（动画覆盖层 / 机器图标）
    fn move_marker(&self, marker: &str, position: Point) -> anyhow::Result<()>;

    /// 重绘车间
    fn refresh(&self);

    /// 状态栏提示
    fn show_status(&self, message: &str);
}

/// 空视图：无界面运行（命令行 / 测试）时使用
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHallView;

impl HallView for NoOpHallView {
    fn move_marker(&self, marker: &str, position: Point) -> anyhow::Result<()> {
        tracing::trace!(marker, %position, "NoOpHallView: 跳过标记移动");
        Ok(())
    }

    fn refresh(&self) {}

    fn show_status(&self, message: &str) {
        tracing::debug!(status = message, "NoOpHallView: 状态栏");
    }
}

// ==========================================
// ManualScheduler - 虚拟时钟调度器
// ==========================================
// 回调按 (到期时间, 注册顺序) 执行；时间只在 advance 时前进
// 用于测试与无界面运行
// ==========================================
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<TimerId>,
    destroyed: Cell<bool>,
    pending: RefCell<BTreeMap<(u64, TimerId), HostCallback>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前虚拟时间（毫秒）
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// 待执行回调数量
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// 时钟前进 ms 毫秒，执行期间到期的全部回调
    ///
    /// # 返回
    /// 执行的回调数量
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now.get().saturating_add(ms);
        let fired = self.fire_while(|due| due <= target);
        self.now.set(target);
        fired
    }

    /// 执行全部待执行回调（包括执行过程中新注册的）
    pub fn run_until_idle(&self) -> usize {
        self.fire_while(|_| true)
    }

    /// 模拟宿主画布销毁：丢弃全部待执行回调
    pub fn destroy(&self) {
        self.destroyed.set(true);
        let dropped = std::mem::take(&mut *self.pending.borrow_mut());
        tracing::debug!(dropped = dropped.len(), "ManualScheduler: 画布已销毁");
    }

    fn fire_while(&self, due_ok: impl Fn(u64) -> bool) -> usize {
        let mut fired = 0;
        loop {
            // 取出回调后释放借用，回调内部可再次调用 after / after_cancel
            let next = {
                let mut pending = self.pending.borrow_mut();
                match pending.keys().next().copied() {
                    Some(key) if due_ok(key.0) => pending.remove(&key).map(|cb| (key.0, cb)),
                    _ => None,
                }
            };
            let Some((due, callback)) = next else {
                return fired;
            };
            if due > self.now.get() {
                self.now.set(due);
            }
            callback();
            fired += 1;
        }
    }
}

impl HostScheduler for ManualScheduler {
    fn after(&self, delay_ms: u64, callback: HostCallback) -> TimerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        if self.destroyed.get() {
            tracing::debug!(timer_id = id, "ManualScheduler: 画布已销毁，回调被丢弃");
            return id;
        }
        let due = self.now.get().saturating_add(delay_ms);
        self.pending.borrow_mut().insert((due, id), callback);
        id
    }

    fn after_cancel(&self, id: TimerId) -> Result<(), HostError> {
        if self.destroyed.get() {
            return Err(HostError::SurfaceDestroyed);
        }
        let mut pending = self.pending.borrow_mut();
        let key = pending
            .keys()
            .find(|(_, timer)| *timer == id)
            .copied()
            .ok_or(HostError::UnknownTimer(id))?;
        pending.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_callbacks_fire_in_due_then_registration_order() {
        let sched = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, tag) in [(20, "c"), (0, "a"), (20, "d"), (10, "b")] {
            let log = log.clone();
            sched.after(delay, Box::new(move || log.borrow_mut().push(tag)));
        }

        assert_eq!(sched.advance(10), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(sched.now(), 10);

        assert_eq!(sched.run_until_idle(), 2);
        assert_eq!(*log.borrow(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_cancel() {
        let sched = ManualScheduler::new();
        let hit = Rc::new(Cell::new(false));
        let flag = hit.clone();
        let id = sched.after(5, Box::new(move || flag.set(true)));

        assert!(sched.after_cancel(id).is_ok());
        assert_eq!(sched.after_cancel(id), Err(HostError::UnknownTimer(id)));
        sched.run_until_idle();
        assert!(!hit.get());
    }

    #[test]
    fn test_reentrant_after() {
        let sched = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));

        let inner_sched = sched.clone();
        let inner_count = count.clone();
        sched.after(
            1,
            Box::new(move || {
                inner_count.set(inner_count.get() + 1);
                let c = inner_count.clone();
                inner_sched.after(1, Box::new(move || c.set(c.get() + 1)));
            }),
        );

        assert_eq!(sched.run_until_idle(), 2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_destroyed_surface() {
        let sched = ManualScheduler::new();
        let id = sched.after(5, Box::new(|| {}));
        sched.destroy();
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(sched.after_cancel(id), Err(HostError::SurfaceDestroyed));
    }
}
