// ==========================================
// Warsztat Menager - 路线动画
// ==========================================
// 职责: 通过宿主 after() 逐点调度 move 回调
// 时序: 第 i 个点在 i × delay_ms 时执行；on_finish 紧随最后一个点
// 红线: 只持有自己的定时器 id，不触碰领域状态
// 红线: 新的 animate 先取消旧调度，两条路线不会交错
// ==========================================

use crate::domain::hall::Point;
use crate::engine::host::{HostCallback, HostScheduler, TimerId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const DEFAULT_DELAY_MS: u64 = 50;

#[derive(Debug, Default)]
struct AnimationState {
    /// 每次取消递增；过期回调据此自行失效
    generation: u64,
    pending: Vec<TimerId>,
}

// ==========================================
// RouteAnimator
// ==========================================
pub struct RouteAnimator {
    scheduler: Rc<dyn HostScheduler>,
    state: Rc<RefCell<AnimationState>>,
}

impl RouteAnimator {
    pub fn new(scheduler: Rc<dyn HostScheduler>) -> Self {
        Self {
            scheduler,
            state: Rc::new(RefCell::new(AnimationState::default())),
        }
    }

    /// 是否还有未执行的动画步骤
    pub fn is_running(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    /// 沿路线调度动画
    ///
    /// # 参数
    /// - route: 路线点（按顺序惰性读取）
    /// - move_fn: 每个点调用一次；返回错误时记录日志并继续后续点
    /// - delay_ms: 相邻两点的间隔
    /// - on_finish: 最后一个点之后调用一次；路线为空时不调用
    ///
    /// # 返回
    /// 已调度的点数
    pub fn animate<I, F>(
        &self,
        route: I,
        move_fn: F,
        delay_ms: u64,
        on_finish: Option<HostCallback>,
    ) -> usize
    where
        I: IntoIterator<Item = Point>,
        F: Fn(Point) -> anyhow::Result<()> + 'static,
    {
        self.cancel_all();

        let generation = self.state.borrow().generation;
        let move_fn = Rc::new(move_fn);
        let mut on_finish = on_finish;
        let mut route = route.into_iter().peekable();
        let mut index: u64 = 0;

        while let Some(point) = route.next() {
            let finish = if route.peek().is_none() {
                on_finish.take()
            } else {
                None
            };

            let state = Rc::clone(&self.state);
            let move_fn = Rc::clone(&move_fn);
            let own_id: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
            let own_id_cb = Rc::clone(&own_id);

            let callback: HostCallback = Box::new(move || {
                {
                    let mut st = state.borrow_mut();
                    if st.generation != generation {
                        return;
                    }
                    if let Some(id) = own_id_cb.get() {
                        st.pending.retain(|pending| *pending != id);
                    }
                }
                if let Err(e) = move_fn(point) {
                    tracing::warn!(%point, error = %e, "动画回调失败，继续后续路线点");
                }
                if let Some(finish) = finish {
                    finish();
                }
            });

            let id = self
                .scheduler
                .after(index.saturating_mul(delay_ms), callback);
            own_id.set(Some(id));
            self.state.borrow_mut().pending.push(id);
            index += 1;
        }

        tracing::debug!(points = index, delay_ms, "路线动画已调度");
        usize::try_from(index).unwrap_or(usize::MAX)
    }

    /// 取消全部未执行的回调
    ///
    /// 已执行的步骤不回滚；宿主取消失败（如画布已销毁）时静默忽略。可重复调用。
    pub fn cancel_all(&self) {
        let pending = {
            let mut st = self.state.borrow_mut();
            st.generation += 1;
            std::mem::take(&mut st.pending)
        };
        for id in pending {
            if let Err(e) = self.scheduler.after_cancel(id) {
                tracing::debug!(timer_id = id, error = %e, "取消定时器失败，已忽略");
            }
        }
    }
}

impl Drop for RouteAnimator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
