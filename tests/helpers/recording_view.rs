// ==========================================
// 记录型视图 - 捕获控制器对画布的调用
// ==========================================

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use warsztat_menager::domain::hall::Point;
use warsztat_menager::engine::host::HallView;

#[derive(Default)]
pub struct RecordingView {
    pub moves: RefCell<Vec<(String, Point)>>,
    pub statuses: RefCell<Vec<String>>,
    pub refreshes: Cell<usize>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某个标记经过的全部位置
    pub fn path_of(&self, marker: &str) -> Vec<Point> {
        self.moves
            .borrow()
            .iter()
            .filter(|(m, _)| m == marker)
            .map(|(_, p)| *p)
            .collect()
    }
}

impl HallView for RecordingView {
    fn move_marker(&self, marker: &str, position: Point) -> anyhow::Result<()> {
        self.moves.borrow_mut().push((marker.to_string(), position));
        Ok(())
    }

    fn refresh(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }

    fn show_status(&self, message: &str) {
        self.statuses.borrow_mut().push(message.to_string());
    }
}
