// ==========================================
// 测试数据构建器 - 机器 / 墙体
// ==========================================

#![allow(dead_code)]

use warsztat_menager::domain::hall::{Machine, Point, Wall};
use warsztat_menager::domain::types::MachineStatus;

// ==========================================
// Machine 构建器
// ==========================================

pub struct MachineBuilder {
    id: String,
    nazwa: Option<String>,
    hala: Option<String>,
    pozycja: Point,
    status: MachineStatus,
}

impl MachineBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            nazwa: None,
            hala: None,
            pozycja: Point::new(0, 0),
            status: MachineStatus::Sprawna,
        }
    }

    pub fn nazwa(mut self, nazwa: &str) -> Self {
        self.nazwa = Some(nazwa.to_string());
        self
    }

    pub fn hala(mut self, hala: &str) -> Self {
        self.hala = Some(hala.to_string());
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.pozycja = Point::new(x, y);
        self
    }

    pub fn status(mut self, status: MachineStatus) -> Self {
        self.status = status;
        self
    }

    pub fn failed(self) -> Self {
        self.status(MachineStatus::Awaria)
    }

    /// status_since 固定为 2024-01-02 08:00:00
    pub fn build(self) -> Machine {
        let mut machine = Machine::new(&self.id, self.pozycja, self.status);
        machine.nazwa = self.nazwa;
        machine.hala = self.hala;
        machine.status_since = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(8, 0, 0));
        machine
    }
}

/// 墙段
pub fn wall(x1: i32, y1: i32, x2: i32, y2: i32) -> Wall {
    Wall {
        hala: None,
        x1,
        y1,
        x2,
        y2,
    }
}
