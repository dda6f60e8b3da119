//! 仿真时间类型
//!
//! 定义 slot（离散时间单位）以及 slot 与毫秒之间的单位转换。

use serde::Serialize;

/// 仿真时间（slot 序号）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Slot(pub u64);

impl Slot {
    pub const ZERO: Slot = Slot(0);

    pub fn next(self) -> Slot {
        Slot(self.0.saturating_add(1))
    }

    /// 从 `earlier` 到 `self` 经过的 slot 数，两端都计入。
    pub fn span_since(self, earlier: Slot) -> u64 {
        self.0.saturating_sub(earlier.0).saturating_add(1)
    }
}

/// 信道时钟：由 slot 大小与传输速率决定一个 slot 的时长。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotClock {
    slot_bytes: u32,
    rate_mbps: f64,
}

impl SlotClock {
    pub fn new(slot_bytes: u32, rate_mbps: f64) -> Self {
        Self {
            slot_bytes,
            rate_mbps,
        }
    }

    fn slot_bits(&self) -> f64 {
        f64::from(self.slot_bytes) * 8.0
    }

    /// 一个 slot 的时长（微秒）
    pub fn slot_micros(&self) -> f64 {
        self.slot_bits() / self.rate_mbps
    }

    /// 毫秒换算为 slot 数（向上取整，负值按 0 处理）
    pub fn millis_to_slots(&self, ms: f64) -> u64 {
        let slots = (ms / (self.slot_micros() / 1_000.0)).ceil();
        if slots.is_finite() && slots > 0.0 {
            slots as u64
        } else {
            0
        }
    }

    /// slot 数换算为毫秒
    pub fn slots_to_millis(&self, slots: u64) -> f64 {
        slots as f64 * self.slot_micros() / 1_000.0
    }

    /// 归一化负载（每 slot 的包数）换算为 Mbps
    pub fn load_to_mbps(&self, load: f64) -> f64 {
        load * self.rate_mbps
    }
}
