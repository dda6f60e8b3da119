//! 数据包类型
//!
//! 定义站点队列中的 packet 及其时间戳。

use crate::sim::Slot;

/// 网络数据包
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// 站点内的包序号
    pub id: u64,
    /// 到达时间（以 slot 为单位的小数）
    pub arrival_time: f64,
    pub arrival_slot: Slot,
    /// 首次发送的 slot
    pub service_start: Option<Slot>,
    /// 已尝试发送的次数
    pub attempts: u32,
}

impl Packet {
    pub fn new(id: u64, arrival_time: f64, arrival_slot: Slot) -> Self {
        Self {
            id,
            arrival_time,
            arrival_slot,
            service_start: None,
            attempts: 0,
        }
    }

    /// 到达到确认的时延，两端 slot 都计入
    pub fn delay_at(&self, now: Slot) -> u64 {
        now.span_since(self.arrival_slot)
    }

    /// 开始服务到确认的服务时间，两端 slot 都计入
    pub fn service_time_at(&self, now: Slot) -> Option<u64> {
        self.service_start.map(|start| now.span_since(start))
    }
}
