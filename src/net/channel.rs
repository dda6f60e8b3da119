//! 信道 slot
//!
//! 信道只需要建模当前这一个 slot：每个 slot 开始时清空，发送站点依次写入，
//! 所有站点动作完毕后由最终的发送者数量决定结果。

use super::id::StationId;
use super::packet::Packet;
use crate::sim::Slot;

/// slot 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    Empty,
    /// 恰好一个站点发送
    Success(StationId),
    /// 多个站点同时发送，携带冲突重数
    Collision(u32),
}

#[derive(Debug, Clone, Default)]
pub struct ChannelSlot {
    slot: Slot,
    multiplicity: u32,
    source: Option<StationId>,
    destination: Option<StationId>,
    packet: Option<Packet>,
    contenders: Vec<StationId>,
}

impl ChannelSlot {
    pub fn with_capacity(stations: usize) -> Self {
        Self {
            contenders: Vec::with_capacity(stations),
            ..Self::default()
        }
    }

    /// 开始新的 slot：恢复为空
    pub fn reset(&mut self, slot: Slot) {
        self.slot = slot;
        self.multiplicity = 0;
        self.source = None;
        self.destination = None;
        self.packet = None;
        self.contenders.clear();
    }

    /// 站点在本 slot 发送一个 packet
    pub fn transmit(&mut self, from: StationId, to: StationId, pkt: &Packet) {
        self.source = Some(from);
        self.destination = Some(to);
        self.packet = Some(pkt.clone());
        self.multiplicity += 1;
        self.contenders.push(from);
    }

    pub fn outcome(&self) -> SlotOutcome {
        match (self.multiplicity, self.source) {
            (0, _) => SlotOutcome::Empty,
            (1, Some(src)) => SlotOutcome::Success(src),
            (m, _) => SlotOutcome::Collision(m),
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn multiplicity(&self) -> u32 {
        self.multiplicity
    }

    pub fn source(&self) -> Option<StationId> {
        self.source
    }

    pub fn destination(&self) -> Option<StationId> {
        self.destination
    }

    pub fn packet(&self) -> Option<&Packet> {
        self.packet.as_ref()
    }

    /// 本 slot 的发送站点，按站点动作顺序排列
    pub fn contenders(&self) -> &[StationId] {
        &self.contenders
    }
}
