//! 站点协议状态机
//!
//! 状态：Idle（空闲）、Resolving（冲突解决中，倒计时或逐 slot 抽样）、
//! Transmitting（本 slot 正在发送）。Idle/Resolving 的转移在站点动作阶段完成；
//! Transmitting 的两个出口（确认成功 / 冲突）由 slot 结算阶段调用
//! [`Station::acknowledge`] 与 [`Station::collide`] 完成。

use tracing::trace;

use super::channel::ChannelSlot;
use super::id::StationId;
use super::packet::Packet;
use crate::cra::{BackoffRequest, ContentionResolution};
use crate::queue::RingQueue;
use crate::sim::{SimError, Slot, VariateStream};

/// 站点状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    Idle,
    Resolving,
    Transmitting,
}

impl StationState {
    pub fn tag(self) -> char {
        match self {
            StationState::Idle => 'I',
            StationState::Resolving => 'R',
            StationState::Transmitting => 'T',
        }
    }
}

#[derive(Debug, Clone)]
pub struct Station {
    id: StationId,
    /// 平均到达率（每 slot 的包数）
    arrival_rate: f64,
    /// 下一个包的到达时间（slot，小数）
    next_arrival: f64,
    state: StationState,
    queue: RingQueue,
    backoff: u32,
    generated: u64,
    tx_slot: Option<Slot>,
}

impl Station {
    pub fn new(id: StationId, arrival_rate: f64, queue_capacity: usize) -> Self {
        Self {
            id,
            arrival_rate,
            next_arrival: 0.0,
            state: StationState::Idle,
            queue: RingQueue::new(queue_capacity),
            backoff: 0,
            generated: 0,
            tx_slot: None,
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn state(&self) -> StationState {
        self.state
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn backoff(&self) -> u32 {
        self.backoff
    }

    /// 累计生成的 packet 数
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// 当前这次发送所在的 slot
    pub fn tx_slot(&self) -> Option<Slot> {
        self.tx_slot
    }

    pub fn arrival_rate(&self) -> f64 {
        self.arrival_rate
    }

    pub fn next_arrival(&self) -> f64 {
        self.next_arrival
    }

    /// 平均到达间隔（slot）；到达率为 0 的站点不产生业务
    pub fn mean_interarrival(&self) -> Option<f64> {
        (self.arrival_rate > 0.0).then(|| 1.0 / self.arrival_rate)
    }

    pub(crate) fn advance_next_arrival(&mut self, interarrival: f64) {
        self.next_arrival += interarrival;
    }

    /// 下一个到达是否落在 `slot`
    pub fn arrival_due(&self, slot: Slot) -> bool {
        self.arrival_rate > 0.0 && self.next_arrival.ceil() == slot.0 as f64
    }

    /// 本 slot 是否参与竞争（用于最优 p 的 n 统计）
    pub fn is_contending(&self, slot: Slot) -> bool {
        match self.state {
            StationState::Idle => !self.queue.is_empty() || self.arrival_due(slot),
            StationState::Resolving | StationState::Transmitting => true,
        }
    }

    /// 在 `slot` 产生一个新 packet 并放入队尾
    pub fn accept_arrival(&mut self, slot: Slot, arrival_time: f64) -> Result<(), SimError> {
        let pkt = Packet::new(self.generated, arrival_time, slot);
        self.queue.enqueue(pkt).map_err(|_| SimError::QueueFull {
            slot: slot.0,
            station: self.id.0,
            capacity: self.queue.capacity(),
        })?;
        self.generated += 1;
        trace!(
            slot = slot.0,
            station = self.id.0,
            arrival_time,
            queue_len = self.queue.len(),
            "📦 packet 到达"
        );
        Ok(())
    }

    fn backoff_request(&self, slot: Slot) -> BackoffRequest {
        BackoffRequest {
            slot,
            station: self.id,
            attempts: self.queue.head().map(|p| p.attempts).unwrap_or(0),
        }
    }

    /// 执行本 slot 的站点协议（在 slot 结算之前调用）
    pub fn run(
        &mut self,
        slot: Slot,
        sink: StationId,
        cra: &mut dyn ContentionResolution,
        rng: &mut VariateStream,
        channel: &mut ChannelSlot,
    ) -> Result<(), SimError> {
        let redraw = cra.algorithm().redraws_every_slot();
        match self.state {
            StationState::Idle => {
                if self.queue.is_empty() {
                    return Ok(());
                }
                if redraw {
                    self.backoff = cra.backoff(&self.backoff_request(slot), rng)?;
                }
                if self.backoff == 0 {
                    self.transmit(slot, sink, channel, true)?;
                }
            }
            StationState::Resolving => {
                if redraw {
                    self.backoff = cra.backoff(&self.backoff_request(slot), rng)?;
                }
                if self.backoff == 0 {
                    self.transmit(slot, sink, channel, false)?;
                } else {
                    trace!(slot = slot.0, station = self.id.0, wait = self.backoff, "CRA 等待");
                    self.backoff -= 1;
                }
            }
            StationState::Transmitting => {
                return Err(SimError::StaleTransmission {
                    slot: slot.0,
                    station: self.id.0,
                });
            }
        }
        Ok(())
    }

    fn transmit(
        &mut self,
        slot: Slot,
        sink: StationId,
        channel: &mut ChannelSlot,
        starts_service: bool,
    ) -> Result<(), SimError> {
        let prev = self.state;
        let head = self.queue.head_mut().ok_or(SimError::QueueEmpty {
            slot: slot.0,
            station: self.id.0,
        })?;
        head.attempts += 1;
        if starts_service {
            head.service_start = Some(slot);
        }
        channel.transmit(self.id, sink, head);
        let attempts = head.attempts;
        self.state = StationState::Transmitting;
        self.tx_slot = Some(slot);
        trace!(
            slot = slot.0,
            station = self.id.0,
            prev = %prev.tag(),
            multiplicity = channel.multiplicity(),
            attempts,
            "📤 发送"
        );
        Ok(())
    }

    /// Transmitting → Idle：收到确认，队头出队并返回
    pub fn acknowledge(&mut self, channel: &ChannelSlot) -> Result<Packet, SimError> {
        let slot = channel.slot();
        let expected = self.queue.head().map(|p| p.id);
        let got = channel.packet().map(|p| p.id);
        if expected.is_none() {
            return Err(SimError::QueueEmpty {
                slot: slot.0,
                station: self.id.0,
            });
        }
        if channel.source() != Some(self.id) {
            return Err(SimError::MisaddressedAck {
                slot: slot.0,
                station: self.id.0,
                sender: channel.source().map(|s| s.0),
            });
        }
        if expected != got {
            return Err(SimError::AckMismatch {
                slot: slot.0,
                station: self.id.0,
                expected,
                got,
            });
        }
        let pkt = self.queue.dequeue().ok_or(SimError::QueueEmpty {
            slot: slot.0,
            station: self.id.0,
        })?;
        self.state = StationState::Idle;
        self.tx_slot = None;
        trace!(
            slot = slot.0,
            station = self.id.0,
            pkt = pkt.id,
            attempts = pkt.attempts,
            queue_len = self.queue.len(),
            "✅ 收到 ACK"
        );
        Ok(pkt)
    }

    /// Transmitting → Resolving：冲突（或未被寻址），重新计算退避
    pub fn collide(
        &mut self,
        slot: Slot,
        cra: &mut dyn ContentionResolution,
        rng: &mut VariateStream,
    ) -> Result<(), SimError> {
        self.backoff = cra.backoff(&self.backoff_request(slot), rng)?;
        self.state = StationState::Resolving;
        self.tx_slot = None;
        trace!(slot = slot.0, station = self.id.0, wait = self.backoff, "💥 冲突，进入退避");
        Ok(())
    }
}
