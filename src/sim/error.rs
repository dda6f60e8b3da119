//! 仿真错误
//!
//! 所有错误都是致命的：一旦出现，本次实验的结果即失效。
//! 错误按 [`ErrorKind`] 分为配置、容量与内部一致性三类，便于测试区分。

use thiserror::Error;

use crate::stats::{Metric, Phase};

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 配置参数非法
    Configuration,
    /// 队列或直方图超出配置的跨度
    Capacity,
    /// 内部一致性校验失败
    Consistency,
}

#[derive(Debug, Clone, Error)]
pub enum SimError {
    #[error("unknown contention resolution algorithm '{0}' (expected D, P, B or O)")]
    UnknownAlgorithm(char),

    #[error("unknown interarrival distribution '{0}' (expected E or P)")]
    UnknownDistribution(char),

    #[error("target relative CI width r must be nonzero")]
    ZeroResolution,

    #[error("persistence probability {0} outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("invalid configuration `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("slot {slot}: queue of station {station} is full (capacity {capacity})")]
    QueueFull {
        slot: u64,
        station: usize,
        capacity: usize,
    },

    #[error("slot {slot}: queue of station {station} is empty")]
    QueueEmpty { slot: u64, station: usize },

    #[error("slot {slot}: {metric} value {value} exceeds histogram span {span} (station {station:?})")]
    HistogramSpan {
        slot: u64,
        metric: Metric,
        station: Option<usize>,
        value: usize,
        span: usize,
    },

    #[error(
        "slot {slot}: station {station} generated {generated} - acknowledged {acknowledged} != queued {queued}"
    )]
    PacketBalance {
        slot: u64,
        station: usize,
        generated: u64,
        acknowledged: u64,
        queued: usize,
    },

    #[error(
        "slot {slot}: station {station} acknowledged {acknowledged} packets in {phase:?} but delay histogram holds {samples}"
    )]
    DelaySamples {
        slot: u64,
        station: usize,
        phase: Phase,
        acknowledged: u64,
        samples: u64,
    },

    #[error("slot {slot}: station {station} counted {counted} arrivals but generated {total}")]
    GeneratedCount {
        slot: u64,
        station: usize,
        counted: u64,
        total: u64,
    },

    #[error("slot {slot}: ack at station {station} for packet {got:?}, queue head is {expected:?}")]
    AckMismatch {
        slot: u64,
        station: usize,
        expected: Option<u64>,
        got: Option<u64>,
    },

    #[error("slot {slot}: ack at station {station} for a slot sent by {sender:?}")]
    MisaddressedAck {
        slot: u64,
        station: usize,
        sender: Option<usize>,
    },

    #[error("slot {slot}: packet {packet} of station {station} acknowledged without service start")]
    MissingServiceStart {
        slot: u64,
        station: usize,
        packet: u64,
    },

    #[error("slot {slot}: collision multiplicity {multiplicity} exceeds station count {stations}")]
    MultiplicityOverflow {
        slot: u64,
        multiplicity: u32,
        stations: usize,
    },

    #[error("slot {slot}: station {station} still transmitting after slot resolution")]
    StaleTransmission { slot: u64, station: usize },

    #[error("slot {slot}: optimal persistence probability undefined with no contenders")]
    UndefinedOptimalP { slot: u64 },
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::UnknownAlgorithm(_)
            | SimError::UnknownDistribution(_)
            | SimError::ZeroResolution
            | SimError::ProbabilityOutOfRange(_)
            | SimError::InvalidParameter { .. } => ErrorKind::Configuration,
            SimError::QueueFull { .. } | SimError::HistogramSpan { .. } => ErrorKind::Capacity,
            SimError::QueueEmpty { .. }
            | SimError::PacketBalance { .. }
            | SimError::DelaySamples { .. }
            | SimError::GeneratedCount { .. }
            | SimError::AckMismatch { .. }
            | SimError::MisaddressedAck { .. }
            | SimError::MissingServiceStart { .. }
            | SimError::MultiplicityOverflow { .. }
            | SimError::StaleTransmission { .. }
            | SimError::UndefinedOptimalP { .. } => ErrorKind::Consistency,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
