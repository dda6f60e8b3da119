//! 仿真配置
//!
//! 支持 JSON（serde）与原始的按顺序排列的文本格式两种输入。

use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::time::SlotClock;
use crate::cra::Algorithm;

pub const DEFAULT_QUEUE_CAPACITY: usize = 30;
pub const DEFAULT_DELAY_BINS: usize = 10_000;
pub const DEFAULT_ATTEMPT_BINS: usize = 1_000;
pub const DEFAULT_PARETO_SHAPE: f64 = 2.5;

/// 到达间隔分布
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum Interarrival {
    Exponential,
    Pareto,
}

impl TryFrom<char> for Interarrival {
    type Error = SimError;

    fn try_from(tag: char) -> Result<Self, Self::Error> {
        match tag.to_ascii_uppercase() {
            'E' => Ok(Interarrival::Exponential),
            'P' => Ok(Interarrival::Pareto),
            _ => Err(SimError::UnknownDistribution(tag)),
        }
    }
}

impl From<Interarrival> for char {
    fn from(d: Interarrival) -> char {
        match d {
            Interarrival::Exponential => 'E',
            Interarrival::Pareto => 'P',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub stations: usize,
    pub slot_bytes: u32,
    pub rate_mbps: f64,
    pub algorithm: Algorithm,
    /// 固定 p-persistence 使用的概率
    #[serde(default)]
    pub persistence: f64,
    /// 归一化负载 ρ（每 slot 的包数，所有站点合计）
    pub load: f64,
    #[serde(default = "default_interarrival")]
    pub interarrival: Interarrival,
    pub duration_ms: f64,
    #[serde(default)]
    pub warmup_ms: f64,
    /// 0 表示使用系统时钟作为种子
    #[serde(default)]
    pub seed: u64,
    pub significance: f64,
    /// (1 - α/2) 对应的 z 值
    pub z: f64,
    /// 目标置信区间相对宽度 r（百分比）
    pub resolution: f64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_delay_bins")]
    pub delay_bins: usize,
    #[serde(default = "default_attempt_bins")]
    pub attempt_bins: usize,
    #[serde(default = "default_pareto_shape")]
    pub pareto_shape: f64,
}

fn default_interarrival() -> Interarrival {
    Interarrival::Exponential
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_delay_bins() -> usize {
    DEFAULT_DELAY_BINS
}

fn default_attempt_bins() -> usize {
    DEFAULT_ATTEMPT_BINS
}

fn default_pareto_shape() -> f64 {
    DEFAULT_PARETO_SHAPE
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            stations: 10,
            slot_bytes: 125,
            rate_mbps: 10.0,
            algorithm: Algorithm::Tbeb,
            persistence: 0.5,
            load: 0.2,
            interarrival: Interarrival::Exponential,
            duration_ms: 100.0,
            warmup_ms: 10.0,
            seed: 1,
            significance: 0.05,
            z: 1.96,
            resolution: 5.0,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            delay_bins: DEFAULT_DELAY_BINS,
            attempt_bins: DEFAULT_ATTEMPT_BINS,
            pareto_shape: DEFAULT_PARETO_SHAPE,
        }
    }
}

/// 按顺序读取以空白分隔的字段
struct Fields<'a> {
    tokens: std::str::SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn next_token(&mut self, name: &'static str) -> Result<&'a str, SimError> {
        self.tokens
            .next()
            .ok_or_else(|| SimError::invalid(name, "missing field"))
    }

    fn parse<T: std::str::FromStr>(&mut self, name: &'static str) -> Result<T, SimError>
    where
        T::Err: std::fmt::Display,
    {
        let tok = self.next_token(name)?;
        tok.parse::<T>()
            .map_err(|e| SimError::invalid(name, format!("`{tok}`: {e}")))
    }

    fn tag(&mut self, name: &'static str) -> Result<char, SimError> {
        let tok = self.next_token(name)?;
        tok.chars()
            .next()
            .ok_or_else(|| SimError::invalid(name, "empty tag"))
    }
}

impl SimConfig {
    pub fn from_json(raw: &str) -> Result<Self, SimError> {
        serde_json::from_str(raw).map_err(|e| SimError::invalid("json", e.to_string()))
    }

    /// 解析原始输入文件格式：13 个字段按固定顺序出现，字段之间以空白分隔。
    ///
    /// 顺序：站点数、slot 字节数、速率（Mbps）、算法标签、p、负载 ρ、
    /// 到达分布标签、仿真时长（ms）、预热时长（ms）、种子、α、z、r。
    pub fn from_ordered_text(raw: &str) -> Result<Self, SimError> {
        let mut f = Fields {
            tokens: raw.split_whitespace(),
        };
        Ok(Self {
            stations: f.parse("stations")?,
            slot_bytes: f.parse("slot_bytes")?,
            rate_mbps: f.parse("rate_mbps")?,
            algorithm: Algorithm::try_from(f.tag("algorithm")?)?,
            persistence: f.parse("persistence")?,
            load: f.parse("load")?,
            interarrival: Interarrival::try_from(f.tag("interarrival")?)?,
            duration_ms: f.parse("duration_ms")?,
            warmup_ms: f.parse("warmup_ms")?,
            seed: f.parse("seed")?,
            significance: f.parse("significance")?,
            z: f.parse("z")?,
            resolution: f.parse("resolution")?,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.stations == 0 {
            return Err(SimError::invalid("stations", "at least one station required"));
        }
        if self.slot_bytes == 0 {
            return Err(SimError::invalid("slot_bytes", "must be positive"));
        }
        if !(self.rate_mbps.is_finite() && self.rate_mbps > 0.0) {
            return Err(SimError::invalid("rate_mbps", "must be positive"));
        }
        if self.algorithm == Algorithm::PPersistence && !(0.0..=1.0).contains(&self.persistence) {
            return Err(SimError::ProbabilityOutOfRange(self.persistence));
        }
        if !(self.load.is_finite() && self.load >= 0.0) {
            return Err(SimError::invalid("load", "must be a non-negative number"));
        }
        if self.interarrival == Interarrival::Pareto
            && !(self.pareto_shape.is_finite() && self.pareto_shape > 1.0)
        {
            return Err(SimError::invalid("pareto_shape", "must be larger than 1"));
        }
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return Err(SimError::invalid("duration_ms", "must be positive"));
        }
        if !(self.warmup_ms >= 0.0 && self.warmup_ms <= self.duration_ms) {
            return Err(SimError::invalid(
                "warmup_ms",
                "must lie between 0 and the simulation duration",
            ));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(SimError::invalid("significance", "must lie in (0, 1)"));
        }
        if !(self.z.is_finite() && self.z > 0.0) {
            return Err(SimError::invalid("z", "must be positive"));
        }
        if self.resolution == 0.0 {
            return Err(SimError::ZeroResolution);
        }
        if !self.resolution.is_finite() {
            return Err(SimError::invalid("resolution", "must be finite"));
        }
        if self.queue_capacity == 0 {
            return Err(SimError::invalid("queue_capacity", "must be positive"));
        }
        if self.delay_bins < 2 || self.attempt_bins < 2 {
            return Err(SimError::invalid("histogram bins", "need at least two bins"));
        }
        Ok(())
    }

    pub fn clock(&self) -> SlotClock {
        SlotClock::new(self.slot_bytes, self.rate_mbps)
    }

    pub fn total_slots(&self) -> u64 {
        self.clock().millis_to_slots(self.duration_ms)
    }

    pub fn warmup_slots(&self) -> u64 {
        self.clock().millis_to_slots(self.warmup_ms)
    }

    /// 单个站点的到达率（每 slot 的包数）
    pub fn station_rate(&self) -> f64 {
        self.load / self.stations as f64
    }
}
