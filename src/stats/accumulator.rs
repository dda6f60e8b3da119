//! 统计累加器
//!
//! 按阶段（预热 / 稳态）与站点组织直方图：`(phase, metric, station) → Histogram`，
//! 所有写入都做边界检查，越界即为致命错误。

use std::fmt;

use serde::Serialize;
use tracing::trace;

use super::histogram::{Histogram, SpanExceeded};
use crate::net::{Packet, Station, StationId};
use crate::sim::{SimError, Slot};

/// 统计阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WarmUp,
    Steady,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::WarmUp, Phase::Steady];

    fn index(self) -> usize {
        match self {
            Phase::WarmUp => 0,
            Phase::Steady => 1,
        }
    }
}

/// 统计指标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    QueueLength,
    Delay,
    ServiceTime,
    Attempts,
    Multiplicity,
    Contenders,
}

impl Metric {
    /// 是否按站点分别统计
    pub fn per_station(self) -> bool {
        matches!(
            self,
            Metric::QueueLength | Metric::Delay | Metric::ServiceTime | Metric::Attempts
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::QueueLength => "queue length",
            Metric::Delay => "delay",
            Metric::ServiceTime => "service time",
            Metric::Attempts => "transmission attempts",
            Metric::Multiplicity => "collision multiplicity",
            Metric::Contenders => "contender count",
        };
        f.write_str(name)
    }
}

/// 各类直方图的 bin 数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramSpans {
    pub queue: usize,
    pub delay: usize,
    pub attempts: usize,
    /// 冲突重数与竞争站点数（0..=站点数）
    pub channel: usize,
}

#[derive(Debug, Clone)]
struct PhaseStats {
    queue: Vec<Histogram>,
    delay: Vec<Histogram>,
    service: Vec<Histogram>,
    attempts: Vec<Histogram>,
    multiplicity: Histogram,
    contenders: Histogram,
    generated: Vec<u64>,
    acknowledged: Vec<u64>,
}

impl PhaseStats {
    fn new(stations: usize, spans: &HistogramSpans) -> Self {
        let per_station = |span: usize| vec![Histogram::new(span); stations];
        Self {
            queue: per_station(spans.queue),
            delay: per_station(spans.delay),
            service: per_station(spans.delay),
            attempts: per_station(spans.attempts),
            multiplicity: Histogram::new(spans.channel),
            contenders: Histogram::new(spans.channel),
            generated: vec![0; stations],
            acknowledged: vec![0; stations],
        }
    }

    fn per_station(&self, metric: Metric) -> Option<&[Histogram]> {
        match metric {
            Metric::QueueLength => Some(&self.queue),
            Metric::Delay => Some(&self.delay),
            Metric::ServiceTime => Some(&self.service),
            Metric::Attempts => Some(&self.attempts),
            Metric::Multiplicity | Metric::Contenders => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    stations: usize,
    warmup_end: Slot,
    phases: [PhaseStats; 2],
}

fn span_error(
    slot: Slot,
    metric: Metric,
    station: Option<StationId>,
) -> impl FnOnce(SpanExceeded) -> SimError {
    move |e| SimError::HistogramSpan {
        slot: slot.0,
        metric,
        station: station.map(|s| s.0),
        value: e.value,
        span: e.span,
    }
}

impl StatsAccumulator {
    pub fn new(stations: usize, spans: HistogramSpans, warmup_end: Slot) -> Self {
        Self {
            stations,
            warmup_end,
            phases: [
                PhaseStats::new(stations, &spans),
                PhaseStats::new(stations, &spans),
            ],
        }
    }

    pub fn stations(&self) -> usize {
        self.stations
    }

    /// `slot` 所属的统计阶段
    pub fn phase(&self, slot: Slot) -> Phase {
        if slot < self.warmup_end {
            Phase::WarmUp
        } else {
            Phase::Steady
        }
    }

    fn at(&mut self, slot: Slot) -> &mut PhaseStats {
        let idx = self.phase(slot).index();
        &mut self.phases[idx]
    }

    fn get(&self, phase: Phase) -> &PhaseStats {
        &self.phases[phase.index()]
    }

    pub fn record_generated(&mut self, slot: Slot, station: StationId) {
        self.at(slot).generated[station.0] += 1;
    }

    pub fn record_queue_length(
        &mut self,
        slot: Slot,
        station: StationId,
        len: usize,
    ) -> Result<(), SimError> {
        self.at(slot).queue[station.0]
            .record(len)
            .map_err(span_error(slot, Metric::QueueLength, Some(station)))
    }

    pub fn record_multiplicity(&mut self, slot: Slot, multiplicity: u32) -> Result<(), SimError> {
        self.at(slot)
            .multiplicity
            .record(multiplicity as usize)
            .map_err(span_error(slot, Metric::Multiplicity, None))
    }

    pub fn record_contenders(&mut self, slot: Slot, contenders: usize) -> Result<(), SimError> {
        self.at(slot)
            .contenders
            .record(contenders)
            .map_err(span_error(slot, Metric::Contenders, None))
    }

    /// 记录一次成功确认：时延、服务时间与尝试次数
    pub fn record_ack(&mut self, slot: Slot, station: StationId, pkt: &Packet) -> Result<(), SimError> {
        let service = pkt.service_time_at(slot).ok_or(SimError::MissingServiceStart {
            slot: slot.0,
            station: station.0,
            packet: pkt.id,
        })?;
        let delay = pkt.delay_at(slot);
        let stats = self.at(slot);
        stats.delay[station.0]
            .record(delay as usize)
            .map_err(span_error(slot, Metric::Delay, Some(station)))?;
        stats.service[station.0]
            .record(service as usize)
            .map_err(span_error(slot, Metric::ServiceTime, Some(station)))?;
        stats.attempts[station.0]
            .record(pkt.attempts as usize)
            .map_err(span_error(slot, Metric::Attempts, Some(station)))?;
        stats.acknowledged[station.0] += 1;
        trace!(slot = slot.0, station = station.0, delay, service, attempts = pkt.attempts, "记录确认");
        Ok(())
    }

    pub fn generated(&self, phase: Phase, station: StationId) -> u64 {
        self.get(phase).generated[station.0]
    }

    pub fn acknowledged(&self, phase: Phase, station: StationId) -> u64 {
        self.get(phase).acknowledged[station.0]
    }

    pub fn generated_total(&self, station: StationId) -> u64 {
        Phase::ALL.iter().map(|&p| self.generated(p, station)).sum()
    }

    pub fn acknowledged_total(&self, station: StationId) -> u64 {
        Phase::ALL.iter().map(|&p| self.acknowledged(p, station)).sum()
    }

    /// 某阶段各站点的计数向量
    pub fn generated_by_station(&self, phase: Phase) -> &[u64] {
        &self.get(phase).generated
    }

    pub fn acknowledged_by_station(&self, phase: Phase) -> &[u64] {
        &self.get(phase).acknowledged
    }

    /// 按 (阶段, 指标, 站点) 查询直方图。站点级指标必须给出站点，信道级指标不能给出站点。
    pub fn histogram(
        &self,
        phase: Phase,
        metric: Metric,
        station: Option<StationId>,
    ) -> Option<&Histogram> {
        let stats = self.get(phase);
        match (metric, station) {
            (Metric::Multiplicity, None) => Some(&stats.multiplicity),
            (Metric::Contenders, None) => Some(&stats.contenders),
            (m, Some(s)) => stats.per_station(m)?.get(s.0),
            _ => None,
        }
    }

    /// 某阶段某站点级指标的全部站点直方图
    pub fn station_histograms(&self, phase: Phase, metric: Metric) -> &[Histogram] {
        self.get(phase).per_station(metric).unwrap_or(&[])
    }

    /// 全网汇总直方图：站点级指标逐站点求和，信道级指标直接返回
    pub fn network_histogram(&self, phase: Phase, metric: Metric) -> Histogram {
        if metric.per_station() {
            let hists = self.station_histograms(phase, metric);
            let span = hists.first().map(Histogram::span).unwrap_or(0);
            Histogram::sum_of(span, hists)
        } else {
            self.histogram(phase, metric, None)
                .cloned()
                .unwrap_or_else(|| Histogram::new(0))
        }
    }

    /// 每个 slot 结束时的站点一致性检查
    pub fn check_station(&self, slot: Slot, station: &Station) -> Result<(), SimError> {
        let id = station.id();
        let generated = self.generated_total(id);
        let acknowledged = self.acknowledged_total(id);
        if generated.checked_sub(acknowledged) != Some(station.queue_len() as u64) {
            return Err(SimError::PacketBalance {
                slot: slot.0,
                station: id.0,
                generated,
                acknowledged,
                queued: station.queue_len(),
            });
        }
        for phase in Phase::ALL {
            let acked = self.acknowledged(phase, id);
            let samples = self.get(phase).delay[id.0].bin_sum();
            if acked != samples {
                return Err(SimError::DelaySamples {
                    slot: slot.0,
                    station: id.0,
                    phase,
                    acknowledged: acked,
                    samples,
                });
            }
        }
        if generated != station.generated() {
            return Err(SimError::GeneratedCount {
                slot: slot.0,
                station: id.0,
                counted: generated,
                total: station.generated(),
            });
        }
        Ok(())
    }
}
