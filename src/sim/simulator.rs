//! 仿真器
//!
//! 固定步长的 slot 仿真：一次运行的全部状态都保存在 [`SlottedAloha`] 中。
//! 每个 slot 严格按以下顺序执行：
//!
//! 1. 清空信道 slot；
//! 2. 若为最优 p-persistence，扫描竞争站点数并更新 p；
//! 3. 为所有站点生成业务；
//! 4. 按站点编号递增顺序运行站点状态机；
//! 5. 结算 slot（汇聚站点确认、冲突站点退避、更新统计并做一致性检查）。

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use super::config::SimConfig;
use super::error::SimError;
use super::time::{Slot, SlotClock};
use super::variate::{MAIN_STREAM, VariateStream};
use crate::cra::{self, ContentionResolution};
use crate::net::{ChannelSlot, SlotOutcome, Station, StationId, TrafficGenerator};
use crate::stats::{HistogramSpans, Report, RunInfo, StatsAccumulator};

/// 种子为 0 时使用系统时钟
pub fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(1)
        .max(1)
}

#[derive(Debug)]
pub struct SlottedAloha {
    config: SimConfig,
    seed: u64,
    clock: SlotClock,
    total_slots: u64,
    slot: Slot,
    stations: Vec<Station>,
    channel: ChannelSlot,
    cra: Box<dyn ContentionResolution>,
    rng: VariateStream,
    traffic: TrafficGenerator,
    stats: StatsAccumulator,
}

impl SlottedAloha {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let seed = resolve_seed(config.seed);
        let clock = config.clock();
        let n = config.stations;

        let mut stations: Vec<Station> = (0..n)
            .map(|i| Station::new(StationId(i), config.station_rate(), config.queue_capacity))
            .collect();
        let mut traffic = TrafficGenerator::new(seed, config.interarrival, config.pareto_shape);
        traffic.prime(&mut stations);

        let spans = HistogramSpans {
            queue: config.queue_capacity + 1,
            delay: config.delay_bins,
            attempts: config.attempt_bins,
            channel: n + 1,
        };
        let stats = StatsAccumulator::new(n, spans, Slot(config.warmup_slots()));

        info!(
            stations = n,
            algorithm = %config.algorithm.tag(),
            load = config.load,
            seed,
            slot_us = clock.slot_micros(),
            total_slots = config.total_slots(),
            warmup_slots = config.warmup_slots(),
            "初始化仿真"
        );

        Ok(Self {
            total_slots: config.total_slots(),
            cra: cra::build(config.algorithm, config.persistence),
            rng: VariateStream::new(seed, MAIN_STREAM),
            channel: ChannelSlot::with_capacity(n),
            config,
            seed,
            clock,
            slot: Slot::ZERO,
            stations,
            traffic,
            stats,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 实际使用的种子（配置为 0 时由系统时钟决定）
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn clock(&self) -> &SlotClock {
        &self.clock
    }

    pub fn total_slots(&self) -> u64 {
        self.total_slots
    }

    /// 下一个待仿真的 slot（即已完成的 slot 数）
    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn is_finished(&self) -> bool {
        self.slot.0 >= self.total_slots
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// 最近一个 slot 的信道记录
    pub fn channel(&self) -> &ChannelSlot {
        &self.channel
    }

    pub fn cra(&self) -> &dyn ContentionResolution {
        self.cra.as_ref()
    }

    pub fn stats(&self) -> &StatsAccumulator {
        &self.stats
    }

    fn sink(&self) -> StationId {
        StationId::sink(self.stations.len())
    }

    /// 在当前 slot 为指定站点直接放入一个 packet（场景构造用）
    pub fn inject_packet(&mut self, station: StationId) -> Result<(), SimError> {
        let slot = self.slot;
        let target = self.stations.get_mut(station.0).ok_or_else(|| {
            SimError::invalid("station", format!("no station {} to inject into", station.0))
        })?;
        TrafficGenerator::inject(slot, target, &mut self.stats)?;
        Ok(())
    }

    /// 运行直到配置的仿真时长结束
    #[tracing::instrument(skip(self), fields(seed = self.seed, total_slots = self.total_slots))]
    pub fn run(&mut self) -> Result<(), SimError> {
        info!("▶️  开始运行仿真");
        let mut collisions = 0_u64;
        let mut successes = 0_u64;
        while !self.is_finished() {
            match self.step()? {
                SlotOutcome::Collision(_) => collisions += 1,
                SlotOutcome::Success(_) => successes += 1,
                SlotOutcome::Empty => {}
            }
        }
        info!(
            slots = self.slot.0,
            successes,
            collisions,
            "✅ 仿真完成"
        );
        Ok(())
    }

    /// 仿真一个 slot
    pub fn step(&mut self) -> Result<SlotOutcome, SimError> {
        let now = self.slot;
        self.channel.reset(now);

        if self.cra.needs_occupancy_scan() {
            let n = self.stations.iter().filter(|s| s.is_contending(now)).count();
            self.cra.on_slot_start(n);
            self.stats.record_contenders(now, n)?;
        }

        self.traffic
            .generate(now, &mut self.stations, &mut self.stats)?;

        let sink = self.sink();
        for station in self.stations.iter_mut() {
            station.run(now, sink, self.cra.as_mut(), &mut self.rng, &mut self.channel)?;
        }

        let outcome = self.resolve_slot(now)?;
        self.slot = now.next();
        Ok(outcome)
    }

    /// 汇聚站点在 slot 末尾结算：必须在所有站点动作之后执行，此时信道状态已是最终状态
    fn resolve_slot(&mut self, now: Slot) -> Result<SlotOutcome, SimError> {
        for station in &self.stations {
            self.stats
                .record_queue_length(now, station.id(), station.queue_len())?;
        }

        let multiplicity = self.channel.multiplicity();
        if multiplicity as usize > self.stations.len() {
            return Err(SimError::MultiplicityOverflow {
                slot: now.0,
                multiplicity,
                stations: self.stations.len(),
            });
        }
        self.stats.record_multiplicity(now, multiplicity)?;

        let sink = self.sink();
        let outcome = self.channel.outcome();
        for &id in self.channel.contenders() {
            let station = &mut self.stations[id.0];
            if station.tx_slot() != Some(now) {
                return Err(SimError::StaleTransmission {
                    slot: now.0,
                    station: id.0,
                });
            }
            match outcome {
                SlotOutcome::Success(src) if src == id && self.channel.destination() == Some(sink) => {
                    let pkt = station.acknowledge(&self.channel)?;
                    self.stats.record_ack(now, id, &pkt)?;
                    debug!(slot = now.0, station = id.0, pkt = pkt.id, "成功发送");
                }
                _ => station.collide(now, self.cra.as_mut(), &mut self.rng)?,
            }
        }
        if let SlotOutcome::Collision(m) = outcome {
            debug!(slot = now.0, multiplicity = m, "信道冲突");
        }

        for station in &self.stations {
            self.stats.check_station(now, station)?;
        }
        Ok(outcome)
    }

    /// 生成报告（运行中止时也可调用，得到部分统计）
    pub fn report(&self) -> Report {
        let run = RunInfo {
            algorithm: self.config.algorithm.tag(),
            interarrival: self.config.interarrival.into(),
            stations: self.stations.len(),
            seed: self.seed,
            slot_micros: self.clock.slot_micros(),
            total_slots: self.total_slots,
            warmup_slots: self.config.warmup_slots(),
            simulated_slots: self.slot.0,
            simulated_ms: self.clock.slots_to_millis(self.slot.0),
            completed: self.is_finished(),
            z: self.config.z,
            target_resolution: self.config.resolution,
        };
        Report::collect(
            &self.stats,
            run,
            &self.clock,
            self.cra.needs_occupancy_scan(),
        )
    }
}
