//! 业务生成器
//!
//! 每个到达率为正的站点维护一个以 slot 为单位的小数“下一到达时间”，
//! 通过独立的业务随机流累加到达间隔；算法层的随机抽样不会影响到达过程。

use tracing::{debug, trace};

use super::id::StationId;
use super::station::Station;
use crate::sim::{Interarrival, SimError, Slot, TRAFFIC_STREAM, VariateStream};
use crate::stats::StatsAccumulator;

#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    stream: VariateStream,
    interarrival: Interarrival,
    pareto_shape: f64,
}

impl TrafficGenerator {
    pub fn new(seed: u64, interarrival: Interarrival, pareto_shape: f64) -> Self {
        Self {
            stream: VariateStream::new(seed, TRAFFIC_STREAM),
            interarrival,
            pareto_shape,
        }
    }

    /// 按配置的分布抽取一个到达间隔（slot）
    pub fn draw_interarrival(&mut self, mean: f64) -> f64 {
        match self.interarrival {
            Interarrival::Exponential => self.stream.exponential(mean),
            Interarrival::Pareto => self.stream.pareto(mean, self.pareto_shape),
        }
    }

    /// 为每个站点抽取第一个到达时间（从时刻 0 起算）
    pub fn prime(&mut self, stations: &mut [Station]) {
        for station in stations.iter_mut() {
            if let Some(mean) = station.mean_interarrival() {
                let ia = self.draw_interarrival(mean);
                station.advance_next_arrival(ia);
                trace!(
                    station = station.id().0,
                    next_arrival = station.next_arrival(),
                    "初始化业务"
                );
            }
        }
    }

    /// 生成本 slot 的所有到达，返回到达的 packet 数
    pub fn generate(
        &mut self,
        slot: Slot,
        stations: &mut [Station],
        stats: &mut StatsAccumulator,
    ) -> Result<usize, SimError> {
        let mut arrivals = 0;
        for station in stations.iter_mut() {
            let Some(mean) = station.mean_interarrival() else {
                continue;
            };
            while station.arrival_due(slot) {
                station.accept_arrival(slot, station.next_arrival())?;
                stats.record_generated(slot, station.id());
                let ia = self.draw_interarrival(mean);
                station.advance_next_arrival(ia);
                arrivals += 1;
            }
        }
        if arrivals > 0 {
            debug!(slot = slot.0, arrivals, "业务到达");
        }
        Ok(arrivals)
    }

    /// 测试与场景注入：在 `slot` 为指定站点直接生成一个 packet
    pub fn inject(
        slot: Slot,
        station: &mut Station,
        stats: &mut StatsAccumulator,
    ) -> Result<StationId, SimError> {
        station.accept_arrival(slot, slot.0 as f64)?;
        stats.record_generated(slot, station.id());
        Ok(station.id())
    }
}
