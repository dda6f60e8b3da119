//! 仿真报告
//!
//! 运行结束（或因错误中止）时把稳态阶段的统计量整理为可序列化的报告，
//! 并给出 Little 定律与 M/D/1 的理论参考值。

use std::fmt;

use serde::Serialize;

use super::accumulator::{Metric, Phase, StatsAccumulator};
use super::histogram::Histogram;
use super::summary::{HistogramSummary, confidence_interval, target_sample_size};
use crate::sim::SlotClock;

/// 本次运行的元信息
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub algorithm: char,
    pub interarrival: char,
    pub stations: usize,
    pub seed: u64,
    pub slot_micros: f64,
    pub total_slots: u64,
    pub warmup_slots: u64,
    /// 实际仿真完成的 slot 数（中止时小于 `total_slots`）
    pub simulated_slots: u64,
    pub simulated_ms: f64,
    pub completed: bool,
    pub z: f64,
    pub target_resolution: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramReport {
    #[serde(flatten)]
    pub summary: HistogramSummary,
    /// 截断到最大非零 bin 之后再多一个 0
    pub bins: Vec<u64>,
}

impl HistogramReport {
    fn new(h: &Histogram, z: f64) -> Self {
        let shown = h.max().map(|m| m + 2).unwrap_or(1).min(h.span());
        Self {
            summary: h.summary(z),
            bins: h.bins()[..shown].to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    pub per_station: Vec<HistogramReport>,
    pub network: HistogramReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterReport {
    pub warmup: Vec<u64>,
    pub warmup_mean: f64,
    pub steady: Vec<u64>,
    pub steady_mean: f64,
}

impl CounterReport {
    fn new(warmup: &[u64], steady: &[u64]) -> Self {
        let mean = |v: &[u64]| {
            if v.is_empty() {
                0.0
            } else {
                v.iter().sum::<u64>() as f64 / v.len() as f64
            }
        };
        Self {
            warmup_mean: mean(warmup),
            warmup: warmup.to_vec(),
            steady_mean: mean(steady),
            steady: steady.to_vec(),
        }
    }
}

/// 全网汇总指标。站点平均值按“有样本站点之和 / 站点总数”计算，
/// 置信区间取自全网汇总直方图。
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub steady_slots: u64,
    /// 每 slot 的包数
    pub offered_load: f64,
    pub offered_mbps: f64,
    pub utilization: f64,
    pub avg_queue_length: f64,
    pub avg_delay: f64,
    pub stddev_delay: f64,
    pub jitter_delay: f64,
    pub p95_delay: f64,
    pub delay_ci: Option<f64>,
    pub delay_samples: u64,
    pub delay_target_samples: Option<u64>,
    pub avg_service: f64,
    pub stddev_service: f64,
    pub service_ci: Option<f64>,
    pub service_samples: u64,
    pub service_target_samples: Option<u64>,
}

/// 理论参考值
#[derive(Debug, Clone, Serialize)]
pub struct TheoryReport {
    /// Little 定律：平均队长 / 单站负载
    pub littles_delay: Option<f64>,
    /// M/D/1：1 + ρ/(2(1-ρ))
    pub md1_delay: Option<f64>,
    /// M/D/1：ρ + ρ²/(2(1-ρ))
    pub md1_queue_length: Option<f64>,
}

impl TheoryReport {
    pub fn new(avg_queue_length: f64, offered_load: f64, stations: usize) -> Self {
        let per_station = offered_load / stations as f64;
        let stable = offered_load < 1.0;
        let rho = offered_load;
        Self {
            littles_delay: (per_station > 0.0).then(|| avg_queue_length / per_station),
            md1_delay: stable.then(|| 1.0 + rho / (2.0 * (1.0 - rho))),
            md1_queue_length: stable.then(|| rho + rho.powi(2) / (2.0 * (1.0 - rho))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run: RunInfo,
    pub queue_length: MetricReport,
    pub delay: MetricReport,
    pub service_time: MetricReport,
    pub attempts: MetricReport,
    pub multiplicity: HistogramReport,
    pub contenders: Option<HistogramReport>,
    pub acknowledged: CounterReport,
    pub generated: CounterReport,
    pub summary: NetworkSummary,
    pub theory: TheoryReport,
}

/// 站点平均：有样本的站点求和后除以站点总数
#[derive(Debug, Default)]
struct StationAverages {
    mean: f64,
    stddev: f64,
    jitter: f64,
    p95: f64,
}

fn station_averages(hists: &[Histogram]) -> StationAverages {
    let mut acc = StationAverages::default();
    for h in hists.iter().filter(|h| h.samples() > 0) {
        acc.mean += h.mean();
        acc.stddev += h.stddev();
        acc.jitter += h.jitter().unwrap_or(0) as f64;
        acc.p95 += h.percentile(95).unwrap_or(0) as f64;
    }
    let n = hists.len().max(1) as f64;
    StationAverages {
        mean: acc.mean / n,
        stddev: acc.stddev / n,
        jitter: acc.jitter / n,
        p95: acc.p95 / n,
    }
}

fn metric_report(stats: &StatsAccumulator, metric: Metric, z: f64) -> MetricReport {
    MetricReport {
        per_station: stats
            .station_histograms(Phase::Steady, metric)
            .iter()
            .map(|h| HistogramReport::new(h, z))
            .collect(),
        network: HistogramReport::new(&stats.network_histogram(Phase::Steady, metric), z),
    }
}

impl Report {
    pub fn collect(
        stats: &StatsAccumulator,
        run: RunInfo,
        clock: &SlotClock,
        with_contenders: bool,
    ) -> Self {
        let z = run.z;
        let r = run.target_resolution;
        let stations = stats.stations();
        let steady = Phase::Steady;

        let steady_slots = run.simulated_slots.saturating_sub(run.warmup_slots);
        let per_slot = |count: u64| {
            if steady_slots == 0 {
                0.0
            } else {
                count as f64 / steady_slots as f64
            }
        };
        let offered_load = per_slot(stats.generated_by_station(steady).iter().sum());
        let utilization = per_slot(stats.acknowledged_by_station(steady).iter().sum());

        let queue = station_averages(stats.station_histograms(steady, Metric::QueueLength));
        let delay = station_averages(stats.station_histograms(steady, Metric::Delay));
        let service = station_averages(stats.station_histograms(steady, Metric::ServiceTime));

        let delay_sum = stats.network_histogram(steady, Metric::Delay);
        let service_sum = stats.network_histogram(steady, Metric::ServiceTime);
        let target = |mean: f64, stddev: f64| target_sample_size(z, r, mean, stddev).ok().flatten();

        let summary = NetworkSummary {
            steady_slots,
            offered_load,
            offered_mbps: clock.load_to_mbps(offered_load),
            utilization,
            avg_queue_length: queue.mean,
            avg_delay: delay.mean,
            stddev_delay: delay.stddev,
            jitter_delay: delay.jitter,
            p95_delay: delay.p95,
            delay_ci: confidence_interval(delay_sum.stddev(), delay_sum.samples(), z),
            delay_samples: delay_sum.samples(),
            delay_target_samples: target(delay.mean, delay.stddev),
            avg_service: service.mean,
            stddev_service: service.stddev,
            service_ci: confidence_interval(service_sum.stddev(), service_sum.samples(), z),
            service_samples: service_sum.samples(),
            service_target_samples: target(service.mean, service.stddev),
        };

        Self {
            theory: TheoryReport::new(summary.avg_queue_length, offered_load, stations),
            queue_length: metric_report(stats, Metric::QueueLength, z),
            delay: metric_report(stats, Metric::Delay, z),
            service_time: metric_report(stats, Metric::ServiceTime, z),
            attempts: metric_report(stats, Metric::Attempts, z),
            multiplicity: HistogramReport::new(
                &stats.network_histogram(steady, Metric::Multiplicity),
                z,
            ),
            contenders: with_contenders.then(|| {
                HistogramReport::new(&stats.network_histogram(steady, Metric::Contenders), z)
            }),
            acknowledged: CounterReport::new(
                stats.acknowledged_by_station(Phase::WarmUp),
                stats.acknowledged_by_station(steady),
            ),
            generated: CounterReport::new(
                stats.generated_by_station(Phase::WarmUp),
                stats.generated_by_station(steady),
            ),
            summary,
            run,
        }
    }
}

fn opt<T: fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn opt_f(v: Option<f64>, prec: usize) -> String {
    v.map(|v| format!("{v:.prec$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn write_hist(f: &mut fmt::Formatter<'_>, title: &str, h: &HistogramReport) -> fmt::Result {
    let s = &h.summary;
    writeln!(f, "{title}")?;
    writeln!(
        f,
        "  samples={} mean={:.4} stddev={:.4} min={} max={} jitter={} p95={} ci={} r={}%",
        s.samples,
        s.mean,
        s.stddev,
        opt(s.min),
        opt(s.max),
        opt(s.jitter),
        opt(s.p95),
        opt_f(s.ci, 4),
        opt_f(s.resolution, 2),
    )?;
    for (row, chunk) in h.bins.chunks(10).enumerate() {
        write!(f, "  {:>5} |", row * 10)?;
        for c in chunk {
            write!(f, " {c:>7}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn write_metric(f: &mut fmt::Formatter<'_>, name: &str, m: &MetricReport) -> fmt::Result {
    for (i, h) in m.per_station.iter().enumerate() {
        write_hist(f, &format!("{name} histogram of station {i}"), h)?;
    }
    write_hist(f, &format!("{name} histogram over all stations"), &m.network)
}

fn write_counter(f: &mut fmt::Formatter<'_>, name: &str, c: &CounterReport) -> fmt::Result {
    writeln!(f, "{name} per station (warm-up, mean {:.2}): {:?}", c.warmup_mean, c.warmup)?;
    writeln!(f, "{name} per station (steady, mean {:.2}): {:?}", c.steady_mean, c.steady)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = &self.run;
        writeln!(
            f,
            "run: algorithm={} interarrival={} stations={} seed={} slot={:.3}us slots={}/{} ({:.3} ms) warmup={} completed={}",
            run.algorithm,
            run.interarrival,
            run.stations,
            run.seed,
            run.slot_micros,
            run.simulated_slots,
            run.total_slots,
            run.simulated_ms,
            run.warmup_slots,
            run.completed,
        )?;
        writeln!(f)?;
        write_metric(f, "queue length", &self.queue_length)?;
        write_metric(f, "delay", &self.delay)?;
        write_metric(f, "service time", &self.service_time)?;
        write_metric(f, "transmission attempts", &self.attempts)?;
        write_hist(f, "collision multiplicity histogram", &self.multiplicity)?;
        if let Some(c) = &self.contenders {
            write_hist(f, "optimal-persistence contender histogram", c)?;
        }
        write_counter(f, "packets acknowledged", &self.acknowledged)?;
        write_counter(f, "packets generated", &self.generated)?;

        let s = &self.summary;
        writeln!(f)?;
        writeln!(f, "summary:")?;
        writeln!(f, "  offered load         : {:.6} ({:.4} Mbps)", s.offered_load, s.offered_mbps)?;
        writeln!(f, "  utilization          : {:.6}", s.utilization)?;
        writeln!(f, "  avg queue length     : {:.6} pkts", s.avg_queue_length)?;
        writeln!(
            f,
            "  avg delay            : {:.4} slots ci={} samples={} target={}",
            s.avg_delay,
            opt_f(s.delay_ci, 4),
            s.delay_samples,
            opt(s.delay_target_samples),
        )?;
        writeln!(f, "  delay stddev         : {:.4} slots", s.stddev_delay)?;
        writeln!(f, "  delay jitter         : {:.4} slots", s.jitter_delay)?;
        writeln!(f, "  delay p95            : {:.4} slots", s.p95_delay)?;
        writeln!(
            f,
            "  avg service time     : {:.4} slots ci={} samples={} target={}",
            s.avg_service,
            opt_f(s.service_ci, 4),
            s.service_samples,
            opt(s.service_target_samples),
        )?;
        writeln!(f, "  service time stddev  : {:.4} slots", s.stddev_service)?;

        let t = &self.theory;
        writeln!(f)?;
        writeln!(f, "theory:")?;
        writeln!(f, "  Little's law delay   : {} slots", opt_f(t.littles_delay, 4))?;
        writeln!(f, "  M/D/1 delay          : {} slots", opt_f(t.md1_delay, 4))?;
        writeln!(f, "  M/D/1 queue length   : {} pkts", opt_f(t.md1_queue_length, 4))
    }
}
