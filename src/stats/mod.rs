//! 统计模块
//!
//! 直方图累加、派生统计量（均值、标准差、分位数、置信区间、目标样本数）与最终报告。

mod accumulator;
mod histogram;
mod report;
mod summary;

pub use accumulator::{HistogramSpans, Metric, Phase, StatsAccumulator};
pub use histogram::{Histogram, SpanExceeded};
pub use report::{
    CounterReport, HistogramReport, MetricReport, NetworkSummary, Report, RunInfo, TheoryReport,
};
pub use summary::{
    HistogramSummary, confidence_interval, relative_resolution, target_sample_size,
};
