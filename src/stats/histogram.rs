//! 定长直方图
//!
//! bin 下标即观测值。取值超出跨度时返回错误，绝不截断。

use serde::Serialize;

use super::summary::{HistogramSummary, confidence_interval, relative_resolution};

/// 观测值超出直方图跨度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanExceeded {
    pub value: usize,
    pub span: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    bins: Vec<u64>,
    samples: u64,
}

impl Histogram {
    pub fn new(span: usize) -> Self {
        Self {
            bins: vec![0; span],
            samples: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_bins(bins: Vec<u64>) -> Self {
        let samples = bins.iter().sum();
        Self { bins, samples }
    }

    pub fn record(&mut self, value: usize) -> Result<(), SpanExceeded> {
        let span = self.bins.len();
        let bin = self
            .bins
            .get_mut(value)
            .ok_or(SpanExceeded { value, span })?;
        *bin += 1;
        self.samples += 1;
        Ok(())
    }

    pub fn span(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// 记录的观测次数
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// 逐 bin 重新求和（与 `samples` 必须一致）
    pub fn bin_sum(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn min(&self) -> Option<usize> {
        self.bins.iter().position(|&c| c != 0)
    }

    pub fn max(&self) -> Option<usize> {
        self.bins.iter().rposition(|&c| c != 0)
    }

    pub fn jitter(&self) -> Option<usize> {
        Some(self.max()? - self.min()?)
    }

    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        let total: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(v, &c)| v as f64 * c as f64)
            .sum();
        total / self.samples as f64
    }

    /// 总体标准差（除以 N）
    pub fn stddev(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let sq: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(v, &c)| c as f64 * (v as f64 - mean).powi(2))
            .sum();
        (sq / self.samples as f64).sqrt()
    }

    /// 累计占比首次达到 `pct`% 的最小 bin
    pub fn percentile(&self, pct: u64) -> Option<usize> {
        if self.samples == 0 {
            return None;
        }
        let mut cum = 0_u64;
        for (v, &c) in self.bins.iter().enumerate() {
            cum += c;
            if cum * 100 >= pct * self.samples {
                return Some(v);
            }
        }
        None
    }

    /// 逐 bin 累加另一个直方图（跨度不同时按较大者扩展）
    pub fn merge(&mut self, other: &Histogram) {
        if other.bins.len() > self.bins.len() {
            self.bins.resize(other.bins.len(), 0);
        }
        for (dst, &src) in self.bins.iter_mut().zip(other.bins.iter()) {
            *dst += src;
        }
        self.samples += other.samples;
    }

    /// 多个站点直方图之和
    pub fn sum_of<'a>(span: usize, hists: impl IntoIterator<Item = &'a Histogram>) -> Histogram {
        let mut sum = Histogram::new(span);
        for h in hists {
            sum.merge(h);
        }
        sum
    }

    pub fn summary(&self, z: f64) -> HistogramSummary {
        let mean = self.mean();
        let stddev = self.stddev();
        let ci = confidence_interval(stddev, self.samples, z);
        HistogramSummary {
            samples: self.samples,
            mean,
            stddev,
            min: self.min(),
            max: self.max(),
            jitter: self.jitter(),
            p95: self.percentile(95),
            ci,
            resolution: ci.and_then(|ci| relative_resolution(ci, mean)),
        }
    }
}
