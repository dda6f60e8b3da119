//! 派生统计量：置信区间、相对精度与目标样本数

use serde::Serialize;

use crate::sim::SimError;

/// 单个直方图的派生统计量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub samples: u64,
    pub mean: f64,
    pub stddev: f64,
    pub min: Option<usize>,
    pub max: Option<usize>,
    /// max - min
    pub jitter: Option<usize>,
    pub p95: Option<usize>,
    /// 置信区间半宽 z·σ/√N
    pub ci: Option<f64>,
    /// 实际达到的相对精度 100·CI/mean（%）
    pub resolution: Option<f64>,
}

/// 置信区间半宽 z·σ/√N；无样本时为 None
pub fn confidence_interval(stddev: f64, n: u64, z: f64) -> Option<f64> {
    (n > 0).then(|| z * stddev / (n as f64).sqrt())
}

/// 相对精度（%）
pub fn relative_resolution(ci: f64, mean: f64) -> Option<f64> {
    (mean != 0.0).then(|| 100.0 * ci / mean)
}

/// 达到目标相对精度 r（%）所需的样本数 N* = ceil((100·z·σ / (r·mean))²)。
///
/// r 为 0 是配置错误；mean 为 0 时无法定义，返回 None。
pub fn target_sample_size(z: f64, r: f64, mean: f64, stddev: f64) -> Result<Option<u64>, SimError> {
    if r == 0.0 {
        return Err(SimError::ZeroResolution);
    }
    let n = ((100.0 * z * stddev) / (r * mean)).powi(2);
    if !n.is_finite() {
        return Ok(None);
    }
    Ok(Some(n.ceil() as u64))
}
