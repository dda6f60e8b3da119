//! 随机变量生成
//!
//! 基于 ChaCha8 的可复现随机流：相同种子与相同调用序列得到逐位相同的输出。
//! 主流（算法层随机性）与业务流（到达间隔）使用同一种子的不同 ChaCha stream，
//! 互不干扰。

use rand::distributions::Standard;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 算法层随机流
pub const MAIN_STREAM: u64 = 0;
/// 业务生成随机流
pub const TRAFFIC_STREAM: u64 = 1;

#[derive(Debug, Clone)]
pub struct VariateStream {
    rng: ChaCha8Rng,
}

impl VariateStream {
    pub fn new(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    /// [0, 1) 上的均匀分布
    pub fn uniform(&mut self) -> f64 {
        self.rng.sample(Standard)
    }

    /// [0, bound) 上的均匀整数；`bound` 为 0 时返回 0
    pub fn uniform_below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    /// 逆 CDF 指数分布抽样，均值为 `mean`。
    ///
    /// 使用 `1 - u` 保证对数的参数落在 (0, 1]。
    pub fn exponential(&mut self, mean: f64) -> f64 {
        let u = self.uniform();
        -mean * (1.0 - u).ln()
    }

    /// 逆 CDF Pareto 抽样，尺度按 `mean` 反推（要求 `shape > 1`）。
    pub fn pareto(&mut self, mean: f64, shape: f64) -> f64 {
        let scale = mean * (shape - 1.0) / shape;
        let u = self.uniform();
        scale / (1.0 - u).powf(1.0 / shape)
    }
}
