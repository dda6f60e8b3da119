//! 冲突解决算法（Contention Resolution Algorithms）
//!
//! 每种算法回答同一个问题：站点在下一次（重）传前需要等待多少个 slot。
//! 算法标签在配置阶段解析为 [`Algorithm`]，再通过 [`build`] 分发为具体实现。

use serde::{Deserialize, Serialize};

use crate::net::StationId;
use crate::sim::{SimError, Slot, VariateStream};

mod deterministic;
mod persistence;
mod tbeb;

pub use deterministic::Deterministic;
pub use persistence::{OptimalPersistence, PPersistence};
pub use tbeb::{TBEB_CEILING, Tbeb, tbeb_window};

/// 算法标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum Algorithm {
    /// 'D'：等待时长等于站点编号
    Deterministic,
    /// 'P'：固定 p-persistence
    PPersistence,
    /// 'O'：每个 slot 取 p = 1/n
    OptimalPersistence,
    /// 'B'：截断二进制指数退避
    Tbeb,
}

impl Algorithm {
    pub fn tag(self) -> char {
        self.into()
    }

    /// persistence 类算法每个 slot 重新抽样，而不是倒计时
    pub fn redraws_every_slot(self) -> bool {
        matches!(
            self,
            Algorithm::PPersistence | Algorithm::OptimalPersistence
        )
    }
}

impl TryFrom<char> for Algorithm {
    type Error = SimError;

    fn try_from(tag: char) -> Result<Self, Self::Error> {
        match tag.to_ascii_uppercase() {
            'D' => Ok(Algorithm::Deterministic),
            'P' => Ok(Algorithm::PPersistence),
            'O' => Ok(Algorithm::OptimalPersistence),
            'B' => Ok(Algorithm::Tbeb),
            _ => Err(SimError::UnknownAlgorithm(tag)),
        }
    }
}

impl From<Algorithm> for char {
    fn from(a: Algorithm) -> char {
        match a {
            Algorithm::Deterministic => 'D',
            Algorithm::PPersistence => 'P',
            Algorithm::OptimalPersistence => 'O',
            Algorithm::Tbeb => 'B',
        }
    }
}

/// 一次退避计算的输入
#[derive(Debug, Clone, Copy)]
pub struct BackoffRequest {
    pub slot: Slot,
    pub station: StationId,
    /// 队头包已经尝试发送的次数
    pub attempts: u32,
}

/// 冲突解决算法抽象
pub trait ContentionResolution: std::fmt::Debug + Send {
    fn algorithm(&self) -> Algorithm;

    /// 计算需要等待的 slot 数（0 表示本 slot 立即发送）
    fn backoff(&mut self, req: &BackoffRequest, rng: &mut VariateStream) -> Result<u32, SimError>;

    /// 是否需要在每个 slot 开始时扫描竞争站点数
    fn needs_occupancy_scan(&self) -> bool {
        false
    }

    /// 每个 slot 开始时（站点动作之前）告知当前竞争站点数
    fn on_slot_start(&mut self, _contenders: usize) {}

    /// 当前使用的持续概率（非 persistence 算法为 None）
    fn persistence(&self) -> Option<f64> {
        None
    }
}

/// 按标签构造算法实现
pub fn build(algorithm: Algorithm, p: f64) -> Box<dyn ContentionResolution> {
    match algorithm {
        Algorithm::Deterministic => Box::new(Deterministic),
        Algorithm::PPersistence => Box::new(PPersistence::new(p)),
        Algorithm::OptimalPersistence => Box::new(OptimalPersistence::default()),
        Algorithm::Tbeb => Box::new(Tbeb),
    }
}
