//! p-persistence 与最优 p-persistence
//!
//! 两者抽样方式相同：抽一个均匀随机数 u，u < p 则本 slot 发送（等待 0），否则等待 1。
//! 最优版本在每个 slot 开始时把 p 设为 1/n。

use tracing::trace;

use super::{Algorithm, BackoffRequest, ContentionResolution};
use crate::sim::{SimError, VariateStream};

fn persistence_draw(p: f64, rng: &mut VariateStream) -> Result<(u32, f64), SimError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SimError::ProbabilityOutOfRange(p));
    }
    let u = rng.uniform();
    Ok((if u < p { 0 } else { 1 }, u))
}

#[derive(Debug, Clone, Copy)]
pub struct PPersistence {
    p: f64,
}

impl PPersistence {
    pub fn new(p: f64) -> Self {
        Self { p }
    }
}

impl ContentionResolution for PPersistence {
    fn algorithm(&self) -> Algorithm {
        Algorithm::PPersistence
    }

    fn backoff(&mut self, req: &BackoffRequest, rng: &mut VariateStream) -> Result<u32, SimError> {
        let (wait, u) = persistence_draw(self.p, rng)?;
        trace!(slot = req.slot.0, station = req.station.0, wait, u, "CRA p-persistence");
        Ok(wait)
    }

    fn persistence(&self) -> Option<f64> {
        Some(self.p)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalPersistence {
    p: Option<f64>,
    contenders: usize,
}

impl OptimalPersistence {
    /// 最近一次扫描得到的竞争站点数
    pub fn contenders(&self) -> usize {
        self.contenders
    }
}

impl ContentionResolution for OptimalPersistence {
    fn algorithm(&self) -> Algorithm {
        Algorithm::OptimalPersistence
    }

    fn backoff(&mut self, req: &BackoffRequest, rng: &mut VariateStream) -> Result<u32, SimError> {
        // 站点编号只做透传，不参与计算
        let p = self.p.ok_or(SimError::UndefinedOptimalP { slot: req.slot.0 })?;
        let (wait, u) = persistence_draw(p, rng)?;
        trace!(slot = req.slot.0, station = req.station.0, wait, u, p, "CRA optimal p-persistence");
        Ok(wait)
    }

    fn needs_occupancy_scan(&self) -> bool {
        true
    }

    fn on_slot_start(&mut self, contenders: usize) {
        self.contenders = contenders;
        self.p = (contenders > 0).then(|| 1.0 / contenders as f64);
        if let Some(p) = self.p {
            trace!(n = contenders, p, "CRA optimal p-persistence 更新 p");
        }
    }

    fn persistence(&self) -> Option<f64> {
        self.p
    }
}
