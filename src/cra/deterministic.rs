use tracing::trace;

use super::{Algorithm, BackoffRequest, ContentionResolution};
use crate::sim::{SimError, VariateStream};

/// 确定性算法：等待 slot 数等于站点编号（教学用基线）。
#[derive(Debug, Clone, Copy, Default)]
pub struct Deterministic;

impl ContentionResolution for Deterministic {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Deterministic
    }

    fn backoff(&mut self, req: &BackoffRequest, _rng: &mut VariateStream) -> Result<u32, SimError> {
        let wait = req.station.0 as u32;
        trace!(slot = req.slot.0, station = req.station.0, wait, "CRA deterministic");
        Ok(wait)
    }
}
