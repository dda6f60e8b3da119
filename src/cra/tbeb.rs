use tracing::trace;

use super::{Algorithm, BackoffRequest, ContentionResolution};
use crate::sim::{SimError, VariateStream};

/// 退避窗口指数的上限：窗口最大为 2^10
pub const TBEB_CEILING: u32 = 10;

/// 第 `attempts` 次尝试后的退避窗口大小 2^min(attempts, 10)
pub fn tbeb_window(attempts: u32) -> u64 {
    1_u64 << attempts.min(TBEB_CEILING)
}

/// 截断二进制指数退避（Truncated Binary Exponential Backoff）
#[derive(Debug, Clone, Copy, Default)]
pub struct Tbeb;

impl ContentionResolution for Tbeb {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Tbeb
    }

    fn backoff(&mut self, req: &BackoffRequest, rng: &mut VariateStream) -> Result<u32, SimError> {
        let window = tbeb_window(req.attempts);
        let wait = rng.uniform_below(window) as u32;
        trace!(
            slot = req.slot.0,
            station = req.station.0,
            attempts = req.attempts,
            window,
            wait,
            "CRA TBEB"
        );
        Ok(wait)
    }
}
