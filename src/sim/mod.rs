//! 仿真核心模块
//!
//! 此模块包含 slot 驱动仿真的核心组件：仿真时间、配置、随机流、错误类型与仿真器。

// 子模块声明
mod config;
mod error;
mod simulator;
mod time;
mod variate;

// 重新导出公共接口
pub use config::{
    DEFAULT_ATTEMPT_BINS, DEFAULT_DELAY_BINS, DEFAULT_PARETO_SHAPE, DEFAULT_QUEUE_CAPACITY,
    Interarrival, SimConfig,
};
pub use error::{ErrorKind, SimError};
pub use simulator::{SlottedAloha, resolve_seed};
pub use time::{Slot, SlotClock};
pub use variate::{MAIN_STREAM, TRAFFIC_STREAM, VariateStream};
