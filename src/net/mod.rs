//! 网络模拟模块
//!
//! 此模块包含 slotted ALOHA 网络的核心组件：站点、数据包、信道 slot 与业务生成器。

// 子模块声明
mod channel;
mod id;
mod packet;
mod station;
mod traffic;

// 重新导出公共接口
pub use channel::{ChannelSlot, SlotOutcome};
pub use id::StationId;
pub use packet::Packet;
pub use station::{Station, StationState};
pub use traffic::TrafficGenerator;
