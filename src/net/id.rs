//! 标识符类型
//!
//! 定义站点的唯一标识符。

use serde::Serialize;

/// 站点标识符（同时也是站点在数组中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StationId(pub usize);

impl StationId {
    /// 汇聚站点（所有 packet 的目的地址）的地址等于站点总数
    pub fn sink(stations: usize) -> StationId {
        StationId(stations)
    }
}
