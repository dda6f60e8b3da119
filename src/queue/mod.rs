//! 站点发送队列
//!
//! 每个站点独占一个定长 FIFO 队列，保存等待发送的 packet。

mod ring;

pub use ring::RingQueue;
