//! 定长环形队列
//!
//! 容量在创建时确定，运行期间不再分配内存；队满时新到达的 packet 被拒绝。

use crate::net::Packet;

#[derive(Debug, Clone)]
pub struct RingQueue {
    buf: Vec<Option<Packet>>,
    head: usize,
    tail: usize,
    len: usize,
}

impl RingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// 入队：成功返回 Ok；队满则返回 Err(pkt)
    pub fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        if self.len == self.buf.len() {
            return Err(pkt);
        }
        self.buf[self.tail] = Some(pkt);
        self.tail = (self.tail + 1) % self.buf.len();
        self.len += 1;
        Ok(())
    }

    /// 出队：按 FIFO 顺序返回队头 packet
    pub fn dequeue(&mut self) -> Option<Packet> {
        if self.len == 0 {
            return None;
        }
        let pkt = self.buf[self.head].take();
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        pkt
    }

    pub fn head(&self) -> Option<&Packet> {
        if self.len == 0 {
            return None;
        }
        self.buf[self.head].as_ref()
    }

    pub fn head_mut(&mut self) -> Option<&mut Packet> {
        if self.len == 0 {
            return None;
        }
        self.buf[self.head].as_mut()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}
