use crate::net::Packet;
use crate::queue::RingQueue;
use crate::sim::Slot;

fn pkt(id: u64) -> Packet {
    Packet::new(id, id as f64, Slot(id))
}

#[test]
fn ring_queue_enforces_capacity_and_preserves_order() {
    let mut q = RingQueue::new(2);
    assert_eq!(q.capacity(), 2);
    assert!(q.is_empty());

    assert!(q.enqueue(pkt(1)).is_ok());
    assert!(q.enqueue(pkt(2)).is_ok());
    assert_eq!(q.len(), 2);

    let rejected = q.enqueue(pkt(3)).expect_err("should reject");
    assert_eq!(rejected.id, 3);
    assert_eq!(q.len(), 2);

    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 2);
    assert!(q.dequeue().is_none());
    assert!(q.head().is_none());
}

#[test]
fn ring_queue_wraps_around_without_losing_fifo_order() {
    let mut q = RingQueue::new(3);
    for round in 0..5_u64 {
        let base = round * 10;
        assert!(q.enqueue(pkt(base)).is_ok());
        assert!(q.enqueue(pkt(base + 1)).is_ok());
        assert_eq!(q.len(), 2);
        assert_eq!(q.head().expect("head").id, base);
        assert_eq!(q.dequeue().expect("pkt").id, base);
        assert_eq!(q.dequeue().expect("pkt").id, base + 1);
    }
    assert_eq!(q.len(), 0);
}

#[test]
fn ring_queue_head_mut_updates_in_place() {
    let mut q = RingQueue::new(4);
    assert!(q.enqueue(pkt(7)).is_ok());
    assert!(q.enqueue(pkt(8)).is_ok());
    q.head_mut().expect("head").attempts += 3;
    assert_eq!(q.head().expect("head").attempts, 3);
    assert_eq!(q.dequeue().expect("first").attempts, 3);
    assert_eq!(q.head().expect("second").attempts, 0);
}

#[test]
fn ring_queue_with_zero_capacity_rejects_everything() {
    let mut q = RingQueue::new(0);
    assert!(q.enqueue(pkt(1)).is_err());
    assert!(q.dequeue().is_none());
}
