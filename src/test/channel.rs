use crate::net::{ChannelSlot, Packet, SlotOutcome, StationId};
use crate::sim::Slot;

#[test]
fn channel_outcome_follows_transmitter_count() {
    let sink = StationId::sink(3);
    let mut ch = ChannelSlot::with_capacity(3);

    ch.reset(Slot(4));
    assert_eq!(ch.outcome(), SlotOutcome::Empty);
    assert_eq!(ch.slot(), Slot(4));

    ch.transmit(StationId(1), sink, &Packet::new(9, 1.5, Slot(2)));
    assert_eq!(ch.outcome(), SlotOutcome::Success(StationId(1)));
    assert_eq!(ch.destination(), Some(StationId(3)));
    assert_eq!(ch.packet().map(|p| p.id), Some(9));

    ch.transmit(StationId(2), sink, &Packet::new(0, 3.0, Slot(3)));
    assert_eq!(ch.outcome(), SlotOutcome::Collision(2));
    assert_eq!(ch.multiplicity(), 2);
    assert_eq!(ch.contenders(), &[StationId(1), StationId(2)]);
}

#[test]
fn channel_reset_clears_previous_slot() {
    let mut ch = ChannelSlot::with_capacity(2);
    ch.reset(Slot(0));
    ch.transmit(StationId(0), StationId::sink(2), &Packet::new(0, 0.0, Slot(0)));
    ch.reset(Slot(1));
    assert_eq!(ch.multiplicity(), 0);
    assert!(ch.source().is_none());
    assert!(ch.destination().is_none());
    assert!(ch.packet().is_none());
    assert!(ch.contenders().is_empty());
}
