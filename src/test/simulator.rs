use crate::cra::Algorithm;
use crate::net::{SlotOutcome, StationId, StationState};
use crate::sim::{ErrorKind, SimConfig, SimError, Slot, SlottedAloha, resolve_seed};
use crate::stats::{Metric, Phase};

/// 无业务的小网络，只靠手动注入 packet 驱动
fn quiet(stations: usize, algorithm: Algorithm) -> SimConfig {
    SimConfig {
        stations,
        algorithm,
        load: 0.0,
        duration_ms: 1.0,
        warmup_ms: 0.0,
        seed: 3,
        ..SimConfig::default()
    }
}

#[test]
fn deterministic_two_station_collision_resolves_in_order() {
    let mut sim = SlottedAloha::new(quiet(2, Algorithm::Deterministic)).unwrap();
    assert_eq!(sim.total_slots(), 10);
    sim.inject_packet(StationId(0)).unwrap();
    sim.inject_packet(StationId(1)).unwrap();

    // slot 0：两站同时发送
    assert_eq!(sim.step().unwrap(), SlotOutcome::Collision(2));
    assert_eq!(sim.channel().contenders(), &[StationId(0), StationId(1)]);
    assert_eq!(sim.stations()[0].state(), StationState::Resolving);
    assert_eq!(sim.stations()[0].backoff(), 0);
    assert_eq!(sim.stations()[1].state(), StationState::Resolving);
    assert_eq!(sim.stations()[1].backoff(), 1);

    // slot 1：站点 0 立即重传成功
    assert_eq!(sim.step().unwrap(), SlotOutcome::Success(StationId(0)));
    let stats = sim.stats();
    let delay0 = stats
        .histogram(Phase::Steady, Metric::Delay, Some(StationId(0)))
        .unwrap();
    assert_eq!(delay0.samples(), 1);
    assert_eq!(delay0.bins()[2], 1);
    let service0 = stats
        .histogram(Phase::Steady, Metric::ServiceTime, Some(StationId(0)))
        .unwrap();
    assert_eq!(service0.bins()[2], 1);
    let attempts0 = stats
        .histogram(Phase::Steady, Metric::Attempts, Some(StationId(0)))
        .unwrap();
    assert_eq!(attempts0.bins()[2], 1);

    // slot 2：站点 1 倒计时结束后成功
    assert_eq!(sim.step().unwrap(), SlotOutcome::Success(StationId(1)));
    let delay1 = sim
        .stats()
        .histogram(Phase::Steady, Metric::Delay, Some(StationId(1)))
        .unwrap();
    assert_eq!(delay1.bins()[3], 1);

    assert_eq!(sim.step().unwrap(), SlotOutcome::Empty);
    assert!(sim.stations().iter().all(|s| s.state() == StationState::Idle));

    let multiplicity = sim.stats().network_histogram(Phase::Steady, Metric::Multiplicity);
    assert_eq!(multiplicity.bins(), &[1, 2, 1]);
}

#[test]
fn full_persistence_keeps_colliding() {
    let mut cfg = quiet(2, Algorithm::PPersistence);
    cfg.persistence = 1.0;
    let mut sim = SlottedAloha::new(cfg).unwrap();
    sim.inject_packet(StationId(0)).unwrap();
    sim.inject_packet(StationId(1)).unwrap();
    for _ in 0..10 {
        assert_eq!(sim.step().unwrap(), SlotOutcome::Collision(2));
    }
    assert!(sim.is_finished());
    let report = sim.report();
    assert_eq!(report.summary.delay_samples, 0);
    assert_eq!(report.multiplicity.summary.samples, 10);
}

#[test]
fn zero_persistence_never_transmits() {
    let mut cfg = quiet(1, Algorithm::PPersistence);
    cfg.persistence = 0.0;
    let mut sim = SlottedAloha::new(cfg).unwrap();
    sim.inject_packet(StationId(0)).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.stations()[0].queue_len(), 1);
    assert_eq!(sim.stats().acknowledged_total(StationId(0)), 0);
}

#[test]
fn optimal_persistence_counts_contenders_each_slot() {
    let mut sim = SlottedAloha::new(quiet(4, Algorithm::OptimalPersistence)).unwrap();
    for i in 0..3 {
        sim.inject_packet(StationId(i)).unwrap();
    }
    sim.step().unwrap();
    assert_eq!(sim.cra().persistence(), Some(1.0 / 3.0));
    let contenders = sim.stats().network_histogram(Phase::Steady, Metric::Contenders);
    assert_eq!(contenders.bins()[3], 1);
    assert_eq!(contenders.samples(), 1);
}

#[test]
fn optimal_persistence_on_empty_network_is_idle() {
    let mut sim = SlottedAloha::new(quiet(4, Algorithm::OptimalPersistence)).unwrap();
    assert_eq!(sim.step().unwrap(), SlotOutcome::Empty);
    assert_eq!(sim.cra().persistence(), None);
    let contenders = sim.stats().network_histogram(Phase::Steady, Metric::Contenders);
    assert_eq!(contenders.bins()[0], 1);

    let report = sim.report();
    assert!(report.contenders.is_some());
}

#[test]
fn every_algorithm_runs_to_completion_under_light_load() {
    for algorithm in [
        Algorithm::Deterministic,
        Algorithm::PPersistence,
        Algorithm::OptimalPersistence,
        Algorithm::Tbeb,
    ] {
        let cfg = SimConfig {
            stations: 5,
            algorithm,
            persistence: 0.5,
            load: 0.1,
            duration_ms: 50.0,
            warmup_ms: 5.0,
            seed: 11,
            ..SimConfig::default()
        };
        let mut sim = SlottedAloha::new(cfg).unwrap();
        sim.run().unwrap();
        assert!(sim.is_finished());
        assert_eq!(sim.slot(), Slot(500));

        let stats = sim.stats();
        for st in sim.stations() {
            let id = st.id();
            assert_eq!(
                stats.generated_total(id) - stats.acknowledged_total(id),
                st.queue_len() as u64
            );
        }

        let report = sim.report();
        assert!(report.run.completed);
        assert_eq!(report.run.algorithm, algorithm.tag());
        assert_eq!(report.summary.steady_slots, 450);
        assert!(report.summary.utilization <= report.summary.offered_load + 0.05);
        assert_eq!(report.contenders.is_some(), algorithm == Algorithm::OptimalPersistence);
    }
}

#[test]
fn same_seed_gives_identical_statistics() {
    let cfg = SimConfig {
        seed: 7,
        ..SimConfig::default()
    };
    let mut a = SlottedAloha::new(cfg.clone()).unwrap();
    let mut b = SlottedAloha::new(cfg).unwrap();
    a.run().unwrap();
    b.run().unwrap();
    for metric in [Metric::Delay, Metric::QueueLength, Metric::Attempts, Metric::Multiplicity] {
        assert_eq!(
            a.stats().network_histogram(Phase::Steady, metric),
            b.stats().network_histogram(Phase::Steady, metric)
        );
    }
    assert_eq!(
        a.stats().generated_by_station(Phase::Steady),
        b.stats().generated_by_station(Phase::Steady)
    );
}

#[test]
fn arrivals_do_not_depend_on_the_algorithm() {
    let run = |algorithm| {
        let cfg = SimConfig {
            algorithm,
            load: 0.1,
            seed: 21,
            ..SimConfig::default()
        };
        let mut sim = SlottedAloha::new(cfg).unwrap();
        sim.run().unwrap();
        [Phase::WarmUp, Phase::Steady]
            .map(|p| sim.stats().generated_by_station(p).to_vec())
    };
    assert_eq!(run(Algorithm::Deterministic), run(Algorithm::Tbeb));
}

#[test]
fn heavy_load_generates_multiple_packets_per_slot() {
    let cfg = SimConfig {
        stations: 1,
        algorithm: Algorithm::Tbeb,
        load: 5.0,
        duration_ms: 2.0,
        warmup_ms: 0.0,
        queue_capacity: 1_000,
        seed: 4,
        ..SimConfig::default()
    };
    let mut sim = SlottedAloha::new(cfg).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.total_slots(), 20);
    let generated = sim.stats().generated_total(StationId(0));
    let acked = sim.stats().acknowledged_total(StationId(0));
    assert!(generated > 20);
    // 单站点永远不会冲突：首个包到达后每个 slot 都成功一次
    assert!((15..=20).contains(&acked), "acked = {acked}");
    assert_eq!(generated - acked, sim.stations()[0].queue_len() as u64);
    let multiplicity = sim.stats().network_histogram(Phase::Steady, Metric::Multiplicity);
    assert_eq!(multiplicity.bins()[1], acked);
}

#[test]
fn queue_overflow_aborts_with_partial_report() {
    let cfg = SimConfig {
        stations: 5,
        algorithm: Algorithm::PPersistence,
        persistence: 1.0,
        load: 1.5,
        queue_capacity: 2,
        warmup_ms: 0.0,
        seed: 2,
        ..SimConfig::default()
    };
    let mut sim = SlottedAloha::new(cfg).unwrap();
    let err = sim.run().expect_err("queues must overflow");
    assert!(matches!(err, SimError::QueueFull { capacity: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::Capacity);

    let report = sim.report();
    assert!(!report.run.completed);
    assert!(report.run.simulated_slots < report.run.total_slots);
}

#[test]
fn invalid_configuration_is_rejected_before_running() {
    let err = SlottedAloha::new(SimConfig {
        resolution: 0.0,
        ..SimConfig::default()
    })
    .expect_err("r = 0");
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn inject_into_unknown_station_fails() {
    let mut sim = SlottedAloha::new(quiet(2, Algorithm::Tbeb)).unwrap();
    assert!(sim.inject_packet(StationId(2)).is_err());
}

#[test]
fn simulator_can_move_across_threads() {
    fn assert_send<T: Send>() {}
    assert_send::<SlottedAloha>();
}

#[test]
fn zero_seed_resolves_to_wall_clock() {
    assert_eq!(resolve_seed(42), 42);
    assert!(resolve_seed(0) > 0);
}
