use super::*;
use crate::config::{Resolution, DEFAULT_EPOCH_MS};
use std::{cell::Cell, collections::HashSet, rc::Rc};

/// Clock stub that returns whatever the test last set.
#[derive(Clone, Debug, Default)]
struct StubClock(Rc<Cell<Duration>>);

impl StubClock {
    fn at(now: Duration) -> Self {
        Self(Rc::new(Cell::new(now)))
    }

    fn set(&self, now: Duration) {
        self.0.set(now);
    }
}

impl TimeSource for StubClock {
    fn now(&mut self) -> Duration {
        self.0.get()
    }
}

/// Random source stub that fills every byte with the same value.
#[derive(Debug)]
struct ConstRng(u8);

impl RandSource for ConstRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(self.0);
    }
}

fn epoch() -> Duration {
    Duration::from_millis(DEFAULT_EPOCH_MS)
}

fn canonical_pattern() -> regex::Regex {
    regex::Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .unwrap()
}

/// Encodes zero timestamp and consecutive counters at the epoch
#[test]
fn encodes_zero_timestamp_and_consecutive_counters_at_the_epoch() {
    let config = Config::default();
    let mut g = CombGenerator::with_sources(config, ConstRng(0xff), StubClock::at(epoch()));

    let first = g.generate();
    assert_eq!(&first.encode() as &str, "00000000-0000-4000-83ff-ffffffffffff");
    assert_eq!(first.timestamp(), 0);
    assert_eq!(first.counter(&config), 0);

    let second = g.generate();
    assert_eq!(&second.encode() as &str, "00000000-0000-4000-87ff-ffffffffffff");
    assert_eq!(second.timestamp(), 0);
    assert_eq!(second.counter(&config), 1);
    assert_eq!(g.state(), Some(GeneratorState::new(0, 1)));
}

/// Resets counter when tick advances
#[test]
fn resets_counter_when_tick_advances() {
    let config = Config::default();
    let clock = StubClock::at(epoch() + Duration::from_millis(7));
    let mut g = CombGenerator::with_sources(config, ConstRng(0), clock.clone());

    for i in 0..5 {
        assert_eq!(g.generate().counter(&config), i);
    }

    clock.set(epoch() + Duration::from_millis(8));
    let e = g.generate();
    assert_eq!(e.timestamp(), 8);
    assert_eq!(e.counter(&config), 0);
}

/// Advances timestamp upon counter overflow
#[test]
fn advances_timestamp_upon_counter_overflow() {
    let config = Config::default();
    let mut g = CombGenerator::with_sources(config, ConstRng(0xff), StubClock::default());
    g.state = Some(GeneratorState::new(5, config.max_counter() - 1));

    let prev = g.generate_core(5);
    assert_eq!(prev.counter(&config), config.max_counter());
    assert_eq!(prev.timestamp(), 5);

    let curr = g.generate_core(5);
    assert!(prev < curr);
    assert!(prev.to_string() < curr.to_string());
    assert_eq!(curr.timestamp(), 6);
    assert_eq!(curr.counter(&config), 0);
}

/// Generates increasing identifiers with a one-bit counter at constant timestamp
#[test]
fn generates_increasing_identifiers_with_a_one_bit_counter_at_constant_timestamp() {
    let config = Config::default().with_counter_bits(1).unwrap();
    let mut g = CombGenerator::with_sources(config, Entropy::detect(), StubClock::default());

    let mut prev = g.generate_core(1_000);
    for _ in 0..10_000 {
        let curr = g.generate_core(1_000);
        assert!(prev < curr);
        prev = curr;
    }
    // once overflow pushes the timestamp past the clock, each call moves it one tick forward
    assert_eq!(prev.timestamp(), 1_000 + 9_999);
}

/// Generates increasing identifiers even with decreasing or constant timestamp
#[test]
fn generates_increasing_identifiers_even_with_decreasing_or_constant_timestamp() {
    let ts = 0x0123_4567_89abu64;
    let mut g = CombGenerator::default();
    let mut prev = g.generate_core(ts);
    assert_eq!(prev.as_bytes()[..6], ts.to_be_bytes()[2..]);
    for i in 0..100_000u64 {
        let curr = g.generate_core(ts - i.min(4_000));
        assert!(prev < curr);
        prev = curr;
    }
    assert!(prev.as_bytes()[..6] >= ts.to_be_bytes()[2..]);
}

/// Substitutes last timestamp plus one upon clock rollback
#[test]
fn substitutes_last_timestamp_plus_one_upon_clock_rollback() {
    let config = Config::default();
    let clock = StubClock::at(epoch() + Duration::from_secs(10));
    let mut g = CombGenerator::with_sources(config, Entropy::detect(), clock.clone());

    let prev = g.generate();
    assert_eq!(prev.timestamp(), 10_000);

    clock.set(epoch() + Duration::from_secs(5));
    let curr = g.generate();
    assert!(prev < curr);
    assert!(prev.to_string() < curr.to_string());
    assert_eq!(curr.timestamp(), 10_001);
    assert_eq!(curr.counter(&config), 0);
}

/// Follows state transition rules
#[test]
fn follows_state_transition_rules() {
    let max = 3;
    let next = |prev, now| GeneratorState::next(Some(prev), now, max).unwrap();
    let s = GeneratorState::next(None, 9, max).unwrap();
    assert_eq!(s, GeneratorState::new(9, 0));
    assert_eq!(next(s, 10), GeneratorState::new(10, 0));
    assert_eq!(next(s, 9), GeneratorState::new(9, 1));
    assert_eq!(next(s, 2), GeneratorState::new(10, 0));
    let full = GeneratorState::new(9, max);
    assert_eq!(next(full, 9), GeneratorState::new(10, 0));
    assert_eq!(next(full, 11), GeneratorState::new(11, 0));

    let mut prev = s;
    for now in [9, 9, 9, 9, 9, 3, 3, 12, 12, 0] {
        let curr = next(prev, now);
        assert!(prev < curr);
        prev = curr;
    }
}

/// Keeps state within the 48-bit timestamp field
#[test]
fn keeps_state_within_the_48_bit_timestamp_field() {
    const LAST: u64 = (1 << 48) - 1;
    let max = 3;

    let s = GeneratorState::next(None, u64::MAX, max).unwrap();
    assert_eq!(s, GeneratorState::new(LAST, 0));
    assert_eq!(
        GeneratorState::next(Some(GeneratorState::new(LAST - 1, max)), LAST - 1, max),
        Some(GeneratorState::new(LAST, 0))
    );

    // no later tick exists, so rollback and overflow fall back to the counter
    let mut prev = s;
    for now in [0, LAST, 1 << 48, u64::MAX] {
        let curr = GeneratorState::next(Some(prev), now, max).unwrap();
        assert_eq!(curr.timestamp(), LAST);
        assert!(prev < curr);
        prev = curr;
    }
    assert_eq!(prev, GeneratorState::new(LAST, 3));
    assert_eq!(GeneratorState::next(Some(prev), 0, max), None);
    assert_eq!(GeneratorState::next(Some(prev), u64::MAX, max), None);
}

/// Generates increasing identifiers across the end of the timestamp field
#[test]
fn generates_increasing_identifiers_across_the_end_of_the_timestamp_field() {
    let mut g = CombGenerator::default();
    let mut prev = g.generate_core((1 << 48) - 1);
    assert_eq!(&prev.to_string()[..14], "ffffffff-ffff-");
    for ts in [1 << 48, u64::MAX, 0, (1 << 48) - 2] {
        let curr = g.generate_core(ts);
        assert!(prev < curr);
        assert!(prev.to_string() < curr.to_string());
        assert_eq!(curr.timestamp(), (1 << 48) - 1);
        prev = curr;
    }
}

/// Does not overflow when the clock rolls back from the largest tick
#[test]
fn does_not_overflow_when_the_clock_rolls_back_from_the_largest_tick() {
    let mut g = CombGenerator::default();
    let prev = g.generate_core(u64::MAX);
    let curr = g.generate_core(0);
    assert!(prev < curr);
    assert_eq!(g.state(), Some(GeneratorState::new((1 << 48) - 1, 1)));
}

/// Returns None once the timestamp field is exhausted
#[test]
fn returns_none_once_the_timestamp_field_is_exhausted() {
    let config = Config::default().with_counter_bits(1).unwrap();
    let mut g = CombGenerator::with_sources(config, ConstRng(0), StubClock::default());

    let first = g.generate_or_abort_core((1 << 48) - 1).unwrap();
    let second = g.generate_or_abort_core((1 << 48) - 1).unwrap();
    assert!(first < second);
    assert_eq!(second.counter(&config), 1);

    assert!(g.generate_or_abort_core((1 << 48) - 1).is_none());
    assert!(g.generate_or_abort_core(0).is_none());
    assert_eq!(g.state(), Some(GeneratorState::new((1 << 48) - 1, 1)));
}

/// Stops iteration once the timestamp field is exhausted
#[test]
fn stops_iteration_once_the_timestamp_field_is_exhausted() {
    let config = Config::default().with_counter_bits(2).unwrap();
    // a clock far past the field reads as the last tick
    let clock = StubClock::at(Duration::MAX);
    let g = CombGenerator::with_sources(config, ConstRng(0), clock);
    let ids: Vec<CombGuid> = g.collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

/// Generates 50k unique sortable identifiers
#[test]
fn generates_50k_unique_sortable_identifiers() {
    let re = canonical_pattern();
    let samples: Vec<String> = CombGenerator::default()
        .take(50_000)
        .map(String::from)
        .collect();

    for e in &samples {
        assert_eq!(e.len(), 36);
        assert!(re.is_match(e));
    }
    for i in 1..samples.len() {
        assert!(samples[i - 1] < samples[i]);
    }
    let s: HashSet<&String> = samples.iter().collect();
    assert_eq!(s.len(), samples.len());
}

/// Generates well-formed unique identifiers with fallback entropy
#[test]
fn generates_well_formed_unique_identifiers_with_fallback_entropy() {
    let entropy = Entropy::select(Err(rand::Error::new("no secure source")));
    assert!(!entropy.is_secure());

    let re = canonical_pattern();
    let mut g = CombGenerator::with_sources(Config::default(), entropy, StdSystemTime);
    let samples: Vec<String> = (0..50_000).map(|_| g.generate_string()).collect();

    for e in &samples {
        assert!(re.is_match(e));
    }
    let s: HashSet<&String> = samples.iter().collect();
    assert_eq!(s.len(), samples.len());
}

/// Encodes microsecond ticks
#[test]
fn encodes_microsecond_ticks() {
    let config = Config::default()
        .with_resolution(Resolution::Microseconds)
        .unwrap();
    let clock = StubClock::at(epoch() + Duration::from_micros(1_500));
    let mut g = CombGenerator::with_sources(config, ConstRng(0), clock);
    let e = g.generate();
    assert_eq!(e.timestamp(), 1_500);
    assert_eq!(config.unix_time_of(e.timestamp()), epoch() + Duration::from_micros(1_500));
}

/// Encodes up-to-date timestamp
#[test]
fn encodes_up_to_date_timestamp() {
    let mut g = CombGenerator::default();
    for _ in 0..10_000 {
        let ts_now = StdSystemTime.now().as_millis() as i64;
        let e = g.generate();
        let timestamp = g.config().unix_time_of(e.timestamp()).as_millis() as i64;
        assert!((ts_now - timestamp).abs() < 16);
    }
}

/// Accepts external random number generators
#[test]
fn accepts_external_random_number_generators() {
    let mut g = CombGenerator::with_rng(Config::default(), rand::thread_rng());
    let prev = g.generate();
    let curr = g.generate();
    assert!(prev < curr);
    assert_eq!(curr.version(), Some(4));
}
