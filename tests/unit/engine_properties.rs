/// Engine properties and reference scenarios, run against the SQLite store
use habit_progress_engine::*;

use chrono::{DateTime, TimeZone, Utc};

/// Small deterministic generator so the property loops are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 31, 18, 0, 0).unwrap()
}

fn today() -> DayKey {
    "2024-07-31".parse().unwrap()
}

fn create(storage: &SqliteStorage, frequency: Frequency, kind: HabitKind) -> Habit {
    let habit = Habit::new(
        "Habit".to_string(),
        frequency,
        kind,
        None,
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();
    storage.create_habit(&habit).unwrap();
    habit
}

#[test]
fn scenario_a_consecutive_days() {
    let storage = SqliteStorage::in_memory().unwrap();
    let habit = create(&storage, Frequency::Daily, HabitKind::Boolean);
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);

    for offset in [0, -1, -2] {
        evaluator.mark_complete(&habit.id, Some(today().offset_days(offset))).unwrap();
    }

    let snapshot = evaluator.snapshot(&habit.id, None).unwrap();
    assert_eq!(snapshot.current_streak, 3);
    assert_eq!(snapshot.best_streak, 3);
}

#[test]
fn scenario_b_gap_breaks_streak() {
    let storage = SqliteStorage::in_memory().unwrap();
    let habit = create(&storage, Frequency::Daily, HabitKind::Boolean);
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);

    for offset in [0, -1, -3] {
        evaluator.mark_complete(&habit.id, Some(today().offset_days(offset))).unwrap();
    }

    let snapshot = evaluator.snapshot(&habit.id, None).unwrap();
    assert_eq!(snapshot.current_streak, 2);
    assert_eq!(snapshot.best_streak, 2);
}

#[test]
fn scenario_c_partial_quantity() {
    let storage = SqliteStorage::in_memory().unwrap();
    let habit = create(&storage, Frequency::Daily, HabitKind::quantifiable(8.0, None).unwrap());
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);

    let update = evaluator.set_quantity(&habit.id, None, 3.0).unwrap();
    assert_eq!(update.snapshot.progress_percent, 37.5);
    assert!(!update.snapshot.completed_today);
}

#[test]
fn scenario_d_target_met_caps_progress() {
    let storage = SqliteStorage::in_memory().unwrap();
    let habit = create(&storage, Frequency::Daily, HabitKind::quantifiable(8.0, None).unwrap());
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);

    evaluator.set_quantity(&habit.id, None, 7.0).unwrap();
    let update = evaluator.adjust_quantity(&habit.id, None, 2.0).unwrap();
    assert_eq!(update.snapshot.current_quantity, Some(9.0));
    assert_eq!(update.snapshot.progress_percent, 100.0);
    assert!(update.snapshot.completed_today);
    assert!(storage.has_completion(&habit.id, today()).unwrap());
}

#[test]
fn scenario_e_weekly_windows() {
    let storage = SqliteStorage::in_memory().unwrap();
    let habit = create(&storage, Frequency::Weekly, HabitKind::Boolean);
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);

    // one completion in each of [D-6, D], [D-13, D-7] and [D-20, D-14]
    for offset in [-2, -12, -20] {
        evaluator.mark_complete(&habit.id, Some(today().offset_days(offset))).unwrap();
    }

    let snapshot = evaluator.snapshot(&habit.id, None).unwrap();
    assert_eq!(snapshot.current_streak, 3);
}

#[test]
fn property_recording_is_idempotent() {
    let storage = SqliteStorage::in_memory().unwrap();
    let once = create(&storage, Frequency::Daily, HabitKind::Boolean);
    let many = create(&storage, Frequency::Daily, HabitKind::Boolean);
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);
    let days: Vec<DayKey> = [-5, -4, -3, -1, 0].iter().map(|o| today().offset_days(*o)).collect();

    for day in &days {
        evaluator.mark_complete(&once.id, Some(*day)).unwrap();
        for _ in 0..4 {
            evaluator.mark_complete(&many.id, Some(*day)).unwrap();
        }
    }

    let a = evaluator.snapshot(&once.id, None).unwrap();
    let b = evaluator.snapshot(&many.id, None).unwrap();
    assert_eq!((a.current_streak, a.best_streak, a.completion_rate), (b.current_streak, b.best_streak, b.completion_rate));
    assert_eq!(storage.list_completions(&many.id).unwrap().len(), days.len());
}

#[test]
fn property_order_independence() {
    let mut rng = Lcg(7);
    for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly] {
        for _ in 0..25 {
            let days: Vec<DayKey> = (0..12).map(|_| today().offset_days(-(rng.below(90) as i64))).collect();
            let mut shuffled = days.clone();
            for i in (1..shuffled.len()).rev() {
                let j = rng.below(i as u64 + 1) as usize;
                shuffled.swap(i, j);
            }

            let forward = compute_streaks(frequency, days.iter().copied(), today());
            let permuted = compute_streaks(frequency, shuffled.iter().copied(), today());
            assert_eq!(forward, permuted);
            assert!(forward.best >= forward.current);
        }
    }
}

#[test]
fn property_quantity_never_negative() {
    let storage = SqliteStorage::in_memory().unwrap();
    let habit = create(&storage, Frequency::Daily, HabitKind::quantifiable(5.0, None).unwrap());
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);
    let mut rng = Lcg(42);

    for _ in 0..200 {
        let delta = rng.below(13) as f64 - 6.0;
        let update = evaluator.adjust_quantity(&habit.id, None, delta).unwrap();
        let quantity = storage.get_quantity(&habit.id, today()).unwrap();
        assert!(quantity >= 0.0);
        assert_eq!(update.snapshot.current_quantity, Some(quantity));

        // completion equivalence
        assert_eq!(update.snapshot.completed_today, quantity >= 5.0);
        assert_eq!(storage.has_completion(&habit.id, today()).unwrap(), quantity >= 5.0);
        assert!(update.snapshot.best_streak >= update.snapshot.current_streak);
    }
}

#[test]
fn property_best_never_below_current_through_engine() {
    let storage = SqliteStorage::in_memory().unwrap();
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);
    let mut rng = Lcg(99);

    for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly] {
        let habit = create(&storage, frequency, HabitKind::Boolean);
        for _ in 0..40 {
            let day = today().offset_days(-(rng.below(60) as i64));
            let update = if rng.below(4) == 0 {
                evaluator.mark_incomplete(&habit.id, Some(day)).unwrap()
            } else {
                evaluator.mark_complete(&habit.id, Some(day)).unwrap()
            };
            assert!(update.snapshot.best_streak >= update.snapshot.current_streak);
            assert!((0.0..=100.0).contains(&update.snapshot.completion_rate));
        }
    }
}

#[test]
fn overflowing_quantity_is_rejected_as_bad_input() {
    let storage = SqliteStorage::in_memory().unwrap();
    let habit = create(&storage, Frequency::Daily, HabitKind::quantifiable(5.0, None).unwrap());
    let clock = FixedClock(now());
    let config = EngineConfig::default();
    let evaluator = ProgressEvaluator::new(&storage, &clock, &config);

    evaluator.set_quantity(&habit.id, None, f64::MAX).unwrap();
    let result = evaluator.adjust_quantity(&habit.id, None, f64::MAX);
    assert!(matches!(result, Err(EngineError::InvalidArgument { .. })), "got {:?}", result);
    assert_eq!(storage.get_quantity(&habit.id, today()).unwrap(), f64::MAX);
    assert!(evaluator.snapshot(&habit.id, None).unwrap().completed_today);
}

#[test]
fn ledger_writes_for_unknown_habit_match_across_stores() {
    let sqlite = SqliteStorage::in_memory().unwrap();
    let memory = MemoryStorage::new();
    let missing = HabitId::new();

    let from_sqlite = CompletionLedger::new(&sqlite).record_completion(&missing, today(), now());
    let from_memory = CompletionLedger::new(&memory).record_completion(&missing, today(), now());
    assert!(matches!(from_sqlite, Err(EngineError::HabitNotFound { .. })), "got {:?}", from_sqlite);
    assert!(matches!(from_memory, Err(EngineError::HabitNotFound { .. })), "got {:?}", from_memory);
}
