use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use callwatch_core::CallRecord;

pub fn make_call(caller: &str, receiver: &str, start: &str, duration: f64) -> CallRecord {
    CallRecord {
        caller_id: caller.to_string(),
        receiver_id: receiver.to_string(),
        call_start_time: start.to_string(),
        call_duration: duration,
    }
}

/// Three quiet callers with two daytime domestic calls each, plus caller
/// `SPAM` placing 50 calls at 03:00 to 50 distinct international numbers.
pub fn quiet_callers_and_spammer() -> Vec<CallRecord> {
    let mut records = Vec::new();
    for caller in ["A", "B", "C"] {
        records.push(make_call(caller, "5550001", "2024-03-01 10:00:00", 120.0));
        records.push(make_call(caller, "5550002", "2024-03-01 14:30:00", 120.0));
    }
    for i in 0..50 {
        records.push(make_call(
            "SPAM",
            &format!("+44770090{i:04}"),
            "2024-03-01 03:00:00",
            120.0,
        ));
    }
    records
}

/// A mixed table of `n` calls from `callers` callers, deterministic per `seed`.
pub fn synthetic_table(n: usize, callers: usize, seed: u64) -> Vec<CallRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let caller = format!("C{:03}", rng.gen_range(0..callers));
            let intl = rng.gen_bool(0.1);
            let receiver = if intl {
                format!("+{}", rng.gen_range(10_000_000u64..99_999_999))
            } else {
                format!("{}", rng.gen_range(10_000_000u64..99_999_999))
            };
            let start = format!(
                "2024-03-{:02} {:02}:{:02}:{:02}",
                rng.gen_range(1..29),
                rng.gen_range(0..24),
                rng.gen_range(0..60),
                rng.gen_range(0..60)
            );
            let duration = rng.gen_range(5.0..900.0);
            make_call(&caller, &receiver, &start, duration)
        })
        .collect()
}
