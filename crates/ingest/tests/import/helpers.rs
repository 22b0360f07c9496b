use std::path::PathBuf;

use uuid::Uuid;

pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("callwatch-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Three quiet daytime callers and one caller hammering foreign numbers at night.
pub fn spam_csv() -> String {
    let mut out = String::from("CallerID,ReceiverID,CallStartTime,CallDuration\n");
    for caller in ["1001", "1002", "1003"] {
        out.push_str(&format!("{caller},5550100,2024-03-01 10:00:00,120\n"));
        out.push_str(&format!("{caller},5550101,2024-03-01 15:00:00,120\n"));
    }
    for i in 0..50 {
        out.push_str(&format!("9999,+44770090{i:04},2024-03-01 03:00:00,8\n"));
    }
    out
}
