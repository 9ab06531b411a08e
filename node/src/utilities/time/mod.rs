use chrono::Utc;

pub struct LedgerTime;

impl LedgerTime {
    pub fn now() -> u64 {
        Utc::now().timestamp_millis() as u64
    }
}
