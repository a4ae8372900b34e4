use chrono::{DateTime, Utc};
use rand::Rng;

/// 管理接口使用的数字ID生成器
///
/// 取毫秒时间戳加上一个随机偏移，再对 `i32::MAX` 取模。结果不保证唯一，
/// 调用方在插入冲突时重新生成。
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskIdGenerator;

impl TaskIdGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn next_id(&self, now: DateTime<Utc>) -> i32 {
        let jitter: i64 = rand::rng().random_range(0..1000);
        (now.timestamp_millis() + jitter).rem_euclid(i32::MAX as i64) as i32
    }
}
