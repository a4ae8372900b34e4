use chrono::{DateTime, Utc};
use cron::Schedule;
use std::fmt;
use std::str::FromStr;

use crate::{Result, SchedulerError};

/// CRON表达式解析和调度工具
///
/// 支持带秒的6段表达式（秒 分 时 日 月 周），以及可选的第7段年份。
/// Quartz风格的 `?` 占位符按 `*` 处理。
#[derive(Debug, Clone)]
pub struct CronScheduler {
    expression: String,
    schedule: Schedule,
}

impl CronScheduler {
    /// 创建新的CRON调度器
    pub fn new(cron_expr: &str) -> Result<Self> {
        let fields: Vec<&str> = cron_expr.split_whitespace().collect();
        if fields.len() != 6 && fields.len() != 7 {
            return Err(SchedulerError::InvalidCron {
                expr: cron_expr.to_string(),
                message: format!("需要6个字段(秒 分 时 日 月 周)，实际为{}个", fields.len()),
            });
        }

        let normalized = fields
            .iter()
            .map(|field| if *field == "?" { "*" } else { field })
            .collect::<Vec<_>>()
            .join(" ");
        let schedule = Schedule::from_str(&normalized).map_err(|e| SchedulerError::InvalidCron {
            expr: cron_expr.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            expression: fields.join(" "),
            schedule,
        })
    }

    /// 验证CRON表达式是否有效
    pub fn validate_cron_expression(cron_expr: &str) -> Result<()> {
        Self::new(cron_expr).map(|_| ())
    }

    /// 规范化后的表达式文本，再次解析得到相同的调度
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// 获取严格晚于 `from` 的下一次执行时间
    pub fn next_execution_time(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).next()
    }

    /// 获取从指定时间开始的多个执行时间
    pub fn upcoming_times(&self, from: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        self.schedule.after(&from).take(count).collect()
    }

    /// 错过触发时间时不补偿执行：到期时间已过则跳到 `now` 之后的下一个时间点
    pub fn next_after_misfire(
        &self,
        due: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if due > now {
            Some(due)
        } else {
            self.next_execution_time(now)
        }
    }

    /// 统计 `(after, until]` 区间内的触发时间个数，最多统计 `limit` 个
    pub fn fires_between(&self, after: DateTime<Utc>, until: DateTime<Utc>, limit: usize) -> usize {
        self.schedule
            .after(&after)
            .take(limit)
            .take_while(|at| *at <= until)
            .count()
    }

    /// 获取任务的执行频率描述
    pub fn frequency_description(&self, from: DateTime<Utc>) -> String {
        let upcoming = self.upcoming_times(from, 2);
        if upcoming.len() < 2 {
            return "无法确定频率".to_string();
        }

        match (upcoming[1] - upcoming[0]).num_seconds() {
            s if s < 60 => format!("每{s}秒"),
            s if s < 3600 => format!("每{}分钟", s / 60),
            s if s < 86400 => format!("每{}小时", s / 3600),
            s if s < 604800 => format!("每{}天", s / 86400),
            s => format!("每{}周", s / 604800),
        }
    }
}

impl fmt::Display for CronScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl FromStr for CronScheduler {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
