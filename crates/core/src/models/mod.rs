//! # 数据模型
//!
//! 动态任务调度的核心数据结构。
//!
//! - [`JobKey`]：`(name, group)` 组合标识
//! - [`JobDefinition`]：处理器类型、描述与参数
//! - [`TriggerSpec`]：编译后的CRON表达式与错过触发策略
//! - [`JobEntry`]：存储中的完整记录，含状态、下一次触发时间与执行历史
//! - [`TaskRecord`]：管理接口返回的视图，带数字ID

pub mod job;
pub mod task;

pub use job::*;
pub use task::*;
