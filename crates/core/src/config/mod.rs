//! 配置管理
//!
//! 配置按以下顺序合并：默认值、TOML配置文件、`SCHEDULER_` 前缀的环境变量。
//! 各配置段都提供 `validate`，加载完成后整体校验一次。
//!
//! ```rust,no_run
//! use scheduler_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/scheduler.toml"))?;
//! println!("API listening on {}", config.api.bind_address);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod models;

pub use models::*;
