use chrono::Utc;
use scheduler_core::{AppConfig, CronScheduler};

fn main() -> anyhow::Result<()> {
    println!("=== 动态定时任务调度服务配置示例 ===\n");

    // 1. 默认配置
    println!("1. 默认配置:");
    let default_config = AppConfig::default();
    println!("   监听地址: {}", default_config.api.bind_address);
    println!("   最长休眠: {}秒", default_config.scheduler.max_idle_seconds);
    println!(
        "   HTTP超时: 连接{}秒 / 响应{}秒\n",
        default_config.http_executor.connect_timeout_seconds,
        default_config.http_executor.response_timeout_seconds
    );

    // 2. 从TOML字符串加载配置
    println!("2. 从TOML字符串加载配置:");
    let toml_config = r#"
[api]
bind_address = "0.0.0.0:9090"
cors_enabled = false

[scheduler]
history_limit = 50

[[scheduler.jobs]]
job_name = "HttpJob"
job_group = "reports"
cron_expression = "0 */5 * * * ?"

[scheduler.jobs.parameters]
url = "http://localhost:9000/report"
method = "POST"

[observability]
log_format = "json"
"#;
    let config = AppConfig::from_toml(toml_config)?;
    println!("   监听地址: {}", config.api.bind_address);
    println!("   历史记录条数: {}", config.scheduler.history_limit);
    println!("   日志格式: {}", config.observability.log_format);

    // 3. 启动任务的下一次触发时间
    println!("\n3. 启动任务:");
    let now = Utc::now();
    for job in &config.scheduler.jobs {
        let scheduler = CronScheduler::new(&job.cron_expression)?;
        println!(
            "   {}.{} [{}] 接下来三次触发: {:?}",
            job.job_group,
            job.job_name,
            scheduler.frequency_description(now),
            scheduler.upcoming_times(now, 3)
        );
    }

    // 4. 序列化回TOML
    println!("\n4. 序列化为TOML:");
    println!("{}", config.to_toml()?);

    Ok(())
}
