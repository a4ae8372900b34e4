use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, error, info, warn};

use scheduler_core::{
    traits::{JobExecutionContext, JobHandler},
    HttpExecutorConfig, SchedulerError, SchedulerResult,
};

/// HTTP任务参数，从任务的字符串参数表中解析
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpJobParams {
    pub url: Option<String>,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpJobParams {
    /// `headers` 是JSON对象字符串，解析失败时按空请求头处理
    pub fn from_parameters(parameters: &HashMap<String, String>) -> Self {
        let url = parameters
            .get("url")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let method = parameters
            .get("method")
            .map(|m| m.trim().to_uppercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "GET".to_string());
        let headers = parameters
            .get("headers")
            .map(|raw| {
                serde_json::from_str::<HashMap<String, String>>(raw).unwrap_or_else(|e| {
                    warn!("解析HTTP请求头失败, 使用空请求头: {}", e);
                    HashMap::new()
                })
            })
            .unwrap_or_default();
        let body = parameters.get("body").cloned().unwrap_or_default();

        Self {
            url,
            method,
            headers,
            body,
        }
    }
}

/// HTTP任务执行器
///
/// 每次触发发出一次HTTP请求。请求结果只记录日志，不回传给调度引擎，
/// 下游失败不会影响任务的调度状态。
pub struct HttpJobExecutor {
    client: reqwest::Client,
}

impl HttpJobExecutor {
    pub fn new(config: &HttpExecutorConfig) -> SchedulerResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.response_timeout_seconds))
            .default_headers(default_headers)
            .build()
            .map_err(|e| SchedulerError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self { client })
    }

    fn method(method: &str) -> SchedulerResult<Method> {
        match method {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "PATCH" => Ok(Method::PATCH),
            "HEAD" => Ok(Method::HEAD),
            "OPTIONS" => Ok(Method::OPTIONS),
            _ => Err(SchedulerError::InvalidTaskParams(format!(
                "不支持的HTTP方法: {method}"
            ))),
        }
    }
}

#[async_trait]
impl JobHandler for HttpJobExecutor {
    async fn execute(&self, context: &JobExecutionContext) -> SchedulerResult<()> {
        let params = HttpJobParams::from_parameters(&context.parameters);

        let Some(url) = params.url else {
            debug!(
                job_name = %context.key.name,
                job_group = %context.key.group,
                "HTTP任务未配置url, 跳过本次执行"
            );
            return Ok(());
        };
        let method = Self::method(&params.method)?;

        info!(
            job_name = %context.key.name,
            job_group = %context.key.group,
            "执行HTTP任务: method={}, url={}",
            method,
            url
        );

        let mut request_builder = self.client.request(method.clone(), &url);
        for (key, value) in &params.headers {
            request_builder = request_builder.header(key.as_str(), value.as_str());
        }
        if !params.body.is_empty() {
            request_builder = request_builder.body(params.body);
        }

        let start_time = Instant::now();
        match request_builder.send().await {
            Ok(response) => {
                let status = response.status();
                let elapsed = start_time.elapsed().as_millis();
                if status.is_success() {
                    info!(
                        job_name = %context.key.name,
                        job_group = %context.key.group,
                        "HTTP任务执行完成: {} {} status={} duration={}ms",
                        method,
                        url,
                        status.as_u16(),
                        elapsed
                    );
                } else {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("读取响应体失败: {e}"));
                    warn!(
                        job_name = %context.key.name,
                        job_group = %context.key.group,
                        "HTTP请求失败，状态码: {} duration={}ms response={}",
                        status.as_u16(),
                        elapsed,
                        body
                    );
                }
            }
            Err(e) => {
                error!(
                    job_name = %context.key.name,
                    job_group = %context.key.group,
                    "HTTP请求失败: {} {} error={}",
                    method,
                    url,
                    e
                );
            }
        }

        Ok(())
    }
}

/// 只记录触发信息的任务处理器
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingJobHandler;

#[async_trait]
impl JobHandler for LoggingJobHandler {
    async fn execute(&self, context: &JobExecutionContext) -> SchedulerResult<()> {
        info!(
            job_name = %context.key.name,
            job_group = %context.key.group,
            task_id = context.task_id,
            "任务触发: 计划时间 {}, 实际时间 {}",
            context.scheduled_fire_time,
            context.fire_time
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_params_defaults() {
        let parsed = HttpJobParams::from_parameters(&params(&[("url", "http://localhost/ping")]));
        assert_eq!(parsed.url.as_deref(), Some("http://localhost/ping"));
        assert_eq!(parsed.method, "GET");
        assert!(parsed.headers.is_empty());
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn test_params_parse_headers_and_method() {
        let parsed = HttpJobParams::from_parameters(&params(&[
            ("url", "http://localhost/hook"),
            ("method", "post"),
            ("headers", r#"{"X-Token": "abc"}"#),
            ("body", r#"{"a":1}"#),
        ]));
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.headers.get("X-Token").map(String::as_str), Some("abc"));
        assert_eq!(parsed.body, r#"{"a":1}"#);
    }

    #[test]
    fn test_invalid_headers_fall_back_to_empty() {
        let parsed = HttpJobParams::from_parameters(&params(&[
            ("url", "http://localhost/hook"),
            ("headers", "X-Token: abc"),
        ]));
        assert!(parsed.headers.is_empty());

        let parsed = HttpJobParams::from_parameters(&params(&[("headers", r#"{"n": 1}"#)]));
        assert!(parsed.headers.is_empty());
        assert!(parsed.url.is_none());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(HttpJobExecutor::method("PATCH").unwrap(), Method::PATCH);
        assert!(matches!(
            HttpJobExecutor::method("BREW"),
            Err(SchedulerError::InvalidTaskParams(_))
        ));
    }
}
