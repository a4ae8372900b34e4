use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::{traits::JobHandler, SchedulerError, SchedulerResult};

/// 处理器注册表
///
/// 进程启动时一次性构建，之后只读。按处理器类型名精确匹配。
#[derive(Clone, Default)]
pub struct JobRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistry {
    pub fn builder() -> JobRegistryBuilder {
        JobRegistryBuilder::default()
    }

    pub fn resolve(&self, handler_type: &str) -> SchedulerResult<Arc<dyn JobHandler>> {
        self.handlers
            .get(handler_type)
            .cloned()
            .ok_or_else(|| SchedulerError::HandlerNotFound {
                handler_type: handler_type.to_string(),
            })
    }

    pub fn contains(&self, handler_type: &str) -> bool {
        self.handlers.contains_key(handler_type)
    }

    /// 已注册的处理器类型，按名称排序
    pub fn handler_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry")
            .field("handler_types", &self.handler_types())
            .finish()
    }
}

#[derive(Default)]
pub struct JobRegistryBuilder {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistryBuilder {
    pub fn register(mut self, handler_type: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        let handler_type = handler_type.into();
        if self.handlers.insert(handler_type.clone(), handler).is_some() {
            warn!("处理器类型 {} 被重复注册，使用最后一次注册的实现", handler_type);
        }
        self
    }

    pub fn build(self) -> JobRegistry {
        JobRegistry {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::JobExecutionContext;
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl JobHandler for NoopHandler {
        async fn execute(&self, _context: &JobExecutionContext) -> SchedulerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve_registered_handler() {
        let registry = JobRegistry::builder()
            .register("LogJob", Arc::new(NoopHandler))
            .register("HttpJob", Arc::new(NoopHandler))
            .build();

        assert!(registry.resolve("LogJob").is_ok());
        assert!(registry.contains("HttpJob"));
        assert_eq!(registry.handler_types(), vec!["HttpJob", "LogJob"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_resolve_is_exact_match() {
        let registry = JobRegistry::builder()
            .register("HttpJob", Arc::new(NoopHandler))
            .build();

        match registry.resolve("httpjob") {
            Err(SchedulerError::HandlerNotFound { handler_type }) => {
                assert_eq!(handler_type, "httpjob")
            }
            _ => panic!("expected HandlerNotFound"),
        }
    }

    #[test]
    fn test_duplicate_registration_keeps_one() {
        let registry = JobRegistry::builder()
            .register("LogJob", Arc::new(NoopHandler))
            .register("LogJob", Arc::new(NoopHandler))
            .build();
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
