use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use scheduler_api::{create_app, MetricsEndpoint};
use scheduler_core::{traits::JobStore, AppConfig, Clock, SystemClock};
use scheduler_dispatcher::{SchedulerEngine, TaskController};
use scheduler_infrastructure::{InMemoryJobStore, MetricsCollector};
use scheduler_worker::build_registry;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};

/// 主应用程序
///
/// 持有调度引擎和任务管理服务，`run` 同时驱动调度循环和HTTP管理接口。
pub struct Application {
    config: AppConfig,
    engine: Arc<SchedulerEngine>,
    task_controller: Arc<TaskController>,
    metrics_handle: Option<PrometheusHandle>,
}

impl Application {
    /// 创建新的应用实例，并创建配置中声明的启动任务
    pub async fn new(config: AppConfig, metrics_handle: Option<PrometheusHandle>) -> Result<Self> {
        Self::with_clock(config, metrics_handle, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        config: AppConfig,
        metrics_handle: Option<PrometheusHandle>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        info!("初始化应用程序");

        let registry = build_registry(&config.http_executor).context("创建任务处理器注册表失败")?;

        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let engine = Arc::new(SchedulerEngine::new(
            Arc::clone(&store),
            Arc::new(registry),
            Arc::clone(&clock),
            Arc::new(MetricsCollector::new()),
            &config.scheduler,
        ));
        let task_controller = Arc::new(TaskController::new(Arc::clone(&engine), store, clock));

        if !config.scheduler.jobs.is_empty() {
            let created = task_controller.bootstrap(&config.scheduler.jobs).await;
            info!(
                "启动任务创建完成: {}/{}",
                created,
                config.scheduler.jobs.len()
            );
        }

        Ok(Self {
            config,
            engine,
            task_controller,
            metrics_handle,
        })
    }

    pub fn task_controller(&self) -> Arc<TaskController> {
        Arc::clone(&self.task_controller)
    }

    /// 构建HTTP管理接口
    pub fn router(&self) -> Router {
        let metrics = self.metrics_handle.clone().map(|handle| MetricsEndpoint {
            path: self.config.observability.metrics_endpoint.clone(),
            handle,
        });
        create_app(self.task_controller.clone(), &self.config.api, metrics)
    }

    /// 绑定配置的地址并运行应用程序
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        self.serve(listener, shutdown_rx).await
    }

    /// 在给定的监听器上运行调度循环和API服务器，直到收到关闭信号
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let local_addr = listener.local_addr().context("获取监听地址失败")?;

        // 启动调度循环
        let engine_handle = {
            let engine = Arc::clone(&self.engine);
            let shutdown_rx = shutdown_rx.resubscribe();
            tokio::spawn(async move {
                engine.run(shutdown_rx).await;
            })
        };

        info!("API服务器启动在 http://{}", local_addr);

        let app = self.router();
        let served = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await;

        if let Err(e) = engine_handle.await {
            error!("调度循环异常退出: {}", e);
        }

        served.context("API服务器运行失败")?;
        info!("应用程序已停止");
        Ok(())
    }
}
