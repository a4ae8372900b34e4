#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{Notify, Semaphore};

use scheduler_core::{
    traits::{JobExecutionContext, JobHandler, JobStore},
    JobRegistry, ManualClock, SchedulerConfig, SchedulerError, SchedulerResult,
};
use scheduler_dispatcher::{SchedulerEngine, TaskController};
use scheduler_infrastructure::{InMemoryJobStore, MetricsCollector};

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
}

/// 统计执行次数和最大并发数，可选地阻塞到测试放行
#[derive(Default)]
pub struct CountingHandler {
    pub executions: AtomicUsize,
    pub current: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    pub entered: Notify,
    pub gate: Option<Semaphore>,
}

impl CountingHandler {
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Default::default()
        }
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobHandler for CountingHandler {
    async fn execute(&self, _context: &JobExecutionContext) -> SchedulerResult<()> {
        let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(running, Ordering::SeqCst);
        self.executions.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| SchedulerError::TaskExecution(e.to_string()))?;
            permit.forget();
        }

        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FailingHandler;

#[async_trait]
impl JobHandler for FailingHandler {
    async fn execute(&self, _context: &JobExecutionContext) -> SchedulerResult<()> {
        Err(SchedulerError::TaskExecution("downstream unavailable".to_string()))
    }
}

pub struct PanickingHandler;

#[async_trait]
impl JobHandler for PanickingHandler {
    async fn execute(&self, _context: &JobExecutionContext) -> SchedulerResult<()> {
        panic!("handler bug");
    }
}

pub struct Harness {
    pub clock: ManualClock,
    pub store: Arc<dyn JobStore>,
    pub engine: Arc<SchedulerEngine>,
    pub controller: TaskController,
}

pub fn harness(registry: JobRegistry, start: DateTime<Utc>) -> Harness {
    let clock = ManualClock::new(start);
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let engine = Arc::new(SchedulerEngine::new(
        store.clone(),
        Arc::new(registry),
        Arc::new(clock.clone()),
        Arc::new(MetricsCollector::new()),
        &SchedulerConfig::default(),
    ));
    let controller = TaskController::new(engine.clone(), store.clone(), Arc::new(clock.clone()));

    Harness {
        clock,
        store,
        engine,
        controller,
    }
}
