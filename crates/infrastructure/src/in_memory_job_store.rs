use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scheduler_core::{
    models::{JobEntry, JobKey, JobState},
    traits::{EntryMutation, JobStore},
    SchedulerError, SchedulerResult,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// 内存任务存储
///
/// 所有任务保存在一把读写锁保护的哈希表中，进程退出即丢失。
/// 写操作在锁内完成检查和修改，因此并发的同名创建只有一个会成功。
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    entries: RwLock<HashMap<JobKey, JobEntry>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, entry: JobEntry) -> SchedulerResult<()> {
        let mut entries = self.entries.write().await;

        let key = entry.key().clone();
        if entries.contains_key(&key) {
            return Err(SchedulerError::JobAlreadyExists {
                name: key.name,
                group: key.group,
            });
        }
        if entries.values().any(|e| e.task_id == entry.task_id) {
            return Err(SchedulerError::TaskIdConflict { id: entry.task_id });
        }

        debug!("存储新任务: {} (id={})", key, entry.task_id);
        entries.insert(key, entry);
        Ok(())
    }

    async fn get(&self, key: &JobKey) -> SchedulerResult<Option<JobEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn find_by_id(&self, task_id: i32) -> SchedulerResult<Option<JobKey>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|e| e.task_id == task_id)
            .map(|e| e.key().clone()))
    }

    async fn list(&self) -> SchedulerResult<Vec<JobEntry>> {
        let entries = self.entries.read().await;
        let mut list: Vec<JobEntry> = entries.values().cloned().collect();
        list.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(list)
    }

    async fn state(&self, key: &JobKey) -> SchedulerResult<JobState> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|e| e.state)
            .ok_or_else(|| key.not_found())
    }

    async fn update(&self, key: &JobKey, mutation: EntryMutation<'_>) -> SchedulerResult<JobEntry> {
        let mut entries = self.entries.write().await;
        let current = entries.get_mut(key).ok_or_else(|| key.not_found())?;

        let mut updated = current.clone();
        mutation(&mut updated)?;
        *current = updated.clone();
        Ok(updated)
    }

    async fn remove(&self, key: &JobKey) -> SchedulerResult<JobEntry> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(key).ok_or_else(|| key.not_found())?;
        debug!("删除任务: {} (id={})", key, removed.task_id);
        Ok(removed)
    }

    async fn due_keys(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<JobKey>> {
        let entries = self.entries.read().await;
        let mut due: Vec<(DateTime<Utc>, JobKey)> = entries
            .values()
            .filter(|e| e.is_due(now))
            .filter_map(|e| e.next_fire_time.map(|at| (at, e.key().clone())))
            .collect();
        due.sort();
        Ok(due.into_iter().map(|(_, key)| key).collect())
    }

    async fn earliest_next_fire(&self) -> SchedulerResult<Option<DateTime<Utc>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|e| e.state == JobState::Scheduled)
            .filter_map(|e| e.next_fire_time)
            .min())
    }

    async fn len(&self) -> SchedulerResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scheduler_core::models::{JobDefinition, TriggerSpec};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 30).unwrap()
    }

    fn entry(task_id: i32, name: &str, group: &str, cron: &str) -> JobEntry {
        let definition = JobDefinition {
            key: JobKey::new(name, group).unwrap(),
            handler_type: "LogJob".to_string(),
            description: None,
            parameters: HashMap::new(),
        };
        JobEntry::new(
            task_id,
            definition,
            TriggerSpec::compile(cron).unwrap(),
            "2024-01-01 12:00:30".to_string(),
            now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryJobStore::new();
        store.insert(entry(1, "a", "g", "0 * * * * *")).await.unwrap();

        let key = JobKey::new("a", "g").unwrap();
        assert!(store.get(&key).await.unwrap().is_some());
        assert_eq!(store.find_by_id(1).await.unwrap(), Some(key.clone()));
        assert_eq!(store.find_by_id(2).await.unwrap(), None);
        assert_eq!(store.state(&key).await.unwrap(), JobState::Scheduled);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_rejected() {
        let store = InMemoryJobStore::new();
        store.insert(entry(1, "a", "g", "0 * * * * *")).await.unwrap();

        let result = store.insert(entry(2, "a", "g", "0 0 * * * *")).await;
        assert!(matches!(result, Err(SchedulerError::JobAlreadyExists { .. })));

        let stored = store.get(&JobKey::new("a", "g").unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.task_id, 1);
        assert_eq!(stored.trigger.cron_expression(), "0 * * * * *");
    }

    #[tokio::test]
    async fn test_duplicate_task_id_is_rejected() {
        let store = InMemoryJobStore::new();
        store.insert(entry(1, "a", "g", "0 * * * * *")).await.unwrap();

        let result = store.insert(entry(1, "b", "g", "0 * * * * *")).await;
        assert!(matches!(result, Err(SchedulerError::TaskIdConflict { id: 1 })));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_of_same_key() {
        let store = Arc::new(InMemoryJobStore::new());

        let attempts = (0..16).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.insert(entry(i, "a", "g", "0 * * * * *")).await })
        });
        let results = futures::future::join_all(attempts).await;

        let succeeded = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(()))))
            .count();
        assert_eq!(succeeded, 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_entry_unchanged() {
        let store = InMemoryJobStore::new();
        store.insert(entry(1, "a", "g", "0 * * * * *")).await.unwrap();
        let key = JobKey::new("a", "g").unwrap();

        let result = store
            .update(
                &key,
                Box::new(|e: &mut JobEntry| {
                    e.state = JobState::Paused;
                    Err(SchedulerError::validation("rejected"))
                }),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(store.state(&key).await.unwrap(), JobState::Scheduled);

        let updated = store
            .update(
                &key,
                Box::new(|e: &mut JobEntry| {
                    e.state = JobState::Paused;
                    Ok(())
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.state, JobState::Paused);
        assert_eq!(store.state(&key).await.unwrap(), JobState::Paused);
    }

    #[tokio::test]
    async fn test_missing_key_operations() {
        let store = InMemoryJobStore::new();
        let key = JobKey::new("missing", "g").unwrap();

        assert!(matches!(
            store.state(&key).await,
            Err(SchedulerError::JobNotFound { .. })
        ));
        assert!(matches!(
            store.remove(&key).await,
            Err(SchedulerError::JobNotFound { .. })
        ));
        assert!(matches!(
            store.update(&key, Box::new(|_: &mut JobEntry| Ok(()))).await,
            Err(SchedulerError::JobNotFound { .. })
        ));
        assert_eq!(store.find_by_id(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_due_keys_and_earliest_next_fire() {
        let store = InMemoryJobStore::new();
        // 12:01:00
        store.insert(entry(1, "minute", "g", "0 * * * * *")).await.unwrap();
        // 13:00:00
        store.insert(entry(2, "hourly", "g", "0 0 * * * *")).await.unwrap();
        // 12:00:40
        store.insert(entry(3, "tens", "g", "*/20 * * * * *")).await.unwrap();

        assert_eq!(
            store.earliest_next_fire().await.unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 40).unwrap())
        );

        let due = store
            .due_keys(Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 0).unwrap())
            .await
            .unwrap();
        let names: Vec<&str> = due.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["tens", "minute"]);

        let paused = JobKey::new("tens", "g").unwrap();
        store
            .update(
                &paused,
                Box::new(|e: &mut JobEntry| {
                    e.state = JobState::Paused;
                    Ok(())
                }),
            )
            .await
            .unwrap();
        assert_eq!(
            store.earliest_next_fire().await.unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 0).unwrap())
        );
    }
}
