//! Shared cache of Kafka topic descriptions, scoped by project and service.
//!
//! The backend rate-limits requests per minute, so topic waiters do not query
//! topics one by one. Instead each waiter enqueues its topic name here and
//! whichever waiter holds the refresh permit resolves the whole queue with one
//! batched call. One instance is created per process and shared through
//! [`crate::ProviderData`].
//!
//! Every operation is its own critical section. Callers that chain several
//! operations (check missing, check cached, enqueue) can interleave with other
//! callers between them.

use std::collections::HashMap;

use tokio::sync::{RwLock, Semaphore, SemaphorePermit};

use crate::api::kafka_topics::{KafkaListTopic, KafkaTopic};

/// Most names handed out by [`KafkaTopicCache::get_queue`] at once. The batch
/// endpoint accepts about a hundred names per call.
pub const QUEUE_BATCH_LIMIT: usize = 99;

/// Identifies one Kafka service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub project: String,
    pub service: String,
}

impl ServiceKey {
    pub fn new(project: &str, service: &str) -> Self {
        Self {
            project: project.to_string(),
            service: service.to_string(),
        }
    }
}

#[derive(Default)]
struct CacheState {
    topics: HashMap<ServiceKey, HashMap<String, KafkaTopic>>,
    queue: HashMap<ServiceKey, Vec<String>>,
    missing: HashMap<ServiceKey, Vec<String>>,
    v1_list: HashMap<ServiceKey, Vec<String>>,
}

/// Held while a batch refresh runs. Dropping it lets the next refresh start.
pub struct RefreshPermit<'a> {
    _permit: SemaphorePermit<'a>,
}

pub struct KafkaTopicCache {
    state: RwLock<CacheState>,
    refresh_guard: Semaphore,
}

impl Default for KafkaTopicCache {
    fn default() -> Self {
        Self::new()
    }
}

impl KafkaTopicCache {
    pub fn new() -> Self {
        tracing::debug!("Creating an instance of KafkaTopicCache");

        Self {
            state: RwLock::new(CacheState::default()),
            refresh_guard: Semaphore::new(1),
        }
    }

    /// All resolved topics of a service, or `None` if nothing was stored yet.
    pub async fn load_by_service(
        &self,
        project: &str,
        service: &str,
    ) -> Option<HashMap<String, KafkaTopic>> {
        let state = self.state.read().await;
        state.topics.get(&ServiceKey::new(project, service)).cloned()
    }

    /// Looks up one topic. When absent, returns a CONFIGURING placeholder and
    /// `false`.
    pub async fn load_by_topic_name(
        &self,
        project: &str,
        service: &str,
        topic_name: &str,
    ) -> (KafkaTopic, bool) {
        let state = self.state.read().await;

        let found = state
            .topics
            .get(&ServiceKey::new(project, service))
            .and_then(|topics| topics.get(topic_name));

        tracing::trace!(
            "retrieving from a topic cache {:?} for a topic name {}",
            found,
            topic_name
        );

        match found {
            Some(topic) => (topic.clone(), true),
            None => (KafkaTopic::placeholder(topic_name), false),
        }
    }

    /// Forgets the resolved topics of a service.
    pub async fn delete_by_service(&self, project: &str, service: &str) {
        let mut state = self.state.write().await;
        state.topics.remove(&ServiceKey::new(project, service));
    }

    /// Merges resolved topics into the cache and drops them from the queue.
    pub async fn store(&self, project: &str, service: &str, topics: Vec<KafkaTopic>) {
        if topics.is_empty() {
            return;
        }

        tracing::debug!(
            "Updating Kafka Topic cache for project {} and service {}",
            project,
            service
        );

        let key = ServiceKey::new(project, service);
        let mut state = self.state.write().await;

        if let Some(queue) = state.queue.get_mut(&key) {
            queue.retain(|name| !topics.iter().any(|t| &t.topic_name == name));
        }

        let cached = state.topics.entry(key).or_default();
        for topic in topics {
            cached.insert(topic.topic_name.clone(), topic);
        }
    }

    /// Queues a topic for the next batch lookup unless it is already cached,
    /// queued or known to be missing.
    pub async fn add_to_queue(&self, project: &str, service: &str, topic_name: &str) {
        let key = ServiceKey::new(project, service);
        let mut state = self.state.write().await;

        let in_cache = state
            .topics
            .get(&key)
            .is_some_and(|topics| topics.contains_key(topic_name));
        let is_missing = state
            .missing
            .get(&key)
            .is_some_and(|missing| missing.iter().any(|name| name == topic_name));
        if in_cache || is_missing {
            return;
        }

        let queue = state.queue.entry(key).or_default();
        if !queue.iter().any(|name| name == topic_name) {
            queue.push(topic_name.to_string());
        }
    }

    /// Drops a topic from the queue and records it as missing.
    pub async fn delete_from_queue_and_mark_missing(
        &self,
        project: &str,
        service: &str,
        topic_name: &str,
    ) {
        let key = ServiceKey::new(project, service);
        let mut state = self.state.write().await;

        if let Some(queue) = state.queue.get_mut(&key) {
            queue.retain(|name| name != topic_name);
        }

        let missing = state.missing.entry(key).or_default();
        if !missing.iter().any(|name| name == topic_name) {
            missing.push(topic_name.to_string());
        }
    }

    pub async fn get_missing(&self, project: &str, service: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .missing
            .get(&ServiceKey::new(project, service))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_missing(&self, project: &str, service: &str, topic_name: &str) -> bool {
        let state = self.state.read().await;
        state
            .missing
            .get(&ServiceKey::new(project, service))
            .is_some_and(|missing| missing.iter().any(|name| name == topic_name))
    }

    /// Oldest queued names, at most [`QUEUE_BATCH_LIMIT`] of them.
    pub async fn get_queue(&self, project: &str, service: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .queue
            .get(&ServiceKey::new(project, service))
            .map(|queue| queue.iter().take(QUEUE_BATCH_LIMIT).cloned().collect())
            .unwrap_or_default()
    }

    /// Records the v1 listing of a service, replacing any earlier snapshot.
    pub async fn set_v1_list(&self, project: &str, service: &str, list: &[KafkaListTopic]) {
        let names = list.iter().map(|t| t.topic_name.clone()).collect();
        let mut state = self.state.write().await;
        state.v1_list.insert(ServiceKey::new(project, service), names);
    }

    /// Topic names from the last v1 listing. Empty if never fetched.
    pub async fn get_v1_list(&self, project: &str, service: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .v1_list
            .get(&ServiceKey::new(project, service))
            .cloned()
            .unwrap_or_default()
    }

    /// Tries to become the single refresher. Never waits: returns `None` when
    /// another refresh is in flight.
    pub fn try_begin_refresh(&self) -> Option<RefreshPermit<'_>> {
        self.refresh_guard
            .try_acquire()
            .ok()
            .map(|permit| RefreshPermit { _permit: permit })
    }

    /// Clears everything for every service. Meant for tests.
    pub async fn flush(&self) {
        let mut state = self.state.write().await;
        *state = CacheState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::kafka_topics::TopicState;

    fn topic(name: &str, state: TopicState) -> KafkaTopic {
        KafkaTopic {
            topic_name: name.to_string(),
            state,
            ..Default::default()
        }
    }

    fn list_topic(name: &str) -> KafkaListTopic {
        KafkaListTopic {
            topic_name: name.to_string(),
            state: TopicState::Active,
            partitions: Some(1),
            replication: Some(2),
            min_insync_replicas: None,
            retention_hours: None,
            retention_bytes: None,
            cleanup_policy: None,
        }
    }

    #[tokio::test]
    async fn lookup_of_unknown_topic_returns_configuring_placeholder() {
        let cache = KafkaTopicCache::new();

        let (found, ok) = cache.load_by_topic_name("proj", "kafka", "orders").await;
        assert!(!ok);
        assert_eq!(found.topic_name, "orders");
        assert_eq!(found.state, TopicState::Configuring);
        assert!(cache.load_by_service("proj", "kafka").await.is_none());
    }

    #[tokio::test]
    async fn enqueue_is_idempotent() {
        let cache = KafkaTopicCache::new();

        cache.add_to_queue("proj", "kafka", "orders").await;
        cache.add_to_queue("proj", "kafka", "orders").await;

        assert_eq!(cache.get_queue("proj", "kafka").await, vec!["orders"]);
    }

    #[tokio::test]
    async fn enqueue_skips_cached_and_missing_topics() {
        let cache = KafkaTopicCache::new();
        cache
            .store("proj", "kafka", vec![topic("orders", TopicState::Active)])
            .await;
        cache
            .delete_from_queue_and_mark_missing("proj", "kafka", "ghost")
            .await;

        cache.add_to_queue("proj", "kafka", "orders").await;
        cache.add_to_queue("proj", "kafka", "ghost").await;

        assert!(cache.get_queue("proj", "kafka").await.is_empty());
    }

    #[tokio::test]
    async fn queue_is_capped_at_batch_limit() {
        let cache = KafkaTopicCache::new();
        for i in 0..150 {
            cache.add_to_queue("proj", "kafka", &format!("topic-{}", i)).await;
        }

        let queue = cache.get_queue("proj", "kafka").await;
        assert_eq!(queue.len(), 99);
        assert_eq!(queue[0], "topic-0");
        assert_eq!(queue[98], "topic-98");
    }

    #[tokio::test]
    async fn store_drains_resolved_topics_from_queue() {
        let cache = KafkaTopicCache::new();
        cache.add_to_queue("proj", "kafka", "orders").await;
        cache.add_to_queue("proj", "kafka", "events").await;

        cache
            .store("proj", "kafka", vec![topic("orders", TopicState::Active)])
            .await;

        assert_eq!(cache.get_queue("proj", "kafka").await, vec!["events"]);
        let (found, ok) = cache.load_by_topic_name("proj", "kafka", "orders").await;
        assert!(ok);
        assert_eq!(found.state, TopicState::Active);
    }

    #[tokio::test]
    async fn store_of_empty_batch_is_a_no_op() {
        let cache = KafkaTopicCache::new();
        cache.store("proj", "kafka", Vec::new()).await;
        assert!(cache.load_by_service("proj", "kafka").await.is_none());
    }

    #[tokio::test]
    async fn store_overwrites_previous_state() {
        let cache = KafkaTopicCache::new();
        cache
            .store("proj", "kafka", vec![topic("orders", TopicState::Configuring)])
            .await;
        cache
            .store("proj", "kafka", vec![topic("orders", TopicState::Active)])
            .await;

        let topics = cache.load_by_service("proj", "kafka").await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics["orders"].state, TopicState::Active);
    }

    #[tokio::test]
    async fn marking_missing_removes_from_queue() {
        let cache = KafkaTopicCache::new();
        cache.add_to_queue("proj", "kafka", "orders").await;
        cache.add_to_queue("proj", "kafka", "ghost").await;

        cache
            .delete_from_queue_and_mark_missing("proj", "kafka", "ghost")
            .await;
        cache
            .delete_from_queue_and_mark_missing("proj", "kafka", "ghost")
            .await;

        assert_eq!(cache.get_queue("proj", "kafka").await, vec!["orders"]);
        assert_eq!(cache.get_missing("proj", "kafka").await, vec!["ghost"]);
        assert!(cache.is_missing("proj", "kafka", "ghost").await);

        let (_, ok) = cache.load_by_topic_name("proj", "kafka", "ghost").await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn services_do_not_share_state() {
        let cache = KafkaTopicCache::new();
        cache.add_to_queue("proj", "kafka-a", "orders").await;
        cache
            .store("proj", "kafka-b", vec![topic("orders", TopicState::Active)])
            .await;

        assert_eq!(cache.get_queue("proj", "kafka-a").await, vec!["orders"]);
        assert!(cache.get_queue("proj", "kafka-b").await.is_empty());

        // Concatenated keys would collide here: "pro" + "jkafka" == "proj" + "kafka".
        cache.add_to_queue("pro", "jkafka-a", "events").await;
        assert_eq!(cache.get_queue("proj", "kafka-a").await, vec!["orders"]);
    }

    #[tokio::test]
    async fn v1_list_is_empty_until_set_and_replaced_on_set() {
        let cache = KafkaTopicCache::new();
        assert!(cache.get_v1_list("proj", "kafka").await.is_empty());

        cache
            .set_v1_list("proj", "kafka", &[list_topic("stale")])
            .await;

        cache
            .set_v1_list("proj", "kafka", &[list_topic("orders"), list_topic("events")])
            .await;
        assert_eq!(
            cache.get_v1_list("proj", "kafka").await,
            vec!["orders".to_string(), "events".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_by_service_keeps_other_maps() {
        let cache = KafkaTopicCache::new();
        cache
            .store("proj", "kafka", vec![topic("orders", TopicState::Active)])
            .await;
        cache.add_to_queue("proj", "kafka", "events").await;

        cache.delete_by_service("proj", "kafka").await;

        assert!(cache.load_by_service("proj", "kafka").await.is_none());
        assert_eq!(cache.get_queue("proj", "kafka").await, vec!["events"]);
    }

    #[tokio::test]
    async fn flush_resets_every_service() {
        let cache = KafkaTopicCache::new();
        for service in ["kafka-a", "kafka-b"] {
            cache
                .store("proj", service, vec![topic("orders", TopicState::Active)])
                .await;
            cache.add_to_queue("proj", service, "events").await;
            cache
                .delete_from_queue_and_mark_missing("proj", service, "ghost")
                .await;
            cache
                .set_v1_list("proj", service, &[list_topic("orders")])
                .await;
        }

        cache.flush().await;

        for service in ["kafka-a", "kafka-b"] {
            assert!(cache.load_by_service("proj", service).await.is_none());
            assert!(cache.get_queue("proj", service).await.is_empty());
            assert!(cache.get_missing("proj", service).await.is_empty());
            assert!(cache.get_v1_list("proj", service).await.is_empty());
        }

        // Missing names are no longer sticky after a flush.
        cache.add_to_queue("proj", "kafka-a", "ghost").await;
        assert_eq!(cache.get_queue("proj", "kafka-a").await, vec!["ghost"]);
    }

    #[tokio::test]
    async fn refresh_permit_is_exclusive_and_released_on_drop() {
        let cache = KafkaTopicCache::new();

        let permit = cache.try_begin_refresh();
        assert!(permit.is_some());
        assert!(cache.try_begin_refresh().is_none());

        drop(permit);
        assert!(cache.try_begin_refresh().is_some());
    }

    #[tokio::test]
    async fn missing_and_queued_stay_disjoint_in_either_order() {
        let cache = KafkaTopicCache::new();

        // Enqueued first, marked missing later: the mark pulls it off the queue.
        cache.add_to_queue("proj", "kafka", "ghost").await;
        cache
            .delete_from_queue_and_mark_missing("proj", "kafka", "ghost")
            .await;
        assert!(cache.get_queue("proj", "kafka").await.is_empty());
        assert!(cache.is_missing("proj", "kafka", "ghost").await);

        // Marked missing first: a later enqueue is refused.
        cache
            .delete_from_queue_and_mark_missing("proj", "kafka", "phantom")
            .await;
        cache.add_to_queue("proj", "kafka", "phantom").await;
        assert!(cache.get_queue("proj", "kafka").await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_enqueue_and_mark_never_leave_name_in_both() {
        let cache = std::sync::Arc::new(KafkaTopicCache::new());

        for round in 0..50 {
            let name = format!("topic-{}", round);
            let enqueue = tokio::spawn({
                let cache = std::sync::Arc::clone(&cache);
                let name = name.clone();
                async move {
                    if !cache.is_missing("proj", "kafka", &name).await {
                        cache.add_to_queue("proj", "kafka", &name).await;
                    }
                }
            });
            let mark = tokio::spawn({
                let cache = std::sync::Arc::clone(&cache);
                let name = name.clone();
                async move {
                    cache
                        .delete_from_queue_and_mark_missing("proj", "kafka", &name)
                        .await;
                }
            });
            enqueue.await.unwrap();
            mark.await.unwrap();

            assert!(cache.is_missing("proj", "kafka", &name).await);
            assert!(!cache.get_queue("proj", "kafka").await.contains(&name));
        }
    }
}
