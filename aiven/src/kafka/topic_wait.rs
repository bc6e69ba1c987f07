//! Waits for a freshly created Kafka topic to become ACTIVE.
//!
//! Waiters for topics of the same service cooperate through the shared
//! [`KafkaTopicCache`]: a waiter that finds its topic unresolved enqueues it
//! and, if no other refresh is running, resolves the whole queue with one
//! batched request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::topic_cache::KafkaTopicCache;
use crate::api::kafka_topics::{KafkaListTopic, KafkaTopic, TopicState};
use crate::api::{ApiError, Client};
use crate::retry::{StateChangeConf, WaitError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 100;

/// Backend calls the waiter depends on.
#[async_trait]
pub trait KafkaTopicBackend: Send + Sync {
    /// Full v1 listing of a service's topics.
    async fn list_topics(&self, project: &str, service: &str)
        -> Result<Vec<KafkaListTopic>, ApiError>;

    /// Batched lookup. Fails with 404 if any name is unknown.
    async fn list_topics_batch(
        &self,
        project: &str,
        service: &str,
        topic_names: &[String],
    ) -> Result<Vec<KafkaTopic>, ApiError>;
}

#[async_trait]
impl KafkaTopicBackend for Client {
    async fn list_topics(
        &self,
        project: &str,
        service: &str,
    ) -> Result<Vec<KafkaListTopic>, ApiError> {
        self.kafka_topics().list(project, service).await
    }

    async fn list_topics_batch(
        &self,
        project: &str,
        service: &str,
        topic_names: &[String],
    ) -> Result<Vec<KafkaTopic>, ApiError> {
        self.kafka_topics().v2_list(project, service, topic_names).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TopicWaitError {
    #[error("invalid input: project={project:?}, service_name={service_name:?}, topic_name={topic_name:?}")]
    InvalidInput {
        project: String,
        service_name: String,
        topic_name: String,
    },

    #[error("error calling v1 list for {project}/{service_name}: {source}")]
    V1List {
        project: String,
        service_name: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type PollResult = Result<Option<(KafkaTopic, TopicState)>, TopicWaitError>;

pub struct KafkaTopicAvailabilityWaiter<B = Client> {
    client: Arc<B>,
    cache: Arc<KafkaTopicCache>,
    project: String,
    service_name: String,
    topic_name: String,
}

impl<B> Clone for KafkaTopicAvailabilityWaiter<B> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cache: Arc::clone(&self.cache),
            project: self.project.clone(),
            service_name: self.service_name.clone(),
            topic_name: self.topic_name.clone(),
        }
    }
}

impl<B> KafkaTopicAvailabilityWaiter<B>
where
    B: KafkaTopicBackend + 'static,
{
    pub fn new(
        client: Arc<B>,
        cache: Arc<KafkaTopicCache>,
        project: &str,
        service_name: &str,
        topic_name: &str,
    ) -> Result<Self, TopicWaitError> {
        if project.is_empty() || service_name.is_empty() || topic_name.is_empty() {
            return Err(TopicWaitError::InvalidInput {
                project: project.to_string(),
                service_name: service_name.to_string(),
                topic_name: topic_name.to_string(),
            });
        }

        Ok(Self {
            client,
            cache,
            project: project.to_string(),
            service_name: service_name.to_string(),
            topic_name: topic_name.to_string(),
        })
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// One tick of the wait. `Ok(None)` means the topic is confirmed missing.
    pub async fn poll(&self) -> PollResult {
        let (project, service, topic_name) = (&self.project, &self.service_name, &self.topic_name);

        // The v1 listing lets a batch 404 be attributed to the names that
        // really do not exist. An empty snapshot is fetched again: topics
        // created after it would otherwise be marked missing.
        if self.cache.get_v1_list(project, service).await.is_empty() {
            let list = self
                .client
                .list_topics(project, service)
                .await
                .map_err(|source| TopicWaitError::V1List {
                    project: project.clone(),
                    service_name: service.clone(),
                    source,
                })?;
            self.cache.set_v1_list(project, service, &list).await;
        }

        if self.cache.is_missing(project, service, topic_name).await {
            tracing::debug!("Topic {} is not found", topic_name);
            return Ok(None);
        }

        let (mut topic, mut found) = self
            .cache
            .load_by_topic_name(project, service, topic_name)
            .await;

        if !found {
            if let Err(err) = self.refresh().await {
                // Topic lookups sometimes fail with 501 or 502 for a while.
                if matches!(err.status(), Some(501) | Some(502)) {
                    tracing::debug!(
                        "Got an error while waiting for a topic '{}' to be ACTIVE: {}",
                        topic_name,
                        err
                    );
                    return Ok(Some((topic, TopicState::Configuring)));
                }
                return Err(err.into());
            }

            (topic, found) = self
                .cache
                .load_by_topic_name(project, service, topic_name)
                .await;
            if !found {
                return Ok(Some((topic, TopicState::Configuring)));
            }
        }

        tracing::debug!(
            "Got {} state while waiting for topic {} to be up",
            topic.state,
            topic_name
        );

        let state = topic.state;
        Ok(Some((topic, state)))
    }

    /// Resolves the service's pending queue in batches. Returns at once if
    /// another refresh holds the permit; the next poll retries.
    async fn refresh(&self) -> Result<(), ApiError> {
        let (project, service, topic_name) = (&self.project, &self.service_name, &self.topic_name);

        let Some(_permit) = self.cache.try_begin_refresh() else {
            tracing::trace!("Kafka Topic Availability cache refresh already in progress");
            return Ok(());
        };

        if self
            .cache
            .load_by_topic_name(project, service, topic_name)
            .await
            .1
        {
            return Ok(());
        }

        self.cache.add_to_queue(project, service, topic_name).await;

        loop {
            let queue = self.cache.get_queue(project, service).await;
            if queue.is_empty() {
                break;
            }

            tracing::debug!("Kafka Topic queue: {:?}", queue);

            match self.client.list_topics_batch(project, service, &queue).await {
                Ok(topics) => {
                    let resolved = topics
                        .iter()
                        .filter(|t| queue.contains(&t.topic_name))
                        .count();
                    self.cache.store(project, service, topics).await;

                    if resolved == 0 {
                        tracing::warn!(
                            "Batch lookup for {}/{} resolved none of the queued topics",
                            project,
                            service
                        );
                        break;
                    }
                }
                // The batch endpoint answers 404 if any name is unknown without
                // saying which. Whatever the v1 listing lacks does not exist.
                Err(err) if err.is_not_found() => {
                    let v1_list = self.cache.get_v1_list(project, service).await;
                    for name in queue.iter().filter(|name| !v1_list.contains(name)) {
                        tracing::debug!("Marking topic {} as missing", name);
                        self.cache
                            .delete_from_queue_and_mark_missing(project, service, name)
                            .await;
                    }
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// Poll function for [`StateChangeConf::wait_for_state`].
    pub fn refresh_func(&self) -> impl FnMut() -> BoxFuture<'static, PollResult> + Send {
        let waiter = self.clone();
        move || {
            let waiter = waiter.clone();
            Box::pin(async move { waiter.poll().await })
        }
    }

    pub fn conf(&self, timeout: Duration) -> StateChangeConf<TopicState> {
        tracing::debug!(
            "Kafka Topic availability waiter timeout {:.0} minutes",
            timeout.as_secs_f64() / 60.0
        );

        StateChangeConf::new(
            vec![TopicState::Configuring],
            vec![TopicState::Active],
            timeout,
        )
        .with_poll_interval(DEFAULT_POLL_INTERVAL)
        .with_not_found_checks(DEFAULT_NOT_FOUND_CHECKS)
    }

    /// Polls until the topic is ACTIVE, missing for too long, or `timeout`
    /// elapses.
    pub async fn wait(&self, timeout: Duration) -> Result<KafkaTopic, WaitError<TopicWaitError>> {
        self.conf(timeout).wait_for_state(self.refresh_func()).await
    }
}
