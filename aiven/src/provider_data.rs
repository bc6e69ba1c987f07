//! Provider data structure passed to resources and data sources

use crate::api::{ApiError, Client};
use crate::config::ProviderConfig;
use crate::kafka::{KafkaTopicAvailabilityWaiter, KafkaTopicCache, TopicWaitError};
use std::sync::Arc;

/// One per configured provider. Every resource shares the same client and
/// the same Kafka topic cache.
#[derive(Clone)]
pub struct ProviderData {
    pub client: Arc<Client>,
    pub topic_cache: Arc<KafkaTopicCache>,
}

impl ProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            topic_cache: Arc::new(KafkaTopicCache::new()),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ApiError> {
        let client =
            Client::with_config(&config.base_url, &config.api_token, config.client.clone())?;
        Ok(Self::new(client))
    }

    pub fn kafka_topic_waiter(
        &self,
        project: &str,
        service_name: &str,
        topic_name: &str,
    ) -> Result<KafkaTopicAvailabilityWaiter, TopicWaitError> {
        KafkaTopicAvailabilityWaiter::new(
            Arc::clone(&self.client),
            Arc::clone(&self.topic_cache),
            project,
            service_name,
            topic_name,
        )
    }
}
