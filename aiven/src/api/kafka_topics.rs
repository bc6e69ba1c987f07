//! Kafka topic API implementation

use crate::api::{common::build_path, ApiError, ApiQueryParams, Client};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic lifecycle state as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicState {
    #[default]
    Configuring,
    Active,
    Deleting,
    #[serde(other)]
    Unknown,
}

impl TopicState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicState::Configuring => "CONFIGURING",
            TopicState::Active => "ACTIVE",
            TopicState::Deleting => "DELETING",
            TopicState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TopicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaTopicPartition {
    pub partition: u32,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub earliest_offset: Option<i64>,
    #[serde(default)]
    pub latest_offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaTopicTag {
    pub key: String,
    pub value: String,
}

/// Full topic description, as returned by the v2 batch endpoint and the
/// single topic endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KafkaTopic {
    pub topic_name: String,
    #[serde(default)]
    pub state: TopicState,
    #[serde(default)]
    pub replication: Option<u32>,
    #[serde(default)]
    pub min_insync_replicas: Option<u32>,
    #[serde(default)]
    pub retention_hours: Option<i64>,
    #[serde(default)]
    pub retention_bytes: Option<i64>,
    #[serde(default)]
    pub cleanup_policy: Option<String>,
    #[serde(default)]
    pub partitions: Vec<KafkaTopicPartition>,
    #[serde(default)]
    pub tags: Vec<KafkaTopicTag>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

impl KafkaTopic {
    /// Stand-in for a topic the cache knows nothing about yet.
    pub fn placeholder(topic_name: &str) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            state: TopicState::Configuring,
            ..Default::default()
        }
    }
}

/// Item of the v1 topic listing. Partitions are a count here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaListTopic {
    pub topic_name: String,
    #[serde(default)]
    pub state: TopicState,
    #[serde(default)]
    pub partitions: Option<u32>,
    #[serde(default)]
    pub replication: Option<u32>,
    #[serde(default)]
    pub min_insync_replicas: Option<u32>,
    #[serde(default)]
    pub retention_hours: Option<i64>,
    #[serde(default)]
    pub retention_bytes: Option<i64>,
    #[serde(default)]
    pub cleanup_policy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KafkaTopicsListResponse<T> {
    #[serde(default = "Vec::new")]
    topics: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct KafkaTopicResponse {
    topic: KafkaTopic,
}

/// Kafka topics API for a single client
pub struct KafkaTopicsApi<'a> {
    client: &'a Client,
}

impl<'a> KafkaTopicsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/project/{project}/service/{service}/topic
    pub async fn list(&self, project: &str, service: &str) -> Result<Vec<KafkaListTopic>, ApiError> {
        let path = build_path(&["v1", "project", project, "service", service, "topic"]);
        let response: KafkaTopicsListResponse<KafkaListTopic> = self.client.get(&path).await?;
        Ok(response.topics)
    }

    /// GET /v2/project/{project}/service/{service}/topic?topic_name=...
    ///
    /// Answers 404 when any of the requested names does not exist, without
    /// telling which one.
    pub async fn v2_list(
        &self,
        project: &str,
        service: &str,
        topic_names: &[String],
    ) -> Result<Vec<KafkaTopic>, ApiError> {
        let path = build_path(&["v2", "project", project, "service", service, "topic"]);
        let params = ApiQueryParams::new().add_all("topic_name", topic_names);
        let response: KafkaTopicsListResponse<KafkaTopic> =
            self.client.get_with_params(&path, &params).await?;
        Ok(response.topics)
    }

    /// GET /v1/project/{project}/service/{service}/topic/{topic}
    pub async fn get(&self, project: &str, service: &str, topic: &str) -> Result<KafkaTopic, ApiError> {
        let path = build_path(&["v1", "project", project, "service", service, "topic", topic]);
        let response: KafkaTopicResponse = self.client.get(&path).await?;
        Ok(response.topic)
    }
}
