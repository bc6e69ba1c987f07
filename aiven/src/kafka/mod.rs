pub mod topic_cache;
pub mod topic_wait;

pub use topic_cache::{KafkaTopicCache, ServiceKey, QUEUE_BATCH_LIMIT};
pub use topic_wait::{KafkaTopicAvailabilityWaiter, KafkaTopicBackend, TopicWaitError};
