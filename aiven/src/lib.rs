//! Core of the Aiven Terraform provider: the REST API client, the Kafka topic
//! availability waiter with its shared cache, and the helpers resources use to
//! map attributes onto API calls.

pub mod api;
pub mod config;
pub mod kafka;
pub mod logging;
pub mod provider_data;
pub mod retry;
pub mod schemautil;

pub use api::{ApiError, Client};
pub use config::{ConfigError, ProviderConfig, ProviderSettings};
pub use kafka::{KafkaTopicAvailabilityWaiter, KafkaTopicCache, TopicWaitError};
pub use logging::{init_logging, try_init_logging};
pub use provider_data::ProviderData;
pub use retry::{StateChangeConf, WaitError};
