pub mod client;
pub mod hooks;
pub mod message;
pub mod stats;

pub use mqtt_codec_kit::common::{QualityOfService, TopicFilter, TopicName};
