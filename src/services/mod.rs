pub mod topic_service;

pub use topic_service::{extract_topic, TopicService};
