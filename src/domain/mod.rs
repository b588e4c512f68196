pub mod topic;

pub use topic::{FeedItem, FeedUser, InteractionInfo, TopicInfo, TopicResult};
