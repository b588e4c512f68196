use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::decoder::null_as_default;
use crate::state::Record;

/// Topic header as the page renders it. Counts are pre-formatted display
/// text such as "1.2万 浏览", not numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "desc", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "viewNumText", deserialize_with = "null_as_default")]
    pub view_count_text: String,
    #[serde(rename = "discussCommentNumText", deserialize_with = "null_as_default")]
    pub discussion_count_text: String,
}

impl Record for TopicInfo {
    const SHAPE: &'static str = "TopicInfo";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedUser {
    #[serde(deserialize_with = "null_as_default")]
    pub nickname: String,
    #[serde(rename = "avatarUrl", deserialize_with = "null_as_default")]
    pub avatar_url: String,
    #[serde(rename = "isForbidden", deserialize_with = "null_as_default")]
    pub is_forbidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionInfo {
    #[serde(rename = "likeText", deserialize_with = "null_as_default")]
    pub like_text: String,
    #[serde(rename = "collectText", deserialize_with = "null_as_default")]
    pub collect_text: String,
    #[serde(rename = "commentText", deserialize_with = "null_as_default")]
    pub comment_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedItem {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "desc", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user: FeedUser,
    #[serde(rename = "interactionInfo", deserialize_with = "null_as_default")]
    pub interaction: InteractionInfo,
    /// Epoch milliseconds
    #[serde(rename = "createTime", deserialize_with = "null_as_default")]
    pub create_time: i64,
    #[serde(rename = "cursorScore", deserialize_with = "null_as_default")]
    pub cursor_score: String,
}

impl FeedItem {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if self.create_time <= 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.create_time)
    }
}

impl Record for FeedItem {
    const SHAPE: &'static str = "FeedItem";
}

/// A topic and its feeds, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicResult {
    topic: TopicInfo,
    feeds: Vec<FeedItem>,
    count: usize,
}

impl TopicResult {
    pub fn new(topic: TopicInfo, feeds: Vec<FeedItem>) -> Self {
        let count = feeds.len();
        Self {
            topic,
            feeds,
            count,
        }
    }

    pub fn topic(&self) -> &TopicInfo {
        &self.topic
    }

    pub fn feeds(&self) -> &[FeedItem] {
        &self.feeds
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_parts(self) -> (TopicInfo, Vec<FeedItem>) {
        (self.topic, self.feeds)
    }

    /// Multi-line summary for terminal output
    pub fn summary(&self) -> String {
        let mut out = self.topic.name.clone();
        if !self.topic.description.is_empty() {
            out.push_str(&format!("\n  {}", self.topic.description));
        }
        out.push_str(&format!(
            "\n  Views: {}  Discussions: {}",
            display_or_dash(&self.topic.view_count_text),
            display_or_dash(&self.topic.discussion_count_text)
        ));
        out.push_str(&format!("\n\n{} feeds:", self.count));

        for (i, feed) in self.feeds.iter().enumerate() {
            let title = if feed.title.is_empty() {
                "(untitled)"
            } else {
                feed.title.as_str()
            };
            out.push_str(&format!("\n  {}. {} [{}]", i + 1, title, feed.kind));
            out.push_str(&format!(
                "\n     by {}  likes {}  collects {}  comments {}",
                display_or_dash(&feed.user.nickname),
                display_or_dash(&feed.interaction.like_text),
                display_or_dash(&feed.interaction.collect_text),
                display_or_dash(&feed.interaction.comment_text)
            ));
            if let Some(created) = feed.created_at() {
                out.push_str(&format!("\n     {}", created.format("%Y-%m-%d %H:%M UTC")));
            }
        }

        out
    }
}

fn display_or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}
