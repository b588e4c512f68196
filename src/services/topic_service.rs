use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::browser::{PageDriver, ReadinessGate};
use crate::config::Config;
use crate::domain::{FeedItem, TopicInfo, TopicResult};
use crate::errors::{ScraperError, ScraperResult};
use crate::state::{decode_list, decode_record, PageSnapshot, StatePath};

pub struct TopicService<D: PageDriver> {
    driver: D,
    gate: ReadinessGate,
    base_url: Url,
    page_timeout: Duration,
}

impl<D: PageDriver> TopicService<D> {
    pub fn new(driver: D, gate: ReadinessGate, base_url: Url, page_timeout: Duration) -> Self {
        Self {
            driver,
            gate,
            base_url,
            page_timeout,
        }
    }

    pub fn from_config(driver: D, config: &Config) -> ScraperResult<Self> {
        let base_url = Url::parse(&config.topic_base_url)
            .map_err(|e| ScraperError::InvalidUrl(format!("{}: {}", config.topic_base_url, e)))?;
        let gate = ReadinessGate::new(
            config.ready_timeout,
            config.settle_delay,
            config.poll_interval,
        );
        Ok(Self::new(driver, gate, base_url, config.page_timeout))
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Topic page URL for `topic_id`, which is used as one opaque path segment
    pub fn topic_url(&self, topic_id: &str) -> ScraperResult<Url> {
        let topic_id = topic_id.trim();
        if topic_id.is_empty() {
            return Err(ScraperError::InvalidUrl("Empty topic ID".to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ScraperError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(topic_id);
        Ok(url)
    }

    /// Load the topic page and return its decoded topic and feeds
    pub async fn get_topic_feeds(
        &self,
        topic_id: &str,
        cancel: &CancellationToken,
    ) -> ScraperResult<TopicResult> {
        let snapshot = self.capture(topic_id, cancel).await?;
        extract_topic(&snapshot)
    }

    /// Load the topic page, wait for it to hydrate and capture its state
    pub async fn capture(
        &self,
        topic_id: &str,
        cancel: &CancellationToken,
    ) -> ScraperResult<PageSnapshot> {
        let url = self.topic_url(topic_id)?;
        tracing::info!(url = %url, "Opening topic page");

        let load = async {
            self.driver.navigate(url.as_str()).await?;
            self.driver.wait_stable().await?;
            self.gate.wait(&self.driver, cancel).await?;
            PageSnapshot::capture(
                &self.driver,
                &[StatePath::topic_info(), StatePath::topic_notes()],
            )
            .await
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(ScraperError::Cancelled),
            loaded = tokio::time::timeout(self.page_timeout, load) => match loaded {
                Ok(snapshot) => snapshot,
                Err(_) => Err(ScraperError::Timeout {
                    waiting_for: format!("topic page {}", url),
                    after: self.page_timeout,
                }),
            },
        }
    }
}

/// Decode topic info and feed list out of a captured page state.
///
/// A missing topic header is a structural failure; a missing feed list is
/// reported as [`ScraperError::NoFeeds`] so callers can tolerate it.
pub fn extract_topic(snapshot: &PageSnapshot) -> ScraperResult<TopicResult> {
    let info_path = StatePath::topic_info();
    let payload = snapshot.locate(&info_path);
    if payload.is_empty() {
        let diagnosis = snapshot.diagnose(&info_path);
        tracing::warn!(%diagnosis, "Topic info lookup failed");
        return Err(ScraperError::MissingField(diagnosis));
    }

    let topic: TopicInfo = decode_record(&payload)?;
    tracing::debug!(?topic, "Decoded topic info");

    let notes_path = StatePath::topic_notes();
    let payload = snapshot.locate(&notes_path);
    if payload.is_empty() {
        let diagnosis = snapshot.diagnose(&notes_path);
        tracing::warn!(%diagnosis, "Topic feed list lookup failed");
        return Err(ScraperError::NoFeeds {
            topic: Box::new(topic),
            diagnosis,
        });
    }

    let feeds: Vec<FeedItem> = decode_list(&payload)?;
    tracing::debug!(count = feeds.len(), "Decoded topic feeds");

    Ok(TopicResult::new(topic, feeds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockPageDriver;
    use crate::state::Diagnosis;
    use serde_json::{json, Value};

    const BASE: &str = "https://www.xiaohongshu.com/topic/normal/";

    fn coffee_state() -> Value {
        json!({
            "user": {"loggedIn": false},
            "topic": {
                "topicData": {"value": {"pageInfo": {
                    "name": "Coffee",
                    "desc": "d",
                    "viewNumText": "10万",
                    "discussCommentNumText": "200"
                }}},
                "topicNotes": {"value": [{
                    "type": "normal",
                    "title": "t1",
                    "desc": "first",
                    "user": {"nickname": "barista", "avatarUrl": "https://img/a.jpg", "isForbidden": false},
                    "interactionInfo": {"likeText": "12", "collectText": "3", "commentText": "1"},
                    "createTime": 1700000000000i64,
                    "cursorScore": "c1"
                }]}
            }
        })
    }

    /// Driver whose page is ready at once and holds `state`
    fn driver_with_state(state: Value) -> MockPageDriver {
        let text = state.to_string();
        let mut driver = MockPageDriver::new();
        driver.expect_navigate().returning(|_| Ok(()));
        driver.expect_wait_stable().returning(|| Ok(()));
        driver.expect_evaluate().returning(move |script| {
            if script.contains("JSON.stringify") {
                Ok(text.clone())
            } else {
                Ok("true".to_string())
            }
        });
        driver
    }

    fn service(driver: MockPageDriver) -> TopicService<MockPageDriver> {
        let gate = ReadinessGate::new(
            Duration::from_millis(200),
            Duration::from_millis(1),
            Duration::from_millis(5),
        );
        TopicService::new(driver, gate, Url::parse(BASE).unwrap(), Duration::from_secs(5))
    }

    #[test]
    fn test_topic_url() {
        let service = service(MockPageDriver::new());
        assert_eq!(
            service.topic_url("5be00").unwrap().as_str(),
            "https://www.xiaohongshu.com/topic/normal/5be00"
        );
        assert_eq!(
            service.topic_url("a/b").unwrap().as_str(),
            "https://www.xiaohongshu.com/topic/normal/a%2Fb"
        );
        assert!(matches!(
            service.topic_url("  "),
            Err(ScraperError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_coffee() {
        let service = service(driver_with_state(coffee_state()));
        let result = service
            .get_topic_feeds("coffee", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.topic(),
            &TopicInfo {
                name: "Coffee".to_string(),
                description: "d".to_string(),
                view_count_text: "10万".to_string(),
                discussion_count_text: "200".to_string(),
            }
        );
        assert_eq!(result.count(), 1);
        assert_eq!(result.feeds()[0].title, "t1");
        assert_eq!(result.feeds()[0].user.nickname, "barista");
        assert_eq!(result.feeds()[0].interaction.like_text, "12");
        assert_eq!(result.feeds()[0].cursor_score, "c1");
    }

    #[tokio::test]
    async fn test_navigates_to_topic_url() {
        let text = coffee_state().to_string();
        let mut driver = MockPageDriver::new();
        driver
            .expect_navigate()
            .withf(|url| url.ends_with("/topic/normal/abc123"))
            .times(1)
            .returning(|_| Ok(()));
        driver.expect_wait_stable().times(1).returning(|| Ok(()));
        driver.expect_evaluate().returning(move |script| {
            if script.contains("JSON.stringify") {
                Ok(text.clone())
            } else {
                Ok("true".to_string())
            }
        });

        let result = service(driver)
            .get_topic_feeds("abc123", &CancellationToken::new())
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_value_and_underscore_value_decode_identically() {
        let page_info = json!({"name": "Coffee", "desc": "d", "viewNumText": "1", "discussCommentNumText": "2"});
        let notes = json!([]);

        let with_value = PageSnapshot::new(json!({"topic": {
            "topicData": {"value": {"pageInfo": page_info.clone()}},
            "topicNotes": {"value": notes.clone()}
        }}));
        let with_underscore = PageSnapshot::new(json!({"topic": {
            "topicData": {"_value": {"pageInfo": page_info}, "__v_isRef": true},
            "topicNotes": {"_value": notes}
        }}));

        let a = extract_topic(&with_value).unwrap();
        let b = extract_topic(&with_underscore).unwrap();
        assert_eq!(a.topic(), b.topic());
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_topic_notes_is_no_feeds() {
        let mut state = coffee_state();
        state["topic"].as_object_mut().unwrap().remove("topicNotes");

        let err = extract_topic(&PageSnapshot::new(state)).unwrap_err();
        assert!(err.is_no_feeds());
        match err.diagnosis() {
            Some(Diagnosis::MissingSegment { segment, siblings, .. }) => {
                assert_eq!(segment, "topicNotes");
                assert_eq!(siblings, &vec!["topicData".to_string()]);
            }
            other => panic!("unexpected diagnosis: {:?}", other),
        }
    }

    #[test]
    fn test_null_topic_notes_is_no_feeds_with_empty_payload() {
        let mut state = coffee_state();
        state["topic"]["topicNotes"] = json!({"_value": null});

        let err = extract_topic(&PageSnapshot::new(state)).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::NoFeeds {
                diagnosis: Diagnosis::EmptyPayload { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_no_feeds_can_be_tolerated() {
        let mut state = coffee_state();
        state["topic"].as_object_mut().unwrap().remove("topicNotes");

        let result = extract_topic(&PageSnapshot::new(state))
            .or_else(ScraperError::into_empty_result)
            .unwrap();
        assert_eq!(result.topic().name, "Coffee");
        assert_eq!(result.count(), 0);
    }

    #[test]
    fn test_empty_feed_list_is_success() {
        let mut state = coffee_state();
        state["topic"]["topicNotes"] = json!({"value": []});

        let result = extract_topic(&PageSnapshot::new(state)).unwrap();
        assert_eq!(result.count(), 0);
        assert!(result.feeds().is_empty());
    }

    #[test]
    fn test_many_feeds_keep_page_order() {
        let mut state = coffee_state();
        state["topic"]["topicNotes"] = json!({"value": [
            {"title": "c"}, {"title": "a"}, {"title": "b"}
        ]});

        let result = extract_topic(&PageSnapshot::new(state)).unwrap();
        let titles: Vec<&str> = result.feeds().iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
        assert_eq!(result.count(), 3);
    }

    #[test]
    fn test_unknown_page_info_field_is_ignored() {
        let mut state = coffee_state();
        state["topic"]["topicData"]["value"]["pageInfo"]["foo"] = json!({"nested": [1, 2]});

        let result = extract_topic(&PageSnapshot::new(state)).unwrap();
        assert_eq!(result.topic().name, "Coffee");
    }

    #[test]
    fn test_missing_topic_data_is_missing_field() {
        let state = json!({"topic": {"topicNotes": {"value": []}, "pageStatus": 1}});

        let err = extract_topic(&PageSnapshot::new(state)).unwrap_err();
        match err {
            ScraperError::MissingField(diagnosis) => {
                assert_eq!(
                    diagnosis.to_string(),
                    "window.__INITIAL_STATE__.topic.topicData does not exist, \
                     window.__INITIAL_STATE__.topic keys: pageStatus, topicNotes"
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_null_page_info_is_missing_field() {
        let mut state = coffee_state();
        state["topic"]["topicData"]["value"]["pageInfo"] = Value::Null;

        let err = extract_topic(&PageSnapshot::new(state)).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::MissingField(Diagnosis::EmptyPayload { .. })
        ));
    }

    #[test]
    fn test_empty_object_page_info_is_zero_valued() {
        let mut state = coffee_state();
        state["topic"]["topicData"]["value"]["pageInfo"] = json!({});

        let result = extract_topic(&PageSnapshot::new(state)).unwrap();
        assert_eq!(result.topic(), &TopicInfo::default());
        assert_eq!(result.count(), 1);
    }

    #[test]
    fn test_page_without_state() {
        let err = extract_topic(&PageSnapshot::from_json("").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::MissingField(Diagnosis::RootMissing)
        ));
    }

    #[test]
    fn test_feed_list_of_wrong_shape_is_decode_error() {
        let mut state = coffee_state();
        state["topic"]["topicNotes"] = json!({"value": {"items": []}});

        let err = extract_topic(&PageSnapshot::new(state)).unwrap_err();
        match err {
            ScraperError::Decode { shape, excerpt, .. } => {
                assert_eq!(shape, "list of FeedItem");
                assert_eq!(excerpt, r#"{"items":[]}"#);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_page_info_of_wrong_shape_is_decode_error() {
        let mut state = coffee_state();
        state["topic"]["topicData"]["value"]["pageInfo"] = json!("Coffee");

        let err = extract_topic(&PageSnapshot::new(state)).unwrap_err();
        assert!(matches!(err, ScraperError::Decode { ref shape, .. } if shape == "TopicInfo"));
    }

    #[tokio::test]
    async fn test_never_ready_times_out() {
        let mut driver = MockPageDriver::new();
        driver.expect_navigate().returning(|_| Ok(()));
        driver.expect_wait_stable().returning(|| Ok(()));
        driver
            .expect_evaluate()
            .returning(|_| Ok("false".to_string()));

        let err = service(driver)
            .get_topic_feeds("coffee", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_getter_only_container_is_unwrapped() {
        // What the page walker returns for a toRef-style `topicData` whose
        // payload is only reachable through its `value` getter.
        let captured = json!({
            "topic": {
                "topicData": {
                    "_object": null,
                    "_key": null,
                    "__v_isRef": null,
                    "value": {"pageInfo": {"name": "Coffee", "desc": "d"}}
                },
                "topicNotes": {
                    "_value": null,
                    "__v_isRef": null,
                    "value": [{"title": "t1"}]
                }
            }
        });
        let service = service(driver_with_state(captured));

        let result = service
            .get_topic_feeds("coffee", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.topic().name, "Coffee");
        assert_eq!(result.topic().description, "d");
        assert_eq!(result.count(), 1);
        assert_eq!(result.feeds()[0].title, "t1");
    }

    #[tokio::test]
    async fn test_page_deadline_bounds_whole_load() {
        let mut driver = MockPageDriver::new();
        driver.expect_navigate().returning(|_| Ok(()));
        driver.expect_wait_stable().returning(|| Ok(()));
        driver
            .expect_evaluate()
            .returning(|_| Ok("false".to_string()));

        // Readiness alone would wait 30s; the page deadline cuts it short
        let gate = ReadinessGate::new(
            Duration::from_secs(30),
            Duration::from_millis(1),
            Duration::from_millis(5),
        );
        let service = TopicService::new(
            driver,
            gate,
            Url::parse("https://x/topic/").unwrap(),
            Duration::from_millis(150),
        );

        let started = std::time::Instant::now();
        let err = service
            .get_topic_feeds("a", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            ScraperError::Timeout { waiting_for, after } => {
                assert_eq!(waiting_for, "topic page https://x/topic/a");
                assert_eq!(after, Duration::from_millis(150));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_navigation_failure_propagates() {
        let mut driver = MockPageDriver::new();
        driver
            .expect_navigate()
            .returning(|_| Err(ScraperError::Browser("net::ERR_NAME_NOT_RESOLVED".to_string())));
        driver.expect_wait_stable().never();
        driver.expect_evaluate().never();

        let err = service(driver)
            .get_topic_feeds("coffee", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::Browser(ref m) if m.contains("ERR_NAME")));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mut driver = MockPageDriver::new();
        driver.expect_navigate().returning(|_| Ok(()));
        driver.expect_wait_stable().returning(|| Ok(()));
        driver
            .expect_evaluate()
            .returning(|_| Ok("false".to_string()));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service(driver)
            .get_topic_feeds("coffee", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::Cancelled));
    }

    #[test]
    fn test_from_config_rejects_bad_base_url() {
        let config = Config {
            topic_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            TopicService::from_config(MockPageDriver::new(), &config),
            Err(ScraperError::InvalidUrl(_))
        ));
    }
}
