use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    error::{IdeatorError, Result},
    types::{Comment, DiscoveredVideo, efficiency_ratio},
};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const SEARCH_PAGE_SIZE: &str = "15";
const COMMENT_PAGE_SIZE: &str = "50";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DurationFilter {
    #[default]
    Any,
    /// < 4 minutes
    Short,
    /// > 20 minutes
    Long,
}

impl DurationFilter {
    fn api_param(&self) -> Option<&'static str> {
        match self {
            DurationFilter::Any => None,
            DurationFilter::Short => Some("short"),
            DurationFilter::Long => Some("long"),
        }
    }
}

/// Client for the YouTube Data API v3.
pub struct YouTubeClient {
    api_key: String,
    http: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IdeatorError::MissingApiKey {
                service: "YouTube".to_string(),
            })?;
        Ok(Self {
            api_key,
            http: reqwest::Client::new(),
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let value: Value = self
            .http
            .get(format!("{}/{}", API_BASE, endpoint))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = value.get("error") {
            let code = err["code"].as_i64().unwrap_or(0);
            if code == 400 || code == 401 {
                return Err(IdeatorError::AuthRejected {
                    service: "YouTube".to_string(),
                });
            }
            return Err(IdeatorError::Upstream {
                service: "YouTube".to_string(),
                reason: err["message"].as_str().unwrap_or("unknown error").to_string(),
            });
        }
        Ok(value)
    }

    /// Search for videos by keyword, then join per-video view counts and
    /// per-channel subscriber counts onto the results.
    pub async fn search(
        &self,
        query: &str,
        duration: DurationFilter,
    ) -> Result<Vec<DiscoveredVideo>> {
        let mut params = vec![
            ("part", "snippet"),
            ("maxResults", SEARCH_PAGE_SIZE),
            ("q", query),
            ("type", "video"),
        ];
        if let Some(d) = duration.api_param() {
            params.push(("videoDuration", d));
        }
        let search = self.get_json("search", &params).await?;

        let empty = Vec::new();
        let items = search["items"].as_array().unwrap_or(&empty);
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids: Vec<&str> = items
            .iter()
            .filter_map(|item| item["id"]["videoId"].as_str())
            .collect();
        let mut channel_ids: Vec<&str> = items
            .iter()
            .filter_map(|item| item["snippet"]["channelId"].as_str())
            .collect();
        channel_ids.sort_unstable();
        channel_ids.dedup();

        let view_counts = self.video_view_counts(&video_ids.join(",")).await?;
        let subscriber_counts = self.channel_subscriber_counts(&channel_ids.join(",")).await?;

        Ok(items
            .iter()
            .filter_map(|item| {
                build_video(item["id"]["videoId"].as_str()?, &item["snippet"], &view_counts, &subscriber_counts)
            })
            .collect())
    }

    /// Fetch a single video by id with the same statistics join as `search`.
    pub async fn fetch_video(&self, video_id: &str) -> Result<DiscoveredVideo> {
        let videos = self
            .get_json("videos", &[("part", "snippet,statistics"), ("id", video_id)])
            .await?;
        let item = videos["items"]
            .as_array()
            .and_then(|items| items.first())
            .ok_or_else(|| IdeatorError::Upstream {
                service: "YouTube".to_string(),
                reason: format!("video {} not found", video_id),
            })?;

        let snippet = &item["snippet"];
        let channel_id = snippet["channelId"].as_str().unwrap_or_default().to_string();
        let subscriber_counts = self.channel_subscriber_counts(&channel_id).await?;

        let mut view_counts = HashMap::new();
        view_counts.insert(
            video_id.to_string(),
            parse_count(&item["statistics"]["viewCount"]),
        );

        build_video(video_id, snippet, &view_counts, &subscriber_counts).ok_or_else(|| {
            IdeatorError::Upstream {
                service: "YouTube".to_string(),
                reason: format!("video {} has no usable snippet", video_id),
            }
        })
    }

    /// Top comments ordered by relevance. Best-effort: any backend error is
    /// reported as an empty list so downstream analysis can detect "no
    /// comments" explicitly.
    pub async fn fetch_comments(&self, video_id: &str) -> Vec<Comment> {
        self.try_fetch_comments(video_id).await.unwrap_or_default()
    }

    async fn try_fetch_comments(&self, video_id: &str) -> Result<Vec<Comment>> {
        let value = self
            .get_json(
                "commentThreads",
                &[
                    ("part", "snippet"),
                    ("videoId", video_id),
                    ("maxResults", COMMENT_PAGE_SIZE),
                    ("order", "relevance"),
                ],
            )
            .await?;

        let empty = Vec::new();
        Ok(value["items"]
            .as_array()
            .unwrap_or(&empty)
            .iter()
            .filter_map(|item| {
                let snippet = item.pointer("/snippet/topLevelComment/snippet")?;
                Some(Comment {
                    text: snippet["textDisplay"].as_str()?.to_string(),
                    author: snippet["authorDisplayName"].as_str().unwrap_or_default().to_string(),
                    like_count: snippet["likeCount"].as_u64().unwrap_or(0),
                })
            })
            .collect())
    }

    async fn video_view_counts(&self, ids: &str) -> Result<HashMap<String, u64>> {
        let value = self
            .get_json("videos", &[("part", "statistics"), ("id", ids)])
            .await?;
        let empty = Vec::new();
        Ok(value["items"]
            .as_array()
            .unwrap_or(&empty)
            .iter()
            .filter_map(|item| {
                Some((
                    item["id"].as_str()?.to_string(),
                    parse_count(&item["statistics"]["viewCount"]),
                ))
            })
            .collect())
    }

    async fn channel_subscriber_counts(&self, ids: &str) -> Result<HashMap<String, u64>> {
        let value = self
            .get_json("channels", &[("part", "statistics"), ("id", ids)])
            .await?;
        let empty = Vec::new();
        Ok(value["items"]
            .as_array()
            .unwrap_or(&empty)
            .iter()
            .filter_map(|item| {
                Some((
                    item["id"].as_str()?.to_string(),
                    parse_count(&item["statistics"]["subscriberCount"]),
                ))
            })
            .collect())
    }
}

fn build_video(
    video_id: &str,
    snippet: &Value,
    view_counts: &HashMap<String, u64>,
    subscriber_counts: &HashMap<String, u64>,
) -> Option<DiscoveredVideo> {
    let channel_id = snippet["channelId"].as_str().unwrap_or_default().to_string();
    let view_count = view_counts.get(video_id).copied().unwrap_or(0);
    let subscriber_count = subscriber_counts.get(&channel_id).copied().unwrap_or(0);

    Some(DiscoveredVideo {
        id: video_id.to_string(),
        title: snippet["title"].as_str()?.to_string(),
        thumbnail: snippet
            .pointer("/thumbnails/high/url")
            .and_then(|u| u.as_str())
            .unwrap_or_default()
            .to_string(),
        published_at: parse_published_at(&snippet["publishedAt"]),
        channel_title: snippet["channelTitle"].as_str().unwrap_or_default().to_string(),
        channel_id,
        view_count,
        subscriber_count,
        efficiency_ratio: efficiency_ratio(view_count, subscriber_count),
    })
}

// The API reports counts as decimal strings.
fn parse_count(value: &Value) -> u64 {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| value.as_u64())
        .unwrap_or(0)
}

fn parse_published_at(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn counts_parse_from_strings_and_numbers() {
        assert_eq!(parse_count(&json!("12345")), 12345);
        assert_eq!(parse_count(&json!(7)), 7);
        assert_eq!(parse_count(&json!(null)), 0);
        assert_eq!(parse_count(&json!("not a number")), 0);
    }

    #[test]
    fn join_handles_zero_subscriber_channels() {
        let snippet = json!({
            "title": "Video",
            "channelId": "c1",
            "channelTitle": "Channel",
            "publishedAt": "2024-03-01T12:00:00Z",
            "thumbnails": { "high": { "url": "https://example.invalid/t.jpg" } }
        });
        let mut views = HashMap::new();
        views.insert("v1".to_string(), 5000);
        let subs = HashMap::new(); // channel missing from the stats response

        let video = build_video("v1", &snippet, &views, &subs).unwrap();
        assert_eq!(video.view_count, 5000);
        assert_eq!(video.subscriber_count, 0);
        assert_eq!(video.efficiency_ratio, 0.0);
    }

    #[test]
    fn join_computes_efficiency_ratio() {
        let snippet = json!({
            "title": "Video",
            "channelId": "c1",
            "channelTitle": "Channel",
            "publishedAt": "2024-03-01T12:00:00Z",
            "thumbnails": { "high": { "url": "" } }
        });
        let mut views = HashMap::new();
        views.insert("v1".to_string(), 300);
        let mut subs = HashMap::new();
        subs.insert("c1".to_string(), 100);

        let video = build_video("v1", &snippet, &views, &subs).unwrap();
        assert_eq!(video.efficiency_ratio, 300.0);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        assert!(matches!(
            YouTubeClient::new(None),
            Err(IdeatorError::MissingApiKey { .. })
        ));
    }
}
