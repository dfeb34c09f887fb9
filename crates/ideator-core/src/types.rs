use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An AI-proposed video idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_description: Option<String>,
    pub style: String,
    pub target_audience: String,
    /// 0-100
    pub estimated_virality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeSeo {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiktokSeo {
    pub title: String,
    pub caption: String,
    pub hashtags: Vec<String>,
}

/// Platform-specific SEO bundles for one video-length format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoContent {
    pub youtube: YoutubeSeo,
    pub tiktok: TiktokSeo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoData {
    pub short: SeoContent,
    pub long: SeoContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedTopic {
    pub keyword: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub audience_reaction: String,
    pub frequent_keywords: Vec<String>,
    pub recommended_topics: Vec<RecommendedTopic>,
    pub seo_data: SeoData,
}

impl AnalysisResult {
    /// Swap in regenerated SEO strategy, keeping every other field as-is.
    pub fn with_seo(mut self, seo: SeoData) -> Self {
        self.seo_data = seo;
        self
    }

    /// Swap in regenerated topic recommendations, keeping every other field as-is.
    pub fn with_topics(mut self, topics: Vec<RecommendedTopic>) -> Self {
        self.recommended_topics = topics;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSection {
    pub label: String,
    pub content: String,
}

/// A script table of contents: input to the production pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptOutline {
    pub title: String,
    pub sections: Vec<OutlineSection>,
}

/// One subtitle cue. Timestamps use the SRT form `HH:MM:SS,mmm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    pub index: u32,
    pub start: String,
    pub end: String,
    pub text: String,
}

/// The expanded production artifact: narration script, ordered image prompts,
/// and subtitle cues covering the narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPlan {
    pub full_script: String,
    pub image_prompts: Vec<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Audio,
    Video,
}

/// An artifact accumulated during a production run.
#[derive(Debug, Clone)]
pub struct GeneratedAsset {
    pub kind: AssetKind,
    pub bytes: Vec<u8>,
    /// Originating prompt, for image and video assets.
    pub prompt: Option<String>,
}

/// views / subscribers * 100. Zero-subscriber channels score 0 instead of
/// dividing by zero.
pub fn efficiency_ratio(view_count: u64, subscriber_count: u64) -> f64 {
    if subscriber_count > 0 {
        view_count as f64 / subscriber_count as f64 * 100.0
    } else {
        0.0
    }
}

/// Metadata for a video discovered through platform search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredVideo {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub published_at: DateTime<Utc>,
    pub channel_title: String,
    pub channel_id: String,
    pub view_count: u64,
    pub subscriber_count: u64,
    pub efficiency_ratio: f64,
}

/// A persisted project snapshot (favorited search result plus whatever was
/// derived from it so far).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteProject {
    pub id: String,
    pub video: DiscoveredVideo,
    pub result: Option<AnalysisResult>,
    pub outline: Option<ScriptOutline>,
    /// Unix millis.
    pub saved_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub author: String,
    pub like_count: u64,
}

/// Stages of a production run. Error paths return to `Idle` (plan failure) or
/// `ReviewImages` (clip failure) without discarding accumulated assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionStage {
    Idle,
    Scripting,
    Imaging,
    ReviewImages,
    Videoing,
    Completed,
}

/// Output language for generated text and narration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Korean,
    English,
    Japanese,
    Spanish,
    Chinese,
}

impl Language {
    pub fn label(&self) -> &'static str {
        match self {
            Language::Korean => "Korean",
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Spanish => "Spanish",
            Language::Chinese => "Chinese",
        }
    }

    /// Deterministic language -> prebuilt TTS voice mapping.
    pub fn voice_name(&self) -> &'static str {
        match self {
            Language::Korean => "Kore",
            Language::English => "Puck",
            Language::Japanese => "Leda",
            Language::Spanish => "Aoede",
            Language::Chinese => "Charon",
        }
    }
}

/// Target video-length format, with its production tuning parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoFormat {
    #[default]
    Short,
    Long,
}

impl VideoFormat {
    pub fn label(&self) -> &'static str {
        match self {
            VideoFormat::Short => "short-form",
            VideoFormat::Long => "long-form",
        }
    }

    /// Allowed storyboard image counts for a production plan.
    pub fn image_count_range(&self) -> RangeInclusive<usize> {
        match self {
            VideoFormat::Short => 6..=16,
            VideoFormat::Long => 30..=70,
        }
    }

    pub fn default_image_count(&self) -> usize {
        match self {
            VideoFormat::Short => 8,
            VideoFormat::Long => 40,
        }
    }

    /// How many storyboard images get a motion clip.
    pub fn clip_count(&self) -> usize {
        match self {
            VideoFormat::Short => 7,
            VideoFormat::Long => 18,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9
    #[default]
    Wide,
    /// 9:16
    Tall,
}

impl AspectRatio {
    pub fn api_str(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
        }
    }

    /// Drawing surface size at the fixed base width.
    pub fn canvas_size(&self) -> (u32, u32) {
        match self {
            AspectRatio::Wide => (1280, 720),
            AspectRatio::Tall => (720, 1280),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_ratio_basic() {
        assert_eq!(efficiency_ratio(200, 100), 200.0);
        assert_eq!(efficiency_ratio(50, 1000), 5.0);
    }

    #[test]
    fn efficiency_ratio_zero_subscribers() {
        assert_eq!(efficiency_ratio(1_000_000, 0), 0.0);
        assert_eq!(efficiency_ratio(0, 0), 0.0);
    }

    #[test]
    fn efficiency_ratio_never_negative_or_nan() {
        for (views, subs) in [(0, 0), (0, 7), (u64::MAX, 1), (1, u64::MAX)] {
            let r = efficiency_ratio(views, subs);
            assert!(r >= 0.0);
            assert!(!r.is_nan());
        }
    }

    fn sample_analysis() -> AnalysisResult {
        let seo = SeoContent {
            youtube: YoutubeSeo {
                title: "t".into(),
                description: "d".into(),
                tags: vec!["a".into()],
            },
            tiktok: TiktokSeo {
                title: "t".into(),
                caption: "c".into(),
                hashtags: vec!["#a".into()],
            },
        };
        AnalysisResult {
            audience_reaction: "positive".into(),
            frequent_keywords: vec!["cats".into(), "drama".into()],
            recommended_topics: vec![RecommendedTopic {
                keyword: "cat drama".into(),
                reason: "high engagement".into(),
            }],
            seo_data: SeoData {
                short: seo.clone(),
                long: seo,
            },
        }
    }

    #[test]
    fn with_seo_leaves_other_fields_untouched() {
        let original = sample_analysis();
        let mut seo = original.seo_data.clone();
        seo.short.youtube.title = "regenerated".into();

        let refreshed = original.clone().with_seo(seo);
        assert_eq!(refreshed.seo_data.short.youtube.title, "regenerated");
        assert_eq!(refreshed.frequent_keywords, original.frequent_keywords);
        assert_eq!(
            refreshed.recommended_topics.len(),
            original.recommended_topics.len()
        );
        assert_eq!(refreshed.audience_reaction, original.audience_reaction);
    }

    #[test]
    fn format_ranges() {
        assert!(VideoFormat::Short.image_count_range().contains(&8));
        assert!(!VideoFormat::Short.image_count_range().contains(&17));
        assert!(VideoFormat::Long.image_count_range().contains(&40));
        assert!(!VideoFormat::Long.image_count_range().contains(&29));
    }
}
