use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use crate::{
    error::{IdeatorError, Result},
    format::parse_srt_timestamp,
    pipeline::CancelToken,
    types::{
        AnalysisResult, AspectRatio, Comment, Concept, DiscoveredVideo, Language, ProductionPlan,
        RecommendedTopic, ScriptOutline, SeoData, VideoFormat,
    },
};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEXT_MODEL: &str = "gemini-3-flash-preview";
const PLAN_MODEL: &str = "gemini-3-pro-preview";
const IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

const CONCEPT_COUNT: usize = 4;
const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(8);

/// Client for the Gemini generative backend. Every structured call sends an
/// explicit response schema and parses the JSON the model returns; callers
/// never see prose.
pub struct GenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GenAiClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IdeatorError::MissingApiKey {
                service: "Gemini".to_string(),
            })?;
        Ok(Self {
            api_key,
            base_url: BASE_URL.to_string(),
            http: reqwest::Client::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn model_url(&self, model: &str, verb: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, verb, self.api_key
        )
    }

    async fn post_generate(&self, model: &str, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(self.model_url(model, "generateContent"))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(IdeatorError::Upstream {
                service: "Gemini".to_string(),
                reason: format!("http {}: {}", status, truncate(&text, 300)),
            });
        }
        let value: Value = serde_json::from_str(&text)?;
        if let Some(err) = value.get("error") {
            return Err(IdeatorError::Upstream {
                service: "Gemini".to_string(),
                reason: err["message"].as_str().unwrap_or("unknown error").to_string(),
            });
        }
        Ok(value)
    }

    /// Send a prompt with a strict output schema and parse the structured reply.
    async fn generate_structured(&self, model: &str, prompt: &str, schema: Value) -> Result<Value> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });
        let response = self.post_generate(model, body).await?;
        let text = extract_text(&response).ok_or_else(|| IdeatorError::Upstream {
            service: "Gemini".to_string(),
            reason: "structured response contained no text part".to_string(),
        })?;
        Ok(serde_json::from_str(strip_code_fences(&text))?)
    }

    /// Propose exactly four video concepts for a free-text topic.
    pub async fn generate_concepts(&self, topic: &str, language: Language) -> Result<Vec<Concept>> {
        let prompt = format!(
            "You are a professional video content strategist. Propose exactly {count} distinct \
             video concepts for the topic \"{topic}\". Write title and description in {lang}. \
             When {lang} is not English, also fill translatedTitle and translatedDescription \
             with English translations. For each concept pick a visual style tag, a target \
             audience tag, and an estimatedVirality score from 0 to 100.",
            count = CONCEPT_COUNT,
            topic = topic,
            lang = language.label(),
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "translatedTitle": { "type": "STRING" },
                    "translatedDescription": { "type": "STRING" },
                    "style": { "type": "STRING" },
                    "targetAudience": { "type": "STRING" },
                    "estimatedVirality": { "type": "INTEGER" }
                },
                "required": ["title", "description", "style", "targetAudience", "estimatedVirality"]
            }
        });
        let value = self.generate_structured(TEXT_MODEL, &prompt, schema).await?;
        let mut concepts: Vec<Concept> = serde_json::from_value(value)?;
        if concepts.is_empty() {
            return Err(IdeatorError::Upstream {
                service: "Gemini".to_string(),
                reason: "backend returned no concepts".to_string(),
            });
        }
        concepts.truncate(CONCEPT_COUNT);
        Ok(concepts)
    }

    /// Analyze a generated concept into audience insight plus SEO strategy.
    pub async fn analyze_concept(
        &self,
        concept: &Concept,
        language: Language,
    ) -> Result<AnalysisResult> {
        let prompt = format!(
            "You are a professional content growth strategist. Analyze this video concept and \
             predict how audiences will respond.\n\nTitle: {}\nDescription: {}\nTarget \
             audience: {}\n\n{}",
            concept.title,
            concept.description,
            concept.target_audience,
            analysis_instructions(language),
        );
        let value = self
            .generate_structured(TEXT_MODEL, &prompt, analysis_schema())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Analyze a discovered video from its top comments. Requires at least one
    /// comment; "no comments" is an explicit error the caller can message.
    pub async fn analyze_video(
        &self,
        video: &DiscoveredVideo,
        comments: &[Comment],
        language: Language,
    ) -> Result<AnalysisResult> {
        if comments.is_empty() {
            return Err(IdeatorError::EmptyInput {
                reason: format!("video {} has no comments to analyze", video.id),
            });
        }
        let comment_text = comments
            .iter()
            .map(|c| format!("- {}", c.text))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "You are a professional YouTube growth strategist. Analyze the comments for the \
             video \"{}\" to find new content ideas.\n\nComments:\n{}\n\n{}",
            video.title,
            comment_text,
            analysis_instructions(language),
        );
        let value = self
            .generate_structured(TEXT_MODEL, &prompt, analysis_schema())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Regenerate only the SEO strategy, e.g. after a language switch.
    pub async fn refresh_seo(&self, title: &str, language: Language) -> Result<SeoData> {
        let prompt = format!(
            "Create SEO content in {lang} for a video project titled \"{title}\". Provide both \
             a short-form and a long-form variant, each with a YouTube bundle (title, \
             description, tags) and a TikTok bundle (title, caption, hashtags).",
            lang = language.label(),
            title = title,
        );
        let value = self
            .generate_structured(TEXT_MODEL, &prompt, seo_schema())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Regenerate only the recommended sub-topics.
    pub async fn refresh_topics(
        &self,
        title: &str,
        language: Language,
    ) -> Result<Vec<RecommendedTopic>> {
        let prompt = format!(
            "Suggest 5 specific keywords or short phrases for new videos related to \
             \"{title}\", each with a short reason. Respond in {lang}.",
            title = title,
            lang = language.label(),
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "keyword": { "type": "STRING" },
                    "reason": { "type": "STRING" }
                },
                "required": ["keyword", "reason"]
            }
        });
        let value = self.generate_structured(TEXT_MODEL, &prompt, schema).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create a script outline (table of contents) for a keyword.
    pub async fn generate_outline(
        &self,
        keyword: &str,
        context: Option<&str>,
        language: Language,
    ) -> Result<ScriptOutline> {
        let context_line = context
            .map(|c| format!(" The idea came from: \"{}\".", c))
            .unwrap_or_default();
        let prompt = format!(
            "Based on the trending keyword \"{keyword}\", create a video script outline \
             (table of contents) with labeled sections.{context_line} Respond in {lang}.",
            keyword = keyword,
            context_line = context_line,
            lang = language.label(),
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "sections": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "label": { "type": "STRING" },
                            "content": { "type": "STRING" }
                        },
                        "required": ["label", "content"]
                    }
                }
            },
            "required": ["title", "sections"]
        });
        let value = self.generate_structured(TEXT_MODEL, &prompt, schema).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Expand an outline into a full narration script, exactly `image_count`
    /// storyboard prompts, and subtitle cues covering the narration.
    pub async fn generate_production_plan(
        &self,
        outline: &ScriptOutline,
        format: VideoFormat,
        style: &str,
        image_count: usize,
        language: Language,
    ) -> Result<ProductionPlan> {
        let range = format.image_count_range();
        if !range.contains(&image_count) {
            return Err(IdeatorError::InvalidImageCount {
                requested: image_count,
                min: *range.start(),
                max: *range.end(),
            });
        }

        let sections = outline
            .sections
            .iter()
            .map(|s| format!("- {}: {}", s.label, s.content))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Video title: {title}\nOutline:\n{sections}\n\nWrite the complete spoken \
             narration script for this {format} video in {lang}. Then write exactly \
             {image_count} English image generation prompts visualizing the script in \
             order, all in a \"{style}\" visual style. Finally produce SRT subtitle cues \
             (index, start, end as HH:MM:SS,mmm, text) that cover the whole narration \
             from start to finish in ascending order.",
            title = outline.title,
            sections = sections,
            format = format.label(),
            lang = language.label(),
            image_count = image_count,
            style = style,
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "fullScript": { "type": "STRING" },
                "imagePrompts": { "type": "ARRAY", "items": { "type": "STRING" } },
                "subtitles": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "index": { "type": "INTEGER" },
                            "start": { "type": "STRING" },
                            "end": { "type": "STRING" },
                            "text": { "type": "STRING" }
                        },
                        "required": ["index", "start", "end", "text"]
                    }
                }
            },
            "required": ["fullScript", "imagePrompts", "subtitles"]
        });
        let value = self.generate_structured(PLAN_MODEL, &prompt, schema).await?;
        let mut plan: ProductionPlan = serde_json::from_value(value)?;

        if plan.image_prompts.len() != image_count {
            return Err(IdeatorError::Upstream {
                service: "Gemini".to_string(),
                reason: format!(
                    "expected {} image prompts, got {}",
                    image_count,
                    plan.image_prompts.len()
                ),
            });
        }
        // Downstream timing assumes cues sorted by start time.
        plan.subtitles.sort_by(|a, b| {
            let a = parse_srt_timestamp(&a.start).unwrap_or(f64::MAX);
            let b = parse_srt_timestamp(&b.start).unwrap_or(f64::MAX);
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(plan)
    }

    /// Generate one storyboard image as PNG bytes.
    pub async fn generate_image(&self, prompt: &str, aspect: AspectRatio) -> Result<Vec<u8>> {
        let full_prompt = format!(
            "{prompt}. No embedded text, no typography, no captions or lettering of any kind."
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": full_prompt }] }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": aspect.api_str(), "imageSize": "1K" }
            }
        });
        let response = self.post_generate(IMAGE_MODEL, body).await?;
        let data = find_inline_data(&response).ok_or_else(|| IdeatorError::MissingPayload {
            what: "image data".to_string(),
        })?;
        decode_base64(data)
    }

    /// Synthesize narration as raw 24 kHz mono s16le PCM.
    pub async fn generate_speech(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": format!("Read the following script aloud as a narrator: {text}") }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": language.voice_name() }
                    }
                }
            }
        });
        let response = self.post_generate(TTS_MODEL, body).await?;
        let data = find_inline_data(&response).ok_or_else(|| IdeatorError::MissingPayload {
            what: "audio data".to_string(),
        })?;
        decode_base64(data)
    }

    /// Generate a short motion clip. Long-running: starts an operation and polls
    /// it until done, honouring `cancel` between polls, then fetches the result
    /// binary with the API key appended as a query parameter.
    pub async fn generate_video_clip(
        &self,
        prompt: &str,
        start_image_png: Option<&[u8]>,
        aspect: AspectRatio,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        let mut instance = json!({
            "prompt": format!("Cinematic high quality 4k trailer: {prompt}")
        });
        if let Some(png) = start_image_png {
            instance["image"] = json!({
                "bytesBase64Encoded": BASE64.encode(png),
                "mimeType": "image/png"
            });
        }
        let body = json!({
            "instances": [instance],
            "parameters": {
                "aspectRatio": aspect.api_str(),
                "resolution": "720p",
                "sampleCount": 1
            }
        });

        let response = self
            .http
            .post(self.model_url(VIDEO_MODEL, "predictLongRunning"))
            .json(&body)
            .send()
            .await?;
        let started: Value = response.json().await?;
        if let Some(err) = started.get("error") {
            return Err(IdeatorError::Upstream {
                service: "Gemini".to_string(),
                reason: err["message"].as_str().unwrap_or("unknown error").to_string(),
            });
        }
        let op_name = started["name"]
            .as_str()
            .ok_or_else(|| IdeatorError::Upstream {
                service: "Gemini".to_string(),
                reason: "video operation has no name".to_string(),
            })?
            .to_string();

        let operation = loop {
            if cancel.is_cancelled() {
                return Err(IdeatorError::Cancelled);
            }
            tokio::time::sleep(VIDEO_POLL_INTERVAL).await;
            if cancel.is_cancelled() {
                return Err(IdeatorError::Cancelled);
            }

            let url = format!("{}/{}?key={}", self.base_url, op_name, self.api_key);
            let polled: Value = self.http.get(url).send().await?.json().await?;
            if let Some(err) = polled.get("error") {
                return Err(IdeatorError::Upstream {
                    service: "Gemini".to_string(),
                    reason: err["message"].as_str().unwrap_or("unknown error").to_string(),
                });
            }
            if polled["done"].as_bool() == Some(true) {
                break polled;
            }
        };

        let uri = video_result_uri(&operation).ok_or_else(|| IdeatorError::MissingPayload {
            what: "video download link".to_string(),
        })?;
        // The result URI already carries query parameters.
        let bytes = self
            .http
            .get(format!("{}&key={}", uri, self.api_key))
            .send()
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

fn analysis_instructions(language: Language) -> String {
    format!(
        "Output the following in {lang}:\n\
         1. audienceReaction: a concise summary of how people respond.\n\
         2. frequentKeywords: the top 5 most relevant keywords.\n\
         3. recommendedTopics: 5 specific keywords/short-phrases for new videos based on \
            audience interest or gaps in current content, with a short reason each.\n\
         4. seoData: SEO content for a short-form and a long-form video, each with a \
            YouTube bundle (title, description, tags) and a TikTok bundle (title, \
            caption, hashtags).",
        lang = language.label()
    )
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "audienceReaction": { "type": "STRING" },
            "frequentKeywords": { "type": "ARRAY", "items": { "type": "STRING" } },
            "recommendedTopics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "keyword": { "type": "STRING" },
                        "reason": { "type": "STRING" }
                    },
                    "required": ["keyword", "reason"]
                }
            },
            "seoData": seo_schema()
        },
        "required": ["audienceReaction", "frequentKeywords", "recommendedTopics", "seoData"]
    })
}

fn seo_schema() -> Value {
    let content = json!({
        "type": "OBJECT",
        "properties": {
            "youtube": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "tags": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["title", "description", "tags"]
            },
            "tiktok": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "caption": { "type": "STRING" },
                    "hashtags": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["title", "caption", "hashtags"]
            }
        },
        "required": ["youtube", "tiktok"]
    });
    json!({
        "type": "OBJECT",
        "properties": { "short": content, "long": content },
        "required": ["short", "long"]
    })
}

/// Concatenate every text part of the first candidate.
fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let mut out = String::new();
    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            out.push_str(text);
        }
    }
    if out.trim().is_empty() { None } else { Some(out) }
}

/// First inlineData payload of the first candidate (image/audio responses).
fn find_inline_data(response: &Value) -> Option<&str> {
    let parts = response
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    parts
        .iter()
        .find_map(|part| part.get("inlineData")?.get("data")?.as_str())
}

fn video_result_uri(operation: &Value) -> Option<&str> {
    let response = operation.get("response")?;
    response
        .pointer("/generateVideoResponse/generatedSamples/0/video/uri")
        .or_else(|| response.pointer("/generatedVideos/0/video/uri"))?
        .as_str()
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    BASE64.decode(data).map_err(|e| IdeatorError::Upstream {
        service: "Gemini".to_string(),
        reason: format!("invalid base64 payload: {e}"),
    })
}

/// Models occasionally wrap JSON in markdown fences despite the mime type.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_config_error() {
        assert!(matches!(
            GenAiClient::new(None),
            Err(IdeatorError::MissingApiKey { .. })
        ));
        assert!(matches!(
            GenAiClient::new(Some("  ".into())),
            Err(IdeatorError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1,2]\n```"), "[1,2]");
    }

    #[test]
    fn extracts_concatenated_text_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "{\"a\":" },
                { "text": "1}" }
            ]}}]
        });
        assert_eq!(extract_text(&response).unwrap(), "{\"a\":1}");
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn finds_inline_payload_after_text_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here is your image" },
                { "inlineData": { "mimeType": "image/png", "data": "aGk=" } }
            ]}}]
        });
        assert_eq!(find_inline_data(&response), Some("aGk="));
        assert_eq!(decode_base64("aGk=").unwrap(), b"hi");
    }

    #[test]
    fn video_uri_from_either_response_shape() {
        let a = json!({ "response": { "generateVideoResponse": {
            "generatedSamples": [{ "video": { "uri": "https://x/v?alt=media" } }]
        }}});
        let b = json!({ "response": {
            "generatedVideos": [{ "video": { "uri": "https://y/v?alt=media" } }]
        }});
        assert_eq!(video_result_uri(&a), Some("https://x/v?alt=media"));
        assert_eq!(video_result_uri(&b), Some("https://y/v?alt=media"));
        assert_eq!(video_result_uri(&json!({ "done": true })), None);
    }

    #[tokio::test]
    async fn plan_rejects_out_of_range_image_counts() {
        let client = GenAiClient::with_base_url("k", "http://127.0.0.1:0");
        let outline = ScriptOutline {
            title: "t".into(),
            sections: vec![],
        };
        let err = client
            .generate_production_plan(&outline, VideoFormat::Short, "cinematic", 20, Language::Korean)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IdeatorError::InvalidImageCount { requested: 20, min: 6, max: 16 }
        ));
    }
}
