//! Ideator Core Library
//!
//! Core functionality for AI-assisted content ideation: trend discovery via the
//! YouTube Data API, concept/script/asset generation via the Gemini API, a staged
//! production pipeline, local video assembly, and bundled export.

pub mod assemble;
pub mod cache;
pub mod error;
pub mod format;
pub mod genai;
pub mod package;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use assemble::{AssemblyOptions, assemble_video, decode_pcm};
pub use cache::{
    get_assembled_path, get_bundle_path, get_clips_dir, get_images_dir, get_narration_path,
    get_outline_path, get_plan_path, get_project_dir, get_root_cache_dir, get_script_path,
};
pub use error::{IdeatorError, Result};
pub use format::{format_srt, format_srt_timestamp, format_timestamp, parse_srt_timestamp};
pub use genai::GenAiClient;
pub use package::{ExportBundle, export_bundle, write_bundle};
pub use pipeline::{CancelToken, ProductionParams, ProductionSession, sample_clip_indices};
pub use store::{SettingsStore, StoreEvent};
pub use types::{
    AnalysisResult, AspectRatio, AssetKind, Comment, Concept, DiscoveredVideo, FavoriteProject,
    GeneratedAsset, Language, ProductionPlan, ProductionStage, RecommendedTopic, ScriptOutline,
    SeoData, SubtitleSegment, VideoFormat, efficiency_ratio,
};
pub use youtube::{DurationFilter, YouTubeClient};
