use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::fs;

use crate::{
    error::{IdeatorError, Result},
    genai::GenAiClient,
    types::{
        AspectRatio, AssetKind, GeneratedAsset, Language, ProductionPlan, ProductionStage,
        ScriptOutline, VideoFormat,
    },
};

/// Cooperative cancellation shared between a session and its in-flight loops.
/// Checked at every suspension point; flipping it makes the next check return
/// `IdeatorError::Cancelled` instead of leaving orphaned requests behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// User-confirmed production parameters.
#[derive(Debug, Clone)]
pub struct ProductionParams {
    pub format: VideoFormat,
    pub style: String,
    pub language: Language,
    pub image_count: usize,
    pub aspect: AspectRatio,
}

/// Which storyboard images get a motion clip: every `stride`-th image starting
/// at 0, where `stride = max(1, image_count / clip_count)`, capped at
/// `clip_count` clips.
pub fn sample_clip_indices(image_count: usize, clip_count: usize) -> Vec<usize> {
    if image_count == 0 || clip_count == 0 {
        return Vec::new();
    }
    let stride = (image_count / clip_count).max(1);
    (0..image_count).step_by(stride).take(clip_count).collect()
}

/// A single production run: the state machine that turns an outline into a
/// script, narration, storyboard images, and optional motion clips, holding
/// all intermediate artifacts in memory.
///
/// Stage failures never discard accumulated assets, so partial results stay
/// exportable. A failed image slot is recorded and skipped rather than
/// aborting the whole imaging pass; individual slots can be regenerated
/// afterwards.
pub struct ProductionSession {
    outline: ScriptOutline,
    params: ProductionParams,
    stage: ProductionStage,
    plan: Option<ProductionPlan>,
    assets: Vec<GeneratedAsset>,
    failed_slots: Vec<usize>,
    narration_failed: bool,
    regenerating: Option<usize>,
    cancel: CancelToken,
}

impl ProductionSession {
    pub fn new(outline: ScriptOutline, params: ProductionParams) -> Self {
        Self {
            outline,
            params,
            stage: ProductionStage::Idle,
            plan: None,
            assets: Vec::new(),
            failed_slots: Vec::new(),
            narration_failed: false,
            regenerating: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn stage(&self) -> ProductionStage {
        self.stage
    }

    pub fn outline(&self) -> &ScriptOutline {
        &self.outline
    }

    pub fn params(&self) -> &ProductionParams {
        &self.params
    }

    pub fn plan(&self) -> Option<&ProductionPlan> {
        self.plan.as_ref()
    }

    pub fn assets(&self) -> &[GeneratedAsset] {
        &self.assets
    }

    pub fn narration(&self) -> Option<&GeneratedAsset> {
        self.assets.iter().find(|a| a.kind == AssetKind::Audio)
    }

    pub fn narration_failed(&self) -> bool {
        self.narration_failed
    }

    pub fn images(&self) -> Vec<&GeneratedAsset> {
        self.assets
            .iter()
            .filter(|a| a.kind == AssetKind::Image)
            .collect()
    }

    pub fn clips(&self) -> Vec<&GeneratedAsset> {
        self.assets
            .iter()
            .filter(|a| a.kind == AssetKind::Video)
            .collect()
    }

    /// Prompt indices whose image generation failed and was skipped.
    pub fn failed_slots(&self) -> &[usize] {
        &self.failed_slots
    }

    pub fn regenerating(&self) -> Option<usize> {
        self.regenerating
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn expect_stage(&self, expected: ProductionStage) -> Result<()> {
        if self.stage != expected {
            return Err(IdeatorError::StageMismatch {
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    /// Idle -> Scripting -> Imaging: expand the outline into a production plan,
    /// then synthesize narration from the finished script. A plan failure
    /// resets to Idle; a narration failure is recorded and tolerated (images
    /// and export remain useful without audio).
    pub async fn write_script(&mut self, client: &GenAiClient) -> Result<()> {
        self.expect_stage(ProductionStage::Idle)?;
        self.stage = ProductionStage::Scripting;

        let plan = match client
            .generate_production_plan(
                &self.outline,
                self.params.format,
                &self.params.style,
                self.params.image_count,
                self.params.language,
            )
            .await
        {
            Ok(plan) => plan,
            Err(e) => {
                self.stage = ProductionStage::Idle;
                return Err(e);
            }
        };

        // Narration needs the complete script text, so TTS strictly follows
        // plan generation.
        match client
            .generate_speech(&plan.full_script, self.params.language)
            .await
        {
            Ok(pcm) => self.assets.push(GeneratedAsset {
                kind: AssetKind::Audio,
                bytes: pcm,
                prompt: None,
            }),
            Err(_) => self.narration_failed = true,
        }

        self.plan = Some(plan);
        self.stage = ProductionStage::Imaging;
        Ok(())
    }

    /// Seed a previously cached plan and narration instead of regenerating
    /// them: Idle -> Imaging without any network calls. A missing narration
    /// payload is recorded the same way a live synthesis failure is.
    pub fn restore_plan(
        &mut self,
        plan: ProductionPlan,
        narration_pcm: Option<Vec<u8>>,
    ) -> Result<()> {
        self.expect_stage(ProductionStage::Idle)?;
        match narration_pcm {
            Some(pcm) => self.assets.push(GeneratedAsset {
                kind: AssetKind::Audio,
                bytes: pcm,
                prompt: None,
            }),
            None => self.narration_failed = true,
        }
        self.plan = Some(plan);
        self.stage = ProductionStage::Imaging;
        Ok(())
    }

    /// Seed previously cached storyboard images in order: Imaging ->
    /// ReviewImages. Prompts are re-attached positionally so per-slot
    /// regeneration and clip rendering keep working.
    pub fn restore_images(&mut self, images: Vec<Vec<u8>>) -> Result<()> {
        self.expect_stage(ProductionStage::Imaging)?;
        let prompts = self
            .plan
            .as_ref()
            .map(|p| p.image_prompts.clone())
            .unwrap_or_default();
        for (i, bytes) in images.into_iter().enumerate() {
            self.assets.push(GeneratedAsset {
                kind: AssetKind::Image,
                bytes,
                prompt: prompts.get(i).cloned(),
            });
        }
        self.stage = ProductionStage::ReviewImages;
        Ok(())
    }

    /// Imaging -> ReviewImages: one request per prompt, in order, appending
    /// each image as it arrives. Failed slots are skipped and recorded.
    pub async fn generate_images<F>(&mut self, client: &GenAiClient, mut progress: F) -> Result<()>
    where
        F: FnMut(usize, usize),
    {
        self.expect_stage(ProductionStage::Imaging)?;
        let prompts = self
            .plan
            .as_ref()
            .map(|p| p.image_prompts.clone())
            .unwrap_or_default();
        let total = prompts.len();

        for (i, prompt) in prompts.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.stage = ProductionStage::ReviewImages;
                return Err(IdeatorError::Cancelled);
            }
            match client.generate_image(prompt, self.params.aspect).await {
                Ok(bytes) => self.assets.push(GeneratedAsset {
                    kind: AssetKind::Image,
                    bytes,
                    prompt: Some(prompt.clone()),
                }),
                Err(_) => self.failed_slots.push(i),
            }
            progress(i + 1, total);
        }

        self.stage = ProductionStage::ReviewImages;
        Ok(())
    }

    /// Regenerate the image at `index` (position among image assets) with its
    /// original prompt. Every other asset entry and the ordering stay
    /// untouched. A duplicate request for the slot already being regenerated
    /// is ignored.
    pub async fn regenerate_image(&mut self, client: &GenAiClient, index: usize) -> Result<()> {
        if !matches!(
            self.stage,
            ProductionStage::ReviewImages | ProductionStage::Completed
        ) {
            return Err(IdeatorError::StageMismatch {
                expected: ProductionStage::ReviewImages,
                actual: self.stage,
            });
        }
        if self.regenerating == Some(index) {
            return Ok(());
        }

        let position = self
            .image_position(index)
            .ok_or_else(|| IdeatorError::MissingPayload {
                what: format!("image in slot {index}"),
            })?;
        let prompt = self.assets[position].prompt.clone().unwrap_or_default();

        self.regenerating = Some(index);
        let result = client.generate_image(&prompt, self.params.aspect).await;
        self.regenerating = None;

        self.replace_image(index, result?);
        Ok(())
    }

    fn image_position(&self, index: usize) -> Option<usize> {
        self.assets
            .iter()
            .enumerate()
            .filter(|(_, a)| a.kind == AssetKind::Image)
            .map(|(pos, _)| pos)
            .nth(index)
    }

    fn replace_image(&mut self, index: usize, bytes: Vec<u8>) {
        if let Some(pos) = self.image_position(index) {
            self.assets[pos].bytes = bytes;
        }
    }

    /// ReviewImages -> Videoing -> Completed: render one motion clip per
    /// stride-sampled storyboard image, sequentially. A clip failure returns
    /// the session to ReviewImages with everything produced so far intact.
    pub async fn render_clips<F>(&mut self, client: &GenAiClient, mut progress: F) -> Result<()>
    where
        F: FnMut(usize, usize),
    {
        self.expect_stage(ProductionStage::ReviewImages)?;
        self.stage = ProductionStage::Videoing;

        let image_positions: Vec<usize> = self
            .assets
            .iter()
            .enumerate()
            .filter(|(_, a)| a.kind == AssetKind::Image)
            .map(|(pos, _)| pos)
            .collect();
        let indices = sample_clip_indices(image_positions.len(), self.params.format.clip_count());
        let total = indices.len();

        for (done, &image_index) in indices.iter().enumerate() {
            let position = image_positions[image_index];
            let prompt = self.assets[position].prompt.clone().unwrap_or_default();
            let start_image = self.assets[position].bytes.clone();

            let result = client
                .generate_video_clip(&prompt, Some(&start_image), self.params.aspect, &self.cancel)
                .await;
            match result {
                Ok(bytes) => self.assets.push(GeneratedAsset {
                    kind: AssetKind::Video,
                    bytes,
                    prompt: Some(prompt),
                }),
                Err(e) => {
                    self.stage = ProductionStage::ReviewImages;
                    return Err(e);
                }
            }
            progress(done + 1, total);
        }

        self.stage = ProductionStage::Completed;
        Ok(())
    }

    /// ReviewImages -> Completed, for runs that skip clip rendering.
    pub fn finish(&mut self) -> Result<()> {
        self.expect_stage(ProductionStage::ReviewImages)?;
        self.stage = ProductionStage::Completed;
        Ok(())
    }
}

/// Load a production plan from a cached file
pub async fn load_plan(path: &Path) -> Result<ProductionPlan> {
    let json_content = fs::read_to_string(path).await?;
    let plan: ProductionPlan = serde_json::from_str(&json_content)?;
    Ok(plan)
}

/// Save a production plan to a file
pub async fn save_plan(plan: &ProductionPlan, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(plan)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutlineSection;

    fn sample_session() -> ProductionSession {
        ProductionSession::new(
            ScriptOutline {
                title: "Why cats run at 3am".into(),
                sections: vec![OutlineSection {
                    label: "Hook".into(),
                    content: "The zoomies".into(),
                }],
            },
            ProductionParams {
                format: VideoFormat::Long,
                style: "cinematic photography".into(),
                language: Language::Korean,
                image_count: 40,
                aspect: AspectRatio::Wide,
            },
        )
    }

    #[test]
    fn clip_sampling_long_form_forty_images() {
        let indices = sample_clip_indices(40, 18);
        assert_eq!(indices.len(), 18);
        assert_eq!(indices.first(), Some(&0));
        assert_eq!(indices.last(), Some(&34));
        assert!(indices.windows(2).all(|w| w[1] - w[0] == 2));
        assert!(indices.iter().all(|&i| i < 40));
    }

    #[test]
    fn clip_sampling_fewer_images_than_clips() {
        // stride clamps to 1, every image gets a clip
        assert_eq!(sample_clip_indices(5, 7), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn clip_sampling_degenerate_inputs() {
        assert!(sample_clip_indices(0, 7).is_empty());
        assert!(sample_clip_indices(10, 0).is_empty());
    }

    #[test]
    fn clip_sampling_never_exceeds_clip_count() {
        for images in 1..=80 {
            for clips in 1..=20 {
                let indices = sample_clip_indices(images, clips);
                assert!(indices.len() <= clips);
                assert!(indices.iter().all(|&i| i < images));
            }
        }
    }

    #[test]
    fn session_starts_idle_with_no_assets() {
        let session = sample_session();
        assert_eq!(session.stage(), ProductionStage::Idle);
        assert!(session.assets().is_empty());
        assert!(session.narration().is_none());
        assert!(!session.cancel_token().is_cancelled());
    }

    #[test]
    fn cancel_token_is_shared() {
        let session = sample_session();
        let token = session.cancel_token();
        session.cancel();
        assert!(token.is_cancelled());
    }

    fn sample_plan() -> ProductionPlan {
        ProductionPlan {
            full_script: "script".into(),
            image_prompts: vec!["prompt 0".into(), "prompt 1".into()],
            subtitles: vec![],
        }
    }

    #[test]
    fn restored_plan_skips_the_scripting_stage() {
        let mut session = sample_session();
        session.restore_plan(sample_plan(), Some(vec![1, 2])).unwrap();

        assert_eq!(session.stage(), ProductionStage::Imaging);
        assert_eq!(session.plan().unwrap().full_script, "script");
        assert_eq!(session.narration().unwrap().bytes, vec![1, 2]);
        assert!(!session.narration_failed());

        // only valid from Idle
        assert!(matches!(
            session.restore_plan(sample_plan(), None),
            Err(IdeatorError::StageMismatch { .. })
        ));
    }

    #[test]
    fn restored_plan_without_narration_records_the_gap() {
        let mut session = sample_session();
        session.restore_plan(sample_plan(), None).unwrap();
        assert!(session.narration().is_none());
        assert!(session.narration_failed());
    }

    #[test]
    fn restored_images_reattach_prompts_in_order() {
        let mut session = sample_session();
        session.restore_plan(sample_plan(), Some(vec![0])).unwrap();
        session
            .restore_images(vec![vec![10], vec![11]])
            .unwrap();

        assert_eq!(session.stage(), ProductionStage::ReviewImages);
        let images = session.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].prompt.as_deref(), Some("prompt 0"));
        assert_eq!(images[1].prompt.as_deref(), Some("prompt 1"));

        // a fully restored session can still finish normally
        session.finish().unwrap();
        assert_eq!(session.stage(), ProductionStage::Completed);
    }

    #[test]
    fn restored_images_require_the_imaging_stage() {
        let mut session = sample_session();
        assert!(matches!(
            session.restore_images(vec![vec![1]]),
            Err(IdeatorError::StageMismatch { .. })
        ));
    }

    #[test]
    fn finish_requires_review_stage() {
        let mut session = sample_session();
        assert!(matches!(
            session.finish(),
            Err(IdeatorError::StageMismatch { .. })
        ));
    }

    #[test]
    fn replace_image_preserves_every_other_entry() {
        let mut session = sample_session();
        session.assets.push(GeneratedAsset {
            kind: AssetKind::Audio,
            bytes: vec![9, 9],
            prompt: None,
        });
        for i in 0..4u8 {
            session.assets.push(GeneratedAsset {
                kind: AssetKind::Image,
                bytes: vec![i; 3],
                prompt: Some(format!("prompt {i}")),
            });
        }
        let before: Vec<Vec<u8>> = session.assets.iter().map(|a| a.bytes.clone()).collect();

        session.replace_image(2, vec![42; 3]);

        assert_eq!(session.assets.len(), before.len());
        for (i, asset) in session.assets.iter().enumerate() {
            if i == 3 {
                // audio sits at 0, so image index 2 is asset position 3
                assert_eq!(asset.bytes, vec![42; 3]);
            } else {
                assert_eq!(asset.bytes, before[i]);
            }
        }
        // prompt survives regeneration
        assert_eq!(session.assets[3].prompt.as_deref(), Some("prompt 2"));
    }

    #[test]
    fn image_accessor_filters_by_kind() {
        let mut session = sample_session();
        session.assets.push(GeneratedAsset {
            kind: AssetKind::Audio,
            bytes: vec![1],
            prompt: None,
        });
        session.assets.push(GeneratedAsset {
            kind: AssetKind::Image,
            bytes: vec![2],
            prompt: Some("p".into()),
        });
        session.assets.push(GeneratedAsset {
            kind: AssetKind::Video,
            bytes: vec![3],
            prompt: Some("p".into()),
        });

        assert_eq!(session.images().len(), 1);
        assert_eq!(session.clips().len(), 1);
        assert_eq!(session.narration().unwrap().bytes, vec![1]);
    }
}
