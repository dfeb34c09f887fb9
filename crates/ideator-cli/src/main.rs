use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Result;
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use ideator_core::{
    AspectRatio, AssemblyOptions, DurationFilter, ExportBundle, FavoriteProject, GenAiClient,
    Language, ProductionParams, ProductionSession, SettingsStore, VideoFormat, YouTubeClient,
    assemble_video, export_bundle,
    format::{
        format_analysis_readable, format_concepts_readable, format_outline_readable,
        format_video_row,
    },
    get_assembled_path, get_bundle_path, get_clips_dir, get_images_dir, get_narration_path,
    get_outline_path, get_plan_path, get_project_dir, get_script_path,
    pipeline::{load_plan, save_plan},
    types::{ProductionStage, ScriptOutline},
};

/// CLI wrapper for Language enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliLanguage {
    #[default]
    Korean,
    English,
    Japanese,
    Spanish,
    Chinese,
}

impl From<CliLanguage> for Language {
    fn from(cli: CliLanguage) -> Self {
        match cli {
            CliLanguage::Korean => Language::Korean,
            CliLanguage::English => Language::English,
            CliLanguage::Japanese => Language::Japanese,
            CliLanguage::Spanish => Language::Spanish,
            CliLanguage::Chinese => Language::Chinese,
        }
    }
}

#[derive(Clone, Default, ValueEnum)]
enum CliFormat {
    #[default]
    Short,
    Long,
}

impl From<CliFormat> for VideoFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Short => VideoFormat::Short,
            CliFormat::Long => VideoFormat::Long,
        }
    }
}

#[derive(Clone, Default, ValueEnum)]
enum CliAspect {
    #[default]
    Wide,
    Tall,
}

impl From<CliAspect> for AspectRatio {
    fn from(cli: CliAspect) -> Self {
        match cli {
            CliAspect::Wide => AspectRatio::Wide,
            CliAspect::Tall => AspectRatio::Tall,
        }
    }
}

#[derive(Clone, Default, ValueEnum)]
enum CliDuration {
    #[default]
    Any,
    Short,
    Long,
}

impl From<CliDuration> for DurationFilter {
    fn from(cli: CliDuration) -> Self {
        match cli {
            CliDuration::Any => DurationFilter::Any,
            CliDuration::Short => DurationFilter::Short,
            CliDuration::Long => DurationFilter::Long,
        }
    }
}

#[derive(Parser)]
#[command(name = "ideator")]
#[command(
    about = "Discover video trends, generate concepts and scripts with AI, and produce storyboard assets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show or store API keys
    Config {
        #[arg(long)]
        gemini_key: Option<String>,
        #[arg(long)]
        youtube_key: Option<String>,
    },

    /// Generate four video concepts for a topic
    Concepts {
        topic: String,
        #[arg(short, long, default_value = "korean")]
        lang: CliLanguage,
        /// Also run the audience/SEO analysis for one concept (1-4)
        #[arg(long, value_name = "N")]
        analyze: Option<usize>,
    },

    /// Search the video platform for trending videos
    Search {
        query: String,
        #[arg(short, long, default_value = "any")]
        duration: CliDuration,
    },

    /// Analyze a video's audience from its top comments
    Analyze {
        video_id: String,
        #[arg(short, long, default_value = "korean")]
        lang: CliLanguage,
        /// Save the result as a favorite project
        #[arg(long)]
        save: bool,
    },

    /// Regenerate only the SEO strategy for a saved favorite
    Seo {
        video_id: String,
        #[arg(short, long, default_value = "korean")]
        lang: CliLanguage,
        /// Also regenerate the recommended topics
        #[arg(long)]
        topics: bool,
    },

    /// Create a script outline for a keyword
    Outline {
        keyword: String,
        /// Where the idea came from (e.g. a source video title)
        #[arg(long)]
        context: Option<String>,
        #[arg(short, long, default_value = "korean")]
        lang: CliLanguage,
    },

    /// Run the full production pipeline for a keyword
    Produce {
        keyword: String,
        #[arg(short, long, default_value = "short")]
        format: CliFormat,
        #[arg(long, default_value = "cinematic photography")]
        style: String,
        #[arg(short, long, default_value = "korean")]
        lang: CliLanguage,
        /// Storyboard image count (short: 6-16, long: 30-70)
        #[arg(long)]
        images: Option<usize>,
        #[arg(long, default_value = "wide")]
        aspect: CliAspect,
        /// Also render motion clips for a sample of the storyboard
        #[arg(long)]
        clips: bool,
        /// Assemble a local video from images + narration
        #[arg(long)]
        assemble: bool,
        /// Background track for the assembled video
        #[arg(long)]
        bgm: Option<PathBuf>,
        #[arg(long, default_value_t = 1.0)]
        narration_gain: f32,
        #[arg(long, default_value_t = 0.25)]
        bgm_gain: f32,
        /// Export all assets as a zip bundle
        #[arg(long)]
        export: bool,
        /// Re-run stages even if cached artifacts exist
        #[arg(long)]
        force: bool,
    },

    /// Manage favorite projects
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    List,
    Remove { id: String },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn create_progress(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} {msg} [{bar:32.cyan/blue}] {pos}/{len}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

fn exit_with(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), err);
    std::process::exit(1);
}

fn require_gemini(store: &SettingsStore) -> GenAiClient {
    GenAiClient::new(store.gemini_api_key()).unwrap_or_else(|e| {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        eprintln!(
            "  store one with {}",
            style("ideator config --gemini-key <KEY>").cyan()
        );
        std::process::exit(1);
    })
}

fn require_youtube(store: &SettingsStore) -> YouTubeClient {
    YouTubeClient::new(store.youtube_api_key()).unwrap_or_else(|e| {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        eprintln!(
            "  store one with {}",
            style("ideator config --youtube-key <KEY>").cyan()
        );
        std::process::exit(1);
    })
}

fn mask_key(key: &Option<String>) -> String {
    match key {
        Some(k) if k.chars().count() > 6 => {
            format!("{}…", k.chars().take(6).collect::<String>())
        }
        Some(_) => "set".to_string(),
        None => style("not set").dim().to_string(),
    }
}

/// Cached storyboard images in slot order, or empty when any slot is missing.
async fn load_cached_images(dir: &Path, expected: usize) -> Vec<Vec<u8>> {
    if expected == 0 {
        return Vec::new();
    }
    let mut images = Vec::with_capacity(expected);
    for i in 0..expected {
        match fs::read(dir.join(format!("scene_{:03}.png", i + 1))).await {
            Ok(bytes) => images.push(bytes),
            Err(_) => return Vec::new(),
        }
    }
    images
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = SettingsStore::open_default();

    match cli.command {
        Command::Config {
            gemini_key,
            youtube_key,
        } => {
            if let Some(key) = &gemini_key {
                store.set_gemini_api_key(key)?;
                println!("{} Gemini key saved", style("✓").green().bold());
            }
            if let Some(key) = &youtube_key {
                store.set_youtube_api_key(key)?;
                println!("{} YouTube key saved", style("✓").green().bold());
            }
            if gemini_key.is_none() && youtube_key.is_none() {
                println!("settings: {}", style(store.path().display()).dim());
                println!("  gemini:  {}", mask_key(&store.gemini_api_key()));
                println!("  youtube: {}", mask_key(&store.youtube_api_key()));
            }
        }

        Command::Concepts {
            topic,
            lang,
            analyze,
        } => {
            let client = require_gemini(&store);
            let language: Language = lang.into();
            let spinner = create_spinner("Generating concepts...");
            let concepts = match client.generate_concepts(&topic, language).await {
                Ok(concepts) => concepts,
                Err(e) => {
                    spinner.finish_and_clear();
                    exit_with(e);
                }
            };
            spinner.finish_with_message(format!(
                "{} {} concepts for \"{}\"",
                style("✓").green().bold(),
                concepts.len(),
                topic
            ));
            println!("\n{}", format_concepts_readable(&concepts));

            if let Some(n) = analyze {
                let Some(concept) = n.checked_sub(1).and_then(|i| concepts.get(i)) else {
                    exit_with(format!("--analyze must be between 1 and {}", concepts.len()));
                };
                let spinner = create_spinner("Analyzing concept...");
                match client.analyze_concept(concept, language).await {
                    Ok(result) => {
                        spinner.finish_with_message(format!(
                            "{} Analysis for {}",
                            style("✓").green().bold(),
                            style(&concept.title).bold()
                        ));
                        println!("\n{}", format_analysis_readable(&result));
                    }
                    Err(e) => {
                        spinner.finish_and_clear();
                        exit_with(e);
                    }
                }
            }
        }

        Command::Search { query, duration } => {
            let client = require_youtube(&store);
            let spinner = create_spinner("Searching...");
            match client.search(&query, duration.into()).await {
                Ok(videos) if videos.is_empty() => {
                    spinner.finish_with_message(format!(
                        "{} No results for \"{}\"",
                        style("✓").green().bold(),
                        query
                    ));
                }
                Ok(videos) => {
                    spinner.finish_with_message(format!(
                        "{} {} results",
                        style("✓").green().bold(),
                        videos.len()
                    ));
                    println!(
                        "\n{:<12} {:>16} {:>14} {:>9}  title",
                        "id", "views", "subs", "eff"
                    );
                    println!("{}", style("─".repeat(72)).dim());
                    for video in &videos {
                        println!("{}", format_video_row(video));
                    }
                }
                Err(e) => {
                    spinner.finish_and_clear();
                    exit_with(e);
                }
            }
        }

        Command::Analyze {
            video_id,
            lang,
            save,
        } => {
            let youtube = require_youtube(&store);
            let gemini = require_gemini(&store);
            let language: Language = lang.into();

            let spinner = create_spinner("Fetching video and comments...");
            let video = match youtube.fetch_video(&video_id).await {
                Ok(v) => v,
                Err(e) => {
                    spinner.finish_and_clear();
                    exit_with(e);
                }
            };
            let comments = youtube.fetch_comments(&video_id).await;
            spinner.finish_with_message(format!(
                "{} {} ({} comments)",
                style("✓").green().bold(),
                style(&video.title).bold(),
                comments.len()
            ));

            let spinner = create_spinner("Analyzing audience...");
            let result = match gemini.analyze_video(&video, &comments, language).await {
                Ok(r) => r,
                Err(e) => {
                    spinner.finish_and_clear();
                    exit_with(e);
                }
            };
            spinner.finish_with_message(format!("{} Analysis ready", style("✓").green().bold()));
            println!("\n{}", format_analysis_readable(&result));

            if save {
                let favorite = FavoriteProject {
                    id: video.id.clone(),
                    video,
                    result: Some(result),
                    outline: None,
                    saved_at: chrono::Utc::now().timestamp_millis(),
                };
                store.add_favorite(favorite)?;
                println!("{} Saved to favorites", style("✓").green().bold());
            }
        }

        Command::Seo {
            video_id,
            lang,
            topics,
        } => {
            let Some(favorite) = store.find_favorite(&video_id) else {
                exit_with(format!(
                    "{} is not a saved favorite; run `ideator analyze {} --save` first",
                    video_id, video_id
                ));
            };
            let Some(result) = favorite.result.clone() else {
                exit_with(format!("favorite {} has no analysis to refresh", video_id));
            };
            let gemini = require_gemini(&store);
            let language: Language = lang.into();

            let spinner = create_spinner("Regenerating SEO strategy...");
            // One call: keywords and topics stay as they are.
            let seo = match gemini.refresh_seo(&favorite.video.title, language).await {
                Ok(seo) => seo,
                Err(e) => {
                    spinner.finish_and_clear();
                    exit_with(e);
                }
            };
            spinner.finish_with_message(format!("{} SEO refreshed", style("✓").green().bold()));

            let mut merged = result.with_seo(seo);
            if topics {
                let spinner = create_spinner("Regenerating topic suggestions...");
                match gemini.refresh_topics(&favorite.video.title, language).await {
                    Ok(fresh) => {
                        spinner.finish_with_message(format!(
                            "{} Topics refreshed",
                            style("✓").green().bold()
                        ));
                        merged = merged.with_topics(fresh);
                    }
                    Err(e) => {
                        spinner.finish_and_clear();
                        exit_with(e);
                    }
                }
            }
            println!("\n{}", format_analysis_readable(&merged));
            store.add_favorite(FavoriteProject {
                result: Some(merged),
                ..favorite
            })?;
        }

        Command::Outline {
            keyword,
            context,
            lang,
        } => {
            let client = require_gemini(&store);
            let spinner = create_spinner("Drafting outline...");
            match client
                .generate_outline(&keyword, context.as_deref(), lang.into())
                .await
            {
                Ok(outline) => {
                    spinner.finish_with_message(format!(
                        "{} Outline ready",
                        style("✓").green().bold()
                    ));
                    println!("\n{}", format_outline_readable(&outline));
                }
                Err(e) => {
                    spinner.finish_and_clear();
                    exit_with(e);
                }
            }
        }

        Command::Produce {
            keyword,
            format,
            style: visual_style,
            lang,
            images,
            aspect,
            clips,
            assemble,
            bgm,
            narration_gain,
            bgm_gain,
            export,
            force,
        } => {
            let client = require_gemini(&store);
            let format: VideoFormat = format.into();
            let language: Language = lang.into();
            let image_count = images.unwrap_or_else(|| format.default_image_count());

            produce(
                &client,
                &keyword,
                ProductionParams {
                    format,
                    style: visual_style,
                    language,
                    image_count,
                    aspect: aspect.into(),
                },
                ProduceFlags {
                    clips,
                    assemble,
                    bgm,
                    narration_gain,
                    bgm_gain,
                    export,
                    force,
                },
            )
            .await?;
        }

        Command::Favorites { action } => match action {
            FavoritesAction::List => {
                let favorites = store.favorites();
                if favorites.is_empty() {
                    println!("No favorites saved yet");
                } else {
                    for favorite in &favorites {
                        let saved = DateTime::from_timestamp_millis(favorite.saved_at)
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        println!(
                            "{:<12} {}  {}",
                            favorite.id,
                            style(&saved).dim(),
                            favorite.video.title
                        );
                    }
                }
            }
            FavoritesAction::Remove { id } => {
                if store.remove_favorite(&id)? {
                    println!("{} Removed {}", style("✓").green().bold(), id);
                } else {
                    println!("No favorite with id {}", id);
                }
            }
        },
    }

    Ok(())
}

struct ProduceFlags {
    clips: bool,
    assemble: bool,
    bgm: Option<PathBuf>,
    narration_gain: f32,
    bgm_gain: f32,
    export: bool,
    force: bool,
}

async fn produce(
    client: &GenAiClient,
    keyword: &str,
    params: ProductionParams,
    flags: ProduceFlags,
) -> Result<()> {
    let project_dir = get_project_dir(keyword);
    fs::create_dir_all(&project_dir).await?;

    println!(
        "\n{}  {}\n",
        style("ideator").cyan().bold(),
        style("Production Studio").dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();

    // Stage 0: outline (check cache)
    let outline_path = get_outline_path(&project_dir);
    let outline: ScriptOutline = if !flags.force && outline_path.exists() {
        let raw = fs::read_to_string(&outline_path).await?;
        println!(
            "{} Outline {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
        serde_json::from_str(&raw)?
    } else {
        let spinner = create_spinner("Drafting outline...");
        let outline = client
            .generate_outline(keyword, None, params.language)
            .await?;
        fs::write(&outline_path, serde_json::to_string_pretty(&outline)?).await?;
        spinner.finish_with_message(format!(
            "{} Outline: {}",
            style("✓").green().bold(),
            style(&outline.title).bold()
        ));
        outline
    };

    let format_label = params.format.label();
    let lang_label = params.language.label();
    let plan_path = get_plan_path(&project_dir, format_label, lang_label);
    let narration_path = get_narration_path(&project_dir);
    let images_dir = get_images_dir(&project_dir);

    let mut session = ProductionSession::new(outline, params);

    // Stage 1: script + narration (check cache)
    let plan = if !flags.force && plan_path.exists() {
        let plan = load_plan(&plan_path).await?;
        let narration = fs::read(&narration_path).await.ok();
        session.restore_plan(plan.clone(), narration)?;
        println!(
            "{} Script {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
        if session.narration_failed() {
            println!(
                "{} No cached narration; continuing without audio",
                style("!").yellow().bold()
            );
        }
        plan
    } else {
        let step_start = Instant::now();
        let spinner = create_spinner("Writing script and narration...");
        session.write_script(client).await?;
        let Some(plan) = session.plan().cloned() else {
            anyhow::bail!("scripting finished without a production plan");
        };
        spinner.finish_with_message(format!(
            "{} Script: {} chars, {} prompts, {} subtitle cues {}",
            style("✓").green().bold(),
            plan.full_script.chars().count(),
            plan.image_prompts.len(),
            plan.subtitles.len(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
        if session.narration_failed() {
            println!(
                "{} Narration synthesis failed; continuing without audio",
                style("!").yellow().bold()
            );
        }

        save_plan(&plan, &plan_path).await?;
        fs::write(get_script_path(&project_dir), &plan.full_script).await?;
        if let Some(narration) = session.narration() {
            fs::write(&narration_path, &narration.bytes).await?;
        }
        plan
    };

    // Stage 2: storyboard images (check cache; a partial set means the stage
    // never completed, so it is regenerated in full)
    let cached_images = if flags.force {
        Vec::new()
    } else {
        load_cached_images(&images_dir, plan.image_prompts.len()).await
    };
    if !cached_images.is_empty() {
        session.restore_images(cached_images)?;
        println!(
            "{} Storyboard {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
    } else {
        let step_start = Instant::now();
        let pb = create_progress(plan.image_prompts.len() as u64, "Generating storyboard");
        session
            .generate_images(client, |done, _total| pb.set_position(done as u64))
            .await?;
        pb.finish_and_clear();
        println!(
            "{} Storyboard: {} images {}",
            style("✓").green().bold(),
            session.images().len(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        );
        if !session.failed_slots().is_empty() {
            println!(
                "{} {} image slot(s) failed and were skipped: {:?}",
                style("!").yellow().bold(),
                session.failed_slots().len(),
                session.failed_slots()
            );
        }

        fs::create_dir_all(&images_dir).await?;
        for (i, image) in session.images().iter().enumerate() {
            fs::write(images_dir.join(format!("scene_{:03}.png", i + 1)), &image.bytes).await?;
        }
    }

    // Stage 3 (optional): motion clips
    if flags.clips {
        let step_start = Instant::now();
        let clip_count = session
            .params()
            .format
            .clip_count()
            .min(session.images().len());
        let pb = create_progress(clip_count as u64, "Rendering motion clips");
        match session
            .render_clips(client, |done, _total| pb.set_position(done as u64))
            .await
        {
            Ok(()) => {
                pb.finish_and_clear();
                println!(
                    "{} Clips: {} rendered {}",
                    style("✓").green().bold(),
                    session.clips().len(),
                    style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
                );
            }
            Err(e) => {
                pb.finish_and_clear();
                // Accumulated assets are still usable; report and move on.
                println!(
                    "{} Clip rendering failed after {} clip(s): {}",
                    style("!").yellow().bold(),
                    session.clips().len(),
                    e
                );
            }
        }

        if !session.clips().is_empty() {
            let clips_dir = get_clips_dir(&project_dir);
            fs::create_dir_all(&clips_dir).await?;
            for (i, clip) in session.clips().iter().enumerate() {
                fs::write(clips_dir.join(format!("clip_{:03}.mp4", i + 1)), &clip.bytes).await?;
            }
        }
    }
    if session.stage() == ProductionStage::ReviewImages {
        session.finish()?;
    }

    // Stage 4 (optional): local assembly
    if flags.assemble {
        let step_start = Instant::now();
        let spinner = create_spinner("Assembling video locally...");
        let narration = session
            .narration()
            .map(|a| a.bytes.clone())
            .unwrap_or_default();
        let image_bytes: Vec<&[u8]> = session
            .images()
            .iter()
            .map(|a| a.bytes.as_slice())
            .collect();
        let options = AssemblyOptions {
            aspect: session.params().aspect,
            narration_gain: flags.narration_gain,
            bgm: flags.bgm.clone(),
            bgm_gain: flags.bgm_gain,
        };
        let out_path = get_assembled_path(&project_dir);
        match assemble_video(&image_bytes, &narration, &options, &project_dir, &out_path).await {
            Ok(path) => {
                spinner.finish_with_message(format!(
                    "{} Assembled: {} {}",
                    style("✓").green().bold(),
                    style(path.display()).cyan(),
                    style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
                ));
            }
            Err(e) => {
                spinner.finish_and_clear();
                println!("{} {}", style("!").yellow().bold(), e);
            }
        }
    }

    // Stage 5 (optional): export bundle
    if flags.export {
        let spinner = create_spinner("Packaging bundle...");
        let narration = session.narration().map(|a| a.bytes.as_slice());
        let bundle = ExportBundle {
            script: &plan.full_script,
            subtitles: &plan.subtitles,
            images: session
                .images()
                .iter()
                .map(|a| a.bytes.as_slice())
                .collect(),
            clips: session
                .clips()
                .iter()
                .map(|a| a.bytes.as_slice())
                .collect(),
            narration_pcm: narration,
            seo: None,
        };
        let bundle_path = get_bundle_path(&project_dir);
        match export_bundle(&bundle_path, &bundle) {
            Ok(path) => {
                spinner.finish_with_message(format!(
                    "{} Bundle: {}",
                    style("✓").green().bold(),
                    style(path.display()).cyan()
                ));
            }
            Err(e) => {
                spinner.finish_and_clear();
                println!("{} {}", style("!").yellow().bold(), e);
            }
        }
    }

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} {}   {} {}",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold(),
        style("Artifacts:").dim(),
        style(project_dir.display()).cyan()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn masked_keys_respect_char_boundaries() {
        assert_eq!(mask_key(&Some("abcdefghij".into())), "abcdef…");
        // multi-byte keys must not be sliced mid-character
        assert_eq!(mask_key(&Some("키워드키워드키워드".into())), "키워드키워드…");
        assert_eq!(mask_key(&Some("short".into())), "set");
    }

    #[tokio::test]
    async fn cached_images_load_only_when_the_set_is_complete() {
        let dir = std::env::temp_dir().join(format!("ideator-frames-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await.unwrap();

        fs::write(dir.join("scene_001.png"), b"one").await.unwrap();
        assert!(load_cached_images(&dir, 2).await.is_empty());

        fs::write(dir.join("scene_002.png"), b"two").await.unwrap();
        let images = load_cached_images(&dir, 2).await;
        assert_eq!(images, vec![b"one".to_vec(), b"two".to_vec()]);

        assert!(load_cached_images(&dir, 0).await.is_empty());
    }
}
