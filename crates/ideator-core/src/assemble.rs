use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use tokio::process::Command;

use crate::{
    error::{IdeatorError, Result},
    types::AspectRatio,
};

/// Narration PCM contract: 24 kHz, mono, signed 16-bit little-endian.
pub const SAMPLE_RATE: u32 = 24_000;
pub const FRAME_RATE: u32 = 30;

const WATERMARK: &str = "ideator";

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub aspect: AspectRatio,
    /// Narration track gain (1.0 = unchanged).
    pub narration_gain: f32,
    /// Optional background track, looped for the whole narration.
    pub bgm: Option<PathBuf>,
    pub bgm_gain: f32,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::Wide,
            narration_gain: 1.0,
            bgm: None,
            bgm_gain: 0.25,
        }
    }
}

/// Decode raw narration PCM into normalized samples.
pub fn decode_pcm(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() < 2 {
        return Err(IdeatorError::AssemblyFailed {
            reason: "narration payload is empty".to_string(),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

pub fn narration_duration(samples: &[f32]) -> f64 {
    samples.len() as f64 / SAMPLE_RATE as f64
}

/// Uniform split of the narration across the storyboard: every image is shown
/// for duration / image_count seconds.
pub fn display_window(total_duration: f64, image_count: usize) -> f64 {
    total_duration / image_count as f64
}

/// Centered cover-fit crop: the source rectangle that fills the target surface
/// without letterboxing, cropping whichever axis overflows.
pub fn cover_crop_rect(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> (u32, u32, u32, u32) {
    let src_ratio = src_w as f64 / src_h as f64;
    let dst_ratio = dst_w as f64 / dst_h as f64;

    if src_ratio > dst_ratio {
        // source wider than target: crop left/right
        let crop_w = ((src_h as f64 * dst_ratio).round() as u32).min(src_w).max(1);
        let x = (src_w - crop_w) / 2;
        (x, 0, crop_w, src_h)
    } else {
        // source taller than target: crop top/bottom
        let crop_h = ((src_w as f64 / dst_ratio).round() as u32).min(src_h).max(1);
        let y = (src_h - crop_h) / 2;
        (0, y, src_w, crop_h)
    }
}

fn prepare_frame(bytes: &[u8], dst_w: u32, dst_h: u32, path: &Path) -> Result<()> {
    let img = image::load_from_memory(bytes)?;
    let (x, y, w, h) = cover_crop_rect(img.width(), img.height(), dst_w, dst_h);
    let frame = img.crop_imm(x, y, w, h).resize_exact(dst_w, dst_h, FilterType::Triangle);
    frame.save(path)?;
    Ok(())
}

fn write_narration_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Build a single playable video from already-generated storyboard images and
/// narration, without a server round-trip: uniform image timing derived from
/// the decoded sample count, cover-fit frames, watermark, narration plus an
/// optional looping background track, muxed to VP9+Opus WebM by ffmpeg.
pub async fn assemble_video(
    images: &[&[u8]],
    narration_pcm: &[u8],
    options: &AssemblyOptions,
    work_dir: &Path,
    out_path: &Path,
) -> Result<PathBuf> {
    if images.is_empty() {
        return Err(IdeatorError::AssemblyFailed {
            reason: "no storyboard images to assemble".to_string(),
        });
    }
    let samples = decode_pcm(narration_pcm)?;
    let duration = narration_duration(&samples);
    let window = display_window(duration, images.len());

    let frames_dir = work_dir.join("frames");
    tokio::fs::create_dir_all(&frames_dir).await?;

    let narration_wav = work_dir.join("narration.wav");
    write_narration_wav(&narration_wav, &samples)?;

    let (dst_w, dst_h) = options.aspect.canvas_size();
    let mut concat = String::from("ffconcat version 1.0\n");
    for (i, bytes) in images.iter().enumerate() {
        let name = format!("frames/scene_{:03}.png", i);
        prepare_frame(bytes, dst_w, dst_h, &work_dir.join(&name))?;
        concat.push_str(&format!("file '{}'\nduration {:.6}\n", name, window));
    }
    // Concat demuxer quirk: the last entry must be repeated so its duration
    // is honoured.
    concat.push_str(&format!("file 'frames/scene_{:03}.png'\n", images.len() - 1));
    let list_path = work_dir.join("list.txt");
    tokio::fs::write(&list_path, &concat).await?;

    let video_chain = format!(
        "[0:v]fps={FRAME_RATE},drawtext=text='{WATERMARK}':fontcolor=white@0.6:fontsize=24:x=w-tw-24:y=h-th-24[v]"
    );
    let filter = match &options.bgm {
        Some(_) => format!(
            "{video_chain};[1:a]volume={ng}[nar];[2:a]volume={bg}[bgm];\
             [nar][bgm]amix=inputs=2:duration=first:normalize=0[a]",
            ng = options.narration_gain,
            bg = options.bgm_gain,
        ),
        None => format!("{video_chain};[1:a]volume={ng}[a]", ng = options.narration_gain),
    };

    let mut command = Command::new("ffmpeg");
    command
        .current_dir(work_dir)
        .arg("-y")
        .arg("-f")
        .arg("concat")
        .arg("-safe")
        .arg("0")
        .arg("-i")
        .arg("list.txt")
        .arg("-i")
        .arg("narration.wav");
    if let Some(bgm) = &options.bgm {
        command.arg("-stream_loop").arg("-1").arg("-i").arg(bgm);
    }
    command
        .arg("-filter_complex")
        .arg(&filter)
        .arg("-map")
        .arg("[v]")
        .arg("-map")
        .arg("[a]")
        .arg("-c:v")
        .arg("libvpx-vp9")
        .arg("-b:v")
        .arg("2M")
        .arg("-c:a")
        .arg("libopus")
        .arg("-shortest")
        .arg(out_path);

    let output = command.output().await?;
    if !output.status.success() {
        // No partial file is exposed on failure.
        let _ = tokio::fs::remove_file(out_path).await;
        return Err(IdeatorError::AssemblyFailed {
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(out_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_pcm_rejects_empty_payload() {
        assert!(matches!(
            decode_pcm(&[]),
            Err(IdeatorError::AssemblyFailed { .. })
        ));
    }

    #[test]
    fn decode_pcm_normalizes_s16le() {
        let bytes = [0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80];
        let samples = decode_pcm(&bytes).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - (i16::MAX as f32 / 32768.0)).abs() < 1e-6);
        assert_eq!(samples[2], -1.0);
    }

    #[test]
    fn duration_follows_the_sample_clock() {
        let samples = vec![0.0; SAMPLE_RATE as usize * 3];
        assert_eq!(narration_duration(&samples), 3.0);
    }

    #[test]
    fn display_windows_cover_the_narration() {
        let duration = 37.5;
        for n in [1usize, 4, 7, 40] {
            let window = display_window(duration, n);
            assert!((window * n as f64 - duration).abs() < 1e-9);
        }
    }

    #[test]
    fn cover_crop_wide_source_into_wide_target() {
        // 4000x2250 is already 16:9: no crop
        assert_eq!(cover_crop_rect(4000, 2250, 1280, 720), (0, 0, 4000, 2250));
    }

    #[test]
    fn cover_crop_wider_source_crops_sides() {
        // 21:9 source into 16:9: width shrinks, centered
        let (x, y, w, h) = cover_crop_rect(2100, 900, 1280, 720);
        assert_eq!(y, 0);
        assert_eq!(h, 900);
        assert_eq!(w, 1600);
        assert_eq!(x, 250);
    }

    #[test]
    fn cover_crop_taller_source_crops_top_and_bottom() {
        // square source into 16:9: height shrinks, centered
        let (x, y, w, h) = cover_crop_rect(1000, 1000, 1280, 720);
        assert_eq!(x, 0);
        assert_eq!(w, 1000);
        assert_eq!(h, 563);
        assert_eq!(y, 218);
    }

    #[test]
    fn cover_crop_into_tall_target() {
        // 16:9 source into 9:16: crop left/right hard
        let (x, y, w, h) = cover_crop_rect(1920, 1080, 720, 1280);
        assert_eq!(y, 0);
        assert_eq!(h, 1080);
        assert_eq!(w, 608); // 1080 * 9/16, rounded
        assert_eq!(x, (1920 - 608) / 2);
    }
}
