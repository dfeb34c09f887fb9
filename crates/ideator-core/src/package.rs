use std::{
    fs::File,
    io::{Seek, Write},
    path::{Path, PathBuf},
};

use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
    error::{IdeatorError, Result},
    format::format_srt,
    types::{SeoData, SubtitleSegment},
};

/// Everything a production run can export as one archive.
#[derive(Debug, Default)]
pub struct ExportBundle<'a> {
    /// Full narration script; written byte-exact to `script.txt`.
    pub script: &'a str,
    pub subtitles: &'a [SubtitleSegment],
    /// PNG per storyboard image, in order.
    pub images: Vec<&'a [u8]>,
    /// MP4 per motion clip, in order.
    pub clips: Vec<&'a [u8]>,
    /// Raw narration samples (24 kHz mono s16le).
    pub narration_pcm: Option<&'a [u8]>,
    pub seo: Option<&'a SeoData>,
}

/// Write the bundle into any seekable writer. Kept generic so tests can pack
/// and re-read an in-memory cursor.
pub fn write_bundle<W: Write + Seek>(writer: W, bundle: &ExportBundle) -> Result<()> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    zip.start_file("script.txt", options)?;
    zip.write_all(bundle.script.as_bytes())?;

    if !bundle.subtitles.is_empty() {
        zip.start_file("subtitles.srt", options)?;
        zip.write_all(format_srt(bundle.subtitles).as_bytes())?;

        zip.start_file("subtitles.json", options)?;
        zip.write_all(&serde_json::to_vec_pretty(bundle.subtitles)?)?;
    }

    for (i, image) in bundle.images.iter().enumerate() {
        zip.start_file(format!("images/scene_{:03}.png", i + 1), options)?;
        zip.write_all(image)?;
    }

    for (i, clip) in bundle.clips.iter().enumerate() {
        zip.start_file(format!("videos/clip_{:03}.mp4", i + 1), options)?;
        zip.write_all(clip)?;
    }

    if let Some(pcm) = bundle.narration_pcm {
        zip.start_file("voiceover.pcm", options)?;
        zip.write_all(pcm)?;
    }

    if let Some(seo) = bundle.seo {
        zip.start_file("seo_data.json", options)?;
        zip.write_all(&serde_json::to_vec_pretty(seo)?)?;
    }

    zip.finish()?;
    Ok(())
}

/// Write the bundle to `path`. Failures surface as a single `PackagingFailed`
/// and leave no partial archive behind.
pub fn export_bundle(path: &Path, bundle: &ExportBundle) -> Result<PathBuf> {
    let result = File::create(path)
        .map_err(IdeatorError::from)
        .and_then(|file| write_bundle(file, bundle));
    match result {
        Ok(()) => Ok(path.to_path_buf()),
        Err(e) => {
            let _ = std::fs::remove_file(path);
            Err(IdeatorError::PackagingFailed {
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use zip::ZipArchive;

    use super::*;

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut entry = archive.by_name(name).unwrap();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn script_round_trips_byte_exact() {
        let script = "안녕하세요.\nToday we talk about cats.\n";
        let bundle = ExportBundle {
            script,
            ..Default::default()
        };

        let mut cursor = Cursor::new(Vec::new());
        write_bundle(&mut cursor, &bundle).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(read_entry(&mut archive, "script.txt"), script.as_bytes());
    }

    #[test]
    fn full_bundle_contains_every_artifact() {
        let subtitles = vec![SubtitleSegment {
            index: 1,
            start: "00:00:00,000".into(),
            end: "00:00:02,000".into(),
            text: "hi".into(),
        }];
        let images: Vec<&[u8]> = vec![b"png-1", b"png-2"];
        let clips: Vec<&[u8]> = vec![b"mp4-1"];
        let bundle = ExportBundle {
            script: "script",
            subtitles: &subtitles,
            images,
            clips,
            narration_pcm: Some(b"pcm"),
            seo: None,
        };

        let mut cursor = Cursor::new(Vec::new());
        write_bundle(&mut cursor, &bundle).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "script.txt",
                "subtitles.srt",
                "subtitles.json",
                "images/scene_001.png",
                "images/scene_002.png",
                "videos/clip_001.mp4",
                "voiceover.pcm",
            ]
        );

        let srt = read_entry(&mut archive, "subtitles.srt");
        assert!(String::from_utf8(srt).unwrap().contains("00:00:00,000 --> 00:00:02,000"));
        let parsed: Vec<SubtitleSegment> =
            serde_json::from_slice(&read_entry(&mut archive, "subtitles.json")).unwrap();
        assert_eq!(parsed, subtitles);
    }

    #[test]
    fn empty_subtitles_skip_both_subtitle_files() {
        let bundle = ExportBundle {
            script: "s",
            ..Default::default()
        };
        let mut cursor = Cursor::new(Vec::new());
        write_bundle(&mut cursor, &bundle).unwrap();
        let archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn failed_export_leaves_no_partial_archive() {
        let path = std::env::temp_dir()
            .join("ideator-no-such-dir")
            .join("bundle.zip");
        let bundle = ExportBundle {
            script: "s",
            ..Default::default()
        };
        assert!(matches!(
            export_bundle(&path, &bundle),
            Err(IdeatorError::PackagingFailed { .. })
        ));
        assert!(!path.exists());
    }
}
