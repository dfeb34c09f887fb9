use crate::types::{
    AnalysisResult, Concept, DiscoveredVideo, ScriptOutline, SubtitleSegment,
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`)
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`) into seconds
pub fn parse_srt_timestamp(ts: &str) -> Option<f64> {
    let (hms, ms) = ts.trim().split_once(',')?;
    let mut parts = hms.split(':');
    let h: u64 = parts.next()?.parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let s: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let ms: u64 = ms.parse().ok()?;
    Some((h * 3600 + m * 60 + s) as f64 + ms as f64 / 1000.0)
}

/// Render subtitle cues as an SRT document
pub fn format_srt(subtitles: &[SubtitleSegment]) -> String {
    let mut out = String::new();
    for sub in subtitles {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            sub.index, sub.start, sub.end, sub.text
        ));
    }
    out
}

/// Format generated concepts as human-readable text
pub fn format_concepts_readable(concepts: &[Concept]) -> String {
    let mut out = String::new();
    for (i, c) in concepts.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (virality {}/100)\n",
            i + 1,
            c.title,
            c.estimated_virality
        ));
        out.push_str(&format!("   {}\n", c.description));
        if let Some(t) = &c.translated_title {
            out.push_str(&format!("   ({})\n", t));
        }
        out.push_str(&format!(
            "   style: {} | audience: {}\n\n",
            c.style, c.target_audience
        ));
    }
    out
}

/// Format an analysis result as human-readable markdown
pub fn format_analysis_readable(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str("## Audience Reaction\n\n");
    out.push_str(&result.audience_reaction);
    out.push_str("\n\n");

    out.push_str("## Frequent Keywords\n\n");
    for kw in &result.frequent_keywords {
        out.push_str(&format!("• {}\n", kw));
    }
    out.push('\n');

    out.push_str("## Recommended Topics\n\n");
    for (i, topic) in result.recommended_topics.iter().enumerate() {
        out.push_str(&format!("{}. {}: {}\n", i + 1, topic.keyword, topic.reason));
    }
    out.push('\n');

    out.push_str("## SEO Strategy\n\n");
    for (label, seo) in [
        ("Short-form", &result.seo_data.short),
        ("Long-form", &result.seo_data.long),
    ] {
        out.push_str(&format!("### {}\n\n", label));
        out.push_str(&format!(
            "YouTube: {}\n  {}\n  tags: {}\n",
            seo.youtube.title,
            seo.youtube.description,
            seo.youtube.tags.join(", ")
        ));
        out.push_str(&format!(
            "TikTok: {}\n  {}\n  {}\n\n",
            seo.tiktok.title,
            seo.tiktok.caption,
            seo.tiktok.hashtags.join(" ")
        ));
    }

    out
}

/// Format a script outline as human-readable text
pub fn format_outline_readable(outline: &ScriptOutline) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", outline.title));
    for (i, section) in outline.sections.iter().enumerate() {
        out.push_str(&format!("{}. {}\n   {}\n", i + 1, section.label, section.content));
    }
    out
}

/// One-line summary of a discovered video for list output
pub fn format_video_row(video: &DiscoveredVideo) -> String {
    format!(
        "{:<12} {:>10} views  {:>9} subs  {:>8.1}%  {}",
        video.id,
        video.view_count,
        video.subscriber_count,
        video.efficiency_ratio,
        video.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_mm_ss() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(75.4), "01:15");
    }

    #[test]
    fn srt_timestamp_round_trip() {
        for secs in [0.0, 1.5, 59.999, 61.25, 3599.0, 3661.042] {
            let ts = format_srt_timestamp(secs);
            let parsed = parse_srt_timestamp(&ts).unwrap();
            assert!((parsed - secs).abs() < 0.001, "{} -> {} -> {}", secs, ts, parsed);
        }
    }

    #[test]
    fn parse_srt_timestamp_rejects_garbage() {
        assert_eq!(parse_srt_timestamp("not a timestamp"), None);
        assert_eq!(parse_srt_timestamp("00:00:00"), None);
        assert_eq!(parse_srt_timestamp("00:00:00,0a0"), None);
    }

    #[test]
    fn srt_rendering() {
        let subs = vec![
            SubtitleSegment {
                index: 1,
                start: "00:00:00,000".into(),
                end: "00:00:02,500".into(),
                text: "Hello".into(),
            },
            SubtitleSegment {
                index: 2,
                start: "00:00:02,500".into(),
                end: "00:00:05,000".into(),
                text: "World".into(),
            },
        ];
        let srt = format_srt(&subs);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,500\nHello\n\n2\n00:00:02,500 --> 00:00:05,000\nWorld\n\n"
        );
    }
}
