use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("ideator")
}

/// Get the artifact directory for a given project keyword
pub fn get_project_dir(keyword: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    keyword.hash(&mut hasher);
    let keyword_hash = hasher.finish();

    get_root_cache_dir().join(keyword_hash.to_string())
}

pub fn get_outline_path(project_dir: &Path) -> PathBuf {
    project_dir.join("outline.json")
}

/// Path for a cached production plan (format and language aware)
pub fn get_plan_path(project_dir: &Path, format_label: &str, lang: &str) -> PathBuf {
    project_dir.join(format!("plan_{}_{}.json", format_label, lang))
}

pub fn get_script_path(project_dir: &Path) -> PathBuf {
    project_dir.join("script.txt")
}

pub fn get_narration_path(project_dir: &Path) -> PathBuf {
    project_dir.join("narration.pcm")
}

pub fn get_images_dir(project_dir: &Path) -> PathBuf {
    project_dir.join("images")
}

pub fn get_clips_dir(project_dir: &Path) -> PathBuf {
    project_dir.join("clips")
}

pub fn get_assembled_path(project_dir: &Path) -> PathBuf {
    project_dir.join("assembled.webm")
}

pub fn get_bundle_path(project_dir: &Path) -> PathBuf {
    project_dir.join("bundle.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_dir_is_stable_per_keyword() {
        assert_eq!(get_project_dir("cat drama"), get_project_dir("cat drama"));
        assert_ne!(get_project_dir("cat drama"), get_project_dir("dog drama"));
    }

    #[test]
    fn paths_live_under_project_dir() {
        let dir = get_project_dir("k");
        assert!(get_plan_path(&dir, "short-form", "Korean").starts_with(&dir));
        assert!(get_images_dir(&dir).starts_with(&dir));
    }
}
