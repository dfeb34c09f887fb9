use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{
    error::Result,
    types::FavoriteProject,
};

/// Typed change notifications, one event per concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    CredentialsChanged,
    FavoritesChanged,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    gemini_api_key: Option<String>,
    #[serde(default)]
    youtube_api_key: Option<String>,
    #[serde(default)]
    favorites: Vec<FavoriteProject>,
}

/// File-backed settings and favorites store with explicit get/set/subscribe.
///
/// Every read goes to disk and every write is a read-modify-write of the whole
/// file; concurrent processes are last-write-wins, which is acceptable for a
/// single-user local store.
pub struct SettingsStore {
    path: PathBuf,
    events: broadcast::Sender<StoreEvent>,
}

impl SettingsStore {
    pub fn open_default() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ideator");
        Self::at(dir.join("settings.json"))
    }

    pub fn at(path: PathBuf) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { path, events }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: StoreEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn load(&self) -> SettingsFile {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return SettingsFile::default();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    fn save(&self, file: &SettingsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(file)?)?;
        Ok(())
    }

    /// Stored Gemini key, falling back to the `GEMINI_API_KEY` environment variable.
    pub fn gemini_api_key(&self) -> Option<String> {
        self.load()
            .gemini_api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Stored YouTube key, falling back to the `YT_API_KEY` environment variable.
    pub fn youtube_api_key(&self) -> Option<String> {
        self.load()
            .youtube_api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("YT_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn set_gemini_api_key(&self, key: &str) -> Result<()> {
        let mut file = self.load();
        file.gemini_api_key = Some(key.to_string());
        self.save(&file)?;
        self.notify(StoreEvent::CredentialsChanged);
        Ok(())
    }

    pub fn set_youtube_api_key(&self, key: &str) -> Result<()> {
        let mut file = self.load();
        file.youtube_api_key = Some(key.to_string());
        self.save(&file)?;
        self.notify(StoreEvent::CredentialsChanged);
        Ok(())
    }

    pub fn favorites(&self) -> Vec<FavoriteProject> {
        self.load().favorites
    }

    /// Save a favorite. An existing entry with the same id is replaced.
    pub fn add_favorite(&self, favorite: FavoriteProject) -> Result<()> {
        let mut file = self.load();
        file.favorites.retain(|f| f.id != favorite.id);
        file.favorites.push(favorite);
        self.save(&file)?;
        self.notify(StoreEvent::FavoritesChanged);
        Ok(())
    }

    /// Remove a favorite by id. Returns whether anything was removed.
    pub fn remove_favorite(&self, id: &str) -> Result<bool> {
        let mut file = self.load();
        let before = file.favorites.len();
        file.favorites.retain(|f| f.id != id);
        let removed = file.favorites.len() != before;
        if removed {
            self.save(&file)?;
            self.notify(StoreEvent::FavoritesChanged);
        }
        Ok(removed)
    }

    pub fn find_favorite(&self, id: &str) -> Option<FavoriteProject> {
        self.favorites().into_iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::types::{DiscoveredVideo, efficiency_ratio};

    fn temp_store() -> SettingsStore {
        let path = std::env::temp_dir()
            .join(format!("ideator-store-{}", Uuid::new_v4()))
            .join("settings.json");
        SettingsStore::at(path)
    }

    fn sample_favorite(id: &str) -> FavoriteProject {
        let views = 1000;
        let subs = 50;
        FavoriteProject {
            id: id.to_string(),
            video: DiscoveredVideo {
                id: id.to_string(),
                title: "title".into(),
                thumbnail: "https://example.invalid/t.jpg".into(),
                published_at: Utc::now(),
                channel_title: "channel".into(),
                channel_id: "c1".into(),
                view_count: views,
                subscriber_count: subs,
                efficiency_ratio: efficiency_ratio(views, subs),
            },
            result: None,
            outline: None,
            saved_at: Utc::now().timestamp_millis(),
        }
    }

    #[test]
    fn favorite_add_then_remove_restores_list() {
        let store = temp_store();
        store.add_favorite(sample_favorite("keep")).unwrap();
        let before = store.favorites();

        store.add_favorite(sample_favorite("temp")).unwrap();
        assert!(store.remove_favorite("temp").unwrap());

        let after = store.favorites();
        assert_eq!(after.len(), before.len());
        assert_eq!(
            after.iter().map(|f| f.id.clone()).collect::<Vec<_>>(),
            before.iter().map(|f| f.id.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn same_id_replaces_instead_of_duplicating() {
        let store = temp_store();
        store.add_favorite(sample_favorite("a")).unwrap();
        store.add_favorite(sample_favorite("a")).unwrap();
        assert_eq!(store.favorites().len(), 1);
    }

    #[test]
    fn remove_missing_id_is_a_noop() {
        let store = temp_store();
        store.add_favorite(sample_favorite("a")).unwrap();
        assert!(!store.remove_favorite("nope").unwrap());
        assert_eq!(store.favorites().len(), 1);
    }

    #[tokio::test]
    async fn subscribe_sees_typed_events() {
        let store = temp_store();
        let mut rx = store.subscribe();

        store.set_gemini_api_key("k").unwrap();
        store.add_favorite(sample_favorite("a")).unwrap();

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::CredentialsChanged);
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::FavoritesChanged);
    }
}
