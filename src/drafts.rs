use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub id: u64,
    pub content: String,
    pub created_at: String,
}

#[async_trait]
pub trait DraftBackend: Send + Sync {
    async fn load(&self) -> Result<Vec<PostDraft>, String>;
    async fn replace_all(&self, drafts: &[PostDraft]) -> Result<(), String>;
}

pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DraftBackend for JsonFileBackend {
    async fn load(&self) -> Result<Vec<PostDraft>, String> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| format!("failed to read drafts: {}", err))?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|err| format!("failed to parse drafts: {}", err))
    }

    async fn replace_all(&self, drafts: &[PostDraft]) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(drafts)
            .map_err(|err| format!("failed to serialize drafts: {}", err))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|err| format!("failed to write drafts: {}", err))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|err| format!("failed to finalize drafts: {}", err))?;
        Ok(())
    }
}

pub struct DraftStore<B> {
    backend: B,
    drafts: Mutex<Vec<PostDraft>>,
}

impl<B: DraftBackend> DraftStore<B> {
    pub async fn open(backend: B) -> Result<Self, String> {
        let drafts = backend.load().await?;
        Ok(Self {
            backend,
            drafts: Mutex::new(drafts),
        })
    }

    pub async fn list(&self) -> Vec<PostDraft> {
        let guard = self.drafts.lock().await;
        guard.clone()
    }

    pub async fn save(&self, content: &str) -> Result<PostDraft, String> {
        if content.trim().is_empty() {
            return Err("draft content is empty".to_string());
        }

        let mut guard = self.drafts.lock().await;
        let draft = PostDraft {
            id: next_id(&guard),
            content: content.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let mut updated = guard.clone();
        updated.push(draft.clone());
        self.backend.replace_all(&updated).await?;
        *guard = updated;
        Ok(draft)
    }

    pub async fn delete(&self, draft_id: u64) -> Result<bool, String> {
        let mut guard = self.drafts.lock().await;
        let mut updated = guard.clone();
        updated.retain(|draft| draft.id != draft_id);
        if updated.len() == guard.len() {
            return Ok(false);
        }

        self.backend.replace_all(&updated).await?;
        *guard = updated;
        Ok(true)
    }
}

// Ids are creation timestamps; a save landing in the same millisecond as the
// previous one bumps past it to keep ids unique.
fn next_id(drafts: &[PostDraft]) -> u64 {
    let now = now_ms();
    match drafts.iter().map(|draft| draft.id).max() {
        Some(max) if max >= now => max + 1,
        _ => now,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

async fn ensure_dir(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| format!("failed to create drafts dir: {}", err))
}
