use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};
use crate::models::ProgressRecord;
use crate::store::{PlayStore, ProgressStore, StoreResult};

/// 随程序附带的示例剧本，新建存储时放入
pub const BUNDLED_PLAY_NAME: &str = "Le Jeu de l'amour et du hasard";
pub const BUNDLED_PLAY: &str = include_str!("../../assets/le_jeu.play");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct DatabaseContent {
    plays: BTreeMap<String, String>,
    progress: BTreeMap<String, ProgressRecord>,
    current_play: Option<String>,
}

/// 剧本和进度的存储。
///
/// 全部内容保存在一个 JSON 文件里，每次写入后整体落盘（先写临时文件再改名）；
/// 没有路径时只在内存中保存。需要显式创建后传给会话，没有全局实例。
#[derive(Debug)]
pub struct PlayDatabase {
    path: Option<PathBuf>,
    content: Mutex<DatabaseContent>,
    names: watch::Sender<Vec<String>>,
}

impl PlayDatabase {
    pub fn in_memory() -> Self {
        Self::with_content(None, DatabaseContent::default())
    }

    /// 打开 JSON 文件，不存在时创建空库
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_seeded(path, &[]).await
    }

    /// 打开 JSON 文件；文件不存在时新建，并放入 `seeds` 中的剧本(剧本名, 原文)
    pub async fn open_seeded(path: impl AsRef<Path>, seeds: &[(&str, &str)]) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                let content: DatabaseContent = serde_json::from_str(&json)?;
                info!(path = %path.display(), plays = content.plays.len(), "opened play database");
                Ok(Self::with_content(Some(path), content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut content = DatabaseContent::default();
                for (name, play) in seeds {
                    content.plays.insert(name.to_string(), play.to_string());
                }
                let db = Self::with_content(Some(path), content);
                {
                    let guard = db.content.lock().await;
                    db.persist(&guard).await?;
                }
                info!(seeded = seeds.len(), "created play database");
                Ok(db)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn with_content(path: Option<PathBuf>, content: DatabaseContent) -> Self {
        let (names, _) = watch::channel(content.plays.keys().cloned().collect());
        PlayDatabase { path, content: Mutex::new(content), names }
    }

    async fn persist(&self, content: &DatabaseContent) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(content)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), "persisted play database");
        Ok(())
    }

    fn publish_names(&self, content: &DatabaseContent) {
        self.names.send_replace(content.plays.keys().cloned().collect());
    }
}

#[async_trait]
impl PlayStore for PlayDatabase {
    async fn get_play(&self, name: &str) -> StoreResult<Option<String>> {
        Ok(self.content.lock().await.plays.get(name).cloned())
    }

    async fn put_play(&self, name: &str, content: &str) -> StoreResult<()> {
        let mut guard = self.content.lock().await;
        guard.plays.insert(name.to_string(), content.to_string());
        self.persist(&guard).await?;
        self.publish_names(&guard);
        Ok(())
    }

    async fn delete_play(&self, name: &str) -> StoreResult<()> {
        let mut guard = self.content.lock().await;
        guard.plays.remove(name);
        guard.progress.remove(name);
        if guard.current_play.as_deref() == Some(name) {
            guard.current_play = None;
        }
        self.persist(&guard).await?;
        self.publish_names(&guard);
        Ok(())
    }

    async fn list_play_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.content.lock().await.plays.keys().cloned().collect())
    }

    fn subscribe_play_names(&self) -> watch::Receiver<Vec<String>> {
        self.names.subscribe()
    }
}

#[async_trait]
impl ProgressStore for PlayDatabase {
    async fn get_progress(&self, play_name: &str) -> StoreResult<Option<ProgressRecord>> {
        Ok(self.content.lock().await.progress.get(play_name).cloned())
    }

    async fn put_progress(&self, record: &ProgressRecord) -> StoreResult<()> {
        let mut guard = self.content.lock().await;
        guard.progress.insert(record.play_name.clone(), record.clone());
        self.persist(&guard).await
    }

    async fn delete_progress(&self, play_name: &str) -> StoreResult<()> {
        let mut guard = self.content.lock().await;
        guard.progress.remove(play_name);
        self.persist(&guard).await
    }

    async fn current_play(&self) -> StoreResult<Option<String>> {
        Ok(self.content.lock().await.current_play.clone())
    }

    async fn set_current_play(&self, name: Option<&str>) -> StoreResult<()> {
        let mut guard = self.content.lock().await;
        guard.current_play = name.map(str::to_string);
        self.persist(&guard).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn names_are_sorted_and_published() {
        let db = PlayDatabase::in_memory();
        let mut names = db.subscribe_play_names();
        assert!(names.borrow().is_empty());

        db.put_play("Tartuffe", "#Tartuffe").await.unwrap();
        db.put_play("Le Cid", "#Le Cid").await.unwrap();
        assert!(names.has_changed().unwrap());
        assert_eq!(*names.borrow_and_update(), vec!["Le Cid", "Tartuffe"]);
        assert_eq!(db.list_play_names().await.unwrap(), vec!["Le Cid", "Tartuffe"]);

        db.put_play("Le Cid", "#Le Cid\n").await.unwrap();
        assert_eq!(db.get_play("Le Cid").await.unwrap().as_deref(), Some("#Le Cid\n"));
        assert!(db.get_play("Phèdre").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_play_deletes_its_progress() {
        let db = PlayDatabase::in_memory();
        db.put_play("P", "#P").await.unwrap();
        db.put_progress(&ProgressRecord::new("P")).await.unwrap();
        db.set_current_play(Some("P")).await.unwrap();

        db.delete_play("P").await.unwrap();
        assert!(db.get_progress("P").await.unwrap().is_none());
        assert!(db.current_play().await.unwrap().is_none());
        assert!(db.list_play_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_file_database_is_seeded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plays.json");
        let seeds = [(BUNDLED_PLAY_NAME, BUNDLED_PLAY)];
        {
            let db = PlayDatabase::open_seeded(&path, &seeds).await.unwrap();
            assert_eq!(db.list_play_names().await.unwrap(), vec![BUNDLED_PLAY_NAME]);
            assert!(path.exists());
            db.delete_play(BUNDLED_PLAY_NAME).await.unwrap();
        }

        // 已存在的文件不再放入示例剧本
        let db = PlayDatabase::open_seeded(&path, &seeds).await.unwrap();
        assert!(db.list_play_names().await.unwrap().is_empty());
    }

    #[test]
    fn bundled_play_parses_under_its_name() {
        let play = crate::parse(BUNDLED_PLAY, &crate::models::Conf::default()).unwrap();
        assert_eq!(play.name, BUNDLED_PLAY_NAME);
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plays.json");
        {
            let db = PlayDatabase::open(&path).await.unwrap();
            db.put_play("P", "#P").await.unwrap();
            let mut record = ProgressRecord::new("P");
            record.character = Some("Alice".to_string());
            record.line_index = Some(3);
            db.put_progress(&record).await.unwrap();
            db.set_current_play(Some("P")).await.unwrap();
        }

        let db = PlayDatabase::open(&path).await.unwrap();
        assert_eq!(db.get_play("P").await.unwrap().as_deref(), Some("#P"));
        let record = db.get_progress("P").await.unwrap().unwrap();
        assert_eq!(record.character.as_deref(), Some("Alice"));
        assert_eq!(record.line_index, Some(3));
        assert_eq!(db.current_play().await.unwrap().as_deref(), Some("P"));
        assert_eq!(*db.subscribe_play_names().borrow(), vec!["P"]);
    }
}
