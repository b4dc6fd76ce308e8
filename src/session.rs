//! 排练会话
//!
//! 把解析器、进度引擎和存储串起来：载入剧本、导入新剧本、删除剧本，
//! 以及每次操作后的进度保存。

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};
use crate::models::{ActSceneId, Conf, ProgressRecord};
use crate::parser::{ParseError, PlayParser};
use crate::progression::ProgressionEngine;
use crate::store::{PlayStore, ProgressStore, Screen, ScrollPositions, StoreError, StoreResult};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("剧本解析失败: {0}")]
    Parse(#[from] ParseError),

    #[error("存储错误: {0}")]
    Store(#[from] StoreError),

    #[error("找不到剧本: {0}")]
    PlayNotFound(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

enum SaveCommand {
    Save(ProgressRecord),
    Flush(oneshot::Sender<()>),
}

/// 后台保存队列：按提交顺序逐条写入，旧的进度不会覆盖新的进度
struct ProgressSaver {
    tx: mpsc::UnboundedSender<SaveCommand>,
}

impl ProgressSaver {
    fn spawn(store: Arc<dyn ProgressStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    SaveCommand::Save(record) => {
                        if let Err(e) = Self::write(store.as_ref(), &record).await {
                            warn!(play = %record.play_name, error = %e, "failed to save progress");
                        }
                    }
                    SaveCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        ProgressSaver { tx }
    }

    async fn write(store: &dyn ProgressStore, record: &ProgressRecord) -> StoreResult<()> {
        store.set_current_play(Some(&record.play_name)).await?;
        store.put_progress(record).await
    }

    fn save(&self, record: ProgressRecord) {
        if self.tx.send(SaveCommand::Save(record)).is_err() {
            warn!("progress saver stopped, dropping save");
        }
    }

    async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(SaveCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

/// 一次排练会话。
///
/// 所有操作都由同一个调用方串行执行；修改进度的操作会立即在内存中生效，
/// 保存内容在操作当时就被捕获，随后排队异步写入。必须在 tokio 运行时中创建。
pub struct RehearsalSession {
    conf: Conf,
    engine: ProgressionEngine,
    /// 当前剧本在存储中的名字，可能与剧本里声明的剧名不同
    play_key: Option<String>,
    plays: Arc<dyn PlayStore>,
    progress: Arc<dyn ProgressStore>,
    saver: ProgressSaver,
    scroll: ScrollPositions,
}

impl RehearsalSession {
    pub fn new(plays: Arc<dyn PlayStore>, progress: Arc<dyn ProgressStore>, conf: Conf) -> Self {
        let saver = ProgressSaver::spawn(Arc::clone(&progress));
        let scroll = ScrollPositions::from_millis(conf.scroll_debounce_ms);
        RehearsalSession {
            engine: ProgressionEngine::new(conf.palette_size),
            conf,
            play_key: None,
            plays,
            progress,
            saver,
            scroll,
        }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    /// 重新打开上次的剧本；没有上次的剧本时返回 `false`
    pub async fn restore(&mut self) -> SessionResult<bool> {
        match self.progress.current_play().await? {
            Some(name) => {
                self.load_play(&name).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 载入已存储的剧本：读取原文 → 解析 → 读取进度 → 恢复位置。
    ///
    /// 任何一步失败，引擎都回到“没有剧本”的状态。
    pub async fn load_play(&mut self, name: &str) -> SessionResult<()> {
        match self.try_load(name).await {
            Ok(()) => {
                self.save();
                Ok(())
            }
            Err(e) => {
                self.engine.clear();
                self.play_key = None;
                Err(e)
            }
        }
    }

    async fn try_load(&mut self, name: &str) -> SessionResult<()> {
        let content = self
            .plays
            .get_play(name)
            .await?
            .ok_or_else(|| SessionError::PlayNotFound(name.to_string()))?;
        let play = PlayParser::new().parse(&content, &self.conf)?;
        let saved = self.progress.get_progress(name).await?;
        info!(play = %name, restored = saved.is_some(), "loading play");
        self.engine.set_play(Arc::new(play), saved.as_ref());
        self.play_key = Some(name.to_string());
        Ok(())
    }

    /// 导入剧本：先解析，失败时不做任何改动；成功后替换同名剧本并载入
    pub async fn insert_and_set_play(&mut self, name: &str, content: &str) -> SessionResult<()> {
        PlayParser::new().parse(content, &self.conf)?;
        self.saver.flush().await;
        self.plays.put_play(name, content).await?;
        self.progress.delete_progress(name).await?;
        info!(play = %name, "imported play");
        self.load_play(name).await
    }

    /// 删除当前剧本及其进度
    pub async fn clear_play(&mut self) -> SessionResult<()> {
        let Some(name) = self.play_key.clone() else {
            return Ok(());
        };
        self.saver.flush().await;
        self.plays.delete_play(&name).await?;
        self.progress.delete_progress(&name).await?;
        self.progress.set_current_play(None).await?;
        self.engine.clear();
        self.play_key = None;
        info!(play = %name, "cleared play");
        Ok(())
    }

    /// 按名字选择“我”；找不到该角色时取消选择
    pub fn select_character(&mut self, name: Option<&str>) -> Option<usize> {
        let character = name.and_then(|name| {
            self.engine.characters().iter().find(|c| c.name == name).cloned()
        });
        let scroll = self.engine.select_character(character);
        self.save();
        scroll
    }

    pub fn set_act_scene(&mut self, id: ActSceneId) -> Option<usize> {
        let scroll = self.engine.set_act_scene(id);
        self.save();
        scroll
    }

    pub fn reset_act_scene(&mut self) -> Option<usize> {
        let scroll = self.engine.reset_current_act_scene();
        self.save();
        scroll
    }

    pub fn next_act_scene(&mut self) -> Option<usize> {
        let scroll = self.engine.advance_act_scene();
        self.save();
        scroll
    }

    pub fn next_line(&mut self) -> Option<usize> {
        let scroll = self.engine.advance_line();
        self.save();
        scroll
    }

    /// 用户自己滚动后的位置，防抖后生效；与操作返回的滚动目标无关
    pub fn record_scroll(&self, screen: Screen, index: usize) {
        self.scroll.record(screen, index);
    }

    pub fn scroll_positions(&self) -> &ScrollPositions {
        &self.scroll
    }

    pub async fn play_names(&self) -> SessionResult<Vec<String>> {
        Ok(self.plays.list_play_names().await?)
    }

    pub fn subscribe_play_names(&self) -> watch::Receiver<Vec<String>> {
        self.plays.subscribe_play_names()
    }

    /// 等待排队中的保存全部完成
    pub async fn flush(&self) {
        self.saver.flush().await;
    }

    pub fn play_key(&self) -> Option<&str> {
        self.play_key.as_deref()
    }

    fn save(&self) {
        let (Some(key), Some(mut record)) = (&self.play_key, self.engine.progress_record()) else {
            return;
        };
        record.play_name = key.clone();
        self.saver.save(record);
    }
}
