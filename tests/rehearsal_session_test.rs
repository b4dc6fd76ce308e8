use std::fs;
use std::sync::Arc;
use async_trait::async_trait;
use learnlines_rust::models::{ActSceneId, Conf, Position, ProgressRecord};
use learnlines_rust::session::{RehearsalSession, SessionError};
use learnlines_rust::store::{PlayDatabase, PlayStore, ProgressStore, StoreError, StoreResult};

fn fixture() -> String {
    fs::read_to_string("tests/test_data/le_jeu.play").expect("无法读取测试文件")
}

fn session(db: &Arc<PlayDatabase>) -> RehearsalSession {
    RehearsalSession::new(db.clone(), db.clone(), Conf::default())
}

#[tokio::test]
async fn test_import_select_and_advance() {
    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);

    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    assert_eq!(session.play_names().await.unwrap(), vec!["le_jeu"]);
    assert_eq!(session.engine().play_name(), Some("Le Jeu de l'amour et du hasard"));
    assert!(session.engine().me().is_none());

    session.select_character(Some("Silvia"));
    assert_eq!(
        session.engine().my_act_scenes(),
        &[ActSceneId::new(0, 0), ActSceneId::new(0, 1)]
    );
    assert_eq!(session.engine().position(), Position::new(0, 0));

    assert_eq!(session.next_line(), Some(0));
    assert_eq!(session.engine().position(), Position::new(0, 2));
    assert_eq!(session.next_line(), Some(2));
    assert_eq!(session.next_line(), Some(4));
    assert!(!session.engine().has_next_line());
    assert_eq!(session.engine().visible_lines().unwrap().lines.len(), 5);

    session.flush().await;
    let record = db.get_progress("le_jeu").await.unwrap().unwrap();
    assert_eq!(
        record,
        ProgressRecord {
            play_name: "le_jeu".to_string(),
            character: Some("Silvia".to_string()),
            act_scene_index: Some(0),
            line_index: Some(4),
        }
    );
    assert_eq!(db.current_play().await.unwrap().as_deref(), Some("le_jeu"));
}

#[tokio::test]
async fn test_restore_resumes_saved_position() {
    let db = Arc::new(PlayDatabase::in_memory());
    {
        let mut first = session(&db);
        first.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
        first.select_character(Some("Silvia"));
        first.next_line();
        first.flush().await;
    }

    let mut second = session(&db);
    assert!(second.restore().await.unwrap());
    assert_eq!(second.play_key(), Some("le_jeu"));
    assert_eq!(second.engine().me().map(|c| c.name.as_str()), Some("Silvia"));
    assert_eq!(second.engine().position(), Position::new(0, 2));
    assert_eq!(second.engine().visible_lines().unwrap().lines.len(), 2);

    second.next_act_scene();
    assert_eq!(second.engine().position(), Position::new(1, 1));
    assert!(!second.engine().has_next_act_scene());
    assert_eq!(second.reset_act_scene(), Some(1));
}

#[tokio::test]
async fn test_restore_without_current_play() {
    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);
    assert!(!session.restore().await.unwrap());
    assert!(session.engine().play().is_none());
}

#[tokio::test]
async fn test_invalid_import_leaves_state_untouched() {
    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);
    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    session.select_character(Some("Lisette"));

    let err = session.insert_and_set_play("broken", "#P\n#Q\n").await.unwrap_err();
    match err {
        SessionError::Parse(e) => assert_eq!(e.line, 1),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.play_key(), Some("le_jeu"));
    assert_eq!(session.engine().me().map(|c| c.name.as_str()), Some("Lisette"));
    assert!(db.get_play("broken").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_play_clears_engine() {
    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);
    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();

    let err = session.load_play("absent").await.unwrap_err();
    assert!(matches!(err, SessionError::PlayNotFound(name) if name == "absent"));
    assert!(session.engine().play().is_none());
    assert!(session.play_key().is_none());
    assert!(session.engine().visible_lines().is_none());
}

#[tokio::test]
async fn test_reimport_resets_progress() {
    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);
    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    session.select_character(Some("Silvia"));
    session.flush().await;

    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    assert!(session.engine().me().is_none());
    session.flush().await;
    let record = db.get_progress("le_jeu").await.unwrap().unwrap();
    assert!(record.character.is_none());
}

#[tokio::test]
async fn test_clear_play() {
    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);
    let mut names = session.subscribe_play_names();
    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    assert_eq!(*names.borrow_and_update(), vec!["le_jeu"]);

    session.select_character(Some("Arlequin"));
    session.next_line();
    session.clear_play().await.unwrap();
    session.flush().await;

    assert!(names.has_changed().unwrap());
    assert!(names.borrow_and_update().is_empty());
    assert!(db.get_progress("le_jeu").await.unwrap().is_none());
    assert!(db.current_play().await.unwrap().is_none());
    assert!(session.engine().play().is_none());

    // 没有剧本时的操作都是空操作
    assert_eq!(session.next_line(), None);
    assert_eq!(session.next_act_scene(), None);
}

#[tokio::test]
async fn test_saves_keep_submission_order() {
    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);
    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    session.select_character(Some("Lisette"));
    for _ in 0..3 {
        session.next_line();
        session.next_act_scene();
    }
    session.flush().await;

    let record = db.get_progress("le_jeu").await.unwrap().unwrap();
    let expected = session.engine().position();
    assert_eq!(record.act_scene_index, Some(expected.act_scene_index));
    assert_eq!(record.line_index, Some(expected.line_index - 1));
}

struct FailingProgressStore;

#[async_trait]
impl ProgressStore for FailingProgressStore {
    async fn get_progress(&self, _play_name: &str) -> StoreResult<Option<ProgressRecord>> {
        Ok(None)
    }

    async fn put_progress(&self, _record: &ProgressRecord) -> StoreResult<()> {
        Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
    }

    async fn delete_progress(&self, _play_name: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn current_play(&self) -> StoreResult<Option<String>> {
        Ok(None)
    }

    async fn set_current_play(&self, _name: Option<&str>) -> StoreResult<()> {
        Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
    }
}

#[tokio::test]
async fn test_failed_saves_do_not_affect_session() {
    let plays = Arc::new(PlayDatabase::in_memory());
    let mut session = RehearsalSession::new(plays, Arc::new(FailingProgressStore), Conf::default());
    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    session.select_character(Some("Silvia"));
    session.next_line();
    session.flush().await;
    assert_eq!(session.engine().position(), Position::new(0, 2));
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learnlines.json");
    {
        let db = Arc::new(PlayDatabase::open(&path).await.unwrap());
        let mut session = session(&db);
        session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
        session.select_character(Some("Monsieur Orgon"));
        session.next_line();
        session.flush().await;
    }

    let db = Arc::new(PlayDatabase::open(&path).await.unwrap());
    let mut session = session(&db);
    assert!(session.restore().await.unwrap());
    assert_eq!(session.engine().me().map(|c| c.name.as_str()), Some("Monsieur Orgon"));
    assert_eq!(session.engine().position(), Position::new(0, 2));
}

#[tokio::test(start_paused = true)]
async fn test_scroll_target_is_immediate_and_user_scroll_is_debounced() {
    use learnlines_rust::store::Screen;
    use std::time::Duration;

    let db = Arc::new(PlayDatabase::in_memory());
    let mut session = session(&db);
    session.insert_and_set_play("le_jeu", &fixture()).await.unwrap();
    session.select_character(Some("Silvia"));
    session.next_line();
    assert_eq!(session.next_line(), Some(2));

    // 推进台词返回的滚动目标不写入用户滚动位置
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(session.scroll_positions().get(Screen::Learn), 0);

    session.record_scroll(Screen::Learn, 5);
    session.record_scroll(Screen::Learn, 9);
    assert_eq!(session.scroll_positions().get(Screen::Learn), 0);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(session.scroll_positions().get(Screen::Learn), 9);
    assert_eq!(session.scroll_positions().get(Screen::Read), 0);
}

struct FailingPlayStore {
    inner: PlayDatabase,
}

#[async_trait]
impl PlayStore for FailingPlayStore {
    async fn get_play(&self, name: &str) -> StoreResult<Option<String>> {
        self.inner.get_play(name).await
    }

    async fn put_play(&self, _name: &str, _content: &str) -> StoreResult<()> {
        Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "read-only")))
    }

    async fn delete_play(&self, name: &str) -> StoreResult<()> {
        self.inner.delete_play(name).await
    }

    async fn list_play_names(&self) -> StoreResult<Vec<String>> {
        self.inner.list_play_names().await
    }

    fn subscribe_play_names(&self) -> tokio::sync::watch::Receiver<Vec<String>> {
        self.inner.subscribe_play_names()
    }
}

#[tokio::test]
async fn test_failed_import_keeps_old_progress() {
    let inner = PlayDatabase::in_memory();
    inner.put_play("le_jeu", &fixture()).await.unwrap();
    let plays = Arc::new(FailingPlayStore { inner });
    let progress = Arc::new(PlayDatabase::in_memory());
    let mut record = ProgressRecord::new("le_jeu");
    record.character = Some("Silvia".to_string());
    record.line_index = Some(1);
    progress.put_progress(&record).await.unwrap();

    let mut session = RehearsalSession::new(plays.clone(), progress.clone(), Conf::default());
    let err = session.insert_and_set_play("le_jeu", &fixture()).await.unwrap_err();
    assert!(matches!(err, SessionError::Store(_)));
    assert_eq!(progress.get_progress("le_jeu").await.unwrap(), Some(record));
    assert_eq!(plays.get_play("le_jeu").await.unwrap(), Some(fixture()));
}
