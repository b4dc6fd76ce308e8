pub mod models;
pub mod utils;
pub mod parser;
pub mod progression;
pub mod store;
pub mod session;
pub mod api;

pub use models::{
    Character,
    Line,
    Scene,
    Act,
    Play,
    ActSceneId,
    Position,
    ProgressRecord,
    Conf
};

pub use parser::{
    PlayParser,
    ParseError,
    ParseResult
};

pub use progression::{
    ProgressionEngine,
    SceneView
};

pub use store::{
    PlayStore,
    ProgressStore,
    PlayDatabase,
    Screen,
    ScrollPositions,
    StoreError
};

pub use session::{
    RehearsalSession,
    SessionError
};

pub use api::{
    PlaySummary,
    ParseReport,
    play_summary,
    parse_play_text,
    parse_play_text_json
};

/// 解析剧本文本
///
/// # Arguments
///
/// * `script` - 剧本文本
/// * `config` - 配置对象
///
/// # Returns
///
/// 解析出的剧本；格式错误时返回带行号的错误
pub fn parse(script: &str, config: &Conf) -> ParseResult<Play> {
    let mut parser = PlayParser::new();
    parser.parse(script, config)
}
