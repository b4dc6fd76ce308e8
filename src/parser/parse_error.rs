use thiserror::Error;

/// 剧本解析错误：整份剧本被拒绝，不返回部分结果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    /// 可直接展示给用户的错误信息
    pub message: String,
    /// 出错的源行号(从0开始)
    pub line: usize,
}

pub type ParseResult<T> = Result<T, ParseError>;

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        ParseError { message: message.into(), line }
    }

    pub fn invalid_stage_direction(line: usize, text: &str) -> Self {
        Self::new(format!("Invalid stage direction at line {}: {}", line, text), line)
    }

    pub fn play_name_declared_twice(line: usize, text: &str) -> Self {
        Self::new(format!("Play name declared twice at line {}: {}", line, text), line)
    }

    pub fn act_before_play_name(line: usize, text: &str) -> Self {
        Self::new(format!("Act is declared before play name at line {}: {}", line, text), line)
    }

    pub fn scene_before_act_name(line: usize, text: &str) -> Self {
        Self::new(format!("Scene is declared before act name at line {}: {}", line, text), line)
    }

    pub fn invalid_character_name(line: usize, text: &str) -> Self {
        Self::new(format!("Invalid character name at line {}: {}", line, text), line)
    }

    pub fn invalid_line(line: usize, text: &str) -> Self {
        Self::new(format!("Invalid line at line {}: {}", line, text), line)
    }

    pub fn empty_act(line: usize, act: &str) -> Self {
        Self::new(format!("Illegal empty act: {}", act), line)
    }

    pub fn empty_scene(line: usize, scene: &str, act: &str) -> Self {
        Self::new(format!("Illegal empty scene: {} ({})", scene, act), line)
    }
}
