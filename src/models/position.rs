use serde::{Deserialize, Serialize};

/// 当前排练进度。
///
/// `line_index` 是当前幕-场中已经显示的台词数，`-1` 表示还什么都没显示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub act_scene_index: usize,
    pub line_index: isize,
}

impl Position {
    pub fn new(act_scene_index: usize, line_index: isize) -> Self {
        Position { act_scene_index, line_index }
    }

    /// 某个幕-场的起点
    pub fn start_of(act_scene_index: usize) -> Self {
        Position { act_scene_index, line_index: -1 }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start_of(0)
    }
}

/// 持久化的进度记录，以剧本名为键。
///
/// 保存的 `line_index` 比引擎内部游标小一：记录的是“最后一行已完整显示的台词”，
/// 重新打开时以它为游标再推进一次即可还原。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub play_name: String,
    pub character: Option<String>,
    pub act_scene_index: Option<usize>,
    pub line_index: Option<isize>,
}

impl ProgressRecord {
    pub fn new(play_name: impl Into<String>) -> Self {
        ProgressRecord {
            play_name: play_name.into(),
            character: None,
            act_scene_index: None,
            line_index: None,
        }
    }

    /// 记录中的起始位置，缺失的字段取默认值，行号不小于 -1
    pub fn position(&self) -> Position {
        Position::new(
            self.act_scene_index.unwrap_or(0),
            self.line_index.unwrap_or(-1).max(-1),
        )
    }
}
