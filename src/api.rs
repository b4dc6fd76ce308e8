//! 面向外部调用方的简单接口
//!
//! 返回可直接序列化的结果，不需要调用方了解解析器和模型的细节。

use serde::Serialize;
use crate::models::{Conf, Play};
use crate::parser::PlayParser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub name: String,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActSummary {
    pub name: String,
    pub scenes: Vec<SceneSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterSummary {
    pub name: String,
    /// 台词数
    pub lines: usize,
    /// 有台词的幕-场数
    pub scenes: usize,
}

/// 剧本概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaySummary {
    pub name: String,
    pub acts: Vec<ActSummary>,
    pub characters: Vec<CharacterSummary>,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub success: bool,
    pub message: String,
    pub line: Option<usize>,
    pub summary: Option<PlaySummary>,
}

pub fn play_summary(play: &Play) -> PlaySummary {
    let acts = play
        .acts
        .iter()
        .map(|act| ActSummary {
            name: act.name.clone(),
            scenes: act
                .scenes
                .iter()
                .map(|scene| SceneSummary { name: scene.name.clone(), lines: scene.lines.len() })
                .collect(),
        })
        .collect();

    let scenes: Vec<_> = play.acts.iter().flat_map(|act| act.scenes.iter()).collect();
    let characters = play
        .characters()
        .into_iter()
        .map(|character| CharacterSummary {
            lines: scenes
                .iter()
                .flat_map(|scene| scene.lines.iter())
                .filter(|line| line.character == character)
                .count(),
            scenes: scenes.iter().filter(|scene| scene.has_lines_for(&character)).count(),
            name: character.name,
        })
        .collect();

    PlaySummary { name: play.name.clone(), acts, characters }
}

/// 解析剧本文本
pub fn parse_play_text(text: &str, config: Option<Conf>) -> ParseReport {
    let conf = config.unwrap_or_default();
    match PlayParser::new().parse(text, &conf) {
        Ok(play) => ParseReport {
            success: true,
            message: format!("解析成功: {}", play.name),
            line: None,
            summary: Some(play_summary(&play)),
        },
        Err(e) => ParseReport {
            success: false,
            message: e.message,
            line: Some(e.line),
            summary: None,
        },
    }
}

/// 解析剧本文本，返回 JSON 格式结果
pub fn parse_play_text_json(text: &str, config: Option<Conf>) -> String {
    let report = parse_play_text(text, config);
    serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string())
}
