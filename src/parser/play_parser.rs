use std::collections::HashMap;
use tracing::debug;
use crate::models::{Act, Character, Conf, Line, Play, Scene};
use crate::parser::parse_error::{ParseError, ParseResult};
use crate::utils::{non_empty, ScriptConstants, HEADING_REGEX};

/// 按标记分类后的一行剧本（已去掉首尾空白）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine<'a> {
    /// `(…)`，保留括号原样并入当前台词
    StageDirection(&'a str),
    /// `#剧名`
    PlayName(&'a str),
    /// `##幕名`
    ActName(&'a str),
    /// `###场名`
    SceneName(&'a str),
    /// `角色: 台词`
    Dialogue { character: &'a str, text: &'a str },
    Blank,
}

/// 对一行做分类，只检查行本身的格式，不涉及上下文
pub fn classify(index: usize, line: &str) -> ParseResult<ScriptLine<'_>> {
    if line.is_empty() {
        return Ok(ScriptLine::Blank);
    }

    if line.starts_with(ScriptConstants::STAGE_DIRECTION_BEGIN) {
        if !line.ends_with(ScriptConstants::STAGE_DIRECTION_END) {
            return Err(ParseError::invalid_stage_direction(index, line));
        }
        return Ok(ScriptLine::StageDirection(line));
    }

    if let Some(caps) = HEADING_REGEX.captures(line) {
        let name = caps.get(2).map_or("", |m| m.as_str());
        return Ok(match &caps[1] {
            ScriptConstants::SCENE_NAME => ScriptLine::SceneName(name),
            ScriptConstants::ACT_NAME => ScriptLine::ActName(name),
            _ => ScriptLine::PlayName(name),
        });
    }

    let (character, text) = line
        .split_once(ScriptConstants::CHARACTER_NAME_SEPARATOR)
        .ok_or_else(|| ParseError::invalid_character_name(index, line))?;
    Ok(ScriptLine::Dialogue { character: character.trim(), text: text.trim() })
}

/// 剧本解析器。
///
/// 逐行扫描，维护一个小状态机：剧名 → 当前幕 → 当前场 → 正在拼接的台词。
/// 每次遇到新的幕/场/台词，先校验并收尾上一级的内容，再进入新的状态。
pub struct PlayParser {
    line_separator: String,
    characters: HashMap<String, Character>,
    play_name: Option<String>,
    acts: Vec<Act>,
    act_name: Option<String>,
    scenes: Vec<Scene>,
    scene_name: Option<String>,
    lines: Vec<Line>,
    speaker: Option<Character>,
    text: String,
}

impl PlayParser {
    pub fn new() -> Self {
        PlayParser {
            line_separator: "\n".to_string(),
            characters: HashMap::new(),
            play_name: None,
            acts: Vec::new(),
            act_name: None,
            scenes: Vec::new(),
            scene_name: None,
            lines: Vec::new(),
            speaker: None,
            text: String::new(),
        }
    }

    /// 解析整份剧本；任何一行出错都会拒绝整份剧本
    pub fn parse(&mut self, content: &str, cfg: &Conf) -> ParseResult<Play> {
        *self = PlayParser::new();
        self.line_separator = cfg.line_separator.clone();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            match classify(index, line)? {
                ScriptLine::StageDirection(direction) => self.push_text(direction),
                ScriptLine::PlayName(name) => self.declare_play(index, line, name)?,
                ScriptLine::ActName(name) => self.declare_act(index, line, name)?,
                ScriptLine::SceneName(name) => self.declare_scene(index, line, name)?,
                ScriptLine::Dialogue { character, text } => {
                    self.start_line(index, line, character, text)?
                }
                ScriptLine::Blank if cfg.skip_blank_lines => continue,
                ScriptLine::Blank => return Err(ParseError::invalid_character_name(index, line)),
            }
        }

        // 文件末尾不再检查空幕/空场，直接收尾
        self.finish_line();
        self.finish_scene();
        self.finish_act();

        let play = Play::new(self.play_name.take().unwrap_or_default(), std::mem::take(&mut self.acts));
        debug!(
            play = %play.name,
            acts = play.acts.len(),
            scenes = play.scene_count(),
            characters = self.characters.len(),
            "parsed play"
        );
        Ok(play)
    }

    fn declare_play(&mut self, index: usize, line: &str, name: &str) -> ParseResult<()> {
        if self.play_name.is_some() {
            return Err(ParseError::play_name_declared_twice(index, line));
        }
        self.play_name = non_empty(name);
        Ok(())
    }

    fn declare_act(&mut self, index: usize, line: &str, name: &str) -> ParseResult<()> {
        if self.play_name.is_none() {
            return Err(ParseError::act_before_play_name(index, line));
        }
        self.finish_line();
        self.check_scene_not_empty(index)?;
        self.finish_scene();
        if let Some(act) = &self.act_name {
            if self.scenes.is_empty() {
                return Err(ParseError::empty_act(index, act));
            }
        }
        self.finish_act();
        self.act_name = non_empty(name);
        Ok(())
    }

    fn declare_scene(&mut self, index: usize, line: &str, name: &str) -> ParseResult<()> {
        if self.act_name.is_none() {
            return Err(ParseError::scene_before_act_name(index, line));
        }
        self.finish_line();
        self.check_scene_not_empty(index)?;
        self.finish_scene();
        self.scene_name = non_empty(name);
        Ok(())
    }

    fn start_line(&mut self, index: usize, line: &str, character: &str, text: &str) -> ParseResult<()> {
        if character.is_empty() {
            return Err(ParseError::invalid_character_name(index, line));
        }
        if text.is_empty() {
            return Err(ParseError::invalid_line(index, line));
        }
        let character = self
            .characters
            .entry(character.to_string())
            .or_insert_with(|| Character::new(character))
            .clone();
        self.finish_line();
        self.speaker = Some(character);
        self.push_text(text);
        Ok(())
    }

    /// 追加到正在拼接的台词；还没有说话人时文本会留给下一句台词
    fn push_text(&mut self, text: &str) {
        if !self.text.is_empty() {
            self.text.push_str(&self.line_separator);
        }
        self.text.push_str(text);
    }

    fn check_scene_not_empty(&self, index: usize) -> ParseResult<()> {
        match &self.scene_name {
            Some(scene) if self.lines.is_empty() => Err(ParseError::empty_scene(
                index,
                scene,
                self.act_name.as_deref().unwrap_or_default(),
            )),
            _ => Ok(()),
        }
    }

    fn finish_line(&mut self) {
        if let Some(speaker) = self.speaker.take() {
            let text = std::mem::take(&mut self.text);
            self.lines.push(Line::new(speaker, text));
        }
    }

    fn finish_scene(&mut self) {
        if let Some(name) = self.scene_name.take() {
            self.scenes.push(Scene::new(name, std::mem::take(&mut self.lines)));
        }
    }

    fn finish_act(&mut self) {
        if let Some(name) = self.act_name.take() {
            self.acts.push(Act::new(name, std::mem::take(&mut self.scenes)));
            self.scene_name = None;
        }
    }
}

impl Default for PlayParser {
    fn default() -> Self {
        Self::new()
    }
}
