use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::models::character::Character;

/// 台词：说话角色 + 文本（文本可能由多行物理行用换行拼接而成）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub character: Character,
    pub text: String,
}

impl Line {
    pub fn new(character: Character, text: impl Into<String>) -> Self {
        Line { character, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub lines: Vec<Line>,
}

impl Scene {
    pub fn new(name: impl Into<String>, lines: Vec<Line>) -> Self {
        Scene { name: name.into(), lines }
    }

    /// 场景中是否有该角色的台词
    pub fn has_lines_for(&self, character: &Character) -> bool {
        self.lines.iter().any(|line| &line.character == character)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Act {
    pub name: String,
    pub scenes: Vec<Scene>,
}

impl Act {
    pub fn new(name: impl Into<String>, scenes: Vec<Scene>) -> Self {
        Act { name: name.into(), scenes }
    }
}

/// 剧本根节点，解析完成后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Play {
    pub name: String,
    pub acts: Vec<Act>,
}

/// 幕-场的位置标识。
///
/// 同名的幕或场可以出现多次，所以用在剧本中的下标而不是名字来区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActSceneId {
    pub act: usize,
    pub scene: usize,
}

impl ActSceneId {
    pub fn new(act: usize, scene: usize) -> Self {
        ActSceneId { act, scene }
    }
}

impl Play {
    pub fn new(name: impl Into<String>, acts: Vec<Act>) -> Self {
        Play { name: name.into(), acts }
    }

    /// 所有幕-场按剧本顺序展开
    pub fn act_scenes(&self) -> Vec<ActSceneId> {
        self.acts
            .iter()
            .enumerate()
            .flat_map(|(act_index, act)| {
                (0..act.scenes.len()).map(move |scene_index| ActSceneId::new(act_index, scene_index))
            })
            .collect()
    }

    pub fn act_scene(&self, id: ActSceneId) -> Option<(&Act, &Scene)> {
        let act = self.acts.get(id.act)?;
        let scene = act.scenes.get(id.scene)?;
        Some((act, scene))
    }

    /// 剧中出现过的所有角色（按名字排序、去重）
    pub fn characters(&self) -> Vec<Character> {
        self.acts
            .iter()
            .flat_map(|act| act.scenes.iter())
            .flat_map(|scene| scene.lines.iter())
            .map(|line| line.character.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn scene_count(&self) -> usize {
        self.acts.iter().map(|act| act.scenes.len()).sum()
    }

    pub fn line_count(&self) -> usize {
        self.acts
            .iter()
            .flat_map(|act| act.scenes.iter())
            .map(|scene| scene.lines.len())
            .sum()
    }
}
