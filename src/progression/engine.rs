use std::sync::Arc;
use tracing::{debug, warn};
use crate::models::{Act, ActSceneId, Character, Line, Play, Position, ProgressRecord, Scene};

/// 某个幕-场当前可见的台词
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneView<'a> {
    pub id: ActSceneId,
    pub act: &'a Act,
    pub scene: &'a Scene,
    pub lines: &'a [Line],
}

impl SceneView<'_> {
    /// 显示用标题，例如 `Acte I / Scène 2`
    pub fn title(&self) -> String {
        format!("{} / {}", self.act.name, self.scene.name)
    }
}

/// 排练进度引擎。
///
/// 持有一份剧本和选定的角色（“我”），只保留“我”有台词的幕-场，
/// 每次推进都把当前场景的台词一直显示到下一句属于“我”的台词为止。
/// 所有操作都是同步的；调用方负责串行访问。
/// 在没有剧本或没有角色时调用任何操作都是安全的空操作。
#[derive(Debug, Clone)]
pub struct ProgressionEngine {
    play: Option<Arc<Play>>,
    act_scenes: Vec<ActSceneId>,
    characters: Vec<Character>,
    me: Option<Character>,
    my_act_scenes: Vec<ActSceneId>,
    position: Position,
    visible: usize,
    has_next_line: bool,
    has_next_act_scene: bool,
    palette_size: usize,
}

impl ProgressionEngine {
    pub fn new(palette_size: usize) -> Self {
        ProgressionEngine {
            play: None,
            act_scenes: Vec::new(),
            characters: Vec::new(),
            me: None,
            my_act_scenes: Vec::new(),
            position: Position::default(),
            visible: 0,
            has_next_line: false,
            has_next_act_scene: false,
            palette_size,
        }
    }

    /// 载入剧本，可选地从保存的进度恢复角色和位置
    pub fn set_play(&mut self, play: Arc<Play>, saved: Option<&ProgressRecord>) {
        let palette_size = self.palette_size;
        *self = ProgressionEngine::new(palette_size);

        self.act_scenes = play.act_scenes();
        self.characters = play.characters();
        self.me = saved
            .and_then(|record| record.character.as_deref())
            .and_then(|name| self.characters.iter().find(|c| c.name == name).cloned());
        self.play = Some(play);
        self.my_act_scenes = self.filter_my_act_scenes();

        let mut position = saved.map(ProgressRecord::position).unwrap_or_default();
        if self.my_act_scenes.is_empty() {
            position = Position::default();
        } else if position.act_scene_index >= self.my_act_scenes.len() {
            warn!(
                saved = position.act_scene_index,
                available = self.my_act_scenes.len(),
                "saved act-scene out of range, clamping"
            );
            position = Position::start_of(self.my_act_scenes.len() - 1);
        }
        self.position = position;
        self.reveal();
        self.update_has_next_act_scene();
        debug!(
            play = %self.play_name().unwrap_or_default(),
            me = ?self.me.as_ref().map(|c| c.name.as_str()),
            position = ?self.position,
            "play loaded"
        );
    }

    /// 回到“没有剧本”的状态
    pub fn clear(&mut self) {
        *self = ProgressionEngine::new(self.palette_size);
    }

    /// 选择“我”；传 `None` 取消选择。位置回到第一个幕-场的开头。
    pub fn select_character(&mut self, character: Option<Character>) -> Option<usize> {
        self.me = character;
        self.my_act_scenes = self.filter_my_act_scenes();
        debug!(
            me = ?self.me.as_ref().map(|c| c.name.as_str()),
            act_scenes = self.my_act_scenes.len(),
            "character selected"
        );
        self.go_to_act_scene(0)
    }

    /// 跳到“我”的某个幕-场；不在列表中时不做任何改变
    pub fn set_act_scene(&mut self, id: ActSceneId) -> Option<usize> {
        match self.my_act_scenes.iter().position(|candidate| *candidate == id) {
            Some(index) => self.go_to_act_scene(index),
            None => {
                warn!(?id, "act-scene has no lines for the selected character");
                None
            }
        }
    }

    /// 当前幕-场从头开始；返回重置前已显示的台词数，供界面滚回原处
    pub fn reset_current_act_scene(&mut self) -> Option<usize> {
        let previous = usize::try_from(self.position.line_index).ok();
        self.go_to_act_scene(self.position.act_scene_index);
        previous
    }

    /// 下一个幕-场，已是最后一个时不动
    pub fn advance_act_scene(&mut self) -> Option<usize> {
        if self.my_act_scenes.is_empty() {
            return None;
        }
        let next = self.position.act_scene_index.saturating_add(1).min(self.my_act_scenes.len() - 1);
        self.go_to_act_scene(next)
    }

    /// 显示到“我”的下一句台词；返回推进前的游标，供界面滚动
    pub fn advance_line(&mut self) -> Option<usize> {
        self.reveal()
    }

    fn go_to_act_scene(&mut self, act_scene_index: usize) -> Option<usize> {
        self.position = Position::start_of(act_scene_index);
        let previous = self.reveal();
        self.update_has_next_act_scene();
        previous
    }

    /// 从游标之后找“我”的下一句台词，游标停在那一句上：它之前的台词全部可见，
    /// 找不到时整场全部可见。
    fn reveal(&mut self) -> Option<usize> {
        let Some((_, scene)) = self.current() else {
            self.visible = 0;
            self.has_next_line = false;
            return None;
        };
        let Some(me) = self.me.as_ref() else {
            return None;
        };

        let old = self.position.line_index.max(-1);
        let total = scene.lines.len();
        let start = usize::try_from(old.saturating_add(1)).unwrap_or(0);
        let next = scene
            .lines
            .iter()
            .skip(start)
            .position(|line| &line.character == me);
        let cursor = match next {
            Some(offset) => (start + offset) as isize,
            None => total as isize,
        };

        self.position.line_index = cursor;
        self.visible = usize::try_from(cursor).unwrap_or(0).min(total);
        self.has_next_line = self.visible < total;
        debug!(from = old, to = cursor, total, "revealed lines");
        usize::try_from(old).ok()
    }

    fn filter_my_act_scenes(&self) -> Vec<ActSceneId> {
        let (Some(play), Some(me)) = (self.play.as_deref(), self.me.as_ref()) else {
            return Vec::new();
        };
        self.act_scenes
            .iter()
            .copied()
            .filter(|id| {
                play.act_scene(*id)
                    .is_some_and(|(_, scene)| scene.has_lines_for(me))
            })
            .collect()
    }

    fn update_has_next_act_scene(&mut self) {
        self.has_next_act_scene = self.position.act_scene_index.saturating_add(1) < self.my_act_scenes.len();
    }

    fn current(&self) -> Option<(&Act, &Scene)> {
        let id = self.my_act_scenes.get(self.position.act_scene_index)?;
        self.play.as_deref()?.act_scene(*id)
    }

    // 以下为只读视图

    pub fn play(&self) -> Option<&Arc<Play>> {
        self.play.as_ref()
    }

    pub fn play_name(&self) -> Option<&str> {
        self.play.as_deref().map(|play| play.name.as_str())
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn act_scenes(&self) -> &[ActSceneId] {
        &self.act_scenes
    }

    pub fn me(&self) -> Option<&Character> {
        self.me.as_ref()
    }

    pub fn my_act_scenes(&self) -> &[ActSceneId] {
        &self.my_act_scenes
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn has_next_line(&self) -> bool {
        self.has_next_line
    }

    pub fn has_next_act_scene(&self) -> bool {
        self.has_next_act_scene
    }

    /// 当前幕-场已显示的台词
    pub fn visible_lines(&self) -> Option<SceneView<'_>> {
        let id = *self.my_act_scenes.get(self.position.act_scene_index)?;
        let (act, scene) = self.current()?;
        Some(SceneView { id, act, scene, lines: &scene.lines[..self.visible] })
    }

    /// 通读模式：全部幕-场及其全部台词
    pub fn all_lines(&self) -> Vec<SceneView<'_>> {
        let Some(play) = self.play.as_deref() else {
            return Vec::new();
        };
        self.act_scenes
            .iter()
            .filter_map(|id| {
                play.act_scene(*id)
                    .map(|(act, scene)| SceneView { id: *id, act, scene, lines: &scene.lines })
            })
            .collect()
    }

    /// 通读列表中某个幕-场标题所在的行号，每个幕-场占 `1 + 台词数` 行
    pub fn index_of_first_line(&self, id: ActSceneId) -> Option<usize> {
        let mut count = 0;
        for view in self.all_lines() {
            if view.id == id {
                return Some(count);
            }
            count += view.lines.len() + 1;
        }
        None
    }

    /// 角色显示颜色的槽位：按名字排序后循环分配
    pub fn color_slot(&self, character: &Character) -> Option<usize> {
        if self.palette_size == 0 {
            return None;
        }
        self.characters
            .iter()
            .position(|c| c == character)
            .map(|index| index % self.palette_size)
    }

    /// 要持久化的进度，保存的行号是游标减一
    pub fn progress_record(&self) -> Option<ProgressRecord> {
        let play_name = self.play_name()?;
        Some(ProgressRecord {
            play_name: play_name.to_string(),
            character: self.me.as_ref().map(|c| c.name.clone()),
            act_scene_index: Some(self.position.act_scene_index),
            line_index: Some((self.position.line_index - 1).max(-1)),
        })
    }
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self::new(8)
    }
}
