use lazy_static::lazy_static;
use regex::Regex;

pub struct ScriptConstants;

impl ScriptConstants {
    pub const STAGE_DIRECTION_BEGIN: &'static str = "(";
    pub const STAGE_DIRECTION_END: &'static str = ")";
    pub const PLAY_NAME: &'static str = "#";
    pub const ACT_NAME: &'static str = "##";
    pub const SCENE_NAME: &'static str = "###";
    pub const CHARACTER_NAME_SEPARATOR: char = ':';
}

lazy_static! {
    // 标题行：交替分支按顺序匹配，### 必须排在 ## 和 # 之前
    pub static ref HEADING_REGEX: Regex = Regex::new(r"^(###|##|#)(.*)$").unwrap();
}
