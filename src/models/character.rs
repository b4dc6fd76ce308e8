use serde::{Deserialize, Serialize};

/// 角色，只由名字标识。
///
/// 同名即同一角色：两次解析得到的不同实例比较、哈希、排序的结果都只取决于名字。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Character { name: name.into() }
    }
}

impl std::fmt::Display for Character {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
