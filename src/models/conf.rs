use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// 是否跳过空行（默认不跳过：空行按缺少角色名的台词报错）
    pub skip_blank_lines: bool,
    /// 多行台词拼接时使用的换行符
    pub line_separator: String,
    /// 滚动位置写入的防抖时间(毫秒)
    pub scroll_debounce_ms: u64,
    /// 角色显示颜色的槽位数，按角色名排序循环分配
    pub palette_size: usize,
}

impl Default for Conf {
    fn default() -> Self {
        Conf {
            skip_blank_lines: false,
            line_separator: "\n".to_string(),
            scroll_debounce_ms: 500,
            palette_size: 8,
        }
    }
}

impl Conf {
    /// 从 JSON 读取配置，未给出的字段使用默认值
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
