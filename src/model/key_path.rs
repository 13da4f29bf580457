//! KeyPath：扁平键的分段表示（`a.b`、`items[0]`、`grid[0][1]`）
//!
//! 字段名本身包含 `.` 或 `[数字]` 时与结构路径无法区分，这里不做转义，保持原有歧义。

use std::fmt;

/// 数组下标上限；超过的键会被拒绝，避免补位时分配海量占位元素
pub const MAX_ARRAY_INDEX: usize = 100_000;

/// 路径中的一步：对象字段或数组下标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Field(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPath {
    steps: Vec<Step>,
}

impl KeyPath {
    /// 解析扁平键文本，永不失败（无法识别的括号按字段名原样保留）
    pub fn parse(text: &str) -> Self {
        let mut steps = Vec::new();
        for (pos, part) in text.split('.').enumerate() {
            let (name, indices) = split_indices(part);
            // 根数组的首段没有名字，如 "[0].title"
            if !(pos == 0 && name.is_empty() && !indices.is_empty()) {
                steps.push(Step::Field(name.to_string()));
            }
            steps.extend(indices.into_iter().map(Step::Index));
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// 是否含有超过 [`MAX_ARRAY_INDEX`] 的数组下标
    pub fn exceeds_index_limit(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, Step::Index(idx) if *idx > MAX_ARRAY_INDEX))
    }
}

/// 从段尾剥离连续的 `[数字]`，返回（名字，下标列表）
fn split_indices(part: &str) -> (&str, Vec<usize>) {
    let mut rest = part;
    let mut indices = Vec::new();
    while rest.ends_with(']') {
        let Some(open) = rest.rfind('[') else { break };
        let digits = &rest[open + 1..rest.len() - 1];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            break;
        }
        let Ok(idx) = digits.parse::<usize>() else { break };
        indices.push(idx);
        rest = &rest[..open];
    }
    indices.reverse();
    (rest, indices)
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Step::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}
