//! PathKeyCodec：嵌套 JSON 与扁平键值表（FlatCatalog）之间的双向转换

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::model::key_path::{KeyPath, Step, MAX_ARRAY_INDEX};

/// 单个语言的扁平翻译表：KeyPath 文本 -> 字符串值（按字节序排列）
pub type FlatCatalog = BTreeMap<String, String>;

/// 将嵌套 JSON 展开为扁平键值表
pub fn flatten(doc: &Value) -> FlatCatalog {
    flatten_with_prefix(doc, "")
}

/// 带前缀展开；前缀为空时单个字符串文档以空键记录
pub fn flatten_with_prefix(doc: &Value, prefix: &str) -> FlatCatalog {
    let mut out = FlatCatalog::new();
    fn text_of(v: &Value) -> String {
        match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
    fn walk(out: &mut FlatCatalog, v: &Value, path: &str) {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    let field_path = if path.is_empty() {
                        k.clone()
                    } else {
                        format!("{}.{}", path, k)
                    };
                    walk(out, child, &field_path);
                }
            }
            Value::Array(arr) => {
                for (idx, child) in arr.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, idx);
                    walk(out, child, &item_path);
                }
            }
            leaf => {
                out.insert(path.to_string(), text_of(leaf));
            }
        }
    }

    walk(&mut out, doc, prefix);
    out
}

/// 重建过程中的中间结构：显式区分对象、数组与叶子
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Object(BTreeMap<String, Node>),
    Array(Vec<Node>),
    Leaf(String),
}

impl Node {
    /// 数组补位与新字段的占位值
    fn placeholder() -> Self {
        Node::Leaf(String::new())
    }

    /// 确保当前节点是 `next` 所要求的容器；形状冲突时直接覆盖（后写者胜）
    fn reshape_for(&mut self, next: &Step, key: &str) {
        let fits = matches!(
            (&*self, next),
            (Node::Object(_), Step::Field(_)) | (Node::Array(_), Step::Index(_))
        );
        if fits {
            return;
        }
        if !matches!(self, Node::Leaf(s) if s.is_empty()) {
            tracing::debug!("键 {} 与已有结构冲突，覆盖为新容器", key);
        }
        *self = match next {
            Step::Field(_) => Node::Object(BTreeMap::new()),
            Step::Index(_) => Node::Array(Vec::new()),
        };
    }

    /// 取出（必要时创建）子节点；调用前需已 reshape
    fn child_mut(&mut self, step: &Step) -> Option<&mut Node> {
        match (self, step) {
            (Node::Object(map), Step::Field(name)) => {
                Some(map.entry(name.clone()).or_insert_with(Node::placeholder))
            }
            (Node::Array(items), Step::Index(idx)) => {
                if *idx > MAX_ARRAY_INDEX {
                    return None;
                }
                let len = idx.checked_add(1)?;
                if items.len() < len {
                    items.resize(len, Node::placeholder());
                }
                items.get_mut(*idx)
            }
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Node::Leaf(s) => Value::String(s),
            Node::Array(items) => Value::Array(items.into_iter().map(Node::into_value).collect()),
            Node::Object(map) => {
                let mut obj = Map::new();
                for (k, v) in map {
                    obj.insert(k, v.into_value());
                }
                Value::Object(obj)
            }
        }
    }
}

/// 将扁平键值表还原为嵌套 JSON
pub fn unflatten(flat: &FlatCatalog) -> Value {
    let mut root = Node::Object(BTreeMap::new());
    for (key, value) in flat {
        let path = KeyPath::parse(key);
        // 在改动任何结构之前整体拒绝，避免根节点被重塑后丢失其他键
        if path.exceeds_index_limit() {
            tracing::warn!("键 {} 的数组下标超过上限 {}，已忽略", key, MAX_ARRAY_INDEX);
            continue;
        }
        insert_path(&mut root, path.steps(), key, value);
    }
    root.into_value()
}

fn insert_path(root: &mut Node, steps: &[Step], key: &str, value: &str) {
    let Some((first, _)) = steps.split_first() else {
        return;
    };
    root.reshape_for(first, key);
    let mut current = root;
    for (i, step) in steps.iter().enumerate() {
        let Some(slot) = current.child_mut(step) else {
            return;
        };
        match steps.get(i + 1) {
            Some(next) => {
                slot.reshape_for(next, key);
                current = slot;
            }
            None => {
                *slot = Node::Leaf(value.to_string());
                return;
            }
        }
    }
}
