//! CatalogAggregator：把多个语言源合并成一张“键 × 语言”表

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::model::data_core::AppError;
use crate::model::path_codec::{flatten, FlatCatalog};

/// 一个语言的原始 JSON 文本（读取失败时携带错误）
#[derive(Debug)]
pub struct LanguageSource {
    pub language: String,
    pub text: Result<String, AppError>,
}

/// 嵌套结构下一个语言文件夹；`selected` 为所选文件内容，文件不存在时为 None
#[derive(Debug)]
pub struct LanguageFolder {
    pub language: String,
    pub selected: Option<Result<String, AppError>>,
}

/// 聚合后的表格模型
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedTable {
    pub languages: Vec<String>,
    pub keys: Vec<String>,
    pub data: BTreeMap<String, FlatCatalog>,
}

/// 表格单元格：有值或缺失
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Value(&'a str),
    Missing,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub table: AggregatedTable,
    /// 按语言隔离的读取/解析失败，不影响其他语言
    pub issues: Vec<AppError>,
}

impl AggregatedTable {
    /// 某语言某键的单元格；空字符串也视为缺失翻译
    pub fn cell(&self, language: &str, key: &str) -> Cell<'_> {
        match self.data.get(language).and_then(|flat| flat.get(key)) {
            Some(v) if !v.is_empty() => Cell::Value(v),
            _ => Cell::Missing,
        }
    }

    pub fn missing_count(&self, language: &str) -> usize {
        self.keys
            .iter()
            .filter(|k| self.cell(language, k) == Cell::Missing)
            .count()
    }

    /// 按会话中保存的列顺序排列语言：已知的在前，新发现的保持原顺序追加
    pub fn apply_column_order(&mut self, order: &[String]) {
        if order.is_empty() {
            return;
        }
        let mut arranged: Vec<String> = order
            .iter()
            .filter(|l| self.languages.contains(l))
            .cloned()
            .collect();
        for lang in &self.languages {
            if !arranged.contains(lang) {
                arranged.push(lang.clone());
            }
        }
        self.languages = arranged;
    }
}

fn parse_source(language: &str, text: Result<String, AppError>) -> Result<FlatCatalog, AppError> {
    let text = text?;
    let doc: Value = serde_json::from_str(&text).map_err(|source| AppError::SourceParse {
        lang: language.to_string(),
        source,
    })?;
    Ok(flatten(&doc))
}

fn aggregate<I>(entries: I) -> ScanOutcome
where
    I: IntoIterator<Item = (String, Result<String, AppError>)>,
{
    let mut outcome = ScanOutcome::default();
    let mut keys = BTreeSet::new();
    for (language, text) in entries {
        let flat = match parse_source(&language, text) {
            Ok(flat) => flat,
            Err(e) => {
                tracing::warn!("语言 {} 加载失败，按空表处理: {}", language, e);
                outcome.issues.push(e);
                FlatCatalog::new()
            }
        };
        keys.extend(flat.keys().cloned());
        outcome.table.languages.push(language.clone());
        outcome.table.data.insert(language, flat);
    }
    outcome.table.keys = keys.into_iter().collect();
    outcome
}

/// 平铺结构：每个语言一个文件，语言顺序保持发现顺序
pub fn scan_flat(sources: Vec<LanguageSource>) -> ScanOutcome {
    let outcome = aggregate(sources.into_iter().map(|s| (s.language, s.text)));
    tracing::info!(
        "平铺扫描完成：{} 个语言，{} 个键",
        outcome.table.languages.len(),
        outcome.table.keys.len()
    );
    outcome
}

/// 嵌套结构：只保留含有所选文件的语言，语言按字母排序
pub fn scan_nested(folders: Vec<LanguageFolder>, selected_file: &str) -> ScanOutcome {
    let mut present: Vec<(String, Result<String, AppError>)> = folders
        .into_iter()
        .filter_map(|f| f.selected.map(|text| (f.language, text)))
        .collect();
    present.sort_by(|a, b| a.0.cmp(&b.0));
    let outcome = aggregate(present);
    tracing::info!(
        "嵌套扫描完成（{}）：{} 个语言，{} 个键",
        selected_file,
        outcome.table.languages.len(),
        outcome.table.keys.len()
    );
    outcome
}
