//! IO helper: JSON 文件读写与两种目录布局（平铺 / 嵌套）下的语言源定位

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::catalog::{scan_flat, scan_nested, LanguageFolder, LanguageSource, ScanOutcome};
use crate::model::data_core::AppError;
use crate::model::path_codec::{flatten, unflatten, FlatCatalog};

const JSON_EXT: &str = "json";

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, AppError> {
    let text = fs::read_to_string(p)?;
    Ok(serde_json::from_str(&text)?)
}

/// 将JSON数据保存到文件（两空格缩进，末尾换行）
pub fn write_json_file(p: &Path, value: &Value) -> Result<(), AppError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(p, text)?;
    Ok(())
}

/// 磁盘布局
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Layout {
    /// `{root}/{lang}.json`
    #[default]
    Flat,
    /// `{root}/{lang}/{file_name}.json`，一次只编辑一个文件名
    Nested { file_name: String },
}

/// 去掉可选的 `.json` 后缀，得到文件名主干
pub fn file_stem(name: &str) -> &str {
    name.strip_suffix(".json").unwrap_or(name)
}

/// 语言标识不能为空，也不能带路径分隔符
pub fn validate_language_id(id: &str) -> Result<(), AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed != id {
        return Err(AppError::State(format!("非法语言标识: '{}'", id)));
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." || id.starts_with('.') {
        return Err(AppError::State(format!("非法语言标识: '{}'", id)));
    }
    Ok(())
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// 一个已打开的翻译目录
#[derive(Debug, Clone)]
pub struct CatalogStore {
    root: PathBuf,
    layout: Layout,
}

impl CatalogStore {
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// 语言对应的 JSON 源文件路径
    pub fn source_path(&self, lang: &str) -> PathBuf {
        match &self.layout {
            Layout::Flat => self.root.join(format!("{}.{}", lang, JSON_EXT)),
            Layout::Nested { file_name } => self
                .root
                .join(lang)
                .join(format!("{}.{}", file_stem(file_name), JSON_EXT)),
        }
    }

    /// 语言存储单元（平铺为文件，嵌套为文件夹）所在路径
    fn unit_path(&self, lang: &str) -> PathBuf {
        match &self.layout {
            Layout::Flat => self.source_path(lang),
            Layout::Nested { .. } => self.root.join(lang),
        }
    }

    /// 枚举所有语言存储单元，按名字排序
    pub fn discover_languages(&self) -> Result<Vec<String>, AppError> {
        let mut langs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if is_hidden(name) {
                continue;
            }
            match self.layout {
                Layout::Flat => {
                    let is_json = path.extension().and_then(|e| e.to_str()) == Some(JSON_EXT);
                    if path.is_file() && is_json {
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            langs.push(stem.to_string());
                        }
                    }
                }
                Layout::Nested { .. } => {
                    if path.is_dir() {
                        langs.push(name.to_string());
                    }
                }
            }
        }
        langs.sort();
        Ok(langs)
    }

    /// 当前可编辑的语言集合：嵌套结构下只包含已有所选文件的语言
    pub fn language_set(&self) -> Result<Vec<String>, AppError> {
        let langs = self.discover_languages()?;
        Ok(match self.layout {
            Layout::Flat => langs,
            Layout::Nested { .. } => langs
                .into_iter()
                .filter(|l| self.source_path(l).is_file())
                .collect(),
        })
    }

    pub fn read_source(&self, lang: &str) -> Result<String, AppError> {
        fs::read_to_string(self.source_path(lang)).map_err(|source| AppError::SourceRead {
            lang: lang.to_string(),
            source,
        })
    }

    /// 从磁盘重新读取并展开一个语言
    pub fn load(&self, lang: &str) -> Result<FlatCatalog, AppError> {
        let text = self.read_source(lang)?;
        let doc: Value = serde_json::from_str(&text).map_err(|source| AppError::SourceParse {
            lang: lang.to_string(),
            source,
        })?;
        Ok(flatten(&doc))
    }

    /// 还原为嵌套 JSON 并整体覆盖写回
    pub fn save(&self, lang: &str, flat: &FlatCatalog) -> Result<(), AppError> {
        let doc = unflatten(flat);
        let path = self.source_path(lang);
        write_json_file(&path, &doc).map_err(|e| match e {
            AppError::Io(source) => AppError::SourceWrite {
                lang: lang.to_string(),
                source,
            },
            other => other,
        })?;
        tracing::info!("已写回 {}: {} 个键", path.display(), flat.len());
        Ok(())
    }

    /// 全量重新扫描
    pub fn scan(&self) -> Result<ScanOutcome, AppError> {
        let langs = self.discover_languages()?;
        Ok(match &self.layout {
            Layout::Flat => scan_flat(
                langs
                    .into_iter()
                    .map(|lang| LanguageSource {
                        text: self.read_source(&lang),
                        language: lang,
                    })
                    .collect(),
            ),
            Layout::Nested { file_name } => scan_nested(
                langs
                    .into_iter()
                    .map(|lang| LanguageFolder {
                        selected: self
                            .source_path(&lang)
                            .is_file()
                            .then(|| self.read_source(&lang)),
                        language: lang,
                    })
                    .collect(),
                file_stem(file_name),
            ),
        })
    }

    /// 嵌套结构下所有语言文件夹中出现过的 JSON 文件名（去重、排序、不含后缀）
    pub fn list_files(&self) -> Result<Vec<String>, AppError> {
        if self.layout == Layout::Flat {
            return Ok(Vec::new());
        }
        let mut names = std::collections::BTreeSet::new();
        for lang in self.discover_languages()? {
            for entry in fs::read_dir(self.root.join(&lang))? {
                let path = entry?.path();
                if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(JSON_EXT) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        if !is_hidden(stem) {
                            names.insert(stem.to_string());
                        }
                    }
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    /// 新建语言：写入空对象 `{}`
    pub fn create_language(&self, lang: &str) -> Result<(), AppError> {
        validate_language_id(lang)?;
        let path = self.source_path(lang);
        if path.exists() {
            return Err(AppError::State(format!("语言已存在: {}", lang)));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json_file(&path, &Value::Object(serde_json::Map::new())).map_err(|e| match e {
            AppError::Io(source) => AppError::SourceWrite {
                lang: lang.to_string(),
                source,
            },
            other => other,
        })?;
        tracing::info!("已新建语言 {}: {}", lang, path.display());
        Ok(())
    }

    /// 重命名语言存储单元，不触碰键内容
    pub fn rename_language(&self, old: &str, new: &str) -> Result<(), AppError> {
        validate_language_id(old)?;
        validate_language_id(new)?;
        let from = self.unit_path(old);
        let to = self.unit_path(new);
        if !from.exists() {
            return Err(AppError::State(format!("语言不存在: {}", old)));
        }
        if to.exists() {
            return Err(AppError::State(format!("语言已存在: {}", new)));
        }
        fs::rename(&from, &to)?;
        tracing::info!("语言重命名: {} -> {}", old, new);
        Ok(())
    }
}
