//! CellMutator：单元格命令的“读取 - 修改 - 整体写回”
//!
//! 每个命令都从磁盘重新读取，不缓存任何语言的扁平表。

use crate::model::data_core::AppError;
use crate::model::key_path::{KeyPath, MAX_ARRAY_INDEX};
use crate::model::path_codec::FlatCatalog;
use crate::utils::fs::CatalogStore;

/// 修改命令所需的语言源操作（磁盘实现为 [`CatalogStore`]）
pub trait LanguageStore {
    fn language_set(&self) -> Result<Vec<String>, AppError>;
    fn load(&self, lang: &str) -> Result<FlatCatalog, AppError>;
    fn save(&self, lang: &str, flat: &FlatCatalog) -> Result<(), AppError>;
    fn rename_language(&self, old: &str, new: &str) -> Result<(), AppError>;
    fn create_language(&self, lang: &str) -> Result<(), AppError>;
}

impl LanguageStore for CatalogStore {
    fn language_set(&self) -> Result<Vec<String>, AppError> {
        CatalogStore::language_set(self)
    }

    fn load(&self, lang: &str) -> Result<FlatCatalog, AppError> {
        CatalogStore::load(self, lang)
    }

    fn save(&self, lang: &str, flat: &FlatCatalog) -> Result<(), AppError> {
        CatalogStore::save(self, lang, flat)
    }

    fn rename_language(&self, old: &str, new: &str) -> Result<(), AppError> {
        CatalogStore::rename_language(self, old, new)
    }

    fn create_language(&self, lang: &str) -> Result<(), AppError> {
        CatalogStore::create_language(self, lang)
    }
}

/// 多语言命令的执行结果：逐语言尽力而为，不保证原子性
#[derive(Debug, Default)]
pub struct MutationReport {
    /// 实际写回的语言
    pub changed: Vec<String>,
    pub failures: Vec<AppError>,
}

impl MutationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct CellMutator<'a, S: LanguageStore = CatalogStore> {
    store: &'a S,
}

fn require_key(key: &str) -> Result<(), AppError> {
    if key.trim().is_empty() {
        return Err(AppError::State("键不能为空".into()));
    }
    if KeyPath::parse(key).exceeds_index_limit() {
        return Err(AppError::State(format!(
            "数组下标超过上限 {}: {}",
            MAX_ARRAY_INDEX, key
        )));
    }
    Ok(())
}

fn require_distinct(from: &str, to: &str) -> Result<(), AppError> {
    require_key(from)?;
    require_key(to)?;
    if from == to {
        return Err(AppError::State(format!("新键与原键相同: {}", to)));
    }
    Ok(())
}

impl<'a, S: LanguageStore> CellMutator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// 对每个语言执行 `edit`，返回 true 的语言才写回；单个语言失败不影响其他语言
    fn for_each_language<F>(&self, mut edit: F) -> Result<MutationReport, AppError>
    where
        F: FnMut(&mut FlatCatalog) -> bool,
    {
        let mut report = MutationReport::default();
        for lang in self.store.language_set()? {
            // 读取或解析失败时不写回，避免覆盖掉原文件内容
            let mut flat = match self.store.load(&lang) {
                Ok(flat) => flat,
                Err(e) => {
                    tracing::warn!("跳过语言 {}: {}", lang, e);
                    report.failures.push(e);
                    continue;
                }
            };
            if !edit(&mut flat) {
                continue;
            }
            match self.store.save(&lang, &flat) {
                Ok(()) => report.changed.push(lang),
                Err(e) => {
                    tracing::error!("写回语言 {} 失败: {}", lang, e);
                    report.failures.push(e);
                }
            }
        }
        Ok(report)
    }

    /// 设置单个语言的值，键不存在时新建
    pub fn set_value(&self, lang: &str, key: &str, value: &str) -> Result<(), AppError> {
        require_key(key)?;
        if !self.store.language_set()?.iter().any(|l| l == lang) {
            return Err(AppError::State(format!("语言不存在: {}", lang)));
        }
        let mut flat = self.store.load(lang)?;
        flat.insert(key.to_string(), value.to_string());
        self.store.save(lang, &flat)
    }

    /// 所有语言补上空值键，已有的值保持不变
    pub fn add_key(&self, key: &str) -> Result<MutationReport, AppError> {
        require_key(key)?;
        self.for_each_language(|flat| {
            if flat.contains_key(key) {
                false
            } else {
                flat.insert(key.to_string(), String::new());
                true
            }
        })
    }

    pub fn delete_key(&self, key: &str) -> Result<MutationReport, AppError> {
        // 删除不会新建数组元素，不做下标校验，以便清理已有的异常键
        self.for_each_language(|flat| flat.remove(key).is_some())
    }

    /// 在有原键的语言中复制值到新键；没有原键的语言保持不变
    pub fn duplicate_key(&self, source: &str, new_key: &str) -> Result<MutationReport, AppError> {
        require_distinct(source, new_key)?;
        self.for_each_language(|flat| match flat.get(source).cloned() {
            Some(value) => {
                flat.insert(new_key.to_string(), value);
                true
            }
            None => false,
        })
    }

    /// 在有原键的语言中把值移到新键
    pub fn rename_key(&self, old: &str, new_key: &str) -> Result<MutationReport, AppError> {
        require_distinct(old, new_key)?;
        self.for_each_language(|flat| match flat.remove(old) {
            Some(value) => {
                flat.insert(new_key.to_string(), value);
                true
            }
            None => false,
        })
    }

    pub fn rename_language(&self, old: &str, new: &str) -> Result<(), AppError> {
        self.store.rename_language(old, new)
    }

    pub fn add_language(&self, lang: &str) -> Result<(), AppError> {
        self.store.create_language(lang)
    }
}
