//! AppState：会话上下文（当前目录、布局、列顺序）与统一错误类型

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::catalog::ScanOutcome;
use crate::model::cell_mutator::CellMutator;
use crate::model::settings::Settings;
use crate::utils::fs::{file_stem, CatalogStore, Layout};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("[{lang}] 读取失败: {source}")]
    SourceRead {
        lang: String,
        #[source]
        source: std::io::Error,
    },
    #[error("[{lang}] JSON解析失败: {source}")]
    SourceParse {
        lang: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("[{lang}] 写入失败: {source}")]
    SourceWrite {
        lang: String,
        #[source]
        source: std::io::Error,
    },
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("状态错误: {0}")]
    State(String),
}

impl AppError {
    /// 按语言隔离的错误所属语言
    pub fn language(&self) -> Option<&str> {
        match self {
            AppError::SourceRead { lang, .. }
            | AppError::SourceParse { lang, .. }
            | AppError::SourceWrite { lang, .. } => Some(lang),
            _ => None,
        }
    }
}

/// 会话状态：替代全局变量，在命令处理之间显式传递
#[derive(Debug, Default)]
pub struct AppState {
    pub root: Option<PathBuf>,
    pub layout: Layout,
    /// 用户拖拽后的语言列顺序
    pub column_order: Vec<String>,
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl AppState {
    /// 从配置文件恢复上次会话；配置缺失或损坏时使用默认值
    pub fn with_settings(path: Option<PathBuf>) -> Self {
        let settings = match &path {
            Some(p) => Settings::load_or_default(p),
            None => Settings::default(),
        };
        let mut state = Self {
            root: settings.last_folder.clone(),
            layout: settings.layout.clone(),
            column_order: Vec::new(),
            settings,
            settings_path: path,
        };
        state.column_order = state.saved_column_order();
        state
    }

    fn saved_column_order(&self) -> Vec<String> {
        self.root
            .as_deref()
            .and_then(|r| self.settings.column_order.get(&Settings::folder_key(r)))
            .cloned()
            .unwrap_or_default()
    }

    /// 打开目录；嵌套结构需要同时指定文件名
    pub fn open_folder(&mut self, root: &Path, nested_file: Option<&str>) -> Result<(), AppError> {
        if !root.is_dir() {
            return Err(AppError::State(format!("目录不存在: {}", root.display())));
        }
        self.root = Some(root.to_path_buf());
        self.layout = match nested_file {
            Some(name) => Layout::Nested {
                file_name: file_stem(name).to_string(),
            },
            None => Layout::Flat,
        };
        self.column_order = self.saved_column_order();
        tracing::info!("打开目录: {} ({:?})", root.display(), self.layout);
        self.persist()
    }

    /// 嵌套结构下切换当前编辑的文件
    pub fn select_file(&mut self, file_name: &str) -> Result<(), AppError> {
        if self.root.is_none() {
            return Err(AppError::State("尚未打开目录".into()));
        }
        let stem = file_stem(file_name.trim());
        if stem.is_empty() {
            return Err(AppError::State("文件名不能为空".into()));
        }
        self.layout = Layout::Nested {
            file_name: stem.to_string(),
        };
        self.persist()
    }

    pub fn reorder_languages(&mut self, order: Vec<String>) -> Result<(), AppError> {
        self.column_order = order;
        self.persist()
    }

    pub fn store(&self) -> Result<CatalogStore, AppError> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| AppError::State("尚未打开目录".into()))?;
        Ok(CatalogStore::new(root.clone(), self.layout.clone()))
    }

    /// 重新扫描并按会话列顺序排列
    pub fn scan(&self) -> Result<ScanOutcome, AppError> {
        let mut outcome = self.store()?.scan()?;
        outcome.table.apply_column_order(&self.column_order);
        Ok(outcome)
    }

    /// 对当前目录执行一次单元格修改
    pub fn with_mutator<T>(
        &self,
        f: impl FnOnce(&CellMutator<'_>) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let store = self.store()?;
        f(&CellMutator::new(&store))
    }

    /// 将会话写回配置文件（未配置路径时跳过）
    fn persist(&mut self) -> Result<(), AppError> {
        self.settings.last_folder = self.root.clone();
        self.settings.layout = self.layout.clone();
        if let Some(root) = &self.root {
            let key = Settings::folder_key(root);
            if self.column_order.is_empty() {
                self.settings.column_order.remove(&key);
            } else {
                self.settings
                    .column_order
                    .insert(key, self.column_order.clone());
            }
        }
        match &self.settings_path {
            Some(path) => self.settings.save(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_store_requires_open_folder() {
        let state = AppState::default();
        assert!(matches!(state.store(), Err(AppError::State(_))));
        assert!(state.scan().is_err(), "未打开目录时扫描应失败");
    }

    #[test]
    fn test_open_missing_folder_fails() {
        let mut state = AppState::default();
        let result = state.open_folder(Path::new("/definitely/not/here"), None);
        assert!(result.is_err());
        assert!(state.root.is_none());
    }

    #[test]
    fn test_session_restored_from_settings() {
        let dir = TempDir::new().expect("创建临时目录失败");
        let catalogs = dir.path().join("locales");
        fs::create_dir_all(catalogs.join("en")).unwrap();
        fs::create_dir_all(catalogs.join("vi")).unwrap();
        fs::write(catalogs.join("en").join("home.json"), r#"{"a":"A"}"#).unwrap();
        fs::write(catalogs.join("vi").join("home.json"), r#"{"b":"B"}"#).unwrap();
        let config = dir.path().join("settings.json");

        let mut state = AppState::with_settings(Some(config.clone()));
        state.open_folder(&catalogs, Some("home.json")).expect("打开目录失败");
        state
            .reorder_languages(vec!["vi".into(), "en".into()])
            .expect("保存列顺序失败");

        let restored = AppState::with_settings(Some(config));
        assert_eq!(restored.root.as_deref(), Some(catalogs.as_path()));
        assert_eq!(
            restored.layout,
            Layout::Nested {
                file_name: "home".into()
            }
        );
        let table = restored.scan().expect("扫描失败").table;
        assert_eq!(table.languages, vec!["vi", "en"]);
        assert_eq!(table.keys, vec!["a", "b"]);
    }

    #[test]
    fn test_error_language_tag() {
        let err = AppError::SourceWrite {
            lang: "fr".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.language(), Some("fr"));
        assert!(err.to_string().contains("[fr]"));
        assert_eq!(AppError::State("x".into()).language(), None);
    }
}
