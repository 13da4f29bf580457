//! 持久化配置：上次打开的目录、布局与各目录的列顺序

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::data_core::AppError;
use crate::utils::fs::{read_json_file, write_json_file, Layout};

pub const CONFIG_ENV: &str = "FANYI_BIAOGE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_folder: Option<PathBuf>,
    pub layout: Layout,
    /// 目录路径 -> 语言列顺序
    pub column_order: BTreeMap<String, Vec<String>>,
}

impl Settings {
    /// `$HOME/.config/fanyi_biaoge/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("fanyi_biaoge")
                .join("settings.json")
        })
    }

    pub fn folder_key(root: &Path) -> String {
        root.to_string_lossy().into_owned()
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let value = read_json_file(path)?;
        Ok(serde_json::from_value(value)?)
    }

    /// 配置不存在时返回默认值，损坏时告警后返回默认值
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("配置文件 {} 无法读取，使用默认配置: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json_file(path, &serde_json::to_value(self)?)
    }
}
