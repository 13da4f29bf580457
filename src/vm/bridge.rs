//! VM桥接层：把宿主 UI 发来的表格命令落到 AppState 上，并推回最新表格
//!
//! 每条命令执行完都会整体重新扫描一次磁盘。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::catalog::AggregatedTable;
use crate::model::cell_mutator::MutationReport;
use crate::model::data_core::{AppError, AppState};
use crate::utils::clipboard::ClipboardWriter;

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_REFRESHED: &str = "已刷新";
pub const STATUS_SAVED: &str = "已保存";
pub const STATUS_PARTIAL: &str = "部分语言处理失败";
pub const STATUS_COPIED: &str = "已复制到剪贴板";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

/// 宿主发来的命令（JSON 中以 `command` 字段区分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Open {
        root: PathBuf,
        #[serde(default)]
        nested_file: Option<String>,
    },
    SelectFile { file_name: String },
    ListFiles,
    Refresh,
    AddLanguage { lang: String },
    RenameLanguage { lang: String, new_name: String },
    AddKey { key: String },
    DeleteKey { key: String },
    DuplicateKey { original_key: String, new_key: String },
    RenameKey { old_key: String, new_key: String },
    SetValue { lang: String, key: String, value: String },
    ReorderLanguages { order: Vec<String> },
    CopyKey { key: String },
}

/// 面向用户的提示，携带出错的语言
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub language: Option<String>,
    pub message: String,
}

impl From<&AppError> for Notice {
    fn from(e: &AppError) -> Self {
        Self {
            language: e.language().map(str::to_string),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub ok: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<AggregatedTable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    pub notices: Vec<Notice>,
}

pub struct ViewModelBridge<C: ClipboardWriter> {
    state: AppState,
    clipboard: C,
}

impl<C: ClipboardWriter> ViewModelBridge<C> {
    pub fn new(state: AppState, clipboard: C) -> Self {
        Self { state, clipboard }
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// 执行一条命令，随后重新扫描并返回最新表格
    pub fn dispatch(&mut self, command: Command) -> Response {
        let mut notices = Vec::new();
        let mut files = Vec::new();
        let status = match self.execute(command, &mut files) {
            Ok(Some(report)) => {
                notices.extend(report.failures.iter().map(Notice::from));
                if report.is_clean() {
                    STATUS_SAVED.to_string()
                } else {
                    STATUS_PARTIAL.to_string()
                }
            }
            Ok(None) => STATUS_READY.to_string(),
            Err(Outcome::Status(status)) => status,
            Err(Outcome::Failed(e)) => {
                tracing::error!("命令执行失败: {}", e);
                notices.push(Notice::from(&e));
                return Response {
                    ok: false,
                    status: format!("{}{}", STATUS_ERROR_PREFIX, e),
                    table: self.refresh(&mut notices),
                    files,
                    notices,
                };
            }
        };
        Response {
            ok: true,
            status,
            table: self.refresh(&mut notices),
            files,
            notices,
        }
    }

    fn refresh(&self, notices: &mut Vec<Notice>) -> Option<AggregatedTable> {
        self.state.root.as_ref()?;
        match self.state.scan() {
            Ok(outcome) => {
                notices.extend(outcome.issues.iter().map(Notice::from));
                Some(outcome.table)
            }
            Err(e) => {
                notices.push(Notice::from(&e));
                None
            }
        }
    }

    fn execute(
        &mut self,
        command: Command,
        files: &mut Vec<String>,
    ) -> Result<Option<MutationReport>, Outcome> {
        tracing::info!("收到命令: {:?}", command);
        let state = &mut self.state;
        match command {
            Command::Open { root, nested_file } => {
                state.open_folder(&root, nested_file.as_deref())?;
            }
            Command::SelectFile { file_name } => state.select_file(&file_name)?,
            Command::ListFiles => *files = state.store()?.list_files()?,
            Command::Refresh => return Err(Outcome::Status(STATUS_REFRESHED.to_string())),
            Command::AddLanguage { lang } => state.with_mutator(|m| m.add_language(&lang))?,
            Command::RenameLanguage { lang, new_name } => {
                state.with_mutator(|m| m.rename_language(&lang, &new_name))?;
                if let Some(slot) = state.column_order.iter_mut().find(|l| **l == lang) {
                    *slot = new_name;
                    let order = state.column_order.clone();
                    state.reorder_languages(order)?;
                }
            }
            Command::AddKey { key } => return Ok(Some(state.with_mutator(|m| m.add_key(&key))?)),
            Command::DeleteKey { key } => {
                return Ok(Some(state.with_mutator(|m| m.delete_key(&key))?))
            }
            Command::DuplicateKey {
                original_key,
                new_key,
            } => {
                return Ok(Some(
                    state.with_mutator(|m| m.duplicate_key(&original_key, &new_key))?,
                ))
            }
            Command::RenameKey { old_key, new_key } => {
                return Ok(Some(
                    state.with_mutator(|m| m.rename_key(&old_key, &new_key))?,
                ))
            }
            Command::SetValue { lang, key, value } => {
                state.with_mutator(|m| m.set_value(&lang, &key, &value))?;
                return Ok(Some(MutationReport {
                    changed: vec![lang],
                    failures: Vec::new(),
                }));
            }
            Command::ReorderLanguages { order } => state.reorder_languages(order)?,
            Command::CopyKey { key } => {
                self.clipboard
                    .write_text(&key)
                    .map_err(|e| AppError::State(e.to_string()))?;
                return Err(Outcome::Status(STATUS_COPIED.to_string()));
            }
        }
        Ok(None)
    }
}

/// 命令的非常规结果：自定义状态文本或失败
enum Outcome {
    Status(String),
    Failed(AppError),
}

impl From<AppError> for Outcome {
    fn from(e: AppError) -> Self {
        Outcome::Failed(e)
    }
}
