//! 程序入口：初始化日志、解析命令行，把子命令转成表格命令交给 VM 桥接层

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use fanyi_biaoge::model::catalog::{AggregatedTable, Cell};
use fanyi_biaoge::model::path_codec::{flatten, unflatten, FlatCatalog};
use fanyi_biaoge::model::settings::{Settings, CONFIG_ENV};
use fanyi_biaoge::utils::clipboard::SystemClipboard;
use fanyi_biaoge::utils::fs::{read_json_file, write_json_file};
use fanyi_biaoge::vm::bridge::{Command, Response, ViewModelBridge};
use fanyi_biaoge::AppState;

/// 多语言 JSON 翻译表格：一行一个键，一列一个语言
#[derive(Parser, Debug)]
#[command(name = "fanyi_biaoge", version, about, long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// 打开翻译目录（会被记住）
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// 嵌套结构：每个语言一个文件夹，编辑其中的这个文件
    #[arg(long, global = true, value_name = "FILE")]
    nested: Option<String>,

    /// 以 JSON 输出响应
    #[arg(long, global = true)]
    json: bool,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// 显示聚合后的表格
    Show,
    /// 列出嵌套结构下可选的文件
    Files,
    /// 新建语言
    AddLanguage { lang: String },
    /// 重命名语言（文件或文件夹）
    RenameLanguage { lang: String, new_name: String },
    /// 在所有语言中添加键
    AddKey { key: String },
    /// 在所有语言中删除键
    DeleteKey { key: String },
    /// 复制键到新键
    DuplicateKey { original_key: String, new_key: String },
    /// 重命名键
    RenameKey { old_key: String, new_key: String },
    /// 设置某语言某键的值
    Set { lang: String, key: String, value: String },
    /// 保存语言列顺序
    Reorder { order: Vec<String> },
    /// 复制键路径到剪贴板
    CopyKey { key: String },
    /// 从标准输入逐行读取 JSON 命令，向标准输出逐行写出响应
    Serve,
    /// 把 JSON 文件展开为扁平键值
    Flatten { file: PathBuf },
    /// 把扁平键值 JSON 还原为嵌套结构
    Unflatten {
        file: PathBuf,
        /// 写入文件而不是标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Action {
    fn into_command(self) -> Option<Command> {
        Some(match self {
            Action::Show => Command::Refresh,
            Action::Files => Command::ListFiles,
            Action::AddLanguage { lang } => Command::AddLanguage { lang },
            Action::RenameLanguage { lang, new_name } => Command::RenameLanguage { lang, new_name },
            Action::AddKey { key } => Command::AddKey { key },
            Action::DeleteKey { key } => Command::DeleteKey { key },
            Action::DuplicateKey {
                original_key,
                new_key,
            } => Command::DuplicateKey {
                original_key,
                new_key,
            },
            Action::RenameKey { old_key, new_key } => Command::RenameKey { old_key, new_key },
            Action::Set { lang, key, value } => Command::SetValue { lang, key, value },
            Action::Reorder { order } => Command::ReorderLanguages { order },
            Action::CopyKey { key } => Command::CopyKey { key },
            Action::Serve | Action::Flatten { .. } | Action::Unflatten { .. } => return None,
        })
    }
}

fn render_table(table: &AggregatedTable) -> String {
    const MISSING: &str = "<缺失>";
    let mut out = String::new();
    let mut header = vec!["key".to_string()];
    header.extend(
        table
            .languages
            .iter()
            .map(|l| format!("{} ({} 缺失)", l, table.missing_count(l))),
    );
    out.push_str(&header.join("\t"));
    out.push('\n');
    for key in &table.keys {
        let mut row = vec![key.clone()];
        for lang in &table.languages {
            row.push(match table.cell(lang, key) {
                Cell::Value(v) => v.replace('\n', "\\n"),
                Cell::Missing => MISSING.to_string(),
            });
        }
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

fn print_response(resp: &Response, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(resp)?);
        return Ok(());
    }
    for notice in &resp.notices {
        eprintln!("{}", notice.message);
    }
    if let Some(table) = &resp.table {
        print!("{}", render_table(table));
    }
    for file in &resp.files {
        println!("{}", file);
    }
    eprintln!("{}", resp.status);
    Ok(())
}

fn serve(bridge: &mut ViewModelBridge<SystemClipboard>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Command>(&line) {
            Ok(cmd) => serde_json::to_value(bridge.dispatch(cmd))?,
            Err(e) => {
                tracing::warn!("无法解析命令: {}", e);
                serde_json::json!({ "ok": false, "status": format!("无法解析命令: {}", e), "notices": [] })
            }
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn flatten_file(file: &Path) -> Result<()> {
    let doc = read_json_file(file).with_context(|| format!("读取 {} 失败", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&flatten(&doc))?);
    Ok(())
}

fn unflatten_file(file: &Path, output: Option<&Path>) -> Result<()> {
    let value = read_json_file(file).with_context(|| format!("读取 {} 失败", file.display()))?;
    let flat: FlatCatalog =
        serde_json::from_value(value).context("扁平文件必须是 键 -> 字符串 的对象")?;
    let doc = unflatten(&flat);
    match output {
        Some(path) => write_json_file(path, &doc)?,
        None => println!("{}", serde_json::to_string_pretty(&doc)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志输出（写到 stderr，保持 stdout 只有结果）
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();

    match &cli.command {
        Action::Flatten { file } => return flatten_file(file),
        Action::Unflatten { file, output } => return unflatten_file(file, output.as_deref()),
        _ => {}
    }

    let config = cli.config.clone().or_else(Settings::default_path);
    let mut bridge = ViewModelBridge::new(AppState::with_settings(config), SystemClipboard);

    if let Some(root) = cli.root.clone() {
        let resp = bridge.dispatch(Command::Open {
            root,
            nested_file: cli.nested.clone(),
        });
        if !resp.ok {
            print_response(&resp, cli.json)?;
            anyhow::bail!("{}", resp.status);
        }
    } else if let Some(file_name) = cli.nested.clone() {
        let resp = bridge.dispatch(Command::SelectFile { file_name });
        if !resp.ok {
            eprintln!("{}", resp.status);
        }
    }

    match cli.command {
        Action::Serve => {
            tracing::info!("进入命令服务模式");
            serve(&mut bridge)
        }
        action => {
            let Some(command) = action.into_command() else {
                return Ok(());
            };
            let resp = bridge.dispatch(command);
            print_response(&resp, cli.json)?;
            if !resp.ok {
                anyhow::bail!("{}", resp.status);
            }
            Ok(())
        }
    }
}
