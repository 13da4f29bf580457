//! 通过命令桥接层驱动完整的“扫描 - 修改 - 写回 - 重扫”流程

use std::fs;
use std::path::Path;

use fanyi_biaoge::model::catalog::Cell;
use fanyi_biaoge::utils::clipboard::MemoryClipboard;
use fanyi_biaoge::utils::fs::read_json_file;
use fanyi_biaoge::vm::bridge::{Command, ViewModelBridge, STATUS_PARTIAL, STATUS_SAVED};
use fanyi_biaoge::AppState;
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("创建目录失败");
    }
    fs::write(path, content).expect("写入文件失败");
}

fn open_bridge(root: &Path, nested_file: Option<&str>) -> ViewModelBridge<MemoryClipboard> {
    let mut bridge = ViewModelBridge::new(AppState::default(), MemoryClipboard::default());
    let resp = bridge.dispatch(Command::Open {
        root: root.to_path_buf(),
        nested_file: nested_file.map(str::to_string),
    });
    assert!(resp.ok, "打开目录应成功: {}", resp.status);
    bridge
}

#[test]
fn test_flat_folder_edit_cycle() {
    let dir = TempDir::new().expect("创建临时目录失败");
    write(dir.path(), "en.json", r#"{"a":{"b":"hello","c":["x","y"]}}"#);
    write(dir.path(), "vi.json", "{}");
    let mut bridge = open_bridge(dir.path(), None);

    let resp = bridge.dispatch(Command::Refresh);
    let table = resp.table.expect("应返回表格");
    assert_eq!(table.languages, vec!["en", "vi"]);
    assert_eq!(table.keys, vec!["a.b", "a.c[0]", "a.c[1]"]);
    assert_eq!(table.cell("vi", "a.b"), Cell::Missing);

    let resp = bridge.dispatch(Command::SetValue {
        lang: "vi".into(),
        key: "a.b".into(),
        value: "xin chào".into(),
    });
    assert_eq!(resp.status, STATUS_SAVED);
    assert_eq!(
        resp.table.as_ref().unwrap().cell("vi", "a.b"),
        Cell::Value("xin chào")
    );
    assert_eq!(
        read_json_file(&dir.path().join("vi.json")).unwrap(),
        json!({"a": {"b": "xin chào"}})
    );

    let resp = bridge.dispatch(Command::AddKey {
        key: "new.key".into(),
    });
    let table = resp.table.unwrap();
    for lang in ["en", "vi"] {
        assert_eq!(table.data[lang].get("new.key").map(String::as_str), Some(""));
    }

    bridge.dispatch(Command::DuplicateKey {
        original_key: "a.c[1]".into(),
        new_key: "a.d".into(),
    });
    let resp = bridge.dispatch(Command::DeleteKey { key: "a.b".into() });
    let table = resp.table.unwrap();
    assert!(!table.keys.contains(&"a.b".to_string()));
    assert_eq!(table.data["en"]["a.d"], "y");
    assert!(!table.data["vi"].contains_key("a.d"));
}

#[test]
fn test_broken_language_reported_but_others_proceed() {
    let dir = TempDir::new().expect("创建临时目录失败");
    write(dir.path(), "en.json", r#"{"k":"v"}"#);
    write(dir.path(), "de.json", "[oops");
    let mut bridge = open_bridge(dir.path(), None);

    let resp = bridge.dispatch(Command::DeleteKey { key: "k".into() });
    assert!(resp.ok);
    assert_eq!(resp.status, STATUS_PARTIAL);
    // 修改失败一次 + 重扫失败一次
    assert_eq!(resp.notices.len(), 2);
    assert!(resp
        .notices
        .iter()
        .all(|n| n.language.as_deref() == Some("de")));
    let table = resp.table.unwrap();
    assert_eq!(table.languages, vec!["de", "en"]);
    assert!(table.data["de"].is_empty());
    assert!(table.keys.is_empty());
}

#[test]
fn test_nested_folders_and_language_management() {
    let dir = TempDir::new().expect("创建临时目录失败");
    write(dir.path(), "en/common.json", r#"{"ok":"OK"}"#);
    write(dir.path(), "zh/common.json", r#"{"ok":"好"}"#);
    write(dir.path(), "fr/home.json", r#"{"t":"Titre"}"#);
    let mut bridge = open_bridge(dir.path(), Some("common"));

    let resp = bridge.dispatch(Command::ListFiles);
    assert_eq!(resp.files, vec!["common", "home"]);
    assert_eq!(resp.table.unwrap().languages, vec!["en", "zh"]);

    let resp = bridge.dispatch(Command::AddKey { key: "cancel".into() });
    assert!(
        !dir.path().join("fr").join("common.json").exists(),
        "没有该文件的语言不应被创建文件"
    );
    assert_eq!(resp.table.unwrap().keys, vec!["cancel", "ok"]);

    let resp = bridge.dispatch(Command::AddLanguage { lang: "fr".into() });
    assert!(resp.ok, "{}", resp.status);
    let table = resp.table.unwrap();
    assert_eq!(table.languages, vec!["en", "fr", "zh"]);
    assert_eq!(table.missing_count("fr"), 2);

    bridge.dispatch(Command::ReorderLanguages {
        order: vec!["zh".into(), "en".into()],
    });
    let resp = bridge.dispatch(Command::RenameLanguage {
        lang: "zh".into(),
        new_name: "zh-CN".into(),
    });
    assert!(resp.ok, "{}", resp.status);
    assert_eq!(resp.table.unwrap().languages, vec!["zh-CN", "en", "fr"]);
    assert!(dir.path().join("zh-CN").join("common.json").is_file());

    let resp = bridge.dispatch(Command::SelectFile {
        file_name: "home.json".into(),
    });
    let table = resp.table.unwrap();
    assert_eq!(table.languages, vec!["fr"]);
    assert_eq!(table.keys, vec!["t"]);
}

#[test]
fn test_rename_language_to_existing_fails() {
    let dir = TempDir::new().expect("创建临时目录失败");
    write(dir.path(), "en.json", "{}");
    write(dir.path(), "vi.json", "{}");
    let mut bridge = open_bridge(dir.path(), None);

    let resp = bridge.dispatch(Command::RenameLanguage {
        lang: "en".into(),
        new_name: "vi".into(),
    });
    assert!(!resp.ok);
    assert_eq!(resp.table.unwrap().languages, vec!["en", "vi"]);
}
