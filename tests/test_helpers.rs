// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试数据目录（复制仓库自带的 data/ 样例）与 JSON 读写
// ==========================================

#![allow(dead_code)]

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 仓库自带的样例数据目录
pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// 复制样例数据到临时目录（测试可随意修改）
pub fn copy_fixture() -> TempDir {
    let dir = TempDir::new().expect("无法创建临时目录");
    copy_dir(&fixture_dir(), dir.path());
    dir
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("无法创建目录");
    for entry in fs::read_dir(from).expect("无法读取样例目录") {
        let entry = entry.expect("目录项读取失败");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("文件复制失败");
        }
    }
}

/// 写入 JSON 文件（自动创建父目录）
pub fn write_json(root: &Path, rel: &str, value: &Value) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("无法创建目录");
    }
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).expect("写入失败");
}

/// 读取 JSON 文件
pub fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("读取失败");
    serde_json::from_str(&text).expect("JSON 解析失败")
}
