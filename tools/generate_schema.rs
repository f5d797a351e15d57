//! JSON Schema + Markdown生成ツール
//!
//! src/domain/config.rsの設定構造から以下を自動生成します：
//! 1. JSON Schema (schema/config.json)
//! 2. Markdownドキュメント (CONFIGURATION.md)
//!
//! 実行方法:
//! ```
//! cargo run --bin generate_schema
//! ```

use schemars::schema_for;
use serde_json::{Map, Value};
use std::fs;
use Kitsutsuki::domain::config::AppConfig;

fn main() {
    println!("JSON Schema + Markdown生成中...");

    let schema = schema_for!(AppConfig);

    let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema to JSON");

    fs::create_dir_all("schema").expect("Failed to create schema/ directory");
    fs::write("schema/config.json", json.clone()).expect("Failed to write schema/config.json");
    println!("  ✓ schema/config.json");

    let schema_value: Value =
        serde_json::from_str(&json).expect("Failed to parse generated schema");
    let markdown = generate_markdown(&schema_value);

    fs::write("CONFIGURATION.md", markdown).expect("Failed to write CONFIGURATION.md");
    println!("  ✓ CONFIGURATION.md");

    println!("✅ 生成完了: schema/config.json + CONFIGURATION.md");
}

/// JSON Schemaからマークダウンドキュメントを生成
fn generate_markdown(schema: &Value) -> String {
    let mut md = String::new();

    md.push_str("# 設定リファレンス (Configuration Reference)\n\n");

    md.push_str("## 概要\n\n");
    md.push_str("`config.toml`ファイルは、Kitsutsukiの動作を制御する設定ファイルです。\n");
    md.push_str("JSON Schemaによる検証により、設定の正確性が保証されています。\n\n");

    md.push_str("**設定ファイルの場所**: `config.toml` (プロジェクトルート)  \n");
    md.push_str("**スキーマファイル**: `schema/config.json` (自動生成)\n\n");

    md.push_str("⚠️ **注意**: このドキュメント（CONFIGURATION.md）は `cargo run --bin generate_schema` で自動生成されます。\n");
    md.push_str("設定項目の説明を変更する場合は、`src/domain/config.rs`のdoc commentsを編集してください。\n\n");

    md.push_str("## 設定ファイルの読み込み\n\n");
    md.push_str("- `config.toml`が存在する場合: ファイルから読み込み\n");
    md.push_str("- ファイルが存在しない場合: デフォルト設定を書き出して使用\n");
    md.push_str("- 検証失敗時: エラー終了\n\n");

    md.push_str("## 設定項目\n\n");

    let defs = schema
        .get("$defs")
        .and_then(|d| d.as_object())
        .cloned()
        .unwrap_or_default();

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, prop) in props {
            generate_property_section(&mut md, key, prop, &defs);
        }
    }

    md.push_str("## 参考\n\n");
    md.push_str("- [README.md](README.md) - クイックスタート\n");

    md
}

/// プロパティセクションを生成
fn generate_property_section(
    md: &mut String,
    key: &str,
    schema: &Value,
    defs: &Map<String, Value>,
) {
    let section_name = format_section_name(key);
    md.push_str(&format!("### [{}] - {}\n\n", key, section_name));

    if let Some(desc) = schema.get("description") {
        md.push_str(&format!("{}\n\n", desc.as_str().unwrap_or("")));
    }

    // $refの場合、定義を取得
    if let Some(ref_str) = schema.get("$ref").and_then(|r| r.as_str()) {
        if let Some(def_name) = ref_str.strip_prefix("#/$defs/") {
            if let Some(def_schema) = defs.get(def_name) {
                generate_properties_table(md, def_schema);
            }
        }
    }

    if schema.get("properties").is_some() {
        generate_properties_table(md, schema);
    }
}

/// プロパティテーブルを生成
fn generate_properties_table(md: &mut String, schema: &Value) {
    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        if props.is_empty() {
            return;
        }

        md.push_str("| 設定項目 | 型 | デフォルト | 説明 |\n");
        md.push_str("|---------|-----|---------|---------|\n");

        for (prop_key, prop_schema) in props {
            let field_name = format!("`{}`", prop_key);
            let type_str = get_type_string(prop_schema).replace('|', "\\|");
            let default = get_default_value(prop_schema);
            let description = get_description(prop_schema);

            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                field_name, type_str, default, description
            ));
        }
        md.push('\n');
    }
}

/// 型を文字列で取得
fn get_type_string(schema: &Value) -> String {
    if let Some(type_val) = schema.get("type") {
        match type_val {
            Value::String(type_str) => {
                return match type_str.as_str() {
                    "integer" | "number" => schema
                        .get("format")
                        .and_then(|f| f.as_str())
                        .unwrap_or(type_str)
                        .to_string(),
                    "boolean" => "bool".to_string(),
                    other => other.to_string(),
                };
            }
            Value::Array(types) => {
                // Union type (e.g., ["string", "null"])
                let type_strs: Vec<String> = types
                    .iter()
                    .filter_map(|t| t.as_str().map(|s| s.to_string()))
                    .collect();
                if !type_strs.is_empty() {
                    return type_strs.join(" | ");
                }
            }
            _ => {}
        }
    }

    "unknown".to_string()
}

/// デフォルト値を取得
fn get_default_value(schema: &Value) -> String {
    if let Some(default) = schema.get("default") {
        match default {
            Value::String(s) => format!("`\"{}\"`", s),
            Value::Number(n) => format!("`{}`", n),
            Value::Bool(b) => format!("`{}`", b),
            Value::Null => "`null`".to_string(),
            _ => "-".to_string(),
        }
    } else {
        "-".to_string()
    }
}

/// 説明文を取得
fn get_description(schema: &Value) -> String {
    if let Some(desc) = schema.get("description").and_then(|d| d.as_str()) {
        return desc
            .replace("\n\n", "<br><br>")
            .replace('\n', " ")
            .replace('|', "\\|");
    }

    "-".to_string()
}

/// セクション名をフォーマット
fn format_section_name(key: &str) -> String {
    match key {
        "input" => "入力デバイス設定".to_string(),
        "clicker" => "クリック生成設定".to_string(),
        "stats" => "統計設定".to_string(),
        _ => key.to_string(),
    }
}
