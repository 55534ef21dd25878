// Phase 3: フィールド値 → 出力レコード

use indexmap::IndexMap;

use crate::model::{Document, FieldKind};

/// 出力レコード（フィールド名 → 文字列）。文書のフィールド順を保持する。
pub type FieldRecord = IndexMap<String, String>;

/// 真偽値の文字列表現（"True" / "False"）。
pub fn bool_text(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// 全フィールドの現在値を文書順に取り出す。失敗しない。
///
/// 未選択のラジオボタンは空文字列になる。
pub fn extract_fields(document: &Document) -> FieldRecord {
    document
        .fields()
        .iter()
        .map(|field| {
            let value = match &field.kind {
                FieldKind::Text { value } => value.clone(),
                FieldKind::Checkbox { checked } => bool_text(*checked).to_string(),
                FieldKind::Radio { selected } => selected.clone().unwrap_or_default(),
                FieldKind::Combo { .. } | FieldKind::Other => String::new(),
            };
            (field.name.clone(), value)
        })
        .collect()
}

/// 出力レコードをJSONオブジェクト文字列にする（キー順は文書順）。
pub fn to_json(record: &FieldRecord) -> crate::error::Result<String> {
    serde_json::to_string(record)
        .map_err(|e| crate::error::FormError::encode(format!("record serialization: {e}")))
}
