// Phase 3: 入力レコード → フィールド値マッピング

use serde_json::{Map, Value};

use crate::error::FormError;
use crate::model::{Document, FieldKind};

/// 入力レコード（フィールド名 → JSON値）。
pub type InputRecord = Map<String, Value>;

/// Fill用のJSON入力を解析する。
///
/// - `None`、空白のみ、JSON `null` は空レコード
/// - 不正なJSON、オブジェクト以外のトップレベル値は `InputParseError`
pub fn parse_input(content: Option<&str>) -> crate::error::Result<InputRecord> {
    let Some(text) = content.filter(|t| !t.trim().is_empty()) else {
        return Ok(InputRecord::new());
    };

    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(InputRecord::new()),
        other => Err(FormError::input_parse(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 入力レコードを名前で文書のフィールドへ適用する。
///
/// 文書側・入力側のどちらかにしかない名前は無視する。
/// `text_font` はテキストフィールドの全ウィジェットに強制する等幅フォント。
pub fn apply_input(document: &mut Document, input: &InputRecord, text_font: &str) {
    for field in document.fields_mut() {
        let entry = input.get(&field.name);

        match &mut field.kind {
            FieldKind::Text { value } => {
                *value = match entry {
                    Some(Value::String(s)) => s.clone(),
                    _ => String::new(),
                };
                for widget in &mut field.widgets {
                    widget.font = Some(text_font.to_string());
                }
                field.mark_dirty();
            }
            FieldKind::Checkbox { checked } => {
                if let Some(Value::Bool(b)) = entry {
                    *checked = *b;
                    field.mark_dirty();
                }
            }
            FieldKind::Radio { selected } => {
                let Some(Value::String(wanted)) = entry else {
                    continue;
                };
                *selected = field
                    .widgets
                    .iter()
                    .find(|w| w.option.as_deref() == Some(wanted.as_str()))
                    .and_then(|w| w.option.clone());
                if selected.is_none() {
                    tracing::debug!(field = %field.name, value = %wanted, "no radio option matched; selection cleared");
                }
                for widget in &mut field.widgets {
                    widget.mark_refresh();
                }
                field.mark_dirty();
            }
            FieldKind::Combo { .. } | FieldKind::Other => {}
        }
    }
}
