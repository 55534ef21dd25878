use std::path::Path;

use serde::Deserialize;

/// 署名画像を配置するページの決め方。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignaturePage {
    /// 常に先頭ページへ配置する。
    First,
    /// 対象ウィジェットが置かれているページへ配置する（不明なら先頭ページ）。
    Widget,
}

/// 検証ルールの評価方針。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// 最初の不一致で打ち切る。
    ShortCircuit,
    /// 全ルールを評価し、不一致をすべて報告する。
    Aggregate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub signature_field: String,
    pub text_font: String,
    pub signature_page: SignaturePage,
    pub validation_mode: ValidationMode,
    pub need_appearances: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            signature_field: "signature".to_string(),
            text_font: "Courier".to_string(),
            signature_page: SignaturePage::First,
            validation_mode: ValidationMode::ShortCircuit,
            need_appearances: true,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::FormError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        if settings.signature_field.trim().is_empty() {
            return Err(crate::error::FormError::config(
                "signature_field cannot be empty",
            ));
        }
        if settings.text_font.trim().is_empty() {
            return Err(crate::error::FormError::config("text_font cannot be empty"));
        }
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
