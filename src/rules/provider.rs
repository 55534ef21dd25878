// Phase 6: ルール供給元（読み取り専用）

use std::path::Path;

use serde::Deserialize;

use super::Rule;

/// フォームIDに対応する検証ルールを供給する読み取り専用インターフェース。
///
/// リレーショナルストアなどの実装は呼び出し側が用意する。
pub trait RuleProvider {
    fn rules_for_form(&self, form_id: &str) -> crate::error::Result<Vec<Rule>>;
}

/// メモリ上のルール一覧から供給するプロバイダ。
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleProvider {
    rules: Vec<Rule>,
}

impl InMemoryRuleProvider {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }
}

impl RuleProvider for InMemoryRuleProvider {
    /// 登録順を保ったまま `form_id` が一致するルールを返す。
    fn rules_for_form(&self, form_id: &str) -> crate::error::Result<Vec<Rule>> {
        Ok(self
            .rules
            .iter()
            .filter(|r| r.form_id == form_id)
            .cloned()
            .collect())
    }
}

/// YAMLのルールファイル。
///
/// ```yaml
/// rules:
///   - name: "Given Name Text Box"
///     regex: "[A-Za-z ]+"
///     kind: text
///     form_id: "116"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleFile {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::FormError::config(format!("Failed to parse rule file YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn into_provider(self) -> InMemoryRuleProvider {
        InMemoryRuleProvider::new(self.rules)
    }
}
