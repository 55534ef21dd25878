pub mod provider;

use std::fmt;

use serde::{Deserialize, Serialize};

/// ルールが期待するフィールド種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Text,
    List,
    Bool,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleKind::Text => "Text",
            RuleKind::List => "List",
            RuleKind::Bool => "Bool",
        };
        f.write_str(s)
    }
}

/// 1フィールド分の検証ルール（外部ストアから読み込む読み取り専用レコード）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// 対象フィールド名（完全一致）。
    pub name: String,
    /// 値全体に対して照合する正規表現。
    pub regex: String,
    #[serde(default)]
    pub regex_description: String,
    pub kind: RuleKind,
    #[serde(default)]
    pub form_id: String,
}

impl Rule {
    pub fn new(name: impl Into<String>, regex: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
            regex_description: String::new(),
            kind,
            form_id: String::new(),
        }
    }

    pub fn with_form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = form_id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.regex_description = description.into();
        self
    }
}
