// Phase 3: ルールによるフィールド値検証

use regex::Regex;

use crate::error::FormError;
use crate::form::extractor::bool_text;
use crate::model::{Document, FieldKind};
use crate::rules::{Rule, RuleKind};

/// 不一致だったルール。
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    pub field: String,
    pub value: String,
    pub pattern: String,
    pub description: String,
}

/// 全ルールを評価した結果。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// 正規表現を実際に照合したルール数。
    pub evaluated: usize,
    /// 対象フィールドが無い、または検証対象外の種別だったルール名。
    pub skipped: Vec<String>,
    pub failures: Vec<RuleFailure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 1ルール分の評価結果。
enum Outcome {
    Skipped,
    Checked { matched: bool, value: String },
}

/// パターンを値全体との一致として扱うようアンカーを付けてコンパイルする。
fn compile_full_match(pattern: &str) -> crate::error::Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| FormError::invalid_regex(format!("'{pattern}': {e}")))
}

fn evaluate(document: &Document, rule: &Rule) -> crate::error::Result<Outcome> {
    let Some(field) = document.field(&rule.name) else {
        tracing::warn!(rule = %rule.name, "no field matches rule; skipped");
        return Ok(Outcome::Skipped);
    };

    let regex = compile_full_match(&rule.regex)?;

    let (required, value) = match &field.kind {
        FieldKind::Text { value } => (RuleKind::Text, value.clone()),
        FieldKind::Combo { selected, .. } => (RuleKind::List, selected.clone().unwrap_or_default()),
        FieldKind::Checkbox { checked } => (RuleKind::Bool, bool_text(*checked).to_string()),
        FieldKind::Radio { .. } | FieldKind::Other => {
            tracing::debug!(rule = %rule.name, kind = %field.kind, "field kind not validated; skipped");
            return Ok(Outcome::Skipped);
        }
    };

    if rule.kind != required {
        return Err(FormError::rule_kind_mismatch(&rule.name, required, rule.kind));
    }

    Ok(Outcome::Checked {
        matched: regex.is_match(&value),
        value,
    })
}

/// ルールを順に評価し、全て一致すれば true を返す。
///
/// 最初の不一致で false を返し、以降のルールはイテレータから取り出さない。
/// 種別の不一致は `RuleKindMismatch` で検証全体を中断する。
pub fn validate<'a, I>(document: &Document, rules: I) -> crate::error::Result<bool>
where
    I: IntoIterator<Item = &'a Rule>,
{
    for rule in rules {
        if let Outcome::Checked { matched: false, value } = evaluate(document, rule)? {
            tracing::debug!(rule = %rule.name, %value, "rule did not match");
            return Ok(false);
        }
    }
    Ok(true)
}

/// 全ルールを評価し、不一致をすべて集めた報告を返す。
///
/// 種別の不一致と不正な正規表現は `validate` と同様に中断する。
pub fn validate_report<'a, I>(document: &Document, rules: I) -> crate::error::Result<ValidationReport>
where
    I: IntoIterator<Item = &'a Rule>,
{
    let mut report = ValidationReport::default();
    for rule in rules {
        match evaluate(document, rule)? {
            Outcome::Skipped => report.skipped.push(rule.name.clone()),
            Outcome::Checked { matched, value } => {
                report.evaluated += 1;
                if !matched {
                    report.failures.push(RuleFailure {
                        field: rule.name.clone(),
                        value,
                        pattern: rule.regex.clone(),
                        description: rule.regex_description.clone(),
                    });
                }
            }
        }
    }
    Ok(report)
}
