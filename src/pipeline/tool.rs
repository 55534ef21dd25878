// Phase 7: 操作単位: 読込 -> マッピング/抽出/検証/署名 -> 書き戻し

use crate::config::settings::{Settings, ValidationMode};
use crate::error::FormError;
use crate::form::extractor::{self, FieldRecord};
use crate::form::mapper::{apply_input, parse_input};
use crate::form::signature::place_signature;
use crate::form::unlock_fields;
use crate::form::validator::{self, ValidationReport};
use crate::model::RasterImage;
use crate::pdf::{DocumentAdapter, LopdfAdapter};
use crate::pipeline::request::decode_base64_payload;
use crate::rules::Rule;
use crate::rules::provider::RuleProvider;

/// フォーム操作の入口。
///
/// 各操作は入力バイト列から新しい文書を読み込み、呼び出しをまたいで状態を持たない。
#[derive(Debug, Clone)]
pub struct FormTool<A: DocumentAdapter = LopdfAdapter> {
    adapter: A,
    settings: Settings,
}

impl FormTool<LopdfAdapter> {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let adapter = LopdfAdapter::new(settings.need_appearances);
        Self { adapter, settings }
    }
}

impl Default for FormTool<LopdfAdapter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: DocumentAdapter> FormTool<A> {
    /// 任意のアダプタで構築する。
    pub fn with_adapter(adapter: A, settings: Settings) -> Self {
        Self { adapter, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// JSON入力でフィールドを埋め、署名があれば配置して書き出す。
    ///
    /// `signature` は base64 (data URL可)。空白のみなら署名処理は行わない。
    pub fn fill(
        &self,
        bytes: &[u8],
        content: Option<&str>,
        signature: Option<&str>,
    ) -> crate::error::Result<Vec<u8>> {
        let mut document = self.adapter.import(bytes)?;
        let input = parse_input(content)?;
        apply_input(&mut document, &input, &self.settings.text_font);

        if let Some(image_bytes) = decode_base64_payload(signature)? {
            let image = RasterImage::decode(&image_bytes)?;
            place_signature(
                &mut document,
                image,
                &self.settings.signature_field,
                self.settings.signature_page,
            )?;
        }

        let output = self.adapter.export(&document)?;
        tracing::info!(
            fields = document.fields().len(),
            input_keys = input.len(),
            bytes = output.len(),
            "form filled"
        );
        Ok(output)
    }

    /// 全フィールドの現在値を文書順に返す。
    pub fn parse(&self, bytes: &[u8]) -> crate::error::Result<FieldRecord> {
        let document = self.adapter.import(bytes)?;
        Ok(extractor::extract_fields(&document))
    }

    /// `parse` の結果をJSONオブジェクト文字列で返す。
    pub fn parse_json(&self, bytes: &[u8]) -> crate::error::Result<String> {
        extractor::to_json(&self.parse(bytes)?)
    }

    /// ルールを順に評価する（最初の不一致で打ち切り）。
    pub fn validate<'a, I>(&self, bytes: &[u8], rules: I) -> crate::error::Result<bool>
    where
        I: IntoIterator<Item = &'a Rule>,
    {
        let document = self.adapter.import(bytes)?;
        validator::validate(&document, rules)
    }

    /// 全ルールを評価し、不一致の一覧を返す。
    pub fn validate_report<'a, I>(
        &self,
        bytes: &[u8],
        rules: I,
    ) -> crate::error::Result<ValidationReport>
    where
        I: IntoIterator<Item = &'a Rule>,
    {
        let document = self.adapter.import(bytes)?;
        validator::validate_report(&document, rules)
    }

    /// フォームIDに対応するルールを取得して検証する。
    ///
    /// `Settings::validation_mode` が `aggregate` の場合は全ルールを評価し、
    /// 不一致をすべてログに出してから結果を返す。
    pub fn validate_form(
        &self,
        bytes: &[u8],
        provider: &dyn RuleProvider,
        form_id: &str,
    ) -> crate::error::Result<bool> {
        let rules = provider.rules_for_form(form_id)?;
        tracing::debug!(form_id, rules = rules.len(), "rules loaded");

        match self.settings.validation_mode {
            ValidationMode::ShortCircuit => self.validate(bytes, &rules),
            ValidationMode::Aggregate => {
                let report = self.validate_report(bytes, &rules)?;
                for failure in &report.failures {
                    tracing::info!(
                        form_id,
                        field = %failure.field,
                        value = %failure.value,
                        description = %failure.description,
                        "rule not satisfied"
                    );
                }
                Ok(report.is_valid())
            }
        }
    }

    /// 署名画像を指定フィールドの位置に配置して書き出す。
    ///
    /// `field_name` が `None` または空白なら `Settings::signature_field` を使う。
    pub fn sign(
        &self,
        bytes: &[u8],
        signature: &str,
        field_name: Option<&str>,
    ) -> crate::error::Result<Vec<u8>> {
        let target = field_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.settings.signature_field);
        let image_bytes = decode_base64_payload(Some(signature))?
            .ok_or_else(|| FormError::base64("signature payload is empty"))?;
        let image = RasterImage::decode(&image_bytes)?;

        let mut document = self.adapter.import(bytes)?;
        place_signature(&mut document, image, target, self.settings.signature_page)?;
        self.adapter.export(&document)
    }

    /// ルールの対象フィールド名を署名先として `sign` する。
    pub fn sign_with_rule(
        &self,
        bytes: &[u8],
        signature: &str,
        rule: &Rule,
    ) -> crate::error::Result<Vec<u8>> {
        self.sign(bytes, signature, Some(&rule.name))
    }

    /// 全フィールドの読み取り専用フラグを外して書き出す。
    pub fn unlock(&self, bytes: &[u8]) -> crate::error::Result<Vec<u8>> {
        let mut document = self.adapter.import(bytes)?;
        let unlocked = unlock_fields(&mut document);
        tracing::info!(unlocked, "form fields unlocked");
        self.adapter.export(&document)
    }
}
