// HTTP層との境界: data URL のアップロードと base64 レスポンス

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::form::extractor::FieldRecord;
use crate::pdf::DocumentAdapter;
use crate::pipeline::tool::FormTool;

/// base64ペイロードをデコードする。
///
/// `data:<mime>;base64,` 形式の場合は最初の `,` より後ろを使う。
/// `None` または空白のみの場合は `None` を返す。
pub fn decode_base64_payload(payload: Option<&str>) -> crate::error::Result<Option<Vec<u8>>> {
    let Some(text) = payload.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let encoded = match text.split_once(',') {
        Some((_, data)) => data.trim(),
        None => text,
    };
    if encoded.is_empty() {
        return Err(FormError::base64("data URL has no payload"));
    }
    Ok(Some(STANDARD.decode(encoded)?))
}

/// アップロード要求。`file` は PDF の data URL（または素の base64）。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(alias = "File")]
    pub file: String,
    /// Fill用のJSON入力。
    #[serde(default, alias = "Content")]
    pub content: Option<String>,
    /// 署名画像の base64 (data URL可)。
    #[serde(default, alias = "Signature")]
    pub signature: Option<String>,
}

impl UploadRequest {
    pub fn from_json(body: &str) -> crate::error::Result<Self> {
        serde_json::from_str(body).map_err(|e| FormError::input_parse(format!("request body: {e}")))
    }

    /// `file` をPDFバイト列にデコードする。
    pub fn document_bytes(&self) -> crate::error::Result<Vec<u8>> {
        decode_base64_payload(Some(&self.file))?
            .ok_or_else(|| FormError::base64("request has no file payload"))
    }
}

/// Parse応答（フィールド名 → 値、文書順）。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParseResponse(pub FieldRecord);

/// Fill応答。`file` は出力PDFの base64。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillResponse {
    pub file: String,
}

impl FillResponse {
    pub fn document_bytes(&self) -> crate::error::Result<Vec<u8>> {
        Ok(STANDARD.decode(&self.file)?)
    }
}

pub fn handle_parse<A: DocumentAdapter>(
    tool: &FormTool<A>,
    request: &UploadRequest,
) -> crate::error::Result<ParseResponse> {
    let bytes = request.document_bytes()?;
    Ok(ParseResponse(tool.parse(&bytes)?))
}

pub fn handle_fill<A: DocumentAdapter>(
    tool: &FormTool<A>,
    request: &UploadRequest,
) -> crate::error::Result<FillResponse> {
    let bytes = request.document_bytes()?;
    let output = tool.fill(
        &bytes,
        request.content.as_deref(),
        request.signature.as_deref(),
    )?;
    Ok(FillResponse {
        file: STANDARD.encode(output),
    })
}
