pub mod content_stream;
pub mod image_xobject;
pub mod reader;
pub mod text;
pub mod writer;

use crate::error::FormError;
use crate::model::Document;
use reader::PdfReader;
use writer::FormWriter;

/// 文書モデルプロバイダとの境界。バイト列とフォームモデルを相互変換する。
pub trait DocumentAdapter {
    /// バイト列を読み込む。壊れた入力は `DecodeError`。
    fn import(&self, bytes: &[u8]) -> crate::error::Result<Document>;

    /// モデルの状態を書き戻したバイト列を返す。
    fn export(&self, document: &Document) -> crate::error::Result<Vec<u8>>;
}

/// lopdf をプロバイダとするアダプタ。
#[derive(Debug, Clone)]
pub struct LopdfAdapter {
    need_appearances: bool,
}

impl Default for LopdfAdapter {
    fn default() -> Self {
        Self {
            need_appearances: true,
        }
    }
}

impl LopdfAdapter {
    /// `need_appearances` が true なら、テキスト値を書き換えたときに
    /// `/AcroForm /NeedAppearances` を立ててビューアに外観の再生成を促す。
    pub fn new(need_appearances: bool) -> Self {
        Self { need_appearances }
    }
}

impl DocumentAdapter for LopdfAdapter {
    fn import(&self, bytes: &[u8]) -> crate::error::Result<Document> {
        PdfReader::from_bytes(bytes)?.read_form()
    }

    fn export(&self, document: &Document) -> crate::error::Result<Vec<u8>> {
        let base = document
            .backing()
            .cloned()
            .ok_or_else(|| FormError::encode("document was not imported from PDF bytes"))?;
        let mut writer = FormWriter::new(base, self.need_appearances);
        writer.write_document(document)?;
        let bytes = writer.save_to_bytes()?;
        tracing::debug!(bytes = bytes.len(), "exported form document");
        Ok(bytes)
    }
}
