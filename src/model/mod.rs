pub mod field;
pub mod raster;

use lopdf::ObjectId;

pub use field::{Field, FieldKind, Rect, Widget};
pub use raster::RasterImage;

/// ページに配置された画像（ページ座標系、PDFポイント単位）。
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub image: RasterImage,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// このセッション中にページへ追加されたコンテンツ要素。
#[derive(Debug, Clone)]
pub enum PageElement {
    Image(PlacedImage),
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub elements: Vec<PageElement>,
    pub(crate) handle: Option<ObjectId>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_handle(handle: ObjectId) -> Self {
        Self {
            elements: Vec::new(),
            handle: Some(handle),
        }
    }
}

/// 1回の操作の間だけ存在するインメモリのフォーム文書。
///
/// フィールドは文書本来の順序を保持し、名前は一意である。
/// インポート元の lopdf 文書を保持している場合、エクスポート時にその文書へ書き戻す。
#[derive(Debug, Clone, Default)]
pub struct Document {
    pages: Vec<Page>,
    fields: Vec<Field>,
    backing: Option<lopdf::Document>,
}

impl Document {
    /// 同名フィールドが複数ある場合は最初のものだけを残す。
    pub fn new(pages: Vec<Page>, fields: Vec<Field>) -> Self {
        let mut unique: Vec<Field> = Vec::with_capacity(fields.len());
        for field in fields {
            if unique.iter().any(|f| f.name == field.name) {
                tracing::warn!(field = %field.name, "duplicate field name ignored");
                continue;
            }
            unique.push(field);
        }
        Self {
            pages,
            fields: unique,
            backing: None,
        }
    }

    pub(crate) fn with_backing(mut self, backing: lopdf::Document) -> Self {
        self.backing = Some(backing);
        self
    }

    pub(crate) fn backing(&self) -> Option<&lopdf::Document> {
        self.backing.as_ref()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    /// 名前の完全一致でフィールドを検索する。
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}
