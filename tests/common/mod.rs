// テスト共通: lopdf でAcroForm付きPDFを組み立てるヘルパー
#![allow(dead_code)]

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

pub const FF_READ_ONLY: i64 = 1;
pub const FF_RADIO: i64 = 1 << 15;
pub const FF_PUSH_BUTTON: i64 = 1 << 16;
pub const FF_COMBO: i64 = 1 << 17;

/// `[x1 y1 x2 y2]`
pub type RectArr = [i64; 4];

fn rect_object(rect: RectArr) -> Object {
    Object::Array(rect.iter().map(|v| Object::Integer(*v)).collect())
}

/// AcroForm付きPDFのビルダー。
pub struct FormPdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    annots: Vec<Vec<Object>>,
    fields: Vec<Object>,
    inline_acroform: bool,
}

impl FormPdfBuilder {
    /// `page_count` ページ（Letterサイズ）の空フォームを作る。
    pub fn new(page_count: usize) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut page_ids = Vec::new();
        for _ in 0..page_count {
            let contents_id = doc.add_object(Stream::new(dictionary! {}, b"q Q\n".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => contents_id,
            });
            page_ids.push(page_id);
        }
        Self {
            doc,
            pages_id,
            page_ids,
            annots: vec![Vec::new(); page_count],
            fields: Vec::new(),
            inline_acroform: false,
        }
    }

    /// `/AcroForm` をCatalog内のインライン辞書にする。
    pub fn inline_acroform(mut self) -> Self {
        self.inline_acroform = true;
        self
    }

    /// ウィジェットを兼ねる終端フィールドを追加する。
    fn add_merged(&mut self, mut dict: Dictionary, rect: RectArr, page: usize) -> ObjectId {
        let page_id = self.page_ids[page];
        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        dict.set("Rect", rect_object(rect));
        dict.set("P", page_id);
        let id = self.doc.add_object(dict);
        self.fields.push(id.into());
        self.annots[page].push(id.into());
        id
    }

    /// ON/Off の外観を持つ `/AP` 辞書。
    fn on_off_appearance(&mut self, on_state: &str) -> Dictionary {
        let on_id = self
            .doc
            .add_object(Stream::new(appearance_dict(), b"0 g 0 0 5 5 re f\n".to_vec()));
        let off_id = self
            .doc
            .add_object(Stream::new(appearance_dict(), Vec::new()));
        let mut normal = Dictionary::new();
        normal.set(on_state.as_bytes().to_vec(), on_id);
        normal.set("Off", off_id);
        dictionary! { "N" => normal }
    }

    pub fn text(self, name: &str, value: Option<&str>, rect: RectArr) -> Self {
        self.text_on_page(name, value.map(str::as_bytes), rect, 0, 0)
    }

    /// 値のバイト列とフィールドフラグを直接指定するテキストフィールド。
    pub fn text_on_page(
        mut self,
        name: &str,
        value: Option<&[u8]>,
        rect: RectArr,
        page: usize,
        flags: i64,
    ) -> Self {
        let mut dict = dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal(name),
            "Ff" => flags,
        };
        if let Some(v) = value {
            dict.set("V", Object::String(v.to_vec(), lopdf::StringFormat::Literal));
        }
        self.add_merged(dict, rect, page);
        self
    }

    pub fn checkbox(mut self, name: &str, checked: bool, rect: RectArr) -> Self {
        let state = if checked { "Yes" } else { "Off" };
        let ap = self.on_off_appearance("Yes");
        let dict = dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal(name),
            "V" => Object::Name(state.as_bytes().to_vec()),
            "AS" => Object::Name(state.as_bytes().to_vec()),
            "AP" => ap,
        };
        self.add_merged(dict, rect, 0);
        self
    }

    /// オプションごとに `/Kids` ウィジェットを持つラジオグループ。
    ///
    /// 各ウィジェットの外観ON状態名はオプション値と同じ。
    pub fn radio(mut self, name: &str, options: &[&str], selected: Option<&str>) -> Self {
        let parent_id = self.doc.new_object_id();
        let page_id = self.page_ids[0];
        let mut kids = Vec::new();
        for (i, option) in options.iter().enumerate() {
            let ap = self.on_off_appearance(option);
            let state = if selected == Some(*option) { *option } else { "Off" };
            let x = 100 + 40 * i as i64;
            let widget_id = self.doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "Parent" => parent_id,
                "Rect" => rect_object([x, 500, x + 12, 512]),
                "P" => page_id,
                "AS" => Object::Name(state.as_bytes().to_vec()),
                "AP" => ap,
            });
            kids.push(Object::Reference(widget_id));
            self.annots[0].push(widget_id.into());
        }
        let value = selected.unwrap_or("Off");
        self.doc.objects.insert(
            parent_id,
            Object::Dictionary(dictionary! {
                "FT" => "Btn",
                "Ff" => FF_RADIO,
                "T" => Object::string_literal(name),
                "V" => Object::Name(value.as_bytes().to_vec()),
                "Kids" => kids,
            }),
        );
        self.fields.push(parent_id.into());
        self
    }

    pub fn combo(mut self, name: &str, options: &[&str], selected: Option<&str>, rect: RectArr) -> Self {
        let mut dict = dictionary! {
            "FT" => "Ch",
            "Ff" => FF_COMBO,
            "T" => Object::string_literal(name),
            "Opt" => options.iter().map(|o| Object::string_literal(*o)).collect::<Vec<_>>(),
        };
        if let Some(s) = selected {
            dict.set("V", Object::string_literal(s));
        }
        self.add_merged(dict, rect, 0);
        self
    }

    pub fn list_box(mut self, name: &str, options: &[&str], rect: RectArr) -> Self {
        let dict = dictionary! {
            "FT" => "Ch",
            "T" => Object::string_literal(name),
            "Opt" => options.iter().map(|o| Object::string_literal(*o)).collect::<Vec<_>>(),
        };
        self.add_merged(dict, rect, 0);
        self
    }

    pub fn push_button(mut self, name: &str, rect: RectArr) -> Self {
        let dict = dictionary! {
            "FT" => "Btn",
            "Ff" => FF_PUSH_BUTTON,
            "T" => Object::string_literal(name),
        };
        self.add_merged(dict, rect, 0);
        self
    }

    pub fn signature(self, name: &str, rect: RectArr) -> Self {
        self.signature_on_page(name, rect, 0)
    }

    pub fn signature_on_page(mut self, name: &str, rect: RectArr, page: usize) -> Self {
        let dict = dictionary! {
            "FT" => "Sig",
            "T" => Object::string_literal(name),
        };
        self.add_merged(dict, rect, page);
        self
    }

    /// `parent.child` という完全修飾名になる階層テキストフィールド。
    pub fn nested_text(self, parent: &str, child: &str, value: &str, rect: RectArr) -> Self {
        self.nested_text_with_flags(parent, child, value, rect, 0)
    }

    /// 親フィールドに `/Ff` を持たせた入れ子テキスト（子は継承する）。
    pub fn nested_text_with_flags(
        mut self,
        parent: &str,
        child: &str,
        value: &str,
        rect: RectArr,
        parent_flags: i64,
    ) -> Self {
        let parent_id = self.doc.new_object_id();
        let page_id = self.page_ids[0];
        let child_id = self.doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => parent_id,
            "T" => Object::string_literal(child),
            "V" => Object::string_literal(value),
            "Rect" => rect_object(rect),
            "P" => page_id,
        });
        self.annots[0].push(child_id.into());
        let mut parent_dict = dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal(parent),
            "Kids" => vec![Object::Reference(child_id)],
        };
        if parent_flags != 0 {
            parent_dict.set("Ff", parent_flags);
        }
        self.doc.objects.insert(parent_id, Object::Dictionary(parent_dict));
        self.fields.push(parent_id.into());
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        for (page_id, annots) in self.page_ids.iter().zip(&self.annots) {
            if annots.is_empty() {
                continue;
            }
            if let Ok(page) = self.doc.get_dictionary_mut(*page_id) {
                page.set("Annots", annots.clone());
            }
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );

        let acroform = dictionary! { "Fields" => self.fields.clone() };
        let acroform_obj: Object = if self.inline_acroform {
            Object::Dictionary(acroform)
        } else {
            self.doc.add_object(acroform).into()
        };
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
            "AcroForm" => acroform_obj,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).expect("save test pdf");
        buf
    }
}

fn appearance_dict() -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
    }
}

/// "Given Name" / "Driving License" / "Gender" の3フィールドを持つフォーム。
pub fn applicant_form() -> Vec<u8> {
    FormPdfBuilder::new(1)
        .text("Given Name", None, [100, 700, 300, 720])
        .checkbox("Driving License", false, [100, 650, 112, 662])
        .radio("Gender", &["M", "F"], None)
        .build()
}

/// 署名フィールド付きのフォーム（署名矩形: x=100, y=100, 幅200, 高さ50）。
pub fn signable_form() -> Vec<u8> {
    FormPdfBuilder::new(2)
        .text("Given Name", Some("Alice"), [100, 700, 300, 720])
        .signature_on_page("Signature", [100, 100, 300, 150], 1)
        .build()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 200])));
    encode(&img, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 20, 20])));
    encode(&img, ImageFormat::Jpeg)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode test image");
    buf.into_inner()
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn png_data_url(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", to_base64(&png_bytes(width, height)))
}

/// 指定ページ（0-indexed）の結合済みコンテンツストリーム。
pub fn page_content(pdf: &[u8], page_index: usize) -> Vec<u8> {
    let doc = Document::load_mem(pdf).expect("load output pdf");
    let page_id = *doc
        .get_pages()
        .values()
        .nth(page_index)
        .expect("page exists");
    doc.get_page_content(page_id).expect("page content")
}

/// 指定ページの `/Resources /XObject` に登録された名前の一覧。
pub fn page_xobject_names(pdf: &[u8], page_index: usize) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("load output pdf");
    let page_id = *doc
        .get_pages()
        .values()
        .nth(page_index)
        .expect("page exists");
    let page = doc.get_dictionary(page_id).expect("page dict");
    let Ok(resources) = page.get(b"Resources") else {
        return Vec::new();
    };
    let (_, resources) = doc.dereference(resources).expect("resources");
    let Ok(xobjects) = resources.as_dict().and_then(|d| d.get(b"XObject")) else {
        return Vec::new();
    };
    let (_, xobjects) = doc.dereference(xobjects).expect("xobjects");
    xobjects
        .as_dict()
        .expect("xobject dict")
        .iter()
        .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
        .collect()
}

/// 指定フィールド辞書のキーの値（フィールド名で検索）。
pub fn field_entry(pdf: &[u8], name: &str, key: &[u8]) -> Option<Object> {
    let doc = Document::load_mem(pdf).expect("load output pdf");
    let catalog = doc.catalog().expect("catalog");
    let (_, acroform) = doc
        .dereference(catalog.get(b"AcroForm").expect("acroform"))
        .expect("acroform");
    let fields = acroform
        .as_dict()
        .expect("acroform dict")
        .get(b"Fields")
        .expect("fields")
        .as_array()
        .expect("fields array")
        .clone();
    fields.iter().find_map(|f| {
        let dict = doc.get_dictionary(f.as_reference().ok()?).ok()?;
        let Object::String(t, _) = dict.get(b"T").ok()? else {
            return None;
        };
        (t.as_slice() == name.as_bytes())
            .then(|| dict.get(key).ok().cloned())
            .flatten()
    })
}
