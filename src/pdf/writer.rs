// Phase 5: フォームモデル → PDF書き戻し（フィールド値、外観、署名画像）

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::FormError;
use crate::model::{self, Field, FieldKind, PageElement, Widget};
use crate::pdf::content_stream::{build_image_draw, build_text_appearance};
use crate::pdf::image_xobject::add_image_xobject;
use crate::pdf::reader::FF_READ_ONLY;
use crate::pdf::text::encode_text_string;

/// インポート元のlopdf文書にフォームモデルの状態を書き戻す。
pub struct FormWriter {
    doc: Document,
    need_appearances: bool,
    /// BaseFont名 → (`/DR /Font` 上のリソース名, フォントオブジェクトID)
    fonts: HashMap<String, (String, ObjectId)>,
    text_written: bool,
}

impl FormWriter {
    pub fn new(doc: Document, need_appearances: bool) -> Self {
        Self {
            doc,
            need_appearances,
            fonts: HashMap::new(),
            text_written: false,
        }
    }

    /// モデルの全フィールドとページ要素を書き込む。
    pub fn write_document(&mut self, form: &model::Document) -> crate::error::Result<()> {
        for field in form.fields() {
            self.write_field(field)?;
        }

        if self.text_written && self.need_appearances {
            let acroform_id = self.acroform_id()?;
            self.doc
                .get_dictionary_mut(acroform_id)?
                .set("NeedAppearances", true);
        }

        for (index, page) in form.pages().iter().enumerate() {
            if page.elements.is_empty() {
                continue;
            }
            let page_id = page
                .handle
                .ok_or_else(|| FormError::encode(format!("page {index} has no object id")))?;
            self.write_page_elements(page_id, &page.elements)?;
        }
        Ok(())
    }

    fn write_field(&mut self, field: &Field) -> crate::error::Result<()> {
        let Some(field_id) = field.handle else {
            return Ok(());
        };

        // 親から継承したフラグも終端フィールド自身の /Ff で上書きする
        if !field.read_only
            && let Some(flags) = self.effective_flags(field_id)
            && flags & FF_READ_ONLY != 0
        {
            self.doc
                .get_dictionary_mut(field_id)?
                .set("Ff", flags & !FF_READ_ONLY);
        }

        if !field.is_dirty() {
            return Ok(());
        }

        match &field.kind {
            FieldKind::Text { value } => {
                self.doc.get_dictionary_mut(field_id)?.set(
                    "V",
                    Object::String(encode_text_string(value), StringFormat::Literal),
                );
                for widget in &field.widgets {
                    self.write_text_widget(widget, value)?;
                }
                self.text_written = true;
            }
            FieldKind::Checkbox { checked } => {
                let state = field
                    .widgets
                    .first()
                    .and_then(|w| w.on_state.clone())
                    .unwrap_or_else(|| "Yes".to_string());
                let value = if *checked { state.as_str() } else { "Off" };
                self.doc
                    .get_dictionary_mut(field_id)?
                    .set("V", Object::Name(value.as_bytes().to_vec()));
                for widget in &field.widgets {
                    let on = widget.on_state.as_deref().unwrap_or("Yes");
                    self.set_appearance_state(widget, if *checked { on } else { "Off" })?;
                }
            }
            FieldKind::Radio { selected } => {
                let selected_state = selected.as_deref().and_then(|opt| {
                    field
                        .widgets
                        .iter()
                        .find(|w| w.option.as_deref() == Some(opt))
                        .map(radio_state)
                });
                let value = selected_state.as_deref().unwrap_or("Off");
                self.doc
                    .get_dictionary_mut(field_id)?
                    .set("V", Object::Name(value.as_bytes().to_vec()));
                for widget in field.widgets.iter().filter(|w| w.needs_refresh()) {
                    let state = radio_state(widget);
                    let as_state = if selected_state.as_deref() == Some(state.as_str()) {
                        state.as_str()
                    } else {
                        "Off"
                    };
                    self.set_appearance_state(widget, as_state)?;
                }
            }
            FieldKind::Combo { .. } | FieldKind::Other => {}
        }
        Ok(())
    }

    /// フィールドに効いている `/Ff`。自身になければ `/Parent` をたどって継承値を探す。
    fn effective_flags(&self, field_id: ObjectId) -> Option<i64> {
        let mut current = self.doc.get_dictionary(field_id).ok()?;
        for _ in 0..32 {
            if let Ok(flags) = current.get(b"Ff").and_then(Object::as_i64) {
                return Some(flags);
            }
            let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent_id).ok()?;
        }
        None
    }

    fn set_appearance_state(&mut self, widget: &Widget, state: &str) -> crate::error::Result<()> {
        if let Some(widget_id) = widget.handle {
            self.doc
                .get_dictionary_mut(widget_id)?
                .set("AS", Object::Name(state.as_bytes().to_vec()));
        }
        Ok(())
    }

    /// テキストウィジェットのフォント指定 (`/DA`) と通常外観を書き換える。
    fn write_text_widget(&mut self, widget: &Widget, value: &str) -> crate::error::Result<()> {
        let (Some(widget_id), Some(base_font)) = (widget.handle, widget.font.as_deref()) else {
            return Ok(());
        };
        let (resource, font_id) = self.ensure_form_font(base_font)?;

        let content = build_text_appearance(&resource, value, widget.rect.width, widget.rect.height);
        let mut font_dict = Dictionary::new();
        font_dict.set(resource.as_bytes().to_vec(), Object::Reference(font_id));
        let appearance = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real(widget.rect.width as f32),
                    Object::Real(widget.rect.height as f32),
                ],
                "Resources" => dictionary! { "Font" => font_dict },
            },
            content,
        );
        let appearance_id = self.doc.add_object(appearance);

        let dict = self.doc.get_dictionary_mut(widget_id)?;
        dict.set(
            "DA",
            Object::string_literal(format!("/{resource} 0 Tf 0 g")),
        );
        dict.set("AP", dictionary! { "N" => appearance_id });
        Ok(())
    }

    /// `/AcroForm /DR /Font` に指定BaseFontの標準フォントを登録し、リソース名を返す。
    fn ensure_form_font(&mut self, base_font: &str) -> crate::error::Result<(String, ObjectId)> {
        if let Some(entry) = self.fonts.get(base_font) {
            return Ok(entry.clone());
        }

        let acroform_id = self.acroform_id()?;
        let dr_id = self.indirect_dict(acroform_id, b"DR")?;
        let font_res_id = self.indirect_dict(dr_id, b"Font")?;

        // 既存の同じBaseFontがあれば再利用する
        let existing = self
            .doc
            .get_dictionary(font_res_id)?
            .iter()
            .find_map(|(name, obj)| {
                let id = obj.as_reference().ok()?;
                let font = self.doc.get_dictionary(id).ok()?;
                let bf = font.get(b"BaseFont").ok()?.as_name().ok()?;
                (bf == base_font.as_bytes())
                    .then(|| (String::from_utf8_lossy(name).into_owned(), id))
            });

        let entry = match existing {
            Some(entry) => entry,
            None => {
                let font_id = self.doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
                    "Encoding" => "WinAnsiEncoding",
                });
                let mut resource: String =
                    base_font.chars().filter(char::is_ascii_alphanumeric).collect();
                if resource.is_empty() {
                    resource = "F".to_string();
                }
                let fonts = self.doc.get_dictionary_mut(font_res_id)?;
                while fonts.has(resource.as_bytes()) {
                    resource.push('_');
                }
                fonts.set(resource.as_bytes().to_vec(), Object::Reference(font_id));
                (resource, font_id)
            }
        };

        self.fonts.insert(base_font.to_string(), entry.clone());
        Ok(entry)
    }

    /// Catalog の `/AcroForm` を間接オブジェクトとして取得する（なければ作成）。
    fn acroform_id(&mut self) -> crate::error::Result<ObjectId> {
        let root_id = self.doc.trailer.get(b"Root")?.as_reference()?;
        self.indirect_dict(root_id, b"AcroForm")
    }

    /// `owner` 辞書の `key` エントリを間接参照の辞書に正規化してIDを返す。
    ///
    /// インライン辞書は新しいオブジェクトへ移し、存在しなければ空辞書を作成する。
    fn indirect_dict(&mut self, owner: ObjectId, key: &[u8]) -> crate::error::Result<ObjectId> {
        let existing = self.doc.get_dictionary(owner)?.get(key).ok().cloned();
        let id = match existing {
            Some(Object::Reference(id)) => return Ok(id),
            Some(Object::Dictionary(dict)) => self.doc.add_object(dict),
            _ => self.doc.add_object(Dictionary::new()),
        };
        self.doc
            .get_dictionary_mut(owner)?
            .set(key.to_vec(), Object::Reference(id));
        Ok(id)
    }

    /// ページの `/Resources` を間接参照に正規化する。
    ///
    /// ページ自身に無い場合は親ページツリーから継承されたものを複製する。
    fn page_resources_id(&mut self, page_id: ObjectId) -> crate::error::Result<ObjectId> {
        if !self.doc.get_dictionary(page_id)?.has(b"Resources")
            && let Some(inherited) = self.inherited_resources(page_id)
        {
            self.doc
                .get_dictionary_mut(page_id)?
                .set("Resources", Object::Dictionary(inherited));
        }
        self.indirect_dict(page_id, b"Resources")
    }

    /// Parent をたどって継承される `/Resources` 辞書を探す。
    fn inherited_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut current = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..32 {
            let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent_id).ok()?;
            if let Ok(res) = current.get(b"Resources") {
                let (_, obj) = self.doc.dereference(res).ok()?;
                return obj.as_dict().ok().cloned();
            }
        }
        None
    }

    /// ページに追加された画像を XObject として登録し、描画コマンドを末尾に追加する。
    fn write_page_elements(
        &mut self,
        page_id: ObjectId,
        elements: &[PageElement],
    ) -> crate::error::Result<()> {
        let resources_id = self.page_resources_id(page_id)?;
        let xobjects_id = self.indirect_dict(resources_id, b"XObject")?;

        let mut draws = Vec::new();
        for element in elements {
            let PageElement::Image(placed) = element;
            let xobject_id = add_image_xobject(&mut self.doc, &placed.image)?;

            let xobjects = self.doc.get_dictionary_mut(xobjects_id)?;
            let mut n = 1;
            let name = loop {
                let candidate = format!("Sig{n}");
                if !xobjects.has(candidate.as_bytes()) {
                    break candidate;
                }
                n += 1;
            };
            xobjects.set(name.as_bytes().to_vec(), Object::Reference(xobject_id));
            draws.extend(build_image_draw(
                &name,
                placed.x,
                placed.y,
                placed.width,
                placed.height,
            ));
            tracing::debug!(?page_id, %name, "image xobject added to page");
        }

        // 既存コンテンツを q/Q で囲み、グラフィックス状態の影響を受けないようにする
        let head_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let mut tail = b"Q\n".to_vec();
        tail.extend(draws);
        let tail_id = self.doc.add_object(Stream::new(dictionary! {}, tail));

        let mut contents = vec![Object::Reference(head_id)];
        contents.extend(self.existing_contents(page_id)?);
        contents.push(Object::Reference(tail_id));
        self.doc
            .get_dictionary_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    /// ページの `/Contents` をストリーム参照の配列として返す。
    fn existing_contents(&self, page_id: ObjectId) -> crate::error::Result<Vec<Object>> {
        let page = self.doc.get_dictionary(page_id)?;
        let contents = match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id)? {
                Object::Array(items) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok(contents)
    }

    /// PDFドキュメントをバイト列として出力する。
    pub fn save_to_bytes(mut self) -> crate::error::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| FormError::encode(e.to_string()))?;
        Ok(buf)
    }
}

/// ラジオウィジェットの外観状態名（ON状態名がなければオプション値）。
fn radio_state(widget: &Widget) -> String {
    widget
        .on_state
        .clone()
        .or_else(|| widget.option.clone())
        .unwrap_or_else(|| "Off".to_string())
}
