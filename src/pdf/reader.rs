// Phase 2: PDF読込 → AcroFormフィールドモデル構築

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Object, ObjectId};

use crate::model::{Document, Field, FieldKind, Page, Rect, Widget};
use crate::pdf::text::object_to_text;

/// フィールドフラグ (`/Ff`)。
pub(crate) const FF_READ_ONLY: i64 = 1;
pub(crate) const FF_RADIO: i64 = 1 << 15;
pub(crate) const FF_PUSH_BUTTON: i64 = 1 << 16;
pub(crate) const FF_COMBO: i64 = 1 << 17;

/// フィールドツリーの最大深さ（循環参照・異常なネスト対策）。
const MAX_FIELD_DEPTH: usize = 32;

/// 親フィールドから継承される属性。
#[derive(Debug, Clone, Default)]
struct Inherited {
    name: Option<String>,
    field_type: Option<Vec<u8>>,
    flags: i64,
    value: Option<Object>,
}

pub struct PdfReader {
    doc: lopdf::Document,
}

impl PdfReader {
    /// メモリ上のPDFバイト列を読み込む。
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| crate::error::FormError::decode(e.to_string()))?;
        Ok(Self { doc })
    }

    /// ページとAcroFormフィールドを読み取り、フォームモデルを構築する。
    ///
    /// 元のlopdf文書はエクスポート用にモデルへ引き渡す。
    pub fn read_form(self) -> crate::error::Result<Document> {
        let page_ids: Vec<ObjectId> = self.doc.get_pages().into_values().collect();
        let page_index: HashMap<ObjectId, usize> = page_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let annot_pages = self.annotation_pages(&page_ids);

        let mut fields = Vec::new();
        let mut visited = HashSet::new();
        for field_id in self.root_field_ids() {
            self.collect_field(
                field_id,
                &Inherited::default(),
                &page_index,
                &annot_pages,
                &mut visited,
                &mut fields,
                0,
            );
        }

        let pages = page_ids.into_iter().map(Page::with_handle).collect();
        let document = Document::new(pages, fields);
        tracing::debug!(
            pages = document.page_count(),
            fields = document.fields().len(),
            "imported form document"
        );
        Ok(document.with_backing(self.doc))
    }

    /// 参照を解決したオブジェクトを返す。
    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        self.doc.dereference(obj).ok().map(|(_, o)| o)
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(obj).and_then(|o| o.as_dict().ok())
    }

    fn resolve_array<'a>(&'a self, obj: &'a Object) -> Option<&'a Vec<Object>> {
        self.resolve(obj).and_then(|o| o.as_array().ok())
    }

    /// Catalog の `/AcroForm /Fields` にあるフィールド参照の一覧。
    fn root_field_ids(&self) -> Vec<ObjectId> {
        let Ok(catalog) = self.doc.catalog() else {
            return Vec::new();
        };
        let Some(acroform) = catalog
            .get(b"AcroForm")
            .ok()
            .and_then(|o| self.resolve_dict(o))
        else {
            return Vec::new();
        };
        let Some(fields) = acroform
            .get(b"Fields")
            .ok()
            .and_then(|o| self.resolve_array(o))
        else {
            return Vec::new();
        };

        fields
            .iter()
            .filter_map(|o| match o {
                Object::Reference(id) => Some(*id),
                _ => {
                    tracing::debug!("skipping inline field dictionary without object id");
                    None
                }
            })
            .collect()
    }

    /// ウィジェット注釈ID → ページ番号(0-indexed) の対応表を各ページの `/Annots` から作る。
    fn annotation_pages(&self, page_ids: &[ObjectId]) -> HashMap<ObjectId, usize> {
        let mut map = HashMap::new();
        for (index, page_id) in page_ids.iter().enumerate() {
            let Ok(page) = self.doc.get_dictionary(*page_id) else {
                continue;
            };
            let Some(annots) = page.get(b"Annots").ok().and_then(|o| self.resolve_array(o))
            else {
                continue;
            };
            for annot in annots {
                if let Object::Reference(id) = annot {
                    map.entry(*id).or_insert(index);
                }
            }
        }
        map
    }

    /// フィールドノードを再帰的にたどり、終端フィールドを `out` に追加する。
    #[allow(clippy::too_many_arguments)]
    fn collect_field(
        &self,
        id: ObjectId,
        parent: &Inherited,
        page_index: &HashMap<ObjectId, usize>,
        annot_pages: &HashMap<ObjectId, usize>,
        visited: &mut HashSet<ObjectId>,
        out: &mut Vec<Field>,
        depth: usize,
    ) {
        if depth > MAX_FIELD_DEPTH || !visited.insert(id) {
            tracing::warn!(?id, "field tree too deep or cyclic; node skipped");
            return;
        }
        let Ok(dict) = self.doc.get_dictionary(id) else {
            return;
        };

        let partial = dict.get(b"T").ok().and_then(object_to_text);
        let name = match (&parent.name, partial) {
            (Some(p), Some(t)) => Some(format!("{p}.{t}")),
            (None, Some(t)) => Some(t),
            (Some(p), None) => Some(p.clone()),
            (None, None) => None,
        };
        let inherited = Inherited {
            name: name.clone(),
            field_type: dict
                .get(b"FT")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(<[u8]>::to_vec)
                .or_else(|| parent.field_type.clone()),
            flags: dict
                .get(b"Ff")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(parent.flags),
            value: dict.get(b"V").ok().cloned().or_else(|| parent.value.clone()),
        };

        // /Kids のうち /T を持つものは子フィールド、持たないものはウィジェット
        let mut widget_ids = Vec::new();
        let mut child_ids = Vec::new();
        if let Some(kids) = dict.get(b"Kids").ok().and_then(|o| self.resolve_array(o)) {
            for kid in kids {
                let Object::Reference(kid_id) = kid else {
                    continue;
                };
                match self.doc.get_dictionary(*kid_id) {
                    Ok(kid_dict) if kid_dict.has(b"T") => child_ids.push(*kid_id),
                    Ok(_) => widget_ids.push(*kid_id),
                    Err(_) => {}
                }
            }
        } else if dict.has(b"Rect") {
            // フィールドとウィジェットが同一辞書に統合されている
            widget_ids.push(id);
        }

        for child in child_ids {
            self.collect_field(
                child,
                &inherited,
                page_index,
                annot_pages,
                visited,
                out,
                depth + 1,
            );
        }

        if widget_ids.is_empty() && dict.has(b"Kids") {
            return;
        }
        let Some(name) = name else {
            tracing::debug!(?id, "field without name skipped");
            return;
        };

        let widgets: Vec<Widget> = widget_ids
            .iter()
            .filter_map(|wid| {
                let wdict = self.doc.get_dictionary(*wid).ok()?;
                Some(self.read_widget(*wid, wdict, page_index, annot_pages))
            })
            .collect();

        let mut field = Field::new(name, FieldKind::Other);
        field.kind = self.read_kind(dict, &inherited, &widgets);
        field.widgets = widgets;
        field.read_only = inherited.flags & FF_READ_ONLY != 0;
        field.handle = Some(id);
        assign_radio_options(dict, &mut field, self);
        out.push(field);
    }

    fn read_widget(
        &self,
        id: ObjectId,
        dict: &Dictionary,
        page_index: &HashMap<ObjectId, usize>,
        annot_pages: &HashMap<ObjectId, usize>,
    ) -> Widget {
        let rect = dict
            .get(b"Rect")
            .ok()
            .and_then(|o| self.resolve_array(o))
            .and_then(|arr| rect_from_array(arr))
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0));

        let on_state = dict
            .get(b"AP")
            .ok()
            .and_then(|o| self.resolve_dict(o))
            .and_then(|ap| ap.get(b"N").ok())
            .and_then(|n| self.resolve_dict(n))
            .and_then(|normal| {
                normal
                    .iter()
                    .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
                    .find(|k| k != "Off")
            });

        let page = dict
            .get(b"P")
            .ok()
            .and_then(|o| o.as_reference().ok())
            .and_then(|p| page_index.get(&p).copied())
            .or_else(|| annot_pages.get(&id).copied());

        let mut widget = Widget::new(rect);
        widget.on_state = on_state;
        widget.page_index = page;
        widget.handle = Some(id);
        widget
    }

    /// `/FT` と `/Ff` からフィールド種別を決め、現在値を読み取る。
    fn read_kind(&self, dict: &Dictionary, inherited: &Inherited, widgets: &[Widget]) -> FieldKind {
        let value = inherited.value.as_ref().and_then(|v| self.resolve(v));
        let flags = inherited.flags;

        match inherited.field_type.as_deref() {
            Some(b"Tx") => FieldKind::Text {
                value: value.and_then(object_to_text).unwrap_or_default(),
            },
            Some(b"Btn") if flags & FF_PUSH_BUTTON != 0 => FieldKind::Other,
            Some(b"Btn") if flags & FF_RADIO != 0 => {
                let state = value.and_then(|v| v.as_name().ok()).and_then(|n| {
                    (n != b"Off").then(|| String::from_utf8_lossy(n).into_owned())
                });
                FieldKind::Radio { selected: state }
            }
            Some(b"Btn") => {
                let checked = match value.and_then(|v| v.as_name().ok()) {
                    Some(state) => state != b"Off",
                    None => widgets.first().is_some_and(|w| {
                        w.handle
                            .and_then(|h| self.doc.get_dictionary(h).ok())
                            .and_then(|d| d.get(b"AS").ok())
                            .and_then(|s| s.as_name().ok())
                            .is_some_and(|s| s != b"Off")
                    }),
                };
                FieldKind::Checkbox { checked }
            }
            Some(b"Ch") if flags & FF_COMBO != 0 => {
                let selected = value.and_then(|v| match v {
                    Object::Array(items) => items.first().and_then(object_to_text),
                    other => object_to_text(other),
                });
                let options = dict
                    .get(b"Opt")
                    .ok()
                    .and_then(|o| self.resolve_array(o))
                    .map(|opts| opts.iter().filter_map(|o| self.option_value(o)).collect())
                    .unwrap_or_default();
                FieldKind::Combo { selected, options }
            }
            _ => FieldKind::Other,
        }
    }

    /// `/Opt` 要素からエクスポート値を取り出す（`[export display]` ペアにも対応）。
    fn option_value(&self, obj: &Object) -> Option<String> {
        match self.resolve(obj)? {
            Object::Array(pair) => pair.first().and_then(object_to_text),
            other => object_to_text(other),
        }
    }
}

/// ラジオボタンの各ウィジェットにオプション値を割り当て、選択状態を外観名から値へ変換する。
///
/// `/Opt` があればウィジェット順に対応付け、なければ外観のON状態名をそのまま使う。
fn assign_radio_options(dict: &Dictionary, field: &mut Field, reader: &PdfReader) {
    let FieldKind::Radio { selected } = &mut field.kind else {
        return;
    };

    let opts: Vec<String> = dict
        .get(b"Opt")
        .ok()
        .and_then(|o| reader.resolve_array(o))
        .map(|arr| arr.iter().filter_map(|o| reader.option_value(o)).collect())
        .unwrap_or_default();

    for (i, widget) in field.widgets.iter_mut().enumerate() {
        widget.option = opts.get(i).cloned().or_else(|| widget.on_state.clone());
    }

    if let Some(state) = selected.take() {
        *selected = field
            .widgets
            .iter()
            .find(|w| w.on_state.as_deref() == Some(state.as_str()))
            .and_then(|w| w.option.clone());
        if selected.is_none() {
            tracing::debug!(field = %field.name, %state, "radio value matches no widget, treated as unset");
        }
    }
}

/// lopdfの数値Objectをf64として取得する。
fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn rect_from_array(arr: &[Object]) -> Option<Rect> {
    if arr.len() < 4 {
        return None;
    }
    let v: Vec<f64> = arr[..4].iter().map(object_to_f64).collect::<Option<_>>()?;
    Some(Rect::from_corners(v[0], v[1], v[2], v[3]))
}
