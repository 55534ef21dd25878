// Phase 1: フィールド種別モデル（Text / Checkbox / Radio / Combo / Other）

use std::fmt;

use lopdf::ObjectId;

/// ページ座標系の矩形（左下原点、PDFポイント単位）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// 幅・高さが負の場合は0に丸める。
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// PDFの `/Rect [x1 y1 x2 y2]` 形式（対角2点、順不同）から正規化する。
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }
}

/// フィールドの種別と、その種別が必要とする値のみを保持する。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text { value: String },
    Checkbox { checked: bool },
    /// 選択中ウィジェットのオプション値。未選択は `None`。
    Radio { selected: Option<String> },
    Combo {
        selected: Option<String>,
        options: Vec<String>,
    },
    /// プッシュボタン、リストボックス、署名フィールドなど。
    Other,
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "Text",
            FieldKind::Checkbox { .. } => "Checkbox",
            FieldKind::Radio { .. } => "Radio",
            FieldKind::Combo { .. } => "Combo",
            FieldKind::Other => "Other",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// フィールドの視覚的インスタンス（ページ上の配置）。
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub rect: Rect,
    /// ラジオボタンが表すオプション値。
    pub option: Option<String>,
    /// 外観ストリームのON状態名（`/AP /N` の Off 以外のキー）。
    pub on_state: Option<String>,
    /// ウィジェットが配置されているページ（0-indexed）。
    pub page_index: Option<usize>,
    /// 描画時に強制するフォント（BaseFont名）。
    pub font: Option<String>,
    pub(crate) refresh: bool,
    pub(crate) handle: Option<ObjectId>,
}

impl Widget {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            option: None,
            on_state: None,
            page_index: None,
            font: None,
            refresh: false,
            handle: None,
        }
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }

    /// 描画内容の再計算が要求されているか。
    pub fn needs_refresh(&self) -> bool {
        self.refresh
    }

    pub(crate) fn mark_refresh(&mut self) {
        self.refresh = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub widgets: Vec<Widget>,
    /// フィールドフラグ ReadOnly (`/Ff` bit 1)。
    pub read_only: bool,
    pub(crate) handle: Option<ObjectId>,
    pub(crate) dirty: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            widgets: Vec::new(),
            read_only: false,
            handle: None,
            dirty: false,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Text {
                value: value.into(),
            },
        )
    }

    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self::new(name, FieldKind::Checkbox { checked })
    }

    /// オプションごとに1ウィジェットを持つラジオグループを作成する。
    pub fn radio<S: Into<String>>(
        name: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        selected: Option<&str>,
    ) -> Self {
        let mut field = Self::new(
            name,
            FieldKind::Radio {
                selected: selected.map(str::to_string),
            },
        );
        field.widgets = options
            .into_iter()
            .map(|option| Widget::new(Rect::new(0.0, 0.0, 0.0, 0.0)).with_option(option))
            .collect();
        field
    }

    pub fn combo<S: Into<String>>(
        name: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        selected: Option<&str>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Combo {
                selected: selected.map(str::to_string),
                options: options.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    /// マッパーにより値が変更され、書き戻しが必要か。
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
