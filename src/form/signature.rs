// Phase 4: 署名画像の拡大縮小・配置計算とページへの挿入

use crate::config::settings::SignaturePage;
use crate::error::FormError;
use crate::model::{Document, PageElement, PlacedImage, RasterImage, Rect};

/// 署名画像の配置結果（ページ座標系）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignaturePlacement {
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 対象矩形に対する画像の大きさと位置を計算する。
///
/// 倍率は画像の「高さ」を基準に `rect.width / image_height` で求める。
/// 配置後の高さは矩形の幅と等しくなり、縦横比は元画像のまま保たれる。
/// 画像の下端は常に矩形の下端に揃う: `y = rect.y - (height - rect.height)`。
///
/// 戻り値は `(x, y, width, height)`。
pub fn compute_placement(rect: &Rect, image_width: u32, image_height: u32) -> (f64, f64, f64, f64) {
    let ratio = rect.width / image_height as f64;
    let height = image_height as f64 * ratio;
    let width = image_width as f64 * ratio;
    let x = rect.x;
    let y = rect.y - (height - rect.height);
    (x, y, width, height)
}

/// 名前（大文字小文字を区別しない）で署名フィールドを探し、画像をページに追加する。
///
/// 対象フィールドが無い場合は `SignatureFieldNotFound` を返し、文書は変更しない。
pub fn place_signature(
    document: &mut Document,
    image: RasterImage,
    target: &str,
    page_policy: SignaturePage,
) -> crate::error::Result<SignaturePlacement> {
    if image.width() == 0 || image.height() == 0 {
        return Err(FormError::image_decode("signature image has zero size"));
    }

    let wanted = target.to_lowercase();
    let widget = document
        .fields()
        .iter()
        .find(|f| f.name.to_lowercase() == wanted)
        .and_then(|f| f.widgets.first())
        .ok_or_else(|| FormError::signature_field_not_found(target))?;

    let rect = widget.rect;
    let page_index = match page_policy {
        SignaturePage::First => 0,
        SignaturePage::Widget => widget.page_index.unwrap_or(0),
    };

    let (x, y, width, height) = compute_placement(&rect, image.width(), image.height());
    let page = document
        .page_mut(page_index)
        .ok_or(FormError::PageNotFound(page_index))?;
    page.elements.push(PageElement::Image(PlacedImage {
        image,
        x,
        y,
        width,
        height,
    }));

    tracing::info!(field = %target, page_index, x, y, width, height, "signature placed");
    Ok(SignaturePlacement {
        page_index,
        x,
        y,
        width,
        height,
    })
}
