// Phase 5: 署名画像 → 画像XObject（JPEGはそのまま、それ以外はFlate + SMask）

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{ColorType, ImageFormat};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::error::FormError;
use crate::model::RasterImage;

/// zlibで圧縮する。
fn flate_encode(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| FormError::encode(format!("FlateDecode error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| FormError::encode(format!("FlateDecode error: {e}")))
}

/// JPEGをDCTDecodeのまま埋め込めるか（グレースケール/RGBのみ）。
fn jpeg_passthrough_color_space(image: &RasterImage) -> Option<&'static str> {
    if image.format() != Some(ImageFormat::Jpeg) {
        return None;
    }
    match image.pixels().color() {
        ColorType::L8 => Some("DeviceGray"),
        ColorType::Rgb8 => Some("DeviceRGB"),
        _ => None,
    }
}

/// ラスター画像を画像XObjectとして文書に追加し、そのオブジェクトIDを返す。
///
/// - JPEG (Gray/RGB): 元のバイト列を DCTDecode で埋め込む
/// - その他: RGB 8bit を FlateDecode で埋め込み、アルファがあれば SMask を付ける
pub fn add_image_xobject(doc: &mut Document, image: &RasterImage) -> crate::error::Result<ObjectId> {
    let width = image.width() as i64;
    let height = image.height() as i64;

    if let Some(color_space) = jpeg_passthrough_color_space(image) {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        return Ok(doc.add_object(Object::Stream(Stream::new(dict, image.data().to_vec()))));
    }

    let pixels = image.pixels();
    let rgb = pixels.to_rgb8();
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if pixels.color().has_alpha() {
        let alpha: Vec<u8> = pixels.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let mask_id = doc.add_object(Object::Stream(Stream::new(
            mask_dict,
            flate_encode(&alpha)?,
        )));
        dict.set("SMask", Object::Reference(mask_id));
    }

    let data = flate_encode(rgb.as_raw())?;
    Ok(doc.add_object(Object::Stream(Stream::new(dict, data))))
}
