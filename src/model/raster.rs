// Phase 4: 署名画像のデコード

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::FormError;

/// デコード済みラスター画像。元のエンコード済みバイト列も保持する。
#[derive(Debug, Clone)]
pub struct RasterImage {
    data: Vec<u8>,
    format: Option<ImageFormat>,
    pixels: DynamicImage,
}

impl RasterImage {
    /// 画像バイト列をデコードし、フォーマットと固有ピクセルサイズを取得する。
    pub fn decode(data: &[u8]) -> crate::error::Result<Self> {
        if data.is_empty() {
            return Err(FormError::image_decode("image data is empty"));
        }

        let reader = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| FormError::image_decode(format!("format detection failed: {e}")))?;
        let format = reader.format();
        let pixels = reader.decode()?;

        Ok(Self {
            data: data.to_vec(),
            format,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// 元のエンコード済みバイト列。
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}
