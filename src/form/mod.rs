pub mod extractor;
pub mod mapper;
pub mod signature;
pub mod validator;

use crate::model::Document;

/// 全フィールドの読み取り専用フラグを外し、外したフィールド数を返す。
///
/// エクスポート時に `/Ff` の ReadOnly ビットが消去される。
pub fn unlock_fields(document: &mut Document) -> usize {
    let mut unlocked = 0;
    for field in document.fields_mut() {
        if field.read_only {
            field.read_only = false;
            unlocked += 1;
        }
    }
    unlocked
}
