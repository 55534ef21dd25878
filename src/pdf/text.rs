// Phase 2: PDFテキスト文字列のデコード/エンコード

/// PDFDocEncoding のうち Latin-1 と異なる 0x18-0x1F の対応表。
const PDF_DOC_LOW: [char; 8] = ['˘', 'ˇ', 'ˆ', '˙', '˝', '˛', '˚', '˜'];

/// PDFDocEncoding のうち Latin-1 と異なる 0x80-0xA0 の対応表（0x9F は未定義）。
const PDF_DOC_HIGH: [char; 33] = [
    '•', '†', '‡', '…', '—', '–', 'ƒ', '⁄', '‹', '›', '−', '‰', '„', '“', '”', '‘', '’', '‚',
    '™', 'ﬁ', 'ﬂ', 'Ł', 'Œ', 'Š', 'Ÿ', 'Ž', 'ı', 'ł', 'œ', 'š', 'ž', '\u{FFFD}', '€',
];

const UTF16_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// PDFテキスト文字列をデコードする。
///
/// UTF-16BE (BOM付き)、UTF-8 (BOM付き)、PDFDocEncoding に対応する。
/// BOMのみの文字列は空文字列ではなく BOM 1文字として保持する。
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes == UTF16_BOM {
        return '\u{FEFF}'.to_string();
    }

    if let Some(rest) = bytes.strip_prefix(&UTF16_BOM) {
        let units = rest
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]));
        return char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }

    if let Some(rest) = bytes.strip_prefix(&UTF8_BOM) {
        return String::from_utf8_lossy(rest).into_owned();
    }

    bytes.iter().map(|&b| pdf_doc_char(b)).collect()
}

fn pdf_doc_char(b: u8) -> char {
    match b {
        0x18..=0x1F => PDF_DOC_LOW[(b - 0x18) as usize],
        0x80..=0xA0 => PDF_DOC_HIGH[(b - 0x80) as usize],
        _ => b as char,
    }
}

/// 文字列をPDFテキスト文字列のバイト列にエンコードする。
///
/// Latin-1 と PDFDocEncoding が一致する範囲の文字だけなら1バイト表現、
/// それ以外は BOM 付き UTF-16BE を使う。
pub fn encode_text_string(s: &str) -> Vec<u8> {
    if s == "\u{FEFF}" {
        return UTF16_BOM.to_vec();
    }

    let single_byte = s.chars().all(|c| {
        let code = c as u32;
        (0x20..0x7F).contains(&code)
            || matches!(code, 0x09 | 0x0A | 0x0D)
            || (0xA1..=0xFF).contains(&code)
    });
    if single_byte {
        return s.chars().map(|c| c as u32 as u8).collect();
    }

    let mut out = UTF16_BOM.to_vec();
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// lopdf の Object から文字列を取り出す（String は復号、Name はそのまま）。
pub fn object_to_text(obj: &lopdf::Object) -> Option<String> {
    match obj {
        lopdf::Object::String(bytes, _) => Some(decode_text_string(bytes)),
        lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}
