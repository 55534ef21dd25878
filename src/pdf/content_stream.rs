// Phase 5: コンテンツストリーム組立（画像描画・テキスト外観）

/// PDF Name として安全な形にエスケープする（`#XX` 形式）。
pub fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        let delimiter = matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        );
        if (0x21..=0x7E).contains(&b) && !delimiter {
            out.push(b as char);
        } else {
            out.push_str(&format!("#{b:02X}"));
        }
    }
    out
}

/// 数値を余分な0なしで出力する。
fn fmt_num(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// 画像XObjectを矩形 (x, y, width, height) に描画するオペレータ列を生成する。
///
/// `q <w> 0 0 <h> <x> <y> cm /<Name> Do Q`
pub fn build_image_draw(name: &str, x: f64, y: f64, width: f64, height: f64) -> Vec<u8> {
    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        fmt_num(width),
        fmt_num(height),
        fmt_num(x),
        fmt_num(y),
        escape_name(name)
    )
    .into_bytes()
}

/// リテラル文字列 `( ... )` 用にエスケープする。WinAnsi外の文字は `?` に置換する。
fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{FEFF}' => {}
            c if (c as u32) < 0x20 => {}
            c if (c as u32) <= 0x7E => out.push(c),
            c if (0xA1..=0xFF).contains(&(c as u32)) => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            _ => out.push('?'),
        }
    }
    out
}

/// テキストフィールドの通常外観 (`/AP /N`) 用コンテンツを生成する。
///
/// `font_resource` はウィジェット外観のリソース辞書に登録したフォント名。
/// 文字サイズは矩形の高さから決める（最大12pt）。
pub fn build_text_appearance(font_resource: &str, text: &str, width: f64, height: f64) -> Vec<u8> {
    let font_size = (height * 0.7).clamp(1.0, 12.0);
    let baseline = ((height - font_size) / 2.0 + font_size * 0.22).max(0.0);
    format!(
        "/Tx BMC\nq\n1 1 {} {} re W n\nBT\n/{} {} Tf\n0 g\n2 {} Td\n({}) Tj\nET\nQ\nEMC\n",
        fmt_num((width - 2.0).max(0.0)),
        fmt_num((height - 2.0).max(0.0)),
        escape_name(font_resource),
        fmt_num(font_size),
        fmt_num(baseline),
        escape_literal(text)
    )
    .into_bytes()
}
