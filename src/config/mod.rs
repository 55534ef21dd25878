pub mod settings;

use settings::Settings;
use std::path::Path;

/// 指定ディレクトリの `settings.yaml` を読み込む。
///
/// 存在しなければデフォルト設定を返す。
pub fn load_settings_from_dir(dir: &Path) -> crate::error::Result<Settings> {
    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}
