// i18n.rs
//
// Runtime string table for the creator UI.
// - Built-in English strings are always available as the fallback.
// - A language can be overridden by assets/i18n/<lang>.json
//   ({ "key": "value" }), searched next to the executable, then in ./assets.
// - Lookup: tr("key") / tr_with("key", &[("name", ...)]) with {name} placeholders.

use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

const FALLBACK_LANG: &str = "en";

const BUILTIN_EN: &[(&str, &str)] = &[
    ("app.title", "Skybox Creator"),
    ("menu.file", "File"),
    ("menu.import_stretch", "Import stretch image..."),
    ("menu.bulk_import", "Bulk import folder..."),
    ("menu.export", "Generate skybox"),
    ("menu.exit", "Exit"),
    ("menu.view", "View"),
    ("view.reset", "Reset view"),
    ("view.projection_mode", "Projection"),
    ("projection.flat", "Flat faces"),
    ("projection.spherical", "Spherical"),
    ("view.subdivision", "Subdivision"),
    ("view.input_sensitivity", "Drag sensitivity"),
    ("view.multiplier", "deg / px"),
    ("view.reset_1_0", "Reset to 1.0"),
    ("panel.title", "Skybox title (folder name):"),
    ("panel.mode_six", "Six separate images (recommended)"),
    ("panel.mode_stretch", "Single stretch image"),
    ("panel.browse", "Browse"),
    ("panel.rotate", "R"),
    ("panel.flip", "F"),
    ("panel.clear", "X"),
    ("panel.missing", "Missing faces: {faces}"),
    ("panel.generate", "Generate Skybox"),
    ("panel.bulk_import", "Bulk Import Images"),
    ("panel.overwrite", "Overwrite existing folder"),
    ("panel.in_memory", "(in memory)"),
    ("panel.empty", "-"),
    ("file.filter.images", "Images"),
    ("status.mode_prefix", "Mode:"),
    ("status.triangles", "Triangles: {count}"),
    ("status.yaw", "Yaw: {deg}°"),
    ("status.pitch", "Pitch: {deg}°"),
    ("status.exported", "Skybox generated in {path}"),
    ("status.imported", "Imported {count} face(s)"),
    ("status.loading", "Loading image..."),
    ("status.drop_unmatched", "No face matches {name}; name files like sky512_ft.png"),
    ("error.import", "Import failed: {err}"),
    ("error.export", "Export failed: {err}"),
    ("error.texture", "Texture upload failed: {err}"),
];

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

impl I18n {
    fn new(lang: String, map: HashMap<String, String>) -> Self {
        let fallback_map = BUILTIN_EN
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            lang,
            map,
            fallback_map,
        }
    }

    pub fn get(&self, key: &str) -> String {
        self.map
            .get(key)
            .or_else(|| self.fallback_map.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("ignoring malformed string table {}: {e}", path.display());
            None
        }
    }
}

/// Find assets/i18n/<lang>.json by searching:
/// 1) <exe_dir>/assets/i18n/<lang>.json
/// 2) ./assets/i18n/<lang>.json
fn find_lang_file(lang: &str) -> Option<PathBuf> {
    let file = format!("{}.json", lang);

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("i18n").join(&file);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("i18n").join(&file);
    if p.exists() {
        return Some(p);
    }

    None
}

/// Initialize global i18n. Safe to call multiple times; later calls replace the table.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let map = find_lang_file(&lang)
        .and_then(|p| load_json_map(&p))
        .unwrap_or_default();
    if map.is_empty() && lang != FALLBACK_LANG {
        log::info!("no string table for '{lang}', using built-in English");
    }
    install(I18n::new(lang, map));
}

fn install(i: I18n) {
    let lock = I18N.get_or_init(|| RwLock::new(I18n::new(FALLBACK_LANG.into(), HashMap::new())));
    if let Ok(mut w) = lock.write() {
        *w = i;
    }
}

/// Get localized text by key. Falls back to English, then to the key itself.
pub fn tr(key: &str) -> String {
    match I18N.get().and_then(|l| l.read().ok()) {
        Some(i) => i.get(key),
        None => BUILTIN_EN
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| key.to_string()),
    }
}

/// Get localized text and substitute `{name}` placeholders.
/// Any placeholder not provided is kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    substitute(tr(key), args)
}

fn substitute(mut s: String, args: &[(&str, String)]) -> String {
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_then_fallback_then_key() {
        let mut map = HashMap::new();
        map.insert("menu.file".to_string(), "Fichier".to_string());
        let i = I18n::new("fr".into(), map);

        assert_eq!(i.get("menu.file"), "Fichier");
        assert_eq!(i.get("menu.exit"), "Exit");
        assert_eq!(i.get("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_substitute_placeholders() {
        let s = substitute(
            "{count} of {total} ({missing})".to_string(),
            &[("count", "2".into()), ("total", "6".into())],
        );
        assert_eq!(s, "2 of 6 ({missing})");
    }

    #[test]
    fn test_status_angles_are_localized() {
        let i = I18n::new("en".into(), HashMap::new());
        assert_eq!(substitute(i.get("status.yaw"), &[("deg", "-30.0".into())]), "Yaw: -30.0°");
        assert_eq!(substitute(i.get("status.pitch"), &[("deg", "20.0".into())]), "Pitch: 20.0°");
    }

    #[test]
    fn test_builtin_keys_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for (k, _) in BUILTIN_EN {
            assert!(seen.insert(*k), "duplicate key {k}");
        }
    }
}
