// Module d'internationalisation (i18n)
// Charge les traductions depuis des fichiers JSON embarques dans le binaire
// et fournit une macro t!() pour acceder aux messages traduits.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::RwLock;

// Fichiers JSON embarques dans le binaire
const EN_JSON: &str = include_str!("../langs/en.json");
const ZH_JSON: &str = include_str!("../langs/zh.json");

static I18N: RwLock<Option<I18nStore>> = RwLock::new(None);

/// Stockage des traductions pour la langue selectionnee et le fallback anglais
struct I18nStore {
    current: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

/// Initialise le systeme i18n avec la langue demandee.
/// Echoue si un des fichiers de traduction embarques est invalide.
pub fn init(language: &str) -> Result<()> {
    let current_json = match language {
        "zh" => ZH_JSON,
        _ => EN_JSON,
    };

    let loaded = load_store(current_json, EN_JSON)
        .with_context(|| format!("Invalid translation bundle: {}", language))?;

    let mut store = I18N.write().unwrap_or_else(|e| e.into_inner());
    *store = Some(loaded);
    Ok(())
}

/// Construit le stockage a partir du JSON de la langue et du JSON anglais
fn load_store(current_json: &str, fallback_json: &str) -> Result<I18nStore> {
    let current = flatten_json(current_json)?;
    let fallback = if current_json == fallback_json {
        current.clone()
    } else {
        flatten_json(fallback_json).context("Invalid fallback bundle")?
    };
    Ok(I18nStore { current, fallback })
}

/// Devine la langue a partir de la locale systeme (API Windows, variables d'environnement ailleurs)
pub fn detect_language() -> &'static str {
    sys_locale::get_locale()
        .map(|locale| language_from_locale(&locale))
        .unwrap_or("en")
}

fn language_from_locale(locale: &str) -> &'static str {
    if locale.to_ascii_lowercase().starts_with("zh") {
        "zh"
    } else {
        "en"
    }
}

/// Recupere un message traduit par sa cle pointee (ex: "tray.open").
/// Sans initialisation, ou si la cle est inconnue, retourne la cle elle-meme.
pub fn get(key: &str) -> String {
    let store = I18N.read().unwrap_or_else(|e| e.into_inner());
    let Some(store) = store.as_ref() else {
        return key.to_string();
    };
    store
        .current
        .get(key)
        .or_else(|| store.fallback.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Recupere un message traduit et remplace les arguments positionnels {0}, {1}, etc.
pub fn get_with_args(key: &str, args: &[&str]) -> String {
    let mut result = get(key);
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Aplatit un JSON imbrique en cles pointees.
/// Ex: {"tray": {"open": "Open"}} → {"tray.open": "Open"}
fn flatten_json(json_str: &str) -> Result<HashMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(json_str)?;
    let mut map = HashMap::new();
    flatten_value(&value, "", &mut map);
    Ok(map)
}

fn flatten_value(value: &serde_json::Value, prefix: &str, map: &mut HashMap<String, String>) {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_value(val, &new_prefix, map);
            }
        }
        serde_json::Value::String(s) => {
            map.insert(prefix.to_string(), s.clone());
        }
        _ => {}
    }
}

/// Macro pour acceder facilement aux traductions.
/// Usage : t!("tray.open") ou t!("probe.unreachable", port)
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::get($key)
    };
    ($key:expr, $($arg:expr),+) => {{
        let args: Vec<String> = vec![$($arg.to_string()),+];
        let refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        $crate::i18n::get_with_args($key, &refs)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundles_share_the_same_keys() {
        let en = flatten_json(EN_JSON).unwrap();
        let zh = flatten_json(ZH_JSON).unwrap();
        let mut missing: Vec<_> = en.keys().filter(|k| !zh.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "missing zh keys: {:?}", missing);
    }

    #[test]
    fn flatten_nests_keys_with_dots() {
        let map = flatten_json(r#"{"a": {"b": "x", "c": {"d": "y"}}, "n": 1}"#).unwrap();
        assert_eq!(map.get("a.b").map(String::as_str), Some("x"));
        assert_eq!(map.get("a.c.d").map(String::as_str), Some("y"));
        assert!(!map.contains_key("n"));
    }

    #[test]
    fn malformed_bundle_is_rejected() {
        assert!(load_store("{ \"tray\": ", EN_JSON).is_err());
        assert!(load_store(ZH_JSON, "not json").is_err());

        let store = load_store(ZH_JSON, EN_JSON).unwrap();
        assert_eq!(store.current.get("tray.quit").map(String::as_str), Some("退出"));
        assert_eq!(store.fallback.get("tray.quit").map(String::as_str), Some("Quit"));
    }

    #[test]
    fn locale_detection() {
        assert_eq!(language_from_locale("zh_CN.UTF-8"), "zh");
        assert_eq!(language_from_locale("ZH-tw"), "zh");
        assert_eq!(language_from_locale("fr_FR.UTF-8"), "en");
        // Format BCP 47 renvoye par sys-locale
        assert_eq!(language_from_locale("zh-Hans-CN"), "zh");
        assert_eq!(language_from_locale("en-US"), "en");
        assert!(matches!(detect_language(), "en" | "zh"));
    }
}
