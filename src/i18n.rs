/*
Simple i18n helper for the backend.

This module provides:
- A tiny embedded translations store for EN/FR (compile-time embedded JSON).
- A simple `tr` function to lookup translations by key + optional params.
- A `t` convenience wrapper using the request language, or DEFAULT_LANG
  outside a request.
- `negotiate` / `with_language` to pick the request language from
  `Accept-Language` (see `middleware::language`).

Usage:
    use crate::i18n;
    let msg = i18n::t("not_found.planning");
    let msg_with = i18n::t_with("range.planning", &[("start", "2026-02-15"), ("end", "2026-02-09")]);

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Default language is `en`. If a key is missing for the requested language,
  the fallback language will be used.
*/

use std::collections::HashMap;
use std::future::Future;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

/// Languages with an embedded catalog.
pub const SUPPORTED_LANGS: [&str; 2] = ["en", "fr"];

tokio::task_local! {
    static REQUEST_LANG: &'static str;
}

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "not_found.planning": "Planning not found",
  "not_found.event": "Event not found",
  "not_found.user": "User not found",
  "validation.invalid_date": "Invalid date: {value} (expected YYYY-MM-DD)",
  "validation.invalid_datetime": "Invalid datetime: {value} (expected ISO-8601 with offset)",
  "validation.invalid_time": "Invalid time: {value} (expected HH:MM)",
  "validation.invalid_offset": "Invalid UTC offset: {value} minutes",
  "validation.invalid_id": "Invalid identifier: {value}",
  "validation.name_required": "Planning name is required",
  "validation.game_name_required": "Game name is required",
  "validation.invalid_url": "{field} must be an absolute http(s) URL",
  "validation.invalid_email": "Invalid email address",
  "validation.password_too_short": "Password must be at least {min} characters",
  "range.planning": "weekEnd must be >= weekStart ({start} → {end})",
  "range.event": "endsAt must be after startsAt",
  "conflict.planning_overlap": "Planning overlaps with existing planning \"{name}\" ({start} → {end})",
  "conflict.planning_overlap_generic": "Planning overlaps with an existing planning",
  "conflict.event_overlap": "Another stream already occupies this time slot ({start} → {end})",
  "conflict.email_in_use": "Email already in use",
  "app.name": "Stream Planner"
}
"#;

const FR_JSON: &str = r#"
{
  "not_found.planning": "Planning introuvable",
  "not_found.event": "Stream introuvable",
  "not_found.user": "Utilisateur introuvable",
  "validation.invalid_date": "Date invalide : {value} (format attendu AAAA-MM-JJ)",
  "validation.invalid_datetime": "Date-heure invalide : {value} (ISO-8601 avec fuseau attendu)",
  "validation.invalid_time": "Heure invalide : {value} (format attendu HH:MM)",
  "validation.invalid_offset": "Décalage UTC invalide : {value} minutes",
  "validation.invalid_id": "Identifiant invalide : {value}",
  "validation.name_required": "Nom du planning requis.",
  "validation.game_name_required": "Nom du jeu requis.",
  "validation.invalid_url": "{field} doit être une URL http(s) absolue",
  "validation.invalid_email": "Adresse e-mail invalide",
  "validation.password_too_short": "Le mot de passe doit contenir au moins {min} caractères",
  "range.planning": "La fin de semaine doit être postérieure ou égale au début ({start} → {end})",
  "range.event": "L'heure de fin doit être après l'heure de début.",
  "conflict.planning_overlap": "Ce planning chevauche le planning existant « {name} » ({start} → {end})",
  "conflict.planning_overlap_generic": "Ce planning chevauche un planning existant",
  "conflict.event_overlap": "Un autre stream occupe déjà cette plage horaire ({start} → {end})",
  "conflict.email_in_use": "Adresse e-mail déjà utilisée",
  "app.name": "Stream Planner"
}
"#;

/// Initialize translations map (lazy).
fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    let fr_map: HashMap<String, String> = serde_json::from_str(FR_JSON).unwrap_or_else(|e| {
        panic!("failed to parse FR_JSON in i18n module: {}", e);
    });
    out.insert("fr".to_string(), fr_map);

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Translate a key using an explicit language (or default if None).
///
/// - `lang`: optional language code (`"en"`, `"fr"`). If None, DEFAULT_LANG is used.
/// - `key`: translation key (flat string, e.g. "not_found.planning").
/// - `params`: optional slice of (name, value) for placeholder replacement.
///
/// If no translation is found the default language value is used, then the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        .unwrap_or_else(|| key.to_string());

    if let Some(params) = params {
        let mut s = val;
        for (k, v) in params {
            s = s.replace(&format!("{{{}}}", k), v);
        }
        s
    } else {
        val
    }
}

/// Language of the request being served, if any.
pub fn current_lang() -> Option<&'static str> {
    REQUEST_LANG.try_with(|lang| *lang).ok()
}

/// Run `f` with `lang` as the language for `t` / `t_with`.
pub async fn with_language<F: Future>(lang: &'static str, f: F) -> F::Output {
    REQUEST_LANG.scope(lang, f).await
}

/// Best supported language for an `Accept-Language` header value.
///
/// Highest q-value wins, ties keep header order; region subtags are ignored
/// (`fr-CA` selects `fr`). Falls back to DEFAULT_LANG.
pub fn negotiate(accept_language: Option<&str>) -> &'static str {
    let Some(header) = accept_language else {
        return DEFAULT_LANG;
    };

    let mut best: Option<(&'static str, f32)> = None;
    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let tag = parts.next().unwrap_or("").trim();
        let primary = tag.split('-').next().unwrap_or("").to_ascii_lowercase();
        let q = parts
            .find_map(|p| p.trim().strip_prefix("q="))
            .and_then(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        let Some(lang) = SUPPORTED_LANGS.iter().copied().find(|l| *l == primary) else {
            continue;
        };
        if q > 0.0 && best.map_or(true, |(_, best_q)| q > best_q) {
            best = Some((lang, q));
        }
    }

    best.map(|(lang, _)| lang).unwrap_or(DEFAULT_LANG)
}

/// Translate in the request language (DEFAULT_LANG outside a request).
pub fn t(key: &str) -> String {
    tr(current_lang(), key, None)
}

/// Like `t`, with placeholder params.
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(current_lang(), key, Some(params))
}
