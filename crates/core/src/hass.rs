//! Identifier normalization for the Home Assistant REST API

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ApiError, ErrorContext, Provider};

fn errors() -> ErrorContext {
    ErrorContext::new(Provider::Hass)
}

fn service_regex() -> &'static Regex {
    static RE_SERVICE: OnceLock<Regex> = OnceLock::new();
    RE_SERVICE.get_or_init(|| Regex::new(r"^([a-z0-9_]+)\.([a-z0-9_]+)$").unwrap())
}

/// `https://hass.local:8123/api/` and `https://hass.local:8123` both become
/// `https://hass.local:8123/api`.
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    format!("{trimmed}/api")
}

/// A service reference in `domain.service` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRef {
    pub domain: String,
    pub service: String,
}

impl ServiceRef {
    pub fn parse(reference: &str) -> Result<Self, ApiError> {
        let captures = service_regex().captures(reference).ok_or_else(|| {
            errors().precondition(format!(
                "Invalid service \"{reference}\" (expected domain.service)"
            ))
        })?;
        Ok(Self {
            domain: captures[1].to_string(),
            service: captures[2].to_string(),
        })
    }

    /// Path below the API root.
    pub fn path(&self) -> String {
        format!("/services/{}/{}", self.domain, self.service)
    }
}

impl std::fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)
    }
}

/// Domain part of an entity id (`light` for `light.kitchen`).
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id.split('.').next().unwrap_or(entity_id)
}

/// Rewrite `entity_id` into `domain`, keeping its object id.
///
/// `kitchen` and `switch.kitchen` both become `light.kitchen` for domain `light`.
pub fn normalize_entity_id(domain: &str, entity_id: &str) -> String {
    if entity_id.starts_with(&format!("{domain}.")) {
        return entity_id.to_string();
    }
    let object_id = entity_id.rsplit('.').next().unwrap_or(entity_id);
    format!("{domain}.{object_id}")
}

/// Prefix `name` with `domain.` unless it already has it.
pub fn qualify(domain: &str, name: &str) -> String {
    if name.starts_with(&format!("{domain}.")) {
        name.to_string()
    } else {
        format!("{domain}.{name}")
    }
}

/// Service data with the entity id normalized into the service's domain.
pub fn build_service_data(
    service: &ServiceRef,
    entity_id: Option<&str>,
    data: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut data = match data {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    if let Some(entity_id) = entity_id.filter(|e| !e.is_empty()) {
        data.insert(
            "entity_id".into(),
            normalize_entity_id(&service.domain, entity_id).into(),
        );
    }
    serde_json::Value::Object(data)
}

/// `round(brightness / 255 * 100)`, or `None` when the attribute is missing
/// or not a number.
pub fn brightness_pct(attributes: &serde_json::Value) -> Option<i64> {
    let brightness = match attributes.get("brightness")? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some((brightness.trunc() / 255.0 * 100.0).round() as i64)
}

/// Add `attributes.brightness_pct` to the state of a light.
pub fn annotate_light_state(entity_id: &str, mut state: serde_json::Value) -> serde_json::Value {
    if entity_domain(entity_id) != "light" {
        return state;
    }
    let pct = state.get("attributes").and_then(brightness_pct);
    if let Some(attributes) = state.get_mut("attributes").and_then(|a| a.as_object_mut()) {
        attributes.insert("brightness_pct".into(), pct.into());
    }
    state
}

/// Home Assistant answers `scene.turn_on` for an unknown scene with `[]`.
pub fn ensure_scene_found(scene_id: &str, response: &serde_json::Value) -> Result<(), ApiError> {
    match response.as_array() {
        Some(states) if states.is_empty() => {
            Err(errors().resolution(format!("Scene \"{scene_id}\" not found")))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://hass:8123/api/"), "http://hass:8123/api");
        assert_eq!(normalize_base_url("http://hass:8123/api"), "http://hass:8123/api");
        assert_eq!(normalize_base_url("http://hass:8123"), "http://hass:8123/api");
        assert_eq!(normalize_base_url("http://hass:8123/"), "http://hass:8123/api");
    }

    #[test]
    fn test_service_ref_parse() {
        let service = ServiceRef::parse("light.turn_on").unwrap();
        assert_eq!(service.domain, "light");
        assert_eq!(service.service, "turn_on");
        assert_eq!(service.path(), "/services/light/turn_on");
        assert_eq!(service.to_string(), "light.turn_on");
    }

    #[test]
    fn test_service_ref_parse_rejects_malformed() {
        assert!(ServiceRef::parse("turn_on").is_err());
        assert!(ServiceRef::parse("light.turn.on").is_err());
        let err = ServiceRef::parse("").unwrap_err();
        assert!(err.to_string().starts_with("[HassAPI]"));
    }

    #[test]
    fn test_normalize_entity_id() {
        assert_eq!(normalize_entity_id("light", "light.kitchen"), "light.kitchen");
        assert_eq!(normalize_entity_id("light", "kitchen"), "light.kitchen");
        assert_eq!(normalize_entity_id("light", "switch.kitchen"), "light.kitchen");
        assert_eq!(normalize_entity_id("script", "script.morning"), "script.morning");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("scene", "movie"), "scene.movie");
        assert_eq!(qualify("scene", "scene.movie"), "scene.movie");
    }

    #[test]
    fn test_build_service_data() {
        let service = ServiceRef::parse("light.turn_on").unwrap();

        let data = build_service_data(
            &service,
            Some("kitchen"),
            Some(serde_json::json!({"brightness_pct": 40})),
        );

        assert_eq!(
            data,
            serde_json::json!({"brightness_pct": 40, "entity_id": "light.kitchen"})
        );
        assert_eq!(build_service_data(&service, None, None), serde_json::json!({}));
    }

    #[test]
    fn test_brightness_pct() {
        assert_eq!(brightness_pct(&serde_json::json!({"brightness": 255})), Some(100));
        assert_eq!(brightness_pct(&serde_json::json!({"brightness": 128})), Some(50));
        assert_eq!(brightness_pct(&serde_json::json!({"brightness": 0})), Some(0));
        assert_eq!(brightness_pct(&serde_json::json!({"brightness": "64"})), Some(25));
        assert_eq!(brightness_pct(&serde_json::json!({"brightness": null})), None);
        assert_eq!(brightness_pct(&serde_json::json!({})), None);
    }

    #[test]
    fn test_annotate_light_state() {
        let state = serde_json::json!({
            "entity_id": "light.kitchen",
            "state": "on",
            "attributes": {"brightness": 191}
        });

        let annotated = annotate_light_state("light.kitchen", state);
        assert_eq!(annotated["attributes"]["brightness_pct"], 75);

        let off = serde_json::json!({"state": "off", "attributes": {}});
        let annotated = annotate_light_state("light.kitchen", off);
        assert!(annotated["attributes"]["brightness_pct"].is_null());
        assert!(annotated["attributes"].get("brightness_pct").is_some());
    }

    #[test]
    fn test_annotate_ignores_other_domains() {
        let state = serde_json::json!({"state": "on", "attributes": {"brightness": 255}});
        let annotated = annotate_light_state("switch.kitchen", state.clone());
        assert_eq!(annotated, state);
    }

    #[test]
    fn test_ensure_scene_found() {
        assert!(ensure_scene_found("scene.movie", &serde_json::json!([{"entity_id": "scene.movie"}])).is_ok());
        let err = ensure_scene_found("scene.movie", &serde_json::json!([])).unwrap_err();
        assert!(matches!(err, ApiError::Resolution { .. }));
        assert!(err.to_string().contains("\"scene.movie\" not found"));
    }
}
