//! Lenient normalization of catalog responses.
//!
//! The catalog has shipped several response shapes over time. Everything is
//! read through `serde_json::Value` so that one odd field degrades a single
//! gym (or is defaulted) instead of failing the whole page.
//!
//! Status handling for both endpoints:
//!
//! | Status | Result |
//! |--------|--------|
//! | 404 | empty page / no detail |
//! | other non-2xx | [`SearchError::Network`] |
//! | 2xx, body empty, unparseable, or without gym data | empty page / no detail |
//! | 2xx, `success: false` | empty page / no detail, logged at `warn` |

use super::request::SearchPage;
use crate::domain::{GymDetail, GymSummary, Position, SearchError};
use serde_json::{Map, Value};

const NOT_FOUND: u16 = 404;

/// Normalizes a discovery response into a page.
///
/// `is_last_page` compares the number of entries the catalog sent against
/// `limit`, so entries dropped for lacking an id do not end pagination early.
///
/// # Errors
///
/// Returns [`SearchError::Network`] for non-success statuses other than 404.
pub fn normalize_discover(status: u16, body: &str, limit: u32) -> Result<SearchPage, SearchError> {
    let Some(envelope) = accepted_envelope(status, body)? else {
        return Ok(SearchPage::empty());
    };

    let Some(entries) = gym_entries(&envelope) else {
        tracing::warn!("discovery response has no gym array, treating as empty");
        return Ok(SearchPage::empty());
    };

    let gyms: Vec<GymSummary> = entries.iter().filter_map(parse_summary).collect();
    let is_last_page = entries.len() < limit as usize;

    tracing::debug!(
        received = entries.len(),
        kept = gyms.len(),
        is_last_page,
        "discovery page normalized"
    );

    Ok(SearchPage { gyms, is_last_page })
}

/// Normalizes a profile response.
///
/// # Errors
///
/// Returns [`SearchError::Network`] for non-success statuses other than 404.
pub fn normalize_detail(status: u16, body: &str) -> Result<Option<GymDetail>, SearchError> {
    let Some(envelope) = accepted_envelope(status, body)? else {
        return Ok(None);
    };

    let data = envelope.get("data").unwrap_or(&envelope);
    let data = data.get("gym").filter(|g| g.is_object()).unwrap_or(data);

    let detail = parse_detail(data);
    if detail.is_none() {
        tracing::warn!("profile response has no usable gym, treating as not found");
    }
    Ok(detail)
}

/// Applies the shared status rules, returning the parsed body if it should be
/// interpreted further.
fn accepted_envelope(status: u16, body: &str) -> Result<Option<Value>, SearchError> {
    if status == NOT_FOUND {
        tracing::debug!("catalog returned not found, normalizing to empty");
        return Ok(None);
    }
    if !(200..300).contains(&status) {
        return Err(SearchError::Network(format!("catalog returned HTTP {status}")));
    }

    let body = body.trim();
    if body.is_empty() {
        tracing::debug!("empty catalog body");
        return Ok(None);
    }

    let envelope: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable catalog body, treating as empty");
            return Ok(None);
        }
    };

    if envelope.get("success").and_then(Value::as_bool) == Some(false) {
        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no message");
        tracing::warn!(message, "catalog reported failure on a success status");
        return Ok(None);
    }

    Ok(Some(envelope))
}

/// Finds the gym array: `data: [...]`, `data: {gyms: [...]}`, `gyms: [...]`,
/// or a bare top-level array.
fn gym_entries(envelope: &Value) -> Option<&Vec<Value>> {
    if let Some(entries) = envelope.as_array() {
        return Some(entries);
    }
    match envelope.get("data") {
        Some(Value::Array(entries)) => Some(entries),
        Some(data @ Value::Object(_)) => data.get("gyms").and_then(Value::as_array),
        _ => envelope.get("gyms").and_then(Value::as_array),
    }
}

fn parse_summary(value: &Value) -> Option<GymSummary> {
    let obj = value.as_object()?;
    let Some(id) = first_text(obj, &["id", "_id", "gymId"]) else {
        tracing::warn!("skipping catalog entry without an id");
        return None;
    };

    let coordinates = coordinates(obj).unwrap_or_else(|| {
        tracing::warn!(gym_id = %id, "gym has no usable coordinates, placing at origin");
        Position::ORIGIN
    });

    Some(GymSummary {
        name: first_text(obj, &["name", "gymName"]).unwrap_or_else(|| "Unnamed gym".to_string()),
        address: address(obj),
        coordinates,
        rating: first_number(obj, &["rating", "averageRating"]).unwrap_or(0.0),
        daily_pass_price: daily_pass_price(obj),
        gym_type: first_text(obj, &["type", "gymType", "category"])
            .unwrap_or_else(|| "gym".to_string()),
        id,
    })
}

fn parse_detail(value: &Value) -> Option<GymDetail> {
    let summary = parse_summary(value)?;
    let obj = value.as_object()?;
    let contact = obj.get("contact").and_then(Value::as_object);
    let contact_text = |keys: &[&str]| {
        first_text(obj, keys).or_else(|| contact.and_then(|c| first_text(c, keys)))
    };

    Some(GymDetail {
        summary,
        description: first_text(obj, &["description", "about"]),
        phone: contact_text(&["phone", "phoneNumber", "contactNumber"]),
        email: contact_text(&["email"]),
        website: contact_text(&["website", "url"]),
        opening_hours: opening_hours(obj),
        amenities: string_list(obj.get("amenities"), "name"),
        images: string_list(obj.get("images").or_else(|| obj.get("photos")), "url"),
    })
}

/// Flat `latitude`/`lat` + `longitude`/`lng`/`lon` fields, then a nested
/// `location` or `coordinates` object, then a GeoJSON `[lon, lat]` array.
fn coordinates(obj: &Map<String, Value>) -> Option<Position> {
    if let Some(p) = flat_coordinates(obj) {
        return Some(p);
    }

    for key in ["location", "coordinates"] {
        match obj.get(key) {
            Some(Value::Object(nested)) => {
                if let Some(p) = flat_coordinates(nested) {
                    return Some(p);
                }
                if let Some(p) = nested.get("coordinates").and_then(geojson_pair) {
                    return Some(p);
                }
            }
            Some(pair @ Value::Array(_)) => {
                if let Some(p) = geojson_pair(pair) {
                    return Some(p);
                }
            }
            _ => {}
        }
    }
    None
}

fn flat_coordinates(obj: &Map<String, Value>) -> Option<Position> {
    let lat = first_number(obj, &["latitude", "lat"])?;
    let lon = first_number(obj, &["longitude", "lng", "lon"])?;
    Position::new(lat, lon).ok()
}

fn geojson_pair(value: &Value) -> Option<Position> {
    match value.as_array()?.as_slice() {
        [lon, lat, ..] => Position::new(number(lat)?, number(lon)?).ok(),
        _ => None,
    }
}

fn address(obj: &Map<String, Value>) -> String {
    let raw = obj
        .get("address")
        .or_else(|| obj.get("location").and_then(|l| l.get("address")));

    match raw {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Object(parts)) => ["street", "line1", "area", "city", "state", "pincode", "zip"]
            .iter()
            .filter_map(|key| text(parts.get(*key)?))
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn daily_pass_price(obj: &Map<String, Value>) -> Option<f64> {
    first_number(obj, &["dailyPassPrice", "dayPassPrice"])
        .or_else(|| {
            let pricing = obj.get("pricing")?;
            let daily = pricing.get("dailyPass").or_else(|| pricing.get("daily"))?;
            number(daily).or_else(|| number(daily.get("price")?))
        })
        .or_else(|| first_number(obj, &["price"]))
        .filter(|p| *p >= 0.0)
}

fn opening_hours(obj: &Map<String, Value>) -> Option<String> {
    let raw = ["openingHours", "timings", "hours"]
        .iter()
        .find_map(|key| obj.get(*key))?;

    match raw {
        Value::Object(days) => {
            let joined = days
                .iter()
                .filter_map(|(day, hours)| Some(format!("{day}: {}", text(hours)?)))
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        other => text(other),
    }
}

/// Strings from an array whose items are either strings or objects carrying
/// the text under `field`.
fn string_list(value: Option<&Value>, field: &str) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(inner) => text(inner.get(field)?),
            other => text(other),
        })
        .collect()
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(obj.get(*key)?))
}

fn first_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| number(obj.get(*key)?))
}

/// Non-empty string, or a number rendered as text.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite number, accepting numeric strings.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
