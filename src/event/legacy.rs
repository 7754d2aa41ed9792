//! Legacy `(data, context)` event convention.
//!
//! Older event handlers take two arguments instead of a CloudEvent. This
//! adapter converts a decoded CloudEvent into that pair, and synthesizes a
//! CloudEvent from a legacy-shaped JSON body when a request carries no
//! CloudEvent at all. It never invents attribute information beyond what
//! the payload already carries.

use crate::error::GatewayError;
use crate::event::cloudevent::{CloudEvent, EventData, SpecVersion};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The resource a legacy event refers to. Sources matching the
/// `//service/path` URI shape are parsed into a descriptor; anything else
/// is carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    Descriptor {
        service: String,
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },
    Raw(Value),
}

/// Context argument of the legacy convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyContext {
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub event_type: String,
    pub resource: Resource,
}

fn parse_resource(source: &str) -> Resource {
    if let Some(rest) = source.strip_prefix("//") {
        if let Some((service, name)) = rest.split_once('/') {
            if !service.is_empty() && !name.is_empty() {
                return Resource::Descriptor {
                    service: service.to_string(),
                    name: name.to_string(),
                    ty: None,
                };
            }
        }
    }
    Resource::Raw(Value::String(source.to_string()))
}

fn resource_to_source(resource: &Resource) -> String {
    match resource {
        Resource::Descriptor { service, name, .. } => format!("//{}/{}", service, name),
        Resource::Raw(Value::String(source)) => source.clone(),
        Resource::Raw(value) => value.to_string(),
    }
}

/// Convert a CloudEvent into the legacy `(data, context)` pair.
pub fn to_legacy(event: &CloudEvent) -> (Value, LegacyContext) {
    let data = event
        .data
        .as_ref()
        .map(EventData::to_json)
        .unwrap_or(Value::Null);
    let context = LegacyContext {
        event_id: event.id.clone(),
        timestamp: event.time.clone(),
        event_type: event.ty.clone(),
        resource: parse_resource(&event.source),
    };
    (data, context)
}

/// Synthesize a CloudEvent from a legacy-shaped JSON body.
///
/// Accepts both the nested shape `{"context": {...}, "data": ...}` and the
/// older flat shape with `eventId`/`timestamp`/`eventType`/`resource` next
/// to `data`. The synthesized event always carries specversion 0.3.
pub fn from_legacy(body: &[u8]) -> Result<CloudEvent, GatewayError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::EventDecode(format!("invalid legacy event body: {}", e)))?;
    let payload = payload.as_object().ok_or_else(|| {
        GatewayError::EventDecode("legacy event body is not a JSON object".to_string())
    })?;

    let data = payload
        .get("data")
        .cloned()
        .ok_or_else(|| GatewayError::EventDecode("legacy event missing \"data\"".to_string()))?;

    let context = match payload.get("context") {
        Some(value) => value.as_object().ok_or_else(|| {
            GatewayError::EventDecode("legacy event \"context\" is not a JSON object".to_string())
        })?,
        None => payload,
    };

    let field = |name: &str| -> Result<String, GatewayError> {
        match context.get(name) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(GatewayError::EventDecode(format!(
                "legacy event field \"{}\" is not a string",
                name
            ))),
            None => Err(GatewayError::EventDecode(format!(
                "legacy event missing \"{}\"",
                name
            ))),
        }
    };

    let resource = context
        .get("resource")
        .cloned()
        .ok_or_else(|| GatewayError::EventDecode("legacy event missing \"resource\"".to_string()))
        .map(|value| serde_json::from_value::<Resource>(value.clone()).unwrap_or(Resource::Raw(value)))?;

    let mut event = CloudEvent::new(
        field("eventId")?,
        resource_to_source(&resource),
        field("eventType")?,
        SpecVersion::V03,
    );
    if context.contains_key("timestamp") {
        event.time = Some(field("timestamp")?);
    }
    event.data = Some(EventData::Json(data));
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_uri_shape_is_parsed() {
        let resource = parse_resource("//pubsub.googleapis.com/projects/p/topics/t");
        assert_eq!(
            resource,
            Resource::Descriptor {
                service: "pubsub.googleapis.com".to_string(),
                name: "projects/p/topics/t".to_string(),
                ty: None,
            }
        );
    }

    #[test]
    fn test_opaque_source_stays_opaque() {
        let resource = parse_resource("from-galaxy-far-far-away");
        assert_eq!(
            resource,
            Resource::Raw(Value::String("from-galaxy-far-far-away".to_string()))
        );
    }

    #[test]
    fn test_resource_round_trips_through_source() {
        let resource = parse_resource("//storage.googleapis.com/buckets/b");
        assert_eq!(
            resource_to_source(&resource),
            "//storage.googleapis.com/buckets/b"
        );
    }
}
