//! CloudEvents wire codec.
//!
//! Two encodings are supported. Binary mode carries attributes as `ce-`
//! prefixed headers with the payload as the raw body; structured mode
//! carries the whole event as one JSON envelope. Version differences are
//! held in a small rules table keyed by the wire specversion, selected
//! before any other attribute is read.

use crate::error::GatewayError;
use crate::event::cloudevent::{CloudEvent, EventData, SpecVersion};
use crate::http::{GatewayRequest, Method};
use serde_json::Value;

pub const CE_ID_HEADER: &str = "ce-id";
pub const CE_SOURCE_HEADER: &str = "ce-source";
pub const CE_TYPE_HEADER: &str = "ce-type";
pub const CE_SPECVERSION_HEADER: &str = "ce-specversion";
pub const CE_TIME_HEADER: &str = "ce-time";

pub const CE_JSON_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Wire encoding of a CloudEvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Structured,
}

/// Per-version extraction rules. 1.0 defaults the data content type to
/// JSON when data is present without a declared type; 0.3 leaves it unset.
#[derive(Debug)]
struct VersionRules {
    version: SpecVersion,
    default_json_content_type: bool,
}

const VERSION_RULES: &[VersionRules] = &[
    VersionRules {
        version: SpecVersion::V10,
        default_json_content_type: true,
    },
    VersionRules {
        version: SpecVersion::V03,
        default_json_content_type: false,
    },
];

fn rules_for(wire_version: &str) -> Result<&'static VersionRules, GatewayError> {
    let version = SpecVersion::parse(wire_version).ok_or_else(|| {
        GatewayError::EventDecode(format!("unsupported specversion \"{}\"", wire_version))
    })?;
    // parse() only returns versions present in the table
    VERSION_RULES
        .iter()
        .find(|rules| rules.version == version)
        .ok_or_else(|| {
            GatewayError::EventDecode(format!("unsupported specversion \"{}\"", wire_version))
        })
}

/// Whether a content type indicates a structured-mode CloudEvent envelope.
pub fn is_structured_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    essence.starts_with("application/cloudevents") && essence.ends_with("+json")
}

/// Whether the request carries a CloudEvent in either mode. Used by the
/// dispatcher to decide between CloudEvent decoding and the legacy
/// fallback.
pub fn carries_cloudevent(request: &GatewayRequest) -> bool {
    if request.get_header(CE_SPECVERSION_HEADER).is_some() {
        return true;
    }
    request
        .content_type()
        .map(is_structured_content_type)
        .unwrap_or(false)
}

/// Decode a CloudEvent from an HTTP request in either mode.
pub fn decode(request: &GatewayRequest) -> Result<CloudEvent, GatewayError> {
    let structured = request
        .content_type()
        .map(is_structured_content_type)
        .unwrap_or(false);
    if structured {
        decode_structured(request)
    } else {
        decode_binary(request)
    }
}

fn missing(attribute: &str) -> GatewayError {
    GatewayError::EventDecode(format!("missing required attribute \"{}\"", attribute))
}

fn decode_structured(request: &GatewayRequest) -> Result<CloudEvent, GatewayError> {
    let body = request.body.as_deref().unwrap_or_default();
    let envelope: Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::EventDecode(format!("invalid structured envelope: {}", e)))?;
    let envelope = envelope.as_object().ok_or_else(|| {
        GatewayError::EventDecode("structured envelope is not a JSON object".to_string())
    })?;

    let attr = |name: &str| -> Result<String, GatewayError> {
        match envelope.get(name) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(GatewayError::EventDecode(format!(
                "attribute \"{}\" is not a string",
                name
            ))),
            None => Err(missing(name)),
        }
    };

    let rules = rules_for(&attr("specversion")?)?;
    let mut event = CloudEvent::new(attr("id")?, attr("source")?, attr("type")?, rules.version);
    if envelope.contains_key("time") {
        event.time = Some(attr("time")?);
    }
    if envelope.contains_key("datacontenttype") {
        event.datacontenttype = Some(attr("datacontenttype")?);
    }
    if let Some(data) = envelope.get("data") {
        event.data = Some(EventData::Json(data.clone()));
        if event.datacontenttype.is_none() && rules.default_json_content_type {
            event.datacontenttype = Some("application/json".to_string());
        }
    }
    Ok(event)
}

fn decode_binary(request: &GatewayRequest) -> Result<CloudEvent, GatewayError> {
    let wire_version = request
        .get_header(CE_SPECVERSION_HEADER)
        .ok_or_else(|| missing("specversion"))?;
    let rules = rules_for(wire_version)?;

    let attr = |header: &str, name: &str| -> Result<String, GatewayError> {
        request
            .get_header(header)
            .map(str::to_string)
            .ok_or_else(|| missing(name))
    };

    let mut event = CloudEvent::new(
        attr(CE_ID_HEADER, "id")?,
        attr(CE_SOURCE_HEADER, "source")?,
        attr(CE_TYPE_HEADER, "type")?,
        rules.version,
    );
    event.time = request.get_header(CE_TIME_HEADER).map(str::to_string);
    event.datacontenttype = request.content_type().map(str::to_string);
    if let Some(body) = &request.body {
        if !body.is_empty() {
            event.data = Some(EventData::Binary(body.clone()));
            if event.datacontenttype.is_none() && rules.default_json_content_type {
                event.datacontenttype = Some("application/json".to_string());
            }
        }
    }
    Ok(event)
}

/// Encode a CloudEvent onto an HTTP request, the structural inverse of
/// [`decode`]. The runtime path is decode-only; encoding exists for parity
/// and round-trip testing.
pub fn encode(event: &CloudEvent, mode: Encoding) -> GatewayRequest {
    match mode {
        Encoding::Structured => encode_structured(event),
        Encoding::Binary => encode_binary(event),
    }
}

fn encode_structured(event: &CloudEvent) -> GatewayRequest {
    let mut envelope = serde_json::Map::new();
    envelope.insert(
        "specversion".to_string(),
        Value::String(event.specversion.as_str().to_string()),
    );
    envelope.insert("id".to_string(), Value::String(event.id.clone()));
    envelope.insert("source".to_string(), Value::String(event.source.clone()));
    envelope.insert("type".to_string(), Value::String(event.ty.clone()));
    if let Some(time) = &event.time {
        envelope.insert("time".to_string(), Value::String(time.clone()));
    }
    if let Some(content_type) = &event.datacontenttype {
        envelope.insert(
            "datacontenttype".to_string(),
            Value::String(content_type.clone()),
        );
    }
    if let Some(data) = &event.data {
        envelope.insert("data".to_string(), data.to_json());
    }

    GatewayRequest::new(Method::Post, "/")
        .header("Content-Type", CE_JSON_CONTENT_TYPE)
        .body(Value::Object(envelope).to_string())
}

fn encode_binary(event: &CloudEvent) -> GatewayRequest {
    let mut request = GatewayRequest::new(Method::Post, "/")
        .header(CE_SPECVERSION_HEADER, event.specversion.as_str())
        .header(CE_ID_HEADER, event.id.clone())
        .header(CE_SOURCE_HEADER, event.source.clone())
        .header(CE_TYPE_HEADER, event.ty.clone());
    if let Some(time) = &event.time {
        request.set_header(CE_TIME_HEADER, time.clone());
    }
    if let Some(content_type) = &event.datacontenttype {
        request.set_header("Content-Type", content_type.clone());
    }
    match &event.data {
        Some(EventData::Binary(bytes)) => request.body(bytes.clone()),
        Some(EventData::Json(value)) => request.body(value.to_string()),
        None => request,
    }
}
