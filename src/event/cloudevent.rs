//! In-memory CloudEvent representation.

use bytes::Bytes;

/// Supported CloudEvents specification versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    V10,
    V03,
}

impl SpecVersion {
    /// The wire form of the version.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V10 => "1.0",
            SpecVersion::V03 => "0.3",
        }
    }

    /// Parse a wire version string. Returns `None` for unsupported values;
    /// the codec turns that into a decode error naming the value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1.0" => Some(SpecVersion::V10),
            "0.3" => Some(SpecVersion::V03),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payload. Structured-mode events carry JSON-typed data; binary-mode
/// events carry the request body verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Json(serde_json::Value),
    Binary(Bytes),
}

impl EventData {
    /// View the payload as a JSON value. Binary payloads are parsed when
    /// they hold valid JSON and carried as a JSON string otherwise.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EventData::Json(value) => value.clone(),
            EventData::Binary(bytes) => serde_json::from_slice(bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
            }),
        }
    }
}

/// A decoded CloudEvent.
///
/// The four required attributes are always present on a constructed event;
/// the codec refuses to produce anything partial.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudEvent {
    /// Event identifier, unique per producer and source. Carried, not
    /// enforced.
    pub id: String,
    /// URI-reference identifying the producer.
    pub source: String,
    /// Event type (wire attribute name `type`).
    pub ty: String,
    /// Specification version the event was encoded with.
    pub specversion: SpecVersion,
    /// RFC3339 occurrence time, if given.
    pub time: Option<String>,
    /// MIME type of `data`, if given.
    pub datacontenttype: Option<String>,
    /// Payload, if any.
    pub data: Option<EventData>,
}

impl CloudEvent {
    /// Create an event from its required attributes.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        ty: impl Into<String>,
        specversion: SpecVersion,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            ty: ty.into(),
            specversion,
            time: None,
            datacontenttype: None,
            data: None,
        }
    }

    /// Set the occurrence time.
    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Set the data content type.
    pub fn datacontenttype(mut self, content_type: impl Into<String>) -> Self {
        self.datacontenttype = Some(content_type.into());
        self
    }

    /// Set the payload.
    pub fn data(mut self, data: EventData) -> Self {
        self.data = Some(data);
        self
    }
}
