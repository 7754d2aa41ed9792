//! CloudEvent representation, wire codec and legacy-event adapter.

mod cloudevent;
pub mod codec;
pub mod legacy;

pub use cloudevent::{CloudEvent, EventData, SpecVersion};
pub use codec::Encoding;
pub use legacy::{LegacyContext, Resource};
