//! User function handling: calling-convention traits, signature
//! classification and the once-only loader.

pub mod handler;
pub mod loader;
pub mod signature;

pub use handler::{CloudEventHandler, EventHandler, Handler, HandlerError, HttpHandler};
pub use loader::{FunctionDescriptor, FunctionLoader, Module, ModuleCatalog};
pub use signature::{CallableShape, SignatureType};
