//! Lazy, once-only resolution of the target function.
//!
//! The loader imports the configured source module on the first request,
//! resolves the named target export, classifies its signature and caches
//! the outcome for the process lifetime. A load failure is just as final
//! as a success: it is replayed for every later request and the module is
//! never imported a second time.

use crate::error::GatewayError;
use crate::function::handler::Handler;
use crate::function::signature::{classify, CallableShape, SignatureType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// A named export of a module. Modules can export values that are not
/// callable; resolving the target to one of those is a resolution error.
pub enum Export {
    Function(Handler),
    Value(serde_json::Value),
}

/// The exports of an imported source module.
#[derive(Default)]
pub struct Module {
    exports: HashMap<String, Export>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a callable under the given name.
    pub fn export_fn(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.exports.insert(name.into(), Export::Function(handler));
        self
    }

    /// Export a plain value under the given name.
    pub fn export_value(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.exports.insert(name.into(), Export::Value(value));
        self
    }

    fn take(&mut self, name: &str) -> Option<Export> {
        self.exports.remove(name)
    }
}

type ModuleInit = Box<dyn Fn() -> Result<Module, GatewayError> + Send + Sync>;

/// The modules the gateway can import, keyed by source path.
///
/// Importing runs the module's init exactly once per process; an init that
/// fails models a module raising during import.
#[derive(Default)]
pub struct ModuleCatalog {
    modules: HashMap<String, ModuleInit>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under a source path.
    pub fn register<F>(mut self, source: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> Result<Module, GatewayError> + Send + Sync + 'static,
    {
        self.modules.insert(source.into(), Box::new(init));
        self
    }

    fn import(&self, source: &str) -> Result<Module, GatewayError> {
        let init = self.modules.get(source).ok_or_else(|| {
            GatewayError::ModuleLoad(format!(
                "source \"{}\" that is expected to define the function does not exist",
                source
            ))
        })?;
        init()
    }
}

/// The resolved target: created once, immutable afterwards.
pub struct FunctionDescriptor {
    /// Name of the target export.
    pub target: String,
    /// Source path the module was imported from.
    pub source: String,
    /// The resolved callable.
    pub handler: Handler,
    /// Classified signature type. A classification failure is cached here
    /// and surfaced on every dispatch, not at load time.
    pub signature: Result<SignatureType, GatewayError>,
}

/// Owner of the one-time load. `resolve` is idempotent; concurrent first
/// callers share a single import and all observe the same completed
/// descriptor or the same cached failure.
pub struct FunctionLoader {
    catalog: ModuleCatalog,
    target: String,
    source: String,
    configured: Option<SignatureType>,
    cell: OnceCell<Result<Arc<FunctionDescriptor>, GatewayError>>,
}

impl FunctionLoader {
    pub fn new(
        catalog: ModuleCatalog,
        target: impl Into<String>,
        source: impl Into<String>,
        configured: Option<SignatureType>,
    ) -> Self {
        Self {
            catalog,
            target: target.into(),
            source: source.into(),
            configured,
            cell: OnceCell::new(),
        }
    }

    /// Resolve the function descriptor, importing the module on first call.
    pub async fn resolve(&self) -> Result<Arc<FunctionDescriptor>, GatewayError> {
        self.cell
            .get_or_init(|| async { self.load() })
            .await
            .clone()
    }

    fn load(&self) -> Result<Arc<FunctionDescriptor>, GatewayError> {
        info!("Importing module \"{}\"", self.source);
        let mut module = match self.catalog.import(&self.source) {
            Ok(module) => module,
            Err(e) => {
                error!("Failed to import module \"{}\": {}", self.source, e);
                return Err(e);
            }
        };

        let export = module.take(&self.target).ok_or_else(|| {
            let err = GatewayError::TargetResolution(format!(
                "target \"{}\" is not defined in module \"{}\"",
                self.target, self.source
            ));
            error!("{}", err);
            err
        })?;

        let handler = match export {
            Export::Function(handler) => handler,
            Export::Value(_) => {
                let err = GatewayError::TargetResolution(format!(
                    "target \"{}\" in module \"{}\" is not callable",
                    self.target, self.source
                ));
                error!("{}", err);
                return Err(err);
            }
        };

        let signature = classify(CallableShape::of(&handler), self.configured);
        if let Ok(signature) = &signature {
            info!(
                "Resolved function \"{}\" from \"{}\" as {}",
                self.target, self.source, signature
            );
        }

        Ok(Arc::new(FunctionDescriptor {
            target: self.target.clone(),
            source: self.source.clone(),
            handler,
            signature,
        }))
    }
}
