use std::sync::Arc;

use seedrun::exec::{HandlerRegistry, TaskHandler};
use seedrun::graph::SeedPackage;
use seedrun::state::TaskKind;

use crate::fake_handlers::{Executed, RecordingHandler};

/// Builder for `SeedPackage` to simplify test setup.
pub struct PackageBuilder {
    pkg: SeedPackage,
}

impl PackageBuilder {
    pub fn new(instance_name: &str) -> Self {
        Self {
            pkg: SeedPackage::new(instance_name),
        }
    }

    pub fn hook(mut self, hook: &str) -> Self {
        self.pkg.hooks.push(hook.to_string());
        self
    }

    pub fn services(mut self) -> Self {
        self.pkg.services = true;
        self
    }

    pub fn gadget_assets(mut self) -> Self {
        self.pkg.gadget_assets = true;
        self
    }

    pub fn build(self) -> SeedPackage {
        self.pkg
    }
}

/// The canonical first-boot package set used across tests:
/// base, kernel, gadget, one application.
pub fn essential_packages() -> Vec<SeedPackage> {
    vec![
        PackageBuilder::new("core").build(),
        PackageBuilder::new("pc-kernel").gadget_assets().build(),
        PackageBuilder::new("pc").gadget_assets().hook("configure").build(),
        PackageBuilder::new("app1")
            .hook("install")
            .hook("configure")
            .services()
            .build(),
    ]
}

/// Registry where every kind records into `executed` and succeeds.
pub fn recording_registry(executed: &Executed) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    let handler: Arc<dyn TaskHandler> = Arc::new(RecordingHandler::new(Arc::clone(executed)));
    for kind in TaskKind::ALL {
        registry.register(kind, Arc::clone(&handler));
    }
    registry
}

/// Like [`recording_registry`], but with `override_kind` handled by the
/// given handler instead of the recorder.
pub fn recording_registry_with(
    executed: &Executed,
    override_kind: TaskKind,
    handler: Arc<dyn TaskHandler>,
) -> HandlerRegistry {
    let mut registry = recording_registry(executed);
    registry.register(override_kind, handler);
    registry
}
