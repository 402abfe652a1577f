use super::{ConstraintModule, ConstraintSink};
use crate::context::ModelContext;
use log::{debug, info};
use std::collections::HashSet;
use std::fmt;

/// Named constraint modules in registration order, plus the set of enabled names.
#[derive(Default)]
pub struct ConstraintRegistry {
    modules: Vec<Box<dyn ConstraintModule>>,
    enabled: HashSet<String>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a module, enabled. A module with the same name is replaced
    /// in place, keeping its original position.
    pub fn register<M: ConstraintModule + 'static>(&mut self, module: M) -> &mut Self {
        let name = module.name().to_string();
        match self.modules.iter().position(|m| m.name() == name) {
            Some(i) => self.modules[i] = Box::new(module),
            None => self.modules.push(Box::new(module)),
        }
        self.enabled.insert(name);
        self
    }

    /// No-op for names that were never registered.
    pub fn enable(&mut self, name: &str) {
        if self.is_registered(name) {
            self.enabled.insert(name.to_string());
        }
    }

    pub fn disable(&mut self, name: &str) {
        self.enabled.remove(name);
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn active(&self) -> impl Iterator<Item = &dyn ConstraintModule> {
        self.modules
            .iter()
            .filter(|m| self.enabled.contains(m.name()))
            .map(|m| m.as_ref())
    }

    /// Runs every enabled module against the context, in registration order.
    pub fn apply_active(&self, ctx: &ModelContext, sink: &mut ConstraintSink) {
        for module in self.active() {
            let before = sink.len();
            info!("Adding '{}' constraints...", module.name());
            module.apply(ctx, sink);
            debug!(
                "'{}' asserted {} constraints (hard: {}).",
                module.name(),
                sink.len() - before,
                module.is_hard()
            );
        }
    }
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintRegistry")
            .field("modules", &self.names())
            .field("enabled", &self.enabled)
            .finish()
    }
}
