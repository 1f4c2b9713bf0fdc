//! Insertion-ordered attribute registry.

use std::collections::HashMap;

use crate::attributes::{Attribute, DataSource};
use crate::error::{CoreError, Result};

/// The set of attributes known to a pipeline. Operations consult the registry
/// to decide which columns to reduce, normalize or recompute.
///
/// Keys are display names, since that is the name a column actually carries
/// inside tables; two providers may share a provider-side name as long as one
/// of them renames.
///
/// Registration is asymmetric on purpose: a native attribute may not reuse any
/// existing name, while a derived attribute silently replaces a prior holder
/// of its name, keeping the original registration slot so enumeration order
/// stays stable across redefinition.
#[derive(Default)]
pub struct AttributeRegistry {
    order: Vec<String>,
    by_name: HashMap<String, Attribute>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, attribute: Attribute) -> Result<()> {
        let name = attribute.display_name().to_string();
        if let Some(existing) = self.by_name.get(&name) {
            if attribute.is_native() {
                return Err(CoreError::DuplicateAttribute {
                    name,
                    existing_source: existing.source(),
                });
            }
            self.by_name.insert(name, attribute);
            return Ok(());
        }
        self.order.push(name.clone());
        self.by_name.insert(name, attribute);
        Ok(())
    }

    /// Lookup by display name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All attributes in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Attribute> {
        self.order.iter().map(|name| &self.by_name[name])
    }

    pub fn by_source(&self, source: DataSource) -> impl Iterator<Item = &Attribute> {
        self.all().filter(move |a| a.source() == source)
    }

    pub fn derived(&self) -> impl Iterator<Item = &Attribute> {
        self.all().filter(|a| a.is_derived())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
