//! Resource keys: the unit of caching and fetch de-duplication
//!
//! A [`ResourceKey`] identifies one logical list: a resource type plus its
//! active filter parameters. Two screens showing "approved gallery images in
//! category X" share a key; changing a filter produces a different key with
//! its own cache partition and its own in-flight guard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of remote list resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// Gallery images
    Gallery,
    /// Audio tracks
    Audio,
    /// Search results
    Search,
    /// Any other paginated resource, addressed by its endpoint path segment
    Custom(String),
}

impl ResourceType {
    /// The endpoint path segment for this resource.
    pub fn path(&self) -> &str {
        match self {
            ResourceType::Gallery => "gallery",
            ResourceType::Audio => "audio",
            ResourceType::Search => "search",
            ResourceType::Custom(path) => path,
        }
    }
}

/// Identifier of a logical list: resource type + active filters.
///
/// Filters live in a `BTreeMap` so the canonical string form is stable
/// regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    resource: ResourceType,
    filters: BTreeMap<String, String>,
}

impl ResourceKey {
    /// Key for a resource with no filters.
    pub fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            filters: BTreeMap::new(),
        }
    }

    /// Key for a resource with the given filters.
    pub fn with_filters(resource: ResourceType, filters: BTreeMap<String, String>) -> Self {
        Self { resource, filters }
    }

    /// Add or replace a single filter.
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    pub fn resource(&self) -> &ResourceType {
        &self.resource
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }
}

impl fmt::Display for ResourceKey {
    /// Canonical form: `resource:k1=v1&k2=v2`, filters sorted by name.
    /// This string is the cache partition key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource.path())?;
        if self.filters.is_empty() {
            return Ok(());
        }
        write!(f, ":")?;
        for (i, (name, value)) in self.filters.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}
