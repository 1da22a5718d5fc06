//! Tag → component mapping.

use std::collections::{BTreeMap, BTreeSet};

use crate::{tag_of, TypesError};

/// Maps each sensor tag to the physical component it is mounted on.
///
/// Built once while preparing a dataset and read-only afterwards. A tag
/// belongs to exactly one component.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TagComponentMap {
    tags: BTreeMap<String, String>,
}

impl TagComponentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for a tag map.
    pub fn builder() -> TagComponentMapBuilder {
        TagComponentMapBuilder::default()
    }

    /// Assign `tag` to `component`.
    ///
    /// Re-inserting the same pair is a no-op; assigning the tag to a
    /// different component is an error.
    pub fn insert(
        &mut self,
        tag: impl Into<String>,
        component: impl Into<String>,
    ) -> Result<(), TypesError> {
        let tag = tag.into();
        let component = component.into();
        if let Some(existing) = self.tags.get(&tag) {
            if *existing != component {
                return Err(TypesError::TagConflict {
                    tag,
                    existing: existing.clone(),
                    conflicting: component,
                });
            }
            return Ok(());
        }
        self.tags.insert(tag, component);
        Ok(())
    }

    /// Exact lookup by tag.
    pub fn component_of(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    /// Resolve a sensor name to its component.
    ///
    /// Tries the full name first, then its tag part, so both `Sensor0` and
    /// `centrifugal-pump\Sensor0` resolve.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.component_of(name)
            .or_else(|| self.component_of(tag_of(name)))
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// All distinct components, sorted.
    pub fn components(&self) -> BTreeSet<&str> {
        self.tags.values().map(String::as_str).collect()
    }

    /// Tags assigned to `component`, sorted.
    pub fn tags_of<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |(_, c)| c.as_str() == component)
            .map(|(t, _)| t.as_str())
    }

    /// Iterate `(tag, component)` pairs sorted by tag.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Builder for [`TagComponentMap`].
#[derive(Debug, Default)]
pub struct TagComponentMapBuilder {
    pairs: Vec<(String, String)>,
}

impl TagComponentMapBuilder {
    /// Assign every tag in `tags` to `component`.
    pub fn component<I, T>(mut self, component: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let component = component.into();
        for tag in tags {
            self.pairs.push((tag.into(), component.clone()));
        }
        self
    }

    /// Build the map, failing on the first conflicting assignment.
    pub fn build(self) -> Result<TagComponentMap, TypesError> {
        let mut map = TagComponentMap::new();
        for (tag, component) in self.pairs {
            map.insert(tag, component)?;
        }
        Ok(map)
    }
}
