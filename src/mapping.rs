use crate::{
    container::MapRow,
    errors::{Error, Result},
};

/// Bidirectional id↔name mapping for tracks or skeletons.
///
/// Ids are not required to be contiguous or sorted; names are unique within
/// one map. Row order from the container is preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdMap {
    names: Vec<String>,
    ids: Vec<u32>,
}

impl IdMap {
    pub fn from_rows(rows: &[MapRow]) -> Self {
        let names = rows.iter().map(|row| row.name.clone()).collect();
        let ids = rows.iter().map(|row| row.id).collect();

        Self { names, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Id registered under `name`, if any.
    pub fn id(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| self.ids[index])
    }

    /// Display name registered for `id`, if any.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.ids
            .iter()
            .position(|&candidate| candidate == id)
            .map(|index| self.names[index].as_str())
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.ids.iter().copied())
    }
}

/// A track or node filter, given either by display name or by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Name(String),
    Id(u32),
}

impl Selector {
    /// Resolve against an id map, yielding the validated id. Unknown names
    /// and ids fail with the list of valid options, so the caller can
    /// correct the filter.
    pub fn resolve(&self, map: &IdMap, kind: &'static str) -> Result<u32> {
        match self {
            Selector::Name(name) => map.id(name).ok_or_else(|| Error::InvalidFilter {
                kind,
                given: name.clone(),
                options: map.names().to_vec(),
            }),
            Selector::Id(id) => {
                if map.contains_id(*id) {
                    Ok(*id)
                } else {
                    Err(Error::InvalidFilter {
                        kind,
                        given: id.to_string(),
                        options: map.ids().iter().map(|id| id.to_string()).collect(),
                    })
                }
            }
        }
    }

    /// Resolve against an ordered label list where the id is the positional
    /// index, as with node names.
    pub fn resolve_label(&self, labels: &[String], kind: &'static str) -> Result<usize> {
        let index = match self {
            Selector::Name(name) => labels.iter().position(|candidate| candidate == name),
            Selector::Id(id) => {
                let id = *id as usize;
                (id < labels.len()).then(|| id)
            }
        };

        index.ok_or_else(|| Error::InvalidFilter {
            kind,
            given: match self {
                Selector::Name(name) => name.clone(),
                Selector::Id(id) => id.to_string(),
            },
            options: labels.to_vec(),
        })
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

impl From<u32> for Selector {
    fn from(id: u32) -> Self {
        Selector::Id(id)
    }
}
