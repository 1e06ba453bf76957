use std::{collections::BTreeMap, path::Path};

use ndarray::{ArrayView1, ArrayViewD, ArrayViewMutD};

use crate::errors::Result;

/// Section type that marks a container as holding tracking data.
pub const SECTION_TRACKING: &str = "nix.tracking.metadata";

/// Required value of the `format` property in the tracking metadata section.
pub const FORMAT_TRACKING: &str = "nix.tracking";

pub(crate) const KEY_POSITION: &str = "position";
pub(crate) const KEY_TRACK: &str = "track";
pub(crate) const KEY_SKELETON: &str = "skeleton";
pub(crate) const KEY_INSTANCE_SCORE: &str = "instance score";
pub(crate) const KEY_NODE_SCORE: &str = "node score";
pub(crate) const KEY_TRACK_MAP: &str = "track map";
pub(crate) const KEY_SKELETON_MAP: &str = "skeleton map";

/// Whether a container is opened for reading only or for reading and
/// writing through the raw array views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileMode {
    ReadOnly,
    ReadWrite,
}

/// A single metadata property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }
}

/// Opaque key-value metadata attached to a section or source.
pub type Metadata = BTreeMap<String, Value>;

/// A typed metadata section found in a container.
#[derive(Clone, Debug)]
pub struct Section {
    pub kind: String,
    pub props: Metadata,
}

impl Section {
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Self {
            kind: kind.into(),
            props: Metadata::new(),
        }
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }
}

/// One row of an id↔name mapping table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRow {
    pub name: String,
    pub id: u32,
}

impl MapRow {
    pub fn new<S: Into<String>>(name: S, id: u32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Accessor contract for the underlying container format.
///
/// The container's on-disk layout is opaque to this crate. An implementation
/// binds to the first top-level data block on open and serves named arrays
/// and tables from it. Returned array views borrow from the open handle, so
/// nothing is copied until a caller materializes a result.
///
/// Array lookups return dynamic-dimension views; callers fix the
/// dimensionality they expect. Lookups for a key the container does not have
/// fail with `Error::BadKey`.
pub trait Container {
    /// Open the container at `path`. Callers are expected to have checked
    /// that the path exists.
    ///
    fn open(path: &Path, mode: FileMode) -> Result<Self>
    where
        Self: Sized;

    /// The mode this container was opened with.
    ///
    fn mode(&self) -> FileMode;

    /// Find the first metadata section of the given type, if any.
    ///
    fn find_section(&self, kind: &str) -> Option<&Section>;

    /// Key-value metadata of the data block's source, e.g. the video the
    /// tracking results were computed from.
    ///
    fn source_metadata(&self) -> Result<&Metadata>;

    fn array_f32(&self, name: &str) -> Result<ArrayViewD<'_, f32>>;

    fn array_u32(&self, name: &str) -> Result<ArrayViewD<'_, u32>>;

    /// Write-through view. Implementations only need to honor this in
    /// read-write mode; the dataset handle rejects the call earlier
    /// otherwise.
    ///
    fn array_f32_mut(&mut self, name: &str) -> Result<ArrayViewMutD<'_, f32>>;

    fn array_u32_mut(&mut self, name: &str) -> Result<ArrayViewMutD<'_, u32>>;

    /// Tick values of one dimension of a named array. For tracking data the
    /// ticks of the position array's first dimension are the frame axis.
    ///
    fn dim_ticks(&self, name: &str, axis: usize) -> Result<ArrayView1<'_, i64>>;

    /// Labels of one dimension of a named array. For tracking data the
    /// labels of the position array's last dimension are the node names.
    ///
    fn dim_labels(&self, name: &str, axis: usize) -> Result<&[String]>;

    /// Rows of a named (name, id) mapping table.
    ///
    fn map_table(&self, name: &str) -> Result<&[MapRow]>;

    /// Write any pending changes back to storage.
    ///
    fn flush(&mut self) -> Result<()>;
}
