use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use ndarray::{ArrayView1, ArrayView2, ArrayView3, ArrayViewMut1, ArrayViewMut2, ArrayViewMut3};
use parking_lot::RwLock;

use crate::{
    container::{
        Container, FileMode, Metadata, Value, FORMAT_TRACKING, KEY_INSTANCE_SCORE, KEY_NODE_SCORE,
        KEY_POSITION, KEY_SKELETON, KEY_SKELETON_MAP, KEY_TRACK, KEY_TRACK_MAP, SECTION_TRACKING,
    },
    errors::{Error, Result},
    mapping::IdMap,
};

/// Handle to one open tracking container.
///
/// The handle owns the container exclusively. Raw array accessors return
/// views borrowing from the open handle; nothing is copied until a query
/// materializes a result. After `close` every accessor fails with
/// `Error::ClosedHandle`.
pub struct Dataset {
    path: PathBuf,
    mode: FileMode,
    version: String,
    inner: Option<Box<dyn Container>>,

    // Lazily computed from the container's tables, cleared on close
    track_map: RwLock<Option<Arc<IdMap>>>,
    skeleton_map: RwLock<Option<Arc<IdMap>>>,
    node_labels: RwLock<Option<Arc<Vec<String>>>>,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("version", &self.version)
            .field("open", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

impl Dataset {
    /// Open the container at `path` using the container implementation `C`.
    ///
    /// Fails with `Error::NotFound` if the path does not exist and with
    /// `Error::InvalidFormat` if the container does not carry tracking
    /// data. No partially open handle is ever returned.
    pub fn open<C>(path: impl AsRef<Path>, mode: FileMode) -> Result<Self>
    where
        C: Container + 'static,
    {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let container = C::open(path, mode)?;

        Self::from_container(path, Box::new(container))
    }

    /// Bind to an already opened container, validating the tracking schema.
    pub fn from_container(path: impl AsRef<Path>, container: Box<dyn Container>) -> Result<Self> {
        let path = path.as_ref();
        let section = container.find_section(SECTION_TRACKING).ok_or_else(|| {
            Error::InvalidFormat(format!("{path:?} has no tracking metadata section"))
        })?;

        match section.prop_str("format") {
            Some(FORMAT_TRACKING) => {}
            _ => {
                return Err(Error::InvalidFormat(format!(
                    "{path:?} metadata format marker is missing or not {FORMAT_TRACKING:?}"
                )));
            }
        }

        let version = section
            .prop_str("version")
            .ok_or_else(|| Error::InvalidFormat(format!("{path:?} has no schema version")))?
            .to_string();

        debug!("opened tracking dataset {path:?}, schema version {version}");

        Ok(Self {
            path: path.to_path_buf(),
            mode: container.mode(),
            version,
            inner: Some(container),
            track_map: RwLock::new(None),
            skeleton_map: RwLock::new(None),
            node_labels: RwLock::new(None),
        })
    }

    /// Close the container. Idempotent. Pending changes are flushed first
    /// when the handle is read-write. All accessors fail from here on.
    pub fn close(&mut self) {
        if let Some(mut container) = self.inner.take() {
            if self.mode == FileMode::ReadWrite {
                if let Err(err) = container.flush() {
                    warn!("flush on close of {:?} failed: {err}", self.path);
                }
            }
            debug!("closed tracking dataset {:?}", self.path);
        }

        self.track_map.write().take();
        self.skeleton_map.write().take();
        self.node_labels.write().take();
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Full path of the underlying file.
    pub fn name(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Schema version tag cached at open time.
    pub fn version(&self) -> &str {
        &self.version
    }

    fn container(&self) -> Result<&dyn Container> {
        self.inner.as_deref().ok_or(Error::ClosedHandle)
    }

    fn container_mut(&mut self) -> Result<&mut dyn Container> {
        let container = self.inner.as_deref_mut().ok_or(Error::ClosedHandle)?;
        if self.mode != FileMode::ReadWrite {
            return Err(Error::ReadOnly);
        }

        Ok(container)
    }

    fn meta_value(&self, key: &str) -> Result<Value> {
        self.container()?
            .source_metadata()?
            .get(key)
            .cloned()
            .ok_or_else(|| Error::InvalidFormat(format!("video metadata is missing {key:?}")))
    }

    fn meta_i64(&self, key: &str) -> Result<i64> {
        self.meta_value(key)?
            .as_i64()
            .ok_or_else(|| Error::InvalidFormat(format!("video metadata {key:?} is not an integer")))
    }

    pub fn frame_width(&self) -> Result<i64> {
        self.meta_i64("width")
    }

    pub fn frame_height(&self) -> Result<i64> {
        self.meta_i64("height")
    }

    pub fn frame_count(&self) -> Result<i64> {
        self.meta_i64("frames")
    }

    pub fn fps(&self) -> Result<f64> {
        self.meta_value("fps")?
            .as_f64()
            .ok_or_else(|| Error::InvalidFormat("video metadata \"fps\" is not a number".into()))
    }

    pub fn video_name(&self) -> Result<String> {
        self.meta_value("filename").and_then(|value| {
            value
                .as_str()
                .map(|name| name.to_string())
                .ok_or_else(|| {
                    Error::InvalidFormat("video metadata \"filename\" is not a string".into())
                })
        })
    }

    /// Opaque key-value metadata of the source video.
    pub fn video_info(&self) -> Result<&Metadata> {
        self.container()?.source_metadata()
    }

    /// Number of instance-observations, i.e. the number of rows shared by
    /// all parallel arrays.
    pub fn instance_count(&self) -> Result<usize> {
        Ok(self.position_array()?.shape()[0])
    }

    /// Ordered node labels. The positional index of a label is its node id.
    pub fn nodes(&self) -> Result<Arc<Vec<String>>> {
        if let Some(labels) = self.node_labels.read().as_ref() {
            return Ok(Arc::clone(labels));
        }

        let labels = Arc::new(self.container()?.dim_labels(KEY_POSITION, 2)?.to_vec());
        *self.node_labels.write() = Some(Arc::clone(&labels));

        Ok(labels)
    }

    /// The track id↔name map.
    pub fn tracks(&self) -> Result<Arc<IdMap>> {
        self.cached_map(&self.track_map, KEY_TRACK_MAP)
    }

    /// The skeleton id↔name map.
    pub fn skeletons(&self) -> Result<Arc<IdMap>> {
        self.cached_map(&self.skeleton_map, KEY_SKELETON_MAP)
    }

    fn cached_map(&self, cache: &RwLock<Option<Arc<IdMap>>>, key: &str) -> Result<Arc<IdMap>> {
        if let Some(map) = cache.read().as_ref() {
            return Ok(Arc::clone(map));
        }

        let map = Arc::new(IdMap::from_rows(self.container()?.map_table(key)?));
        *cache.write() = Some(Arc::clone(&map));

        Ok(map)
    }

    /// Frame index of every instance-observation, non-decreasing.
    pub fn frame_axis(&self) -> Result<ArrayView1<'_, i64>> {
        self.container()?.dim_ticks(KEY_POSITION, 0)
    }

    /// Raw positions, shaped `(instances, 2, nodes)`.
    pub fn position_array(&self) -> Result<ArrayView3<'_, f32>> {
        self.container()?
            .array_f32(KEY_POSITION)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("position array is not 3-dimensional".into()))
    }

    /// Raw track id per instance-observation.
    pub fn track_id_array(&self) -> Result<ArrayView1<'_, u32>> {
        self.container()?
            .array_u32(KEY_TRACK)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("track array is not 1-dimensional".into()))
    }

    /// Raw skeleton id per instance-observation.
    pub fn skeleton_id_array(&self) -> Result<ArrayView1<'_, u32>> {
        self.container()?
            .array_u32(KEY_SKELETON)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("skeleton array is not 1-dimensional".into()))
    }

    /// Raw instance score per instance-observation. User-labeled instances
    /// score 0.
    pub fn instance_score_array(&self) -> Result<ArrayView1<'_, f32>> {
        self.container()?
            .array_f32(KEY_INSTANCE_SCORE)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("instance score array is not 1-dimensional".into()))
    }

    /// Raw node scores, shaped `(instances, nodes)`.
    pub fn node_score_array(&self) -> Result<ArrayView2<'_, f32>> {
        self.container()?
            .array_f32(KEY_NODE_SCORE)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("node score array is not 2-dimensional".into()))
    }

    /// Write-through view of the positions. Read-write mode only.
    pub fn position_array_mut(&mut self) -> Result<ArrayViewMut3<'_, f32>> {
        self.container_mut()?
            .array_f32_mut(KEY_POSITION)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("position array is not 3-dimensional".into()))
    }

    /// Write-through view of the track ids. Read-write mode only.
    pub fn track_id_array_mut(&mut self) -> Result<ArrayViewMut1<'_, u32>> {
        self.container_mut()?
            .array_u32_mut(KEY_TRACK)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("track array is not 1-dimensional".into()))
    }

    /// Write-through view of the skeleton ids. Read-write mode only.
    pub fn skeleton_id_array_mut(&mut self) -> Result<ArrayViewMut1<'_, u32>> {
        self.container_mut()?
            .array_u32_mut(KEY_SKELETON)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("skeleton array is not 1-dimensional".into()))
    }

    /// Write-through view of the instance scores. Read-write mode only.
    pub fn instance_score_array_mut(&mut self) -> Result<ArrayViewMut1<'_, f32>> {
        self.container_mut()?
            .array_f32_mut(KEY_INSTANCE_SCORE)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("instance score array is not 1-dimensional".into()))
    }

    /// Write-through view of the node scores. Read-write mode only.
    pub fn node_score_array_mut(&mut self) -> Result<ArrayViewMut2<'_, f32>> {
        self.container_mut()?
            .array_f32_mut(KEY_NODE_SCORE)?
            .into_dimensionality()
            .map_err(|_| Error::InvalidFormat("node score array is not 2-dimensional".into()))
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let location = self
            .path
            .parent()
            .map(|parent| parent.to_string_lossy())
            .unwrap_or_default();
        let size = fs::metadata(&self.path).map(|meta| meta.len()).unwrap_or(0);

        write!(
            f,
            "{name}\n\tlocation: {location}\n\tfile size {:.2} MB",
            size as f64 / 1e6
        )
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        self.close();
    }
}
