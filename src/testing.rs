use std::path::Path;

use ndarray::{array, Array1, Array2, Array3, ArrayView1, ArrayViewD, ArrayViewMutD};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    container::{
        Container, FileMode, MapRow, Metadata, Section, Value, FORMAT_TRACKING,
        KEY_INSTANCE_SCORE, KEY_NODE_SCORE, KEY_POSITION, KEY_SKELETON, KEY_SKELETON_MAP,
        KEY_TRACK, KEY_TRACK_MAP, SECTION_TRACKING,
    },
    errors::{Error, Result},
};

/// A tracking container held entirely in memory, used as the container
/// implementation for the test suites.
pub(crate) struct MemoryContainer {
    mode: FileMode,
    sections: Vec<Section>,
    source_meta: Metadata,

    position: Array3<f32>,
    frame_axis: Array1<i64>,
    node_labels: Vec<String>,
    track_ids: Array1<u32>,
    skeleton_ids: Array1<u32>,
    instance_score: Array1<f32>,
    node_score: Array2<f32>,

    track_map: Vec<MapRow>,
    skeleton_map: Vec<MapRow>,

    // Simulates a container that lacks one schema-required key
    dropped_key: Option<&'static str>,
}

impl MemoryContainer {
    fn check_key(&self, name: &str) -> Result<()> {
        if self.dropped_key == Some(name) {
            return Err(Error::BadKey(name.to_string()));
        }

        Ok(())
    }
}

impl Container for MemoryContainer {
    fn open(_path: &Path, mode: FileMode) -> Result<Self> {
        let mut fixture = container();
        fixture.mode = mode;

        Ok(fixture)
    }

    fn mode(&self) -> FileMode {
        self.mode
    }

    fn find_section(&self, kind: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    fn source_metadata(&self) -> Result<&Metadata> {
        Ok(&self.source_meta)
    }

    fn array_f32(&self, name: &str) -> Result<ArrayViewD<'_, f32>> {
        self.check_key(name)?;

        match name {
            KEY_POSITION => Ok(self.position.view().into_dyn()),
            KEY_INSTANCE_SCORE => Ok(self.instance_score.view().into_dyn()),
            KEY_NODE_SCORE => Ok(self.node_score.view().into_dyn()),
            _ => Err(Error::BadKey(name.to_string())),
        }
    }

    fn array_u32(&self, name: &str) -> Result<ArrayViewD<'_, u32>> {
        self.check_key(name)?;

        match name {
            KEY_TRACK => Ok(self.track_ids.view().into_dyn()),
            KEY_SKELETON => Ok(self.skeleton_ids.view().into_dyn()),
            _ => Err(Error::BadKey(name.to_string())),
        }
    }

    fn array_f32_mut(&mut self, name: &str) -> Result<ArrayViewMutD<'_, f32>> {
        self.check_key(name)?;

        match name {
            KEY_POSITION => Ok(self.position.view_mut().into_dyn()),
            KEY_INSTANCE_SCORE => Ok(self.instance_score.view_mut().into_dyn()),
            KEY_NODE_SCORE => Ok(self.node_score.view_mut().into_dyn()),
            _ => Err(Error::BadKey(name.to_string())),
        }
    }

    fn array_u32_mut(&mut self, name: &str) -> Result<ArrayViewMutD<'_, u32>> {
        self.check_key(name)?;

        match name {
            KEY_TRACK => Ok(self.track_ids.view_mut().into_dyn()),
            KEY_SKELETON => Ok(self.skeleton_ids.view_mut().into_dyn()),
            _ => Err(Error::BadKey(name.to_string())),
        }
    }

    fn dim_ticks(&self, name: &str, axis: usize) -> Result<ArrayView1<'_, i64>> {
        match (name, axis) {
            (KEY_POSITION, 0) => Ok(self.frame_axis.view()),
            _ => Err(Error::BadKey(name.to_string())),
        }
    }

    fn dim_labels(&self, name: &str, axis: usize) -> Result<&[String]> {
        match (name, axis) {
            (KEY_POSITION, 2) => Ok(&self.node_labels),
            _ => Err(Error::BadKey(name.to_string())),
        }
    }

    fn map_table(&self, name: &str) -> Result<&[MapRow]> {
        self.check_key(name)?;

        match name {
            KEY_TRACK_MAP => Ok(&self.track_map),
            KEY_SKELETON_MAP => Ok(&self.skeleton_map),
            _ => Err(Error::BadKey(name.to_string())),
        }
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn tracking_section() -> Section {
    let mut section = Section::new(SECTION_TRACKING);
    section
        .props
        .insert("format".into(), Value::Str(FORMAT_TRACKING.into()));
    section.props.insert("version".into(), Value::Str("0.1".into()));

    section
}

fn video_metadata() -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("width".into(), Value::Int(1024));
    meta.insert("height".into(), Value::Int(768));
    meta.insert("frames".into(), Value::Int(100));
    meta.insert("fps".into(), Value::Float(10.0));
    meta.insert("filename".into(), Value::Str("test.mp4".into()));

    meta
}

/// The canonical fixture: five observations of two tracks across five
/// frames, three tracked nodes.
///
/// Frame axis `[0, 1, 2, 3, 4]`, fps 10, track ids `[0, 0, 1, 1, 0]`.
/// Position of node `n` in row `i` is `(100 i + 10 n, 100 i + 10 n + 1)`,
/// so every cell is distinct and row provenance is checkable after
/// slicing and masking.
pub(crate) fn container() -> MemoryContainer {
    let rows = 5;
    let nodes: Vec<String> = ["snout", "left ear", "right ear"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut position = Array3::zeros([rows, 2, nodes.len()]);
    let mut node_score = Array2::zeros([rows, nodes.len()]);
    for row in 0..rows {
        for node in 0..nodes.len() {
            let base = (100 * row + 10 * node) as f32;
            position[[row, 0, node]] = base;
            position[[row, 1, node]] = base + 1.0;
            node_score[[row, node]] = 1.0 - 0.1 * node as f32;
        }
    }

    MemoryContainer {
        mode: FileMode::ReadOnly,
        sections: vec![tracking_section()],
        source_meta: video_metadata(),
        position,
        frame_axis: array![0, 1, 2, 3, 4],
        node_labels: nodes,
        track_ids: array![0, 0, 1, 1, 0],
        skeleton_ids: array![0, 0, 0, 0, 0],
        // Row 0 is user-labeled, the rest are predictions
        instance_score: array![0.0, 0.9, 0.8, 0.85, 0.7],
        node_score,
        track_map: vec![MapRow::new("mother", 0), MapRow::new("pup", 1)],
        skeleton_map: vec![MapRow::new("mouse", 0)],
        dropped_key: None,
    }
}

/// Canonical fixture opened read-write.
pub(crate) fn container_rw() -> MemoryContainer {
    let mut fixture = container();
    fixture.mode = FileMode::ReadWrite;

    fixture
}

/// Canonical fixture with no tracking metadata section at all.
pub(crate) fn container_without_metadata() -> MemoryContainer {
    let mut fixture = container();
    fixture.sections.clear();

    fixture
}

/// Canonical fixture whose metadata section carries the wrong format marker.
pub(crate) fn container_bad_format() -> MemoryContainer {
    let mut fixture = container();
    fixture.sections[0]
        .props
        .insert("format".into(), Value::Str("something.else".into()));

    fixture
}

/// Canonical fixture whose metadata section has no schema version.
pub(crate) fn container_without_version() -> MemoryContainer {
    let mut fixture = container();
    fixture.sections[0].props.remove("version");

    fixture
}

/// Canonical fixture whose container has no instance score array.
pub(crate) fn container_missing_instance_score() -> MemoryContainer {
    let mut fixture = container();
    fixture.dropped_key = Some(KEY_INSTANCE_SCORE);

    fixture
}

/// A larger fixture with randomized positions, for tests that only care
/// about structural properties. Seeded, so runs are reproducible.
pub(crate) fn container_jittered() -> MemoryContainer {
    let mut fixture = container();
    let rows = 40;
    let nodes = fixture.node_labels.len();
    let mut rng = StdRng::seed_from_u64(42);

    fixture.position = Array3::zeros([rows, 2, nodes]);
    for cell in fixture.position.iter_mut() {
        *cell = rng.gen_range(0.0..1024.0);
    }

    fixture.node_score = Array2::zeros([rows, nodes]);
    for cell in fixture.node_score.iter_mut() {
        *cell = rng.gen_range(0.0..1.0);
    }

    fixture.instance_score = Array1::from_iter((0..rows).map(|_| rng.gen_range(0.0..1.0)));

    // Two observations share some frames, as when both animals are visible
    fixture.frame_axis = Array1::from_iter((0..rows).map(|row| (row / 2) as i64));
    fixture.track_ids = Array1::from_iter((0..rows).map(|row| (row % 2) as u32));
    fixture.skeleton_ids = Array1::zeros(rows);

    fixture
}
