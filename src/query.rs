use log::debug;
use ndarray::{s, Array1, ArrayD, Axis};

use crate::{dataset::Dataset, errors::Result, geom, mapping::Selector};

/// Controls whether range bounds and the returned axis are expressed as
/// frame indices or as seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisType {
    #[default]
    Index,
    Time,
}

/// Filter set for one positional query.
///
/// The default query selects every observation of every node on the frame
/// index axis. Filters narrow it down:
///
/// ```
/// use trackstore::{AxisType, PositionQuery};
///
/// let query = PositionQuery::new()
///     .track("mother")
///     .node("snout")
///     .start(1.5)
///     .end(20.0)
///     .axis_type(AxisType::Time);
/// # let _ = query;
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionQuery {
    pub track: Option<Selector>,
    pub node: Option<Selector>,
    pub axis_start: Option<f64>,
    pub axis_end: Option<f64>,
    pub axis_type: AxisType,
}

impl PositionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only observations belonging to this track, by name or id.
    pub fn track<S: Into<Selector>>(mut self, track: S) -> Self {
        self.track = Some(track.into());
        self
    }

    /// Squeeze the result to a single node, by name or positional id.
    pub fn node<S: Into<Selector>>(mut self, node: S) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Inclusive lower bound on the selected axis. Omitted means "from the
    /// first observation".
    pub fn start(mut self, start: f64) -> Self {
        self.axis_start = Some(start);
        self
    }

    /// Exclusive upper bound on the selected axis. Omitted means "through
    /// the last observation".
    pub fn end(mut self, end: f64) -> Self {
        self.axis_end = Some(end);
        self
    }

    pub fn axis_type(mut self, axis_type: AxisType) -> Self {
        self.axis_type = axis_type;
        self
    }
}

/// Result of one positional query. All arrays share row indices.
///
/// `positions` is `(rows, 2)` when the query selected a single node and
/// `(rows, 2, nodes)` otherwise; `node_score` is `(rows,)` or
/// `(rows, nodes)` accordingly.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionData {
    pub positions: ArrayD<f32>,
    pub axis: Array1<f64>,
    pub instance_score: Array1<f32>,
    pub node_score: ArrayD<f32>,
}

impl PositionData {
    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }
}

impl Dataset {
    /// Query positions, optionally filtered by track, node and an axis
    /// window.
    ///
    /// Symbolic filters are validated first: an unknown track or node name
    /// or id fails with `Error::InvalidFilter` carrying the valid options.
    /// The axis window selects all observations whose frame index (or time,
    /// per `axis_type`) lies in `[axis_start, axis_end)`. Bounds outside
    /// the recorded axis, or a track filter matching nothing, yield empty
    /// result arrays rather than an error.
    pub fn positions(&self, query: &PositionQuery) -> Result<PositionData> {
        let track_id = match &query.track {
            Some(selector) => Some(selector.resolve(&*self.tracks()?, "track")?),
            None => None,
        };
        let node_id = match &query.node {
            Some(selector) => Some(selector.resolve_label(&self.nodes()?, "node")?),
            None => None,
        };

        let frames = self.frame_axis()?;
        let axis: Array1<f64> = match query.axis_type {
            AxisType::Index => frames.mapv(|frame| frame as f64),
            AxisType::Time => {
                let fps = self.fps()?;
                frames.mapv(|frame| frame as f64 / fps)
            }
        };

        let window = geom::search_window(axis.view(), query.axis_start, query.axis_end);
        debug!(
            "positions query selected rows {}..{} of {} (track {track_id:?}, node {node_id:?})",
            window.start,
            window.end,
            axis.len()
        );

        let position = self.position_array()?;
        let node_score = self.node_score_array()?;

        let mut axis = axis.slice(s![window.start..window.end]).to_owned();
        let mut instance_score = self
            .instance_score_array()?
            .slice(s![window.start..window.end])
            .to_owned();
        let (mut positions, mut node_score): (ArrayD<f32>, ArrayD<f32>) = match node_id {
            Some(node) => (
                position
                    .slice(s![window.start..window.end, .., node])
                    .to_owned()
                    .into_dyn(),
                node_score
                    .slice(s![window.start..window.end, node])
                    .to_owned()
                    .into_dyn(),
            ),
            None => (
                position
                    .slice(s![window.start..window.end, .., ..])
                    .to_owned()
                    .into_dyn(),
                node_score
                    .slice(s![window.start..window.end, ..])
                    .to_owned()
                    .into_dyn(),
            ),
        };

        if let Some(track_id) = track_id {
            let track_ids = self.track_id_array()?;
            let rows: Vec<usize> = track_ids
                .slice(s![window.start..window.end])
                .iter()
                .enumerate()
                .filter(|(_, &id)| id == track_id)
                .map(|(row, _)| row)
                .collect();

            positions = positions.select(Axis(0), &rows);
            node_score = node_score.select(Axis(0), &rows);
            axis = axis.select(Axis(0), &rows);
            instance_score = instance_score.select(Axis(0), &rows);
        }

        Ok(PositionData {
            positions,
            axis,
            instance_score,
            node_score,
        })
    }
}
