//! Datasets shown by the viewer

use std::fmt;
use std::ops::Range;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zenith_algorithms::{PickCandidate, RTreeIndex, TemporalWindow, WindowIndex};
use zenith_core::{planar_positions, split_columns, Error, NearestNeighborSearch, Point3f, Result, TimedPoint};

use crate::config::PlaybackConfig;
use crate::playback::{PlaybackController, PlaybackCursor};

/// Primitive assembly used by the renderer for a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawStyle {
    #[default]
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    Polygon,
}

impl DrawStyle {
    pub const ALL: [DrawStyle; 10] = [
        DrawStyle::Points,
        DrawStyle::Lines,
        DrawStyle::LineLoop,
        DrawStyle::LineStrip,
        DrawStyle::Triangles,
        DrawStyle::TriangleStrip,
        DrawStyle::TriangleFan,
        DrawStyle::Quads,
        DrawStyle::QuadStrip,
        DrawStyle::Polygon,
    ];

    /// Map a raw primitive code; unknown codes fall back to points
    pub fn from_raw(raw: u32) -> Self {
        match Self::ALL.get(raw as usize) {
            Some(&style) => style,
            None => {
                warn!(raw, "unknown draw style, defaulting to points");
                DrawStyle::Points
            }
        }
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            DrawStyle::Points => "GL_POINTS",
            DrawStyle::Lines => "GL_LINES",
            DrawStyle::LineLoop => "GL_LINE_LOOP",
            DrawStyle::LineStrip => "GL_LINE_STRIP",
            DrawStyle::Triangles => "GL_TRIANGLES",
            DrawStyle::TriangleStrip => "GL_TRIANGLE_STRIP",
            DrawStyle::TriangleFan => "GL_TRIANGLE_FAN",
            DrawStyle::Quads => "GL_QUADS",
            DrawStyle::QuadStrip => "GL_QUAD_STRIP",
            DrawStyle::Polygon => "GL_POLYGON",
        }
    }
}

impl fmt::Display for DrawStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timing of an animated layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// One non-decreasing timestamp per position
    pub timestamps: Vec<i64>,
    pub step_size: i64,
    pub window_size: i64,
}

/// Description of a dataset to add to the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub draw_style: DrawStyle,
    pub positions: Vec<Point3f>,
    pub animation: Option<Animation>,
    /// Optional text shown for a picked record, one per position
    pub labels: Vec<String>,
    pub picking: bool,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, positions: Vec<Point3f>) -> Self {
        Self {
            name: name.into(),
            draw_style: DrawStyle::Points,
            positions,
            animation: None,
            labels: Vec::new(),
            picking: false,
        }
    }

    /// A layer of x/y data placed on the `z = 1` plane
    pub fn planar(name: impl Into<String>, xs: &[f32], ys: &[f32]) -> Result<Self> {
        let positions = planar_positions(xs, ys).ok_or_else(|| {
            Error::InvalidData(format!(
                "x and y must have the same length ({} != {})",
                xs.len(),
                ys.len()
            ))
        })?;
        Ok(Self::new(name, positions))
    }

    /// An animated layer from timed records
    pub fn timed(name: impl Into<String>, points: &[TimedPoint], step_size: i64, window_size: i64) -> Self {
        let (positions, timestamps) = split_columns(points);
        Self::new(name, positions).with_animation(timestamps, step_size, window_size)
    }

    pub fn with_draw_style(mut self, draw_style: DrawStyle) -> Self {
        self.draw_style = draw_style;
        self
    }

    pub fn with_animation(mut self, timestamps: Vec<i64>, step_size: i64, window_size: i64) -> Self {
        self.animation = Some(Animation {
            timestamps,
            step_size,
            window_size,
        });
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_picking(mut self, picking: bool) -> Self {
        self.picking = picking;
        self
    }
}

/// Animation state owned by an animated layer
#[derive(Debug, Clone)]
struct Playback {
    window: TemporalWindow,
    controller: PlaybackController,
}

/// One dataset: its records plus the windowing and picking state built for them
pub struct Layer {
    id: u32,
    name: String,
    draw_style: DrawStyle,
    positions: Vec<Point3f>,
    labels: Vec<String>,
    playback: Option<Playback>,
    picking: bool,
    index: Option<Box<dyn NearestNeighborSearch>>,
}

impl Layer {
    /// Validate a spec and build the layer's windowing and spatial index
    pub fn build(id: u32, spec: LayerSpec, playback_config: PlaybackConfig) -> Result<Self> {
        let LayerSpec {
            name,
            draw_style,
            positions,
            animation,
            mut labels,
            picking,
        } = spec;

        if name.trim().is_empty() {
            return Err(Error::InvalidData("layer name must be a non-empty string".to_string()));
        }

        let playback = match animation {
            Some(animation) => {
                if animation.timestamps.len() != positions.len() {
                    return Err(Error::InvalidData(format!(
                        "layer '{}' has {} positions but {} timestamps",
                        name,
                        positions.len(),
                        animation.timestamps.len()
                    )));
                }
                let index = WindowIndex::new(&animation.timestamps, animation.step_size, animation.window_size)?;
                Some(Playback {
                    window: TemporalWindow::new(index),
                    controller: PlaybackController::new(playback_config)?,
                })
            }
            None => None,
        };

        if !labels.is_empty() && labels.len() != positions.len() {
            warn!(
                layer = %name,
                labels = labels.len(),
                records = positions.len(),
                "dropping labels that do not match the record count"
            );
            labels.clear();
        }

        let index: Option<Box<dyn NearestNeighborSearch>> = if picking {
            match RTreeIndex::new(&positions) {
                Ok(index) => Some(Box::new(index)),
                Err(err) => {
                    warn!(layer = %name, error = %err, "picking disabled for layer");
                    None
                }
            }
        } else {
            None
        };

        debug!(
            id,
            layer = %name,
            records = positions.len(),
            animated = playback.is_some(),
            pickable = index.is_some(),
            "built layer"
        );

        Ok(Self {
            id,
            name,
            draw_style,
            positions,
            labels,
            playback,
            picking,
            index,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn draw_style(&self) -> DrawStyle {
        self.draw_style
    }

    pub fn positions(&self) -> &[Point3f] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Label of a record, if the layer carries labels
    pub fn label(&self, record_index: usize) -> Option<&str> {
        self.labels.get(record_index).map(String::as_str)
    }

    pub fn is_animated(&self) -> bool {
        self.playback.is_some()
    }

    /// Whether picking was requested for this layer
    pub fn picking_enabled(&self) -> bool {
        self.picking
    }

    /// Whether this layer can actually produce picks
    pub fn is_pickable(&self) -> bool {
        self.index.is_some()
    }

    pub fn window(&self) -> Option<&TemporalWindow> {
        self.playback.as_ref().map(|p| &p.window)
    }

    /// Record range to draw this frame; every record for static layers
    pub fn visible_range(&self) -> Range<usize> {
        match &self.playback {
            Some(playback) => playback.window.visible_range(),
            None => 0..self.positions.len(),
        }
    }

    /// Positions of a record range as raw bytes for vertex upload
    pub fn vertex_bytes(&self, range: Range<usize>) -> &[u8] {
        let end = range.end.min(self.positions.len());
        let start = range.start.min(end);
        bytemuck::cast_slice(&self.positions[start..end])
    }

    pub fn playback_cursor(&self) -> Option<PlaybackCursor> {
        self.playback
            .as_ref()
            .map(|p| p.controller.cursor(&p.window))
    }

    pub fn toggle_playback(&mut self) {
        if let Some(playback) = &mut self.playback {
            playback.controller.toggle();
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        if let Some(playback) = &mut self.playback {
            playback.controller.set_paused(paused);
        }
    }

    pub fn set_fps(&mut self, fps: f32) {
        if let Some(playback) = &mut self.playback {
            playback.controller.set_fps(fps);
        }
    }

    pub fn set_current_step(&mut self, step: usize) {
        if let Some(playback) = &mut self.playback {
            playback.window.set_current_step(step);
        }
    }

    pub fn set_window_steps(&mut self, steps: usize) {
        if let Some(playback) = &mut self.playback {
            playback.window.set_window_steps(steps);
        }
    }

    /// Run the playback gate for this frame. Returns `true` if the window advanced.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &mut self.playback {
            Some(playback) => playback.controller.tick(&mut playback.window, now),
            None => false,
        }
    }

    /// This layer as a picking candidate, if it can be picked
    pub fn pick_candidate(&self) -> Option<PickCandidate<'_>> {
        let index = self.index.as_deref()?;
        Some(PickCandidate {
            dataset: self.id,
            index,
            positions: &self.positions,
            visible: self.visible_range(),
        })
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("draw_style", &self.draw_style)
            .field("records", &self.positions.len())
            .field("animated", &self.is_animated())
            .field("pickable", &self.is_pickable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Point3f> {
        (0..n).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_draw_style_codes() {
        for (raw, style) in DrawStyle::ALL.iter().enumerate() {
            assert_eq!(DrawStyle::from_raw(raw as u32), *style);
            assert_eq!(style.as_raw(), raw as u32);
        }
        assert_eq!(DrawStyle::from_raw(42), DrawStyle::Points);
        assert_eq!(DrawStyle::LineLoop.to_string(), "GL_LINE_LOOP");
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = Layer::build(1, LayerSpec::new("  ", line(3)), PlaybackConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_planar_spec_rejects_mismatched_columns() {
        assert!(matches!(
            LayerSpec::planar("xy", &[1.0, 2.0], &[1.0]),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_animated_layer_validation() {
        let spec = LayerSpec::new("anim", line(4)).with_animation(vec![0, 1, 2], 1, 1);
        assert!(matches!(
            Layer::build(1, spec, PlaybackConfig::default()),
            Err(Error::InvalidData(_))
        ));

        let spec = LayerSpec::new("anim", line(3)).with_animation(vec![0, 1, 2], 1, -5);
        assert!(matches!(
            Layer::build(1, spec, PlaybackConfig::default()),
            Err(Error::InvalidWindowConfig(_))
        ));

        let spec = LayerSpec::new("anim", Vec::new()).with_animation(Vec::new(), 1, 1);
        assert!(matches!(
            Layer::build(1, spec, PlaybackConfig::default()),
            Err(Error::InvalidWindowConfig(_))
        ));
    }

    #[test]
    fn test_animated_layer_rejects_bad_fps_range() {
        let config = PlaybackConfig {
            fps_min: 10.0,
            fps_max: 1.0,
            default_fps: 5.0,
        };
        let spec = LayerSpec::new("anim", line(3)).with_animation(vec![0, 1, 2], 1, 1);
        assert!(matches!(
            Layer::build(1, spec, config),
            Err(Error::InvalidConfig(_))
        ));
        assert_eq!(DrawStyle::default(), DrawStyle::Points);
    }

    #[test]
    fn test_mismatched_labels_are_dropped() {
        let spec = LayerSpec::new("labels", line(3)).with_labels(["a", "b"]);
        let layer = Layer::build(1, spec, PlaybackConfig::default()).unwrap();
        assert_eq!(layer.label(0), None);

        let spec = LayerSpec::new("labels", line(2)).with_labels(["a", "b"]);
        let layer = Layer::build(1, spec, PlaybackConfig::default()).unwrap();
        assert_eq!(layer.label(1), Some("b"));
    }

    #[test]
    fn test_empty_pickable_layer_stays_drawable() {
        let spec = LayerSpec::new("empty", Vec::new()).with_picking(true);
        let layer = Layer::build(1, spec, PlaybackConfig::default()).unwrap();
        assert!(layer.picking_enabled());
        assert!(!layer.is_pickable());
        assert!(layer.pick_candidate().is_none());
        assert_eq!(layer.visible_range(), 0..0);
    }

    #[test]
    fn test_static_layer_draws_everything() {
        let layer = Layer::build(1, LayerSpec::new("static", line(5)), PlaybackConfig::default()).unwrap();
        assert!(!layer.is_animated());
        assert_eq!(layer.visible_range(), 0..5);
        assert!(layer.playback_cursor().is_none());
        assert!(!layer.is_pickable());
    }

    #[test]
    fn test_vertex_bytes_cover_range() {
        let layer = Layer::build(1, LayerSpec::new("bytes", line(5)), PlaybackConfig::default()).unwrap();
        assert_eq!(layer.vertex_bytes(1..3).len(), 2 * 3 * std::mem::size_of::<f32>());
        assert_eq!(layer.vertex_bytes(4..10).len(), 3 * std::mem::size_of::<f32>());
        let floats: &[f32] = bytemuck::cast_slice(layer.vertex_bytes(2..3));
        assert_eq!(floats, &[2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scrub_controls() {
        let timestamps: Vec<i64> = (0..10).collect();
        let spec = LayerSpec::new("anim", line(10)).with_animation(timestamps, 1, 1);
        let mut layer = Layer::build(1, spec, PlaybackConfig::default()).unwrap();

        layer.set_current_step(3);
        layer.set_window_steps(2);
        layer.set_fps(500.0);
        layer.toggle_playback();
        let cursor = layer.playback_cursor().unwrap();
        assert_eq!(cursor.current_step, 3);
        assert_eq!(cursor.window_steps, 2);
        assert_eq!(cursor.fps, 200.0);
        assert!(!cursor.paused);

        layer.set_paused(true);
        assert!(!layer.tick(Instant::now()));
        assert_eq!(layer.visible_range(), 3..6);
    }
}
