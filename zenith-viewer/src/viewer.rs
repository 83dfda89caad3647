//! The viewer facade driven once per frame by the host application

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Instant;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zenith_algorithms::{DepthSampler, FrameInput, PickCandidate, PickResult, PickingResolver};
use zenith_core::{CameraTransform, Error, Point3f, Result};

use crate::camera::{CameraState, MouseButtons, ProjectionKind, RotationPolicy};
use crate::config::ViewerConfig;
use crate::layer::{DrawStyle, Layer, LayerSpec};

/// One draw call for the external renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub layer: u32,
    pub draw_style: DrawStyle,
    pub range: Range<usize>,
}

/// A successful pick, resolved back to its layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickReport {
    pub layer: u32,
    pub layer_name: String,
    pub record_index: usize,
    pub label: Option<String>,
    pub position: Point3f,
    pub distance: f32,
}

/// Owns the layers, the camera and the picking state of one window
///
/// The host runs, every frame: input forwarding (`handle_*`),
/// [`Viewer::advance_playback`], its own scene render from
/// [`Viewer::draw_list`], then [`Viewer::pick`] against the depth buffer it
/// just produced.
#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    camera: CameraState,
    resolver: PickingResolver,
    layers: BTreeMap<u32, Layer>,
    next_id: u32,
    last_pick: Option<PickReport>,
}

impl Viewer {
    pub fn new(config: ViewerConfig, projection: ProjectionKind) -> Result<Self> {
        config.validate()?;
        let rotation_policy = match projection {
            ProjectionKind::Orthographic => RotationPolicy::Fixed,
            ProjectionKind::Perspective => RotationPolicy::Orbit {
                speed: config.camera.rotate_speed,
            },
        };
        info!(?projection, "created viewer");
        Ok(Self {
            config,
            camera: CameraState::new(projection, rotation_policy, config.camera),
            resolver: PickingResolver::new(config.pick_threshold),
            layers: BTreeMap::new(),
            next_id: 1,
            last_pick: None,
        })
    }

    /// Orthographic viewer for x/y data
    pub fn planar(config: ViewerConfig) -> Result<Self> {
        Self::new(config, ProjectionKind::Orthographic)
    }

    /// Perspective viewer with orbit controls
    pub fn spatial(config: ViewerConfig) -> Result<Self> {
        Self::new(config, ProjectionKind::Perspective)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Validate and add a layer, returning its id
    pub fn add_layer(&mut self, spec: LayerSpec) -> Result<u32> {
        let id = self.next_id;
        let layer = Layer::build(id, spec, self.config.playback)?;
        self.next_id += 1;
        info!(id, layer = %layer.name(), records = layer.len(), "added layer");
        self.layers.insert(id, layer);
        Ok(id)
    }

    pub fn remove_layer(&mut self, id: u32) -> Result<Layer> {
        let layer = self.layers.remove(&id).ok_or(Error::UnknownLayer(id))?;
        if self.last_pick.as_ref().is_some_and(|p| p.layer == id) {
            self.last_pick = None;
        }
        debug!(id, "removed layer");
        Ok(layer)
    }

    pub fn contains_layer(&self, id: u32) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, id: u32) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer_mut(&mut self, id: u32) -> Option<&mut Layer> {
        self.layers.get_mut(&id)
    }

    /// Like [`Viewer::layer_mut`], but an unknown id is an error
    pub fn try_layer_mut(&mut self, id: u32) -> Result<&mut Layer> {
        self.layers.get_mut(&id).ok_or(Error::UnknownLayer(id))
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraState {
        &mut self.camera
    }

    pub fn handle_scroll(&mut self, delta: f32) {
        self.camera.scroll(delta);
    }

    pub fn handle_cursor(&mut self, frame: &FrameInput, buttons: MouseButtons) {
        self.camera.handle_cursor(frame, buttons);
    }

    /// Tick every animated layer. Returns how many of them advanced.
    pub fn advance_playback(&mut self, now: Instant) -> usize {
        self.layers
            .values_mut()
            .map(|layer| layer.tick(now))
            .filter(|&advanced| advanced)
            .count()
    }

    /// What the renderer should draw this frame, in layer order
    pub fn draw_list(&self) -> Vec<DrawCommand> {
        self.layers
            .values()
            .map(|layer| DrawCommand {
                layer: layer.id(),
                draw_style: layer.draw_style(),
                range: layer.visible_range(),
            })
            .collect()
    }

    pub fn camera_transform(&self, framebuffer: Vector2<f32>) -> CameraTransform {
        self.camera.transform(framebuffer)
    }

    /// Resolve the cursor against every pickable layer.
    ///
    /// Must run after the scene render so `depth` reads this frame's
    /// depth buffer.
    pub fn pick<D>(&mut self, frame: &FrameInput, depth: &D) -> Option<PickReport>
    where
        D: DepthSampler + ?Sized,
    {
        let transform = self.camera.transform(frame.framebuffer_size);
        let candidates: Vec<PickCandidate<'_>> = self
            .layers
            .values()
            .filter_map(Layer::pick_candidate)
            .collect();

        let report = match self.resolver.resolve(frame, &transform, depth, &candidates) {
            PickResult::Match(hit) => self.layers.get(&hit.dataset).map(|layer| PickReport {
                layer: hit.dataset,
                layer_name: layer.name().to_string(),
                record_index: hit.record_index,
                label: layer.label(hit.record_index).map(str::to_string),
                position: hit.position,
                distance: hit.distance,
            }),
            PickResult::NoMatch => None,
        };

        self.last_pick = report.clone();
        report
    }

    /// Point to highlight, or the no-match sentinel
    pub fn highlight(&self) -> Point3f {
        self.resolver.highlight()
    }

    pub fn last_pick(&self) -> Option<&PickReport> {
        self.last_pick.as_ref()
    }
}
