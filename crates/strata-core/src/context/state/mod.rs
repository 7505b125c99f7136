// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Dirty-state tracking and lazy resolution into hardware register images.
//!
//! Every state-setting call mutates the [`CurrentState`] through the tracker
//! and marks the matching [`DirtyState`] group. Before a draw the tracker runs
//! each [`StateAtom`] whose dependencies are dirty; atoms rebuild the
//! [`DerivedState`] and report which [`HardwareDirty`] groups must be
//! re-emitted into the batch.

mod atoms;
mod emit;

pub use self::atoms::{builtin_atoms, IMMEDIATE_WORDS, INVARIANT_STATE};

use crate::renderer::api::*;
use crate::strata_bitflags;
use std::fmt::Debug;
use std::sync::Arc;

strata_bitflags! {
    /// Pipeline state groups changed since the last resolution.
    pub struct DirtyState: u32 {
        /// Rasterizer state.
        const RASTERIZER = 1 << 0;
        /// Blend state.
        const BLEND = 1 << 1;
        /// Blend constant color.
        const BLEND_COLOR = 1 << 2;
        /// Depth and stencil state.
        const DEPTH_STENCIL = 1 << 3;
        /// Stencil reference value.
        const STENCIL_REF = 1 << 4;
        /// Viewport transform.
        const VIEWPORT = 1 << 5;
        /// Scissor rectangle.
        const SCISSOR = 1 << 6;
        /// Sampler states.
        const SAMPLER = 1 << 7;
        /// Sampler views.
        const SAMPLER_VIEW = 1 << 8;
        /// Vertex shader.
        const VERTEX_SHADER = 1 << 9;
        /// Fragment shader.
        const FRAGMENT_SHADER = 1 << 10;
        /// Vertex stage user constants.
        const VERTEX_CONSTANTS = 1 << 11;
        /// Fragment stage user constants.
        const FRAGMENT_CONSTANTS = 1 << 12;
        /// Framebuffer attachments.
        const FRAMEBUFFER = 1 << 13;
        /// Vertex buffer bindings.
        const VERTEX_BUFFERS = 1 << 14;
        /// Index buffer binding.
        const INDEX_BUFFER = 1 << 15;
        /// Vertex element layout.
        const VERTEX_ELEMENTS = 1 << 16;
    }
}

strata_bitflags! {
    /// Hardware packet groups that must be re-emitted before the next primitive.
    pub struct HardwareDirty: u32 {
        /// Context setup that never changes.
        const INVARIANT = 1 << 0;
        /// Immediate state registers.
        const IMMEDIATE = 1 << 1;
        /// Dynamic state registers.
        const DYNAMIC = 1 << 2;
        /// Render target description.
        const STATIC = 1 << 3;
        /// Sampler registers.
        const SAMPLER = 1 << 4;
        /// Texture maps.
        const MAP = 1 << 5;
        /// Fragment program.
        const PROGRAM = 1 << 6;
        /// Fragment constants.
        const CONSTANTS = 1 << 7;
    }
}

/// The state bound through the context's setters.
#[derive(Debug, Clone, Default)]
pub struct CurrentState {
    /// Rasterizer state.
    pub rasterizer: RasterizerState,
    /// Blend state.
    pub blend: BlendState,
    /// Blend constant color.
    pub blend_color: [f32; 4],
    /// Depth and stencil state.
    pub depth_stencil: DepthStencilState,
    /// Stencil reference value.
    pub stencil_ref: u8,
    /// Viewport transform.
    pub viewport: Viewport,
    /// Scissor rectangle, used when the rasterizer enables scissoring.
    pub scissor: ScissorRect,
    /// Bound sampler states, at most [`MAX_SAMPLERS`].
    pub samplers: Vec<SamplerState>,
    /// Bound sampler views, at most [`MAX_SAMPLERS`].
    pub sampler_views: Vec<Arc<Surface>>,
    /// Vertex shader.
    pub vertex_shader: Option<ShaderProgram>,
    /// Fragment shader.
    pub fragment_shader: Option<ShaderProgram>,
    /// User constants indexed by [`ShaderStage::index`].
    pub constants: [Vec<Constant>; 2],
    /// Render targets.
    pub framebuffer: Framebuffer,
    /// Vertex buffer bindings, one per slot.
    pub vertex_buffers: Vec<VertexBufferBinding>,
    /// Index buffer binding.
    pub index_buffer: Option<IndexBufferBinding>,
    /// Vertex element layout.
    pub vertex_elements: Vec<VertexElement>,
}

impl CurrentState {
    /// The user constants of `stage`.
    pub fn constants(&self, stage: ShaderStage) -> &[Constant] {
        &self.constants[stage.index()]
    }
}

/// Hardware register images computed from the [`CurrentState`].
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedState {
    /// Floats per vertex implied by the vertex element layout.
    pub vertex_size: usize,
    /// Immediate registers; word 0 is owned by the vertex layout.
    pub immediate: [u32; IMMEDIATE_WORDS],
    /// Dynamic registers.
    pub dynamic: Vec<u32>,
    /// Render target description.
    pub static_state: Vec<u32>,
    /// Sampler registers.
    pub sampler: Vec<u32>,
    /// Texture map descriptions.
    pub map: Vec<u32>,
    /// Fragment program words.
    pub program: Vec<u32>,
    /// Fragment constants.
    pub constants: Vec<u32>,
}

impl Default for DerivedState {
    fn default() -> Self {
        Self {
            vertex_size: 0,
            immediate: [0; IMMEDIATE_WORDS],
            dynamic: Vec::new(),
            static_state: Vec::new(),
            sampler: Vec::new(),
            map: Vec::new(),
            program: Vec::new(),
            constants: Vec::new(),
        }
    }
}

/// One update routine of the state cache.
pub trait StateAtom: Debug {
    /// A short name used in logs.
    fn name(&self) -> &'static str;

    /// The dirty groups that trigger this atom.
    fn dependencies(&self) -> DirtyState;

    /// Recomputes derived state and returns the hardware groups it changed.
    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty;
}

/// The context-local pipeline state cache.
#[derive(Debug)]
pub struct StateTracker {
    current: CurrentState,
    derived: DerivedState,
    dirty: DirtyState,
    hardware_dirty: HardwareDirty,
    atoms: Vec<Box<dyn StateAtom>>,
    resolutions: u64,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    /// Creates a tracker with the built-in atoms and every group dirty.
    pub fn new() -> Self {
        Self {
            current: CurrentState::default(),
            derived: DerivedState::default(),
            dirty: DirtyState::ALL,
            hardware_dirty: HardwareDirty::ALL,
            atoms: builtin_atoms(),
            resolutions: 0,
        }
    }

    /// The bound state.
    pub fn current(&self) -> &CurrentState {
        &self.current
    }

    /// The last resolved register images.
    pub fn derived(&self) -> &DerivedState {
        &self.derived
    }

    /// Groups awaiting resolution.
    pub fn dirty(&self) -> DirtyState {
        self.dirty
    }

    /// Hardware groups awaiting emission.
    pub fn hardware_dirty(&self) -> HardwareDirty {
        self.hardware_dirty
    }

    /// The number of resolutions that found dirty state.
    pub fn resolutions(&self) -> u64 {
        self.resolutions
    }

    /// Marks `groups` as changed.
    pub fn mark_dirty(&mut self, groups: DirtyState) {
        self.dirty.insert(groups);
    }

    /// Applies `change` to the bound state and marks `groups` as changed.
    pub fn modify<R>(&mut self, groups: DirtyState, change: impl FnOnce(&mut CurrentState) -> R) -> R {
        let result = change(&mut self.current);
        self.mark_dirty(groups);
        result
    }

    /// Adds an atom after the built-in ones.
    pub fn register_atom(&mut self, atom: Box<dyn StateAtom>) {
        log::debug!("Registered state atom '{}'", atom.name());
        self.atoms.push(atom);
    }

    /// Runs every atom whose dependencies are dirty, each at most once.
    ///
    /// Returns `false` without doing anything when no group is dirty.
    pub fn resolve_if_dirty(&mut self) -> bool {
        if self.dirty.is_empty() {
            return false;
        }

        let pending = self.dirty;
        for atom in self.atoms.iter_mut() {
            let dependencies = atom.dependencies();
            if !pending.intersects(dependencies) {
                continue;
            }
            let produced = atom.update(&self.current, &mut self.derived);
            log::trace!("State atom '{}' produced {:?}", atom.name(), produced);
            self.hardware_dirty.insert(produced);
            self.dirty.remove(dependencies);
        }

        // Groups consumed directly by draw dispatch have no atom.
        self.dirty = DirtyState::EMPTY;
        self.resolutions += 1;
        log::debug!(
            "Resolved {:?}, hardware dirty {:?}",
            pending,
            self.hardware_dirty
        );
        true
    }

    /// Forces every hardware group to be emitted again, as after a flush.
    pub fn invalidate_hardware(&mut self) {
        self.hardware_dirty = HardwareDirty::ALL;
    }

    /// Drops every surface reference held by the bound state.
    pub(crate) fn release_surfaces(&mut self) {
        self.current.framebuffer.release();
        self.current.sampler_views.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct CountingAtom {
        dependencies: DirtyState,
        runs: Arc<Mutex<u32>>,
    }

    impl StateAtom for CountingAtom {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn dependencies(&self) -> DirtyState {
            self.dependencies
        }

        fn update(&mut self, _: &CurrentState, _: &mut DerivedState) -> HardwareDirty {
            *self.runs.lock().unwrap() += 1;
            HardwareDirty::EMPTY
        }
    }

    fn resolved_tracker() -> StateTracker {
        let mut tracker = StateTracker::new();
        tracker.resolve_if_dirty();
        tracker
    }

    #[test]
    fn new_tracker_is_fully_dirty() {
        let tracker = StateTracker::new();
        assert_eq!(tracker.dirty(), DirtyState::ALL);
        assert_eq!(tracker.hardware_dirty(), HardwareDirty::ALL);
    }

    #[test]
    fn resolution_clears_dirty_and_is_idempotent() {
        let mut tracker = resolved_tracker();
        assert!(tracker.dirty().is_empty());
        assert_eq!(tracker.resolutions(), 1);
        assert!(!tracker.resolve_if_dirty());
        assert_eq!(tracker.resolutions(), 1);
    }

    #[test]
    fn atom_runs_once_when_several_of_its_groups_are_dirty() {
        let runs = Arc::new(Mutex::new(0));
        let mut tracker = resolved_tracker();
        tracker.register_atom(Box::new(CountingAtom {
            dependencies: DirtyState::BLEND | DirtyState::VIEWPORT | DirtyState::SCISSOR,
            runs: runs.clone(),
        }));

        tracker.mark_dirty(DirtyState::BLEND);
        tracker.mark_dirty(DirtyState::VIEWPORT | DirtyState::SCISSOR);
        assert!(tracker.resolve_if_dirty());
        assert_eq!(*runs.lock().unwrap(), 1);

        tracker.mark_dirty(DirtyState::FRAMEBUFFER);
        tracker.resolve_if_dirty();
        assert_eq!(*runs.lock().unwrap(), 1);
    }

    #[test]
    fn modify_marks_the_group() {
        let mut tracker = resolved_tracker();
        tracker.modify(DirtyState::STENCIL_REF, |state| state.stencil_ref = 7);
        assert_eq!(tracker.current().stencil_ref, 7);
        assert_eq!(tracker.dirty(), DirtyState::STENCIL_REF);
    }

    #[test]
    fn blend_change_only_dirties_immediate_registers() {
        let mut tracker = resolved_tracker();
        tracker.hardware_dirty = HardwareDirty::EMPTY;
        tracker.modify(DirtyState::BLEND, |state| state.blend.enabled = true);
        tracker.resolve_if_dirty();
        assert_eq!(tracker.hardware_dirty(), HardwareDirty::IMMEDIATE);
    }

    #[test]
    fn depth_stencil_change_refreshes_the_stencil_read_mask() {
        let mut tracker = resolved_tracker();
        tracker.hardware_dirty = HardwareDirty::EMPTY;
        tracker.modify(DirtyState::DEPTH_STENCIL, |state| {
            state.depth_stencil.stencil_read_mask = 0x0f
        });
        tracker.resolve_if_dirty();

        assert!(tracker.hardware_dirty().contains(HardwareDirty::DYNAMIC));
        assert_eq!((tracker.derived().dynamic[1] >> 8) & 0xff, 0x0f);
    }

    #[test]
    fn release_surfaces_drops_views_and_attachments() {
        let surface = Surface::new(SurfaceId(1), TextureFormat::Rgba8Unorm, 4, 4);
        let mut tracker = StateTracker::new();
        tracker.modify(DirtyState::SAMPLER_VIEW, |state| {
            state.sampler_views.push(surface.clone())
        });
        tracker.modify(DirtyState::FRAMEBUFFER, |state| {
            state.framebuffer = Framebuffer::new(4, 4, &[surface.clone()], None).unwrap();
        });
        assert_eq!(Arc::strong_count(&surface), 3);

        tracker.release_surfaces();
        assert_eq!(Arc::strong_count(&surface), 1);
    }
}
