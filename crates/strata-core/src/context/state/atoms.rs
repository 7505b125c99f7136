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

//! Built-in state atoms and the register layouts they produce.

use super::{CurrentState, DerivedState, DirtyState, HardwareDirty, StateAtom};
use crate::renderer::api::*;

/// Words in the immediate register block.
pub const IMMEDIATE_WORDS: usize = 4;

/// Context setup emitted at the start of every batch.
pub const INVARIANT_STATE: [u32; 3] = [
    // Texture coordinate set bindings, identity.
    0x0000_3210,
    // Line stipple disabled.
    0x0000_0000,
    // Default depth scale, 1.0.
    0x3f80_0000,
];

/// The atoms every context starts with, in resolution order.
pub fn builtin_atoms() -> Vec<Box<dyn StateAtom>> {
    vec![
        Box::new(VertexLayoutAtom),
        Box::new(ImmediateAtom),
        Box::new(DynamicAtom),
        Box::new(FramebufferAtom),
        Box::new(SamplersAtom),
        Box::new(ProgramAtom),
        Box::new(ConstantsAtom),
    ]
}

fn pack_u16(low: u32, high: u32) -> u32 {
    (low & 0xffff) | ((high & 0xffff) << 16)
}

fn pack_unorm8(color: [f32; 4]) -> u32 {
    color
        .iter()
        .enumerate()
        .map(|(i, c)| ((c.clamp(0.0, 1.0) * 255.0).round() as u32) << (i * 8))
        .fold(0, |word, channel| word | channel)
}

/// Vertex format word: element count, per-vertex floats and fragment inputs.
#[derive(Debug)]
struct VertexLayoutAtom;

impl StateAtom for VertexLayoutAtom {
    fn name(&self) -> &'static str {
        "vertex_layout"
    }

    fn dependencies(&self) -> DirtyState {
        DirtyState::VERTEX_SHADER
            | DirtyState::FRAGMENT_SHADER
            | DirtyState::RASTERIZER
            | DirtyState::VERTEX_ELEMENTS
    }

    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty {
        let elements = &current.vertex_elements;
        let vertex_size: usize = elements.iter().map(|e| e.format.components()).sum();
        let varyings = current
            .fragment_shader
            .as_ref()
            .map_or(0, |program| program.num_varyings);
        let point_size = u32::from(current.rasterizer.point_size != 1.0);

        derived.vertex_size = vertex_size;
        derived.immediate[0] = (elements.len() as u32 & 0xf)
            | ((vertex_size as u32 & 0xff) << 4)
            | ((varyings & 0xff) << 12)
            | (point_size << 20);
        HardwareDirty::IMMEDIATE
    }
}

/// Rasterizer, depth/stencil and blend registers.
#[derive(Debug)]
struct ImmediateAtom;

impl StateAtom for ImmediateAtom {
    fn name(&self) -> &'static str {
        "immediate"
    }

    fn dependencies(&self) -> DirtyState {
        DirtyState::RASTERIZER
            | DirtyState::BLEND
            | DirtyState::DEPTH_STENCIL
            | DirtyState::VERTEX_ELEMENTS
    }

    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty {
        let raster = &current.rasterizer;
        derived.immediate[1] = raster.cull_mode as u32
            | (raster.front_face as u32) << 2
            | (raster.polygon_mode as u32) << 3
            | u32::from(raster.flatshade) << 5
            | (((raster.line_width * 2.0) as u32 & 0xf) << 6)
            | (((raster.point_size as u32).min(0x1ff)) << 10);

        let ds = &current.depth_stencil;
        derived.immediate[2] = u32::from(ds.depth_test_enabled)
            | u32::from(ds.depth_write_enabled) << 1
            | (ds.depth_compare as u32) << 2
            | u32::from(ds.stencil_enabled) << 5
            | (ds.stencil_front.compare as u32) << 6
            | (ds.stencil_front.fail_op as u32) << 9
            | (ds.stencil_front.depth_fail_op as u32) << 12
            | (ds.stencil_front.depth_pass_op as u32) << 15
            | u32::from(ds.stencil_write_mask) << 18;

        let blend = &current.blend;
        derived.immediate[3] = u32::from(blend.enabled)
            | (blend.color.src_factor as u32) << 1
            | (blend.color.dst_factor as u32) << 4
            | (blend.color.operation as u32) << 7
            | (blend.alpha.src_factor as u32) << 10
            | (blend.alpha.dst_factor as u32) << 13
            | (blend.alpha.operation as u32) << 16
            | u32::from(blend.write_mask.bits()) << 19;

        HardwareDirty::IMMEDIATE
    }
}

/// Blend color, stencil reference and read mask, scissor and viewport.
///
/// The scissor's far edge saturates instead of wrapping.
#[derive(Debug)]
struct DynamicAtom;

impl StateAtom for DynamicAtom {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn dependencies(&self) -> DirtyState {
        DirtyState::BLEND_COLOR
            | DirtyState::STENCIL_REF
            | DirtyState::DEPTH_STENCIL
            | DirtyState::SCISSOR
            | DirtyState::VIEWPORT
            | DirtyState::RASTERIZER
    }

    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty {
        let ds = &current.depth_stencil;
        let scissor = &current.scissor;
        let viewport = &current.viewport;

        derived.dynamic = vec![
            pack_unorm8(current.blend_color),
            u32::from(current.stencil_ref) | u32::from(ds.stencil_read_mask) << 8,
            u32::from(current.rasterizer.scissor_enabled),
            pack_u16(scissor.x, scissor.y),
            pack_u16(
                scissor.x.saturating_add(scissor.width),
                scissor.y.saturating_add(scissor.height),
            ),
            viewport.x.to_bits(),
            viewport.y.to_bits(),
            viewport.width.to_bits(),
            viewport.height.to_bits(),
        ];
        HardwareDirty::DYNAMIC
    }
}

/// Render target description: one word of counts, the draw rectangle, then
/// `[id, pitch, format]` per attachment with the depth/stencil one last.
#[derive(Debug)]
struct FramebufferAtom;

impl StateAtom for FramebufferAtom {
    fn name(&self) -> &'static str {
        "framebuffer"
    }

    fn dependencies(&self) -> DirtyState {
        DirtyState::FRAMEBUFFER
    }

    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty {
        let fb = &current.framebuffer;
        let mut words = vec![
            fb.color_count() as u32 | u32::from(fb.depth_stencil().is_some()) << 8,
            pack_u16(fb.width(), fb.height()),
        ];
        for surface in fb.colors().chain(fb.depth_stencil()) {
            words.extend([surface.id.0 as u32, surface.pitch(), surface.format as u32]);
        }
        derived.static_state = words;
        HardwareDirty::STATIC
    }
}

/// Sampler registers and the texture maps of the sampler views.
#[derive(Debug)]
struct SamplersAtom;

impl StateAtom for SamplersAtom {
    fn name(&self) -> &'static str {
        "samplers"
    }

    fn dependencies(&self) -> DirtyState {
        DirtyState::SAMPLER | DirtyState::SAMPLER_VIEW
    }

    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty {
        let mut sampler = vec![current.samplers.len() as u32];
        for state in &current.samplers {
            sampler.push(
                state.min_filter as u32
                    | (state.mag_filter as u32) << 2
                    | (state.address_u as u32) << 4
                    | (state.address_v as u32) << 7,
            );
            sampler.push(state.lod_bias.to_bits());
        }

        let mut map = vec![current.sampler_views.len() as u32];
        for view in &current.sampler_views {
            map.extend([
                view.id.0 as u32,
                pack_u16(view.width, view.height),
                view.format as u32,
            ]);
        }

        derived.sampler = sampler;
        derived.map = map;
        HardwareDirty::SAMPLER | HardwareDirty::MAP
    }
}

/// The fragment program words, empty when no fragment shader is bound.
#[derive(Debug)]
struct ProgramAtom;

impl StateAtom for ProgramAtom {
    fn name(&self) -> &'static str {
        "program"
    }

    fn dependencies(&self) -> DirtyState {
        DirtyState::FRAGMENT_SHADER
    }

    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty {
        derived.program = current
            .fragment_shader
            .as_ref()
            .map(|program| program.words.to_vec())
            .unwrap_or_default();
        HardwareDirty::PROGRAM
    }
}

/// Fragment constants as raw float bits, preceded by their count.
#[derive(Debug)]
struct ConstantsAtom;

impl StateAtom for ConstantsAtom {
    fn name(&self) -> &'static str {
        "constants"
    }

    fn dependencies(&self) -> DirtyState {
        DirtyState::FRAGMENT_CONSTANTS | DirtyState::FRAGMENT_SHADER
    }

    fn update(&mut self, current: &CurrentState, derived: &mut DerivedState) -> HardwareDirty {
        let constants = current.constants(ShaderStage::Fragment);
        let mut words = Vec::with_capacity(1 + constants.len() * CONSTANT_COMPONENTS);
        words.push(constants.len() as u32);
        words.extend_from_slice(bytemuck::cast_slice(constants));
        derived.constants = words;
        HardwareDirty::CONSTANTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn run(atom: &mut dyn StateAtom, current: &CurrentState) -> (DerivedState, HardwareDirty) {
        let mut derived = DerivedState::default();
        let produced = atom.update(current, &mut derived);
        (derived, produced)
    }

    #[test]
    fn vertex_layout_counts_floats_per_vertex() {
        let mut current = CurrentState::default();
        current.vertex_elements = vec![
            VertexElement {
                slot: 0,
                offset: 0,
                format: VertexFormat::Float32x3,
            },
            VertexElement {
                slot: 0,
                offset: 12,
                format: VertexFormat::Unorm8x4,
            },
        ];
        current.fragment_shader = Some(ShaderProgram::new(None, &[1, 2], 3));

        let (derived, produced) = run(&mut VertexLayoutAtom, &current);
        assert_eq!(produced, HardwareDirty::IMMEDIATE);
        assert_eq!(derived.vertex_size, 7);
        assert_eq!(derived.immediate[0] & 0xf, 2);
        assert_eq!((derived.immediate[0] >> 12) & 0xff, 3);
    }

    #[test]
    fn framebuffer_describes_every_attachment() {
        let color = Surface::new(SurfaceId(3), TextureFormat::Bgra8Unorm, 64, 32);
        let depth = Surface::new(SurfaceId(4), TextureFormat::Depth16Unorm, 64, 32);
        let mut current = CurrentState::default();
        current.framebuffer =
            Framebuffer::new(64, 32, &[Arc::clone(&color)], Some(Arc::clone(&depth))).unwrap();

        let (derived, produced) = run(&mut FramebufferAtom, &current);
        assert_eq!(produced, HardwareDirty::STATIC);
        assert_eq!(derived.static_state[0], 1 | 1 << 8);
        assert_eq!(derived.static_state[1], 64 | 32 << 16);
        assert_eq!(&derived.static_state[2..5], &[3, 256, TextureFormat::Bgra8Unorm as u32]);
        assert_eq!(derived.static_state[5], 4);
    }

    #[test]
    fn constants_carry_float_bits() {
        let mut current = CurrentState::default();
        current.constants[ShaderStage::Fragment.index()] = vec![[0.5, 1.0, 0.0, -1.0]];

        let (derived, _) = run(&mut ConstantsAtom, &current);
        assert_eq!(derived.constants.len(), 5);
        assert_eq!(derived.constants[0], 1);
        assert_relative_eq!(f32::from_bits(derived.constants[1]), 0.5);
        assert_relative_eq!(f32::from_bits(derived.constants[4]), -1.0);
    }

    #[test]
    fn dynamic_registers_carry_the_stencil_mask_and_viewport() {
        let mut current = CurrentState::default();
        current.stencil_ref = 0x12;
        current.depth_stencil.stencil_read_mask = 0x0f;
        current.viewport = Viewport {
            x: 0.0,
            y: 0.0,
            width: 320.5,
            height: 240.0,
        };

        let (derived, produced) = run(&mut DynamicAtom, &current);
        assert_eq!(produced, HardwareDirty::DYNAMIC);
        assert_eq!(derived.dynamic[1], 0x12 | 0x0f << 8);
        assert_relative_eq!(f32::from_bits(derived.dynamic[7]), 320.5);
        assert!(DynamicAtom.dependencies().contains(DirtyState::DEPTH_STENCIL));
    }

    #[test]
    fn scissor_far_edge_saturates() {
        let mut current = CurrentState::default();
        current.scissor = ScissorRect {
            x: 0xfff0,
            y: 8,
            width: u32::MAX,
            height: 16,
        };

        let (derived, _) = run(&mut DynamicAtom, &current);
        assert_eq!(derived.dynamic[4], pack_u16(u32::MAX, 24));
    }

    #[test]
    fn missing_fragment_shader_yields_an_empty_program() {
        let (derived, produced) = run(&mut ProgramAtom, &CurrentState::default());
        assert_eq!(produced, HardwareDirty::PROGRAM);
        assert!(derived.program.is_empty());
    }

    #[test]
    fn blend_color_is_packed_as_unorm8() {
        assert_eq!(pack_unorm8([1.0, 0.0, 0.0, 1.0]), 0xff00_00ff);
        assert_eq!(pack_unorm8([2.0, -1.0, 0.5, 0.0]), 0x0080_00ff);
    }
}
