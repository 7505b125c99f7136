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

//! State descriptors accepted by the context's state-setting calls.

use super::enums::*;
use crate::strata_bitflags;
use std::sync::Arc;

/// The maximum number of samplers (and sampler views) a context can bind.
pub const MAX_SAMPLERS: usize = 8;

/// The maximum number of vertex elements the hardware vertex format describes.
pub const MAX_VERTEX_ELEMENTS: usize = 12;

/// The maximum number of vec4 user constants per shader stage.
pub const MAX_CONSTANTS: usize = 32;

/// The maximum size of a shader program in words.
pub const MAX_PROGRAM_WORDS: usize = 256;

/// Components per user constant. Constants are uploaded as vec4 of `f32`.
pub const CONSTANT_COMPONENTS: usize = 4;

/// One user constant.
pub type Constant = [f32; CONSTANT_COMPONENTS];

/// Returns the byte length of `count` user constants.
pub const fn constant_byte_len(count: usize) -> usize {
    count * CONSTANT_COMPONENTS * std::mem::size_of::<f32>()
}

/// Describes the state for primitive rasterization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerState {
    /// The face culling mode.
    pub cull_mode: CullMode,
    /// The vertex winding order that determines the "front" face of a triangle.
    pub front_face: FrontFace,
    /// The rasterization mode for polygons.
    pub polygon_mode: PolygonMode,
    /// If `true`, the provoking vertex's attributes are used for the whole primitive.
    pub flatshade: bool,
    /// If `true`, fragments outside the scissor rectangle are discarded.
    pub scissor_enabled: bool,
    /// The size of rasterized points in pixels.
    pub point_size: f32,
    /// The width of rasterized lines in pixels.
    pub line_width: f32,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::None,
            front_face: FrontFace::Ccw,
            polygon_mode: PolygonMode::Fill,
            flatshade: false,
            scissor_enabled: false,
            point_size: 1.0,
            line_width: 1.0,
        }
    }
}

/// Describes a blend equation for the color or alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// The blend factor for the source color.
    pub src_factor: BlendFactor,
    /// The blend factor for the destination color.
    pub dst_factor: BlendFactor,
    /// The operation combining both.
    pub operation: BlendOperation,
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
            operation: BlendOperation::Add,
        }
    }
}

strata_bitflags! {
    /// A bitmask that controls which color channels are written to a color target.
    pub struct ColorWrites: u8 {
        /// Enable writes to the red channel.
        const RED = 1 << 0;
        /// Enable writes to the green channel.
        const GREEN = 1 << 1;
        /// Enable writes to the blue channel.
        const BLUE = 1 << 2;
        /// Enable writes to the alpha channel.
        const ALPHA = 1 << 3;
    }
}

/// Describes color blending for the render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// If `false`, fragments replace the destination color.
    pub enabled: bool,
    /// The color channel equation.
    pub color: BlendComponent,
    /// The alpha channel equation.
    pub alpha: BlendComponent,
    /// The channels written to the color targets.
    pub write_mask: ColorWrites,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            color: BlendComponent::default(),
            alpha: BlendComponent::default(),
            write_mask: ColorWrites::ALL,
        }
    }
}

/// Describes the stencil test and operations for a single face of a primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    /// The comparison function used for the stencil test.
    pub compare: CompareFunction,
    /// The operation to perform if the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation to perform if the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation to perform if both the stencil and depth tests pass.
    pub depth_pass_op: StencilOperation,
}

/// Describes the state for depth and stencil testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// If `true`, fragments are depth tested.
    pub depth_test_enabled: bool,
    /// If `true`, depth values will be written to the depth buffer.
    pub depth_write_enabled: bool,
    /// The comparison function used for the depth test.
    pub depth_compare: CompareFunction,
    /// If `true`, fragments are stencil tested.
    pub stencil_enabled: bool,
    /// The stencil state for front-facing primitives.
    pub stencil_front: StencilFaceState,
    /// A bitmask for reading from the stencil buffer.
    pub stencil_read_mask: u8,
    /// A bitmask for writing to the stencil buffer.
    pub stencil_write_mask: u8,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test_enabled: false,
            depth_write_enabled: false,
            depth_compare: CompareFunction::Always,
            stencil_enabled: false,
            stencil_front: StencilFaceState::default(),
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
        }
    }
}

/// The viewport transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

/// A scissor rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScissorRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Describes how a texture unit samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SamplerState {
    /// Filter used when the texture is minified.
    pub min_filter: FilterMode,
    /// Filter used when the texture is magnified.
    pub mag_filter: FilterMode,
    /// Addressing along U.
    pub address_u: AddressMode,
    /// Addressing along V.
    pub address_v: AddressMode,
    /// Bias added to the computed level of detail.
    pub lod_bias: f32,
}

/// Describes one vertex attribute fetched from a vertex buffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    /// The vertex buffer slot the attribute is read from.
    pub slot: usize,
    /// The byte offset of the attribute within a vertex.
    pub offset: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
}

/// A compiled shader program for one stage.
///
/// The program is an opaque list of hardware instruction words. It is shared,
/// so binding the same program to several contexts does not copy it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderProgram {
    /// An optional debug label.
    pub label: Option<String>,
    /// The hardware instruction words.
    pub words: Arc<[u32]>,
    /// The number of interpolated inputs (fragment) or outputs (vertex) the program uses.
    pub num_varyings: u32,
}

impl ShaderProgram {
    /// Creates a program from its instruction words.
    pub fn new(label: Option<&str>, words: &[u32], num_varyings: u32) -> Self {
        Self {
            label: label.map(str::to_string),
            words: Arc::from(words),
            num_varyings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_byte_len_is_vec4_of_f32() {
        assert_eq!(constant_byte_len(0), 0);
        assert_eq!(constant_byte_len(3), 48);
        assert_eq!(
            constant_byte_len(MAX_CONSTANTS),
            std::mem::size_of::<[Constant; MAX_CONSTANTS]>()
        );
    }

    #[test]
    fn default_blend_writes_every_channel() {
        let blend = BlendState::default();
        assert!(!blend.enabled);
        assert!(blend.write_mask.contains(ColorWrites::RED | ColorWrites::ALPHA));
    }

    #[test]
    fn shader_program_shares_its_words() {
        let program = ShaderProgram::new(Some("passthrough"), &[1, 2, 3], 2);
        let copy = program.clone();
        assert!(Arc::ptr_eq(&program.words, &copy.words));
        assert_eq!(copy.label.as_deref(), Some("passthrough"));
    }
}
