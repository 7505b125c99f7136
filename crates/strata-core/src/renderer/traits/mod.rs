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

//! Defines the core architectural traits of the graphics context.
//!
//! This module contains the contracts that decouple the context kernel from
//! its collaborators.
//!
//! - [`GraphicsDevice`]: allocates and accepts command batches.
//! - [`BufferStore`]: owns buffer memory and hands out mappings.
//! - [`PrimitiveAssembler`]: the downstream stage consuming mapped buffers.
//! - [`PrimitiveSink`]: receives assembled primitives from the assembler.
//! - [`RenderContext`]: the capability set a context implementation provides.

mod assembler;
mod buffer_store;
mod graphics_device;
mod render_context;

pub use self::assembler::{Primitive, PrimitiveAssembler, PrimitiveKind, PrimitiveSink};
pub use self::buffer_store::BufferStore;
pub use self::graphics_device::GraphicsDevice;
pub use self::render_context::RenderContext;
