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

//! Provides the public, backend-agnostic contracts of the graphics context.
//!
//! This module defines the "common language" shared by the context kernel and
//! its collaborators. It contains the abstract `traits` (like [`GraphicsDevice`]
//! and [`PrimitiveAssembler`]), value types (like [`DrawInfo`] and
//! [`Framebuffer`]) and the error types that form the stable, public-facing API.
//!
//! The 'how' is handled by concrete implementations in the `strata-infra`
//! crate (a software device, a host-memory buffer store and a reference
//! primitive assembler) which implement these traits.

pub mod api;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{RenderError, ResourceError, StateError};
pub use self::traits::{
    BufferStore, GraphicsDevice, Primitive, PrimitiveAssembler, PrimitiveKind, PrimitiveSink,
    RenderContext,
};
