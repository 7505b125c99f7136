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

use crate::context::FlushOutcome;
use crate::renderer::api::{ClearFlags, DrawInfo};
use crate::renderer::error::RenderError;

/// The operations every context implementation provides.
///
/// The implementation is chosen once, when the context is created.
pub trait RenderContext {
    /// Draws primitives with the currently bound state and buffers.
    fn draw(&mut self, info: &DrawInfo) -> Result<(), RenderError>;

    /// Clears the selected attachments of the bound framebuffer.
    fn clear(
        &mut self,
        flags: ClearFlags,
        color: [f32; 4],
        depth: f64,
        stencil: u32,
    ) -> Result<(), RenderError>;

    /// Submits the commands recorded so far.
    fn flush(&mut self) -> Result<FlushOutcome, RenderError>;

    /// Tears the context down, releasing every resource it holds.
    fn destroy(self: Box<Self>);
}
