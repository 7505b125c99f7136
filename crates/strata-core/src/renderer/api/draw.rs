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

//! Defines the description of a single draw call.

use super::enums::PrimitiveTopology;

/// Describes one draw call.
///
/// A `DrawInfo` is a plain value and is never modified while a draw is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawInfo {
    /// If `true`, `start` and `count` address the bound index buffer.
    pub indexed: bool,
    /// How vertices are assembled into primitives.
    pub topology: PrimitiveTopology,
    /// The first vertex (or index) to draw.
    pub start: u32,
    /// The number of vertices (or indices) to draw.
    pub count: u32,
    /// A value added to every fetched index before the vertex fetch.
    pub index_bias: i32,
    /// The smallest index value the draw references.
    pub min_index: u32,
    /// The largest index value the draw references.
    pub max_index: u32,
}

impl DrawInfo {
    /// A non-indexed draw of `count` vertices starting at `start`.
    pub fn arrays(topology: PrimitiveTopology, start: u32, count: u32) -> Self {
        Self {
            indexed: false,
            topology,
            start,
            count,
            index_bias: 0,
            min_index: start,
            max_index: start.saturating_add(count).saturating_sub(1),
        }
    }

    /// An indexed draw of `count` indices starting at index `start`.
    pub fn elements(topology: PrimitiveTopology, start: u32, count: u32) -> Self {
        Self {
            indexed: true,
            topology,
            start,
            count,
            index_bias: 0,
            min_index: 0,
            max_index: u32::MAX,
        }
    }

    /// Returns a copy with `index_bias` set.
    #[must_use]
    pub fn with_index_bias(mut self, index_bias: i32) -> Self {
        self.index_bias = index_bias;
        self
    }

    /// The number of primitives this draw produces.
    pub fn primitive_count(&self) -> u32 {
        self.topology.primitive_count(self.count)
    }
}
