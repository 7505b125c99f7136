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

//! Batch handles and device information exchanged with a [`GraphicsDevice`](crate::renderer::GraphicsDevice).

use std::borrow::Cow;

/// An opaque handle to a command batch allocated by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchHandle(pub u64);

/// A descriptor used to allocate a command batch.
#[derive(Debug, Clone)]
pub struct BatchDescriptor<'a> {
    /// An optional debug label, usually the owning context's label.
    pub label: Option<Cow<'a, str>>,
    /// The number of 32-bit command words the batch holds before it must be submitted.
    pub capacity_words: usize,
}

/// The physical type of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A software device running on the CPU.
    Cpu,
    /// An unknown device type.
    #[default]
    Unknown,
}

/// Describes the device a context submits to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// A human-readable device name.
    pub name: String,
    /// The physical type of the device.
    pub device_type: DeviceType,
}
