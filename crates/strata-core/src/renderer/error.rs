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

//! Defines the hierarchy of error types for the graphics context.

use std::fmt;

/// An error related to the creation or use of a GPU resource (buffers, batches, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds,
    /// The operation is not allowed while the resource is mapped.
    Mapped,
    /// The backend could not allocate the resource.
    AllocationFailed(String),
    /// An error originating from the specific backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::Mapped => write!(f, "Resource is currently mapped."),
            ResourceError::AllocationFailed(msg) => {
                write!(f, "Resource allocation failed: {msg}")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error raised by a state-setting call whose arguments break a state invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// More color attachments than the framebuffer can hold.
    TooManyColorAttachments {
        /// The number of attachments requested.
        count: usize,
        /// The maximum supported.
        max: usize,
    },
    /// An attachment is smaller than the framebuffer it is bound to.
    AttachmentTooSmall {
        /// The attachment slot, `None` for the depth/stencil attachment.
        slot: Option<usize>,
    },
    /// More vertex buffers than the context can bind.
    TooManyVertexBuffers {
        /// The number of buffers requested.
        count: usize,
        /// The maximum supported.
        max: usize,
    },
    /// More vertex elements than the hardware vertex format can describe.
    TooManyVertexElements {
        /// The number of elements requested.
        count: usize,
        /// The maximum supported.
        max: usize,
    },
    /// A vertex element reads from a buffer slot outside the bindable range.
    InvalidElementSlot {
        /// The element index.
        element: usize,
        /// The slot it refers to.
        slot: usize,
    },
    /// More samplers (or sampler views) than the context can bind.
    TooManySamplers {
        /// The number of samplers requested.
        count: usize,
        /// The maximum supported.
        max: usize,
    },
    /// More user constants than a shader stage can hold.
    TooManyConstants {
        /// The number of vec4 constants requested.
        count: usize,
        /// The maximum supported.
        max: usize,
    },
    /// A shader program exceeds the hardware program size.
    ProgramTooLarge {
        /// The program size in words.
        words: usize,
        /// The maximum supported.
        max: usize,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::TooManyColorAttachments { count, max } => {
                write!(f, "Too many color attachments: {count} (max {max})")
            }
            StateError::AttachmentTooSmall { slot: Some(slot) } => {
                write!(f, "Color attachment {slot} is smaller than the framebuffer")
            }
            StateError::AttachmentTooSmall { slot: None } => {
                write!(f, "Depth/stencil attachment is smaller than the framebuffer")
            }
            StateError::TooManyVertexBuffers { count, max } => {
                write!(f, "Too many vertex buffers: {count} (max {max})")
            }
            StateError::TooManyVertexElements { count, max } => {
                write!(f, "Too many vertex elements: {count} (max {max})")
            }
            StateError::InvalidElementSlot { element, slot } => {
                write!(f, "Vertex element {element} reads from invalid slot {slot}")
            }
            StateError::TooManySamplers { count, max } => {
                write!(f, "Too many samplers: {count} (max {max})")
            }
            StateError::TooManyConstants { count, max } => {
                write!(f, "Too many constants: {count} (max {max})")
            }
            StateError::ProgramTooLarge { words, max } => {
                write!(f, "Shader program too large: {words} words (max {max})")
            }
        }
    }
}

impl std::error::Error for StateError {}

/// A high-level error that can occur within the graphics context or device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A failure occurred while creating the context.
    InitializationFailed(String),
    /// The context configuration is invalid or could not be parsed.
    InvalidConfig(String),
    /// The device could not allocate a command batch.
    BatchAllocationFailed(ResourceError),
    /// The device refused a submitted batch.
    SubmissionFailed(String),
    /// A packet cannot fit in an empty batch together with the full hardware state.
    PacketTooLarge {
        /// The size of the packet in words.
        words: usize,
        /// The capacity of the batch in words.
        capacity: usize,
    },
    /// An error occurred while managing a resource.
    ResourceError(ResourceError),
    /// A state-setting call was rejected.
    State(StateError),
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize graphics context: {msg}")
            }
            RenderError::InvalidConfig(msg) => write!(f, "Invalid context configuration: {msg}"),
            RenderError::BatchAllocationFailed(err) => {
                write!(f, "Failed to allocate command batch: {err}")
            }
            RenderError::SubmissionFailed(msg) => write!(f, "Batch submission failed: {msg}"),
            RenderError::PacketTooLarge { words, capacity } => write!(
                f,
                "Packet of {words} words does not fit a batch of {capacity} words"
            ),
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::State(err) => write!(f, "Invalid pipeline state: {err}"),
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::BatchAllocationFailed(err) | RenderError::ResourceError(err) => Some(err),
            RenderError::State(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<StateError> for RenderError {
    fn from(err: StateError) -> Self {
        RenderError::State(err)
    }
}
