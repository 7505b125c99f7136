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

//! Surfaces and the framebuffer that references them.

use super::enums::TextureFormat;
use crate::renderer::error::StateError;
use crate::strata_bitflags;
use std::sync::Arc;

/// The maximum number of color attachments in a [`Framebuffer`].
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// An opaque identifier of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// A renderable 2D resource, used as a color or depth/stencil attachment or
/// as a sampler view.
///
/// Surfaces are owned by whoever created them and shared through `Arc`; a
/// context holds its own references and drops them on detach or destruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Surface {
    /// The surface identifier.
    pub id: SurfaceId,
    /// The pixel format.
    pub format: TextureFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Surface {
    /// Creates a shared surface.
    pub fn new(id: SurfaceId, format: TextureFormat, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            id,
            format,
            width,
            height,
        })
    }

    /// The distance in bytes between two rows.
    pub fn pitch(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }
}

/// An ordered set of color attachments plus an optional depth/stencil attachment.
///
/// Slots at or beyond [`Framebuffer::color_count`] are always empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color_count: usize,
    colors: [Option<Arc<Surface>>; MAX_COLOR_ATTACHMENTS],
    depth_stencil: Option<Arc<Surface>>,
}

impl Framebuffer {
    /// Builds a framebuffer from its attachments.
    ///
    /// Every attachment must be at least `width` x `height`.
    pub fn new(
        width: u32,
        height: u32,
        colors: &[Arc<Surface>],
        depth_stencil: Option<Arc<Surface>>,
    ) -> Result<Self, StateError> {
        if colors.len() > MAX_COLOR_ATTACHMENTS {
            return Err(StateError::TooManyColorAttachments {
                count: colors.len(),
                max: MAX_COLOR_ATTACHMENTS,
            });
        }

        let fits = |surface: &Surface| surface.width >= width && surface.height >= height;
        if let Some(slot) = colors.iter().position(|surface| !fits(surface)) {
            return Err(StateError::AttachmentTooSmall { slot: Some(slot) });
        }
        if depth_stencil.as_deref().is_some_and(|surface| !fits(surface)) {
            return Err(StateError::AttachmentTooSmall { slot: None });
        }

        let mut slots: [Option<Arc<Surface>>; MAX_COLOR_ATTACHMENTS] = Default::default();
        for (slot, surface) in slots.iter_mut().zip(colors) {
            *slot = Some(Arc::clone(surface));
        }

        Ok(Self {
            width,
            height,
            color_count: colors.len(),
            colors: slots,
            depth_stencil,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The number of bound color attachments.
    pub fn color_count(&self) -> usize {
        self.color_count
    }

    /// The color attachment in `slot`, if any.
    pub fn color(&self, slot: usize) -> Option<&Arc<Surface>> {
        self.colors.get(slot).and_then(Option::as_ref)
    }

    /// Iterates over the bound color attachments in slot order.
    pub fn colors(&self) -> impl Iterator<Item = &Arc<Surface>> {
        self.colors[..self.color_count].iter().flatten()
    }

    /// The depth/stencil attachment, if any.
    pub fn depth_stencil(&self) -> Option<&Arc<Surface>> {
        self.depth_stencil.as_ref()
    }

    /// Returns `true` if no attachment is bound.
    pub fn is_empty(&self) -> bool {
        self.color_count == 0 && self.depth_stencil.is_none()
    }

    /// Drops every attachment reference and resets the size.
    pub fn release(&mut self) {
        for slot in &mut self.colors {
            *slot = None;
        }
        self.depth_stencil = None;
        self.color_count = 0;
        self.width = 0;
        self.height = 0;
    }
}

strata_bitflags! {
    /// Selects the attachments a clear touches.
    pub struct ClearFlags: u32 {
        /// Clear every color attachment.
        const COLOR = 1 << 0;
        /// Clear the depth aspect of the depth/stencil attachment.
        const DEPTH = 1 << 1;
        /// Clear the stencil aspect of the depth/stencil attachment.
        const STENCIL = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(id: u64) -> Arc<Surface> {
        Surface::new(SurfaceId(id), TextureFormat::Rgba8Unorm, 64, 64)
    }

    #[test]
    fn slots_beyond_count_stay_empty() {
        let fb = Framebuffer::new(64, 64, &[color(1), color(2)], None).unwrap();
        assert_eq!(fb.color_count(), 2);
        assert!(fb.color(1).is_some());
        assert!((2..MAX_COLOR_ATTACHMENTS).all(|slot| fb.color(slot).is_none()));
        assert_eq!(fb.colors().count(), 2);
    }

    #[test]
    fn too_many_attachments_are_rejected() {
        let colors: Vec<_> = (0..=MAX_COLOR_ATTACHMENTS as u64).map(color).collect();
        let err = Framebuffer::new(64, 64, &colors, None).unwrap_err();
        assert_eq!(
            err,
            StateError::TooManyColorAttachments {
                count: MAX_COLOR_ATTACHMENTS + 1,
                max: MAX_COLOR_ATTACHMENTS
            }
        );
    }

    #[test]
    fn undersized_depth_attachment_is_rejected() {
        let depth = Surface::new(SurfaceId(9), TextureFormat::Depth16Unorm, 32, 32);
        let err = Framebuffer::new(64, 64, &[color(1)], Some(depth)).unwrap_err();
        assert_eq!(err, StateError::AttachmentTooSmall { slot: None });
    }

    #[test]
    fn framebuffer_holds_its_own_references() {
        let surface = color(1);
        let mut fb = Framebuffer::new(64, 64, &[Arc::clone(&surface)], None).unwrap();
        assert_eq!(Arc::strong_count(&surface), 2);

        fb.release();
        assert_eq!(Arc::strong_count(&surface), 1);
        assert!(fb.is_empty());
    }

    #[test]
    fn pitch_uses_format_size() {
        let surface = Surface::new(SurfaceId(3), TextureFormat::Rgb565Unorm, 100, 10);
        assert_eq!(surface.pitch(), 200);
    }
}
