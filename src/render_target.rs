use anyhow::Result;
use wgpu::{Device, TextureView};

/// The intermediate image the compute shader writes and the present pass
/// samples. Lives exactly as long as the current output size; a resize
/// builds the replacement first and only then lets the old one go, so there
/// is never a window with zero valid targets.
pub struct RenderTarget {
    pub view: TextureView,
    pub width: u32,
    pub height: u32,
}

/// Validates a requested extent without touching the device. The returned
/// pair is used verbatim as the new target's dimensions.
fn validate_extent(width: u32, height: u32) -> Result<(u32, u32)> {
    anyhow::ensure!(
        width > 0 && height > 0,
        "render target extent must be positive, got {width}x{height}"
    );
    Ok((width, height))
}

impl RenderTarget {
    pub fn create(device: &Device, width: u32, height: u32) -> Result<RenderTarget> {
        let (width, height) = validate_extent(width, height)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Ray Tracing Output"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        // the view holds the texture alive; no separate handle needed
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(RenderTarget {
            view,
            width,
            height,
        })
    }

    /// Replaces the target with one sized `width` x `height`. On failure the
    /// existing target stays untouched and usable.
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) -> Result<()> {
        if width == self.width && height == self.height {
            return Ok(());
        }

        *self = RenderTarget::create(device, width, height)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extents_are_rejected() {
        assert!(validate_extent(0, 600).is_err());
        assert!(validate_extent(800, 0).is_err());
        assert!(validate_extent(0, 0).is_err());
    }

    #[test]
    fn valid_extents_pass_through_exactly() {
        for (width, height) in [(1, 1), (800, 600), (1600, 900), (17, 4093)] {
            // dimensions are never clamped or rounded: what the caller asks
            // for is what the new target gets
            assert_eq!(validate_extent(width, height).unwrap(), (width, height));
        }
    }
}
