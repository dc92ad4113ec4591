//! Compute device resolution with CPU fallback.

use candle_core::Device;
use vulnscan_core::DeviceKind;

/// Resolve the configured [`DeviceKind`] to a candle [`Device`].
///
/// GPU backends are only tried when compiled in (`cuda` / `metal` features);
/// anything unavailable falls back to CPU with a warning.
pub fn select_device(kind: DeviceKind) -> Device {
    let want_cuda = matches!(kind, DeviceKind::Cuda | DeviceKind::Auto);
    let want_metal = matches!(kind, DeviceKind::Metal | DeviceKind::Auto);

    if want_cuda {
        #[cfg(feature = "cuda")]
        {
            if let Ok(device) = Device::new_cuda(0) {
                tracing::info!("Using CUDA device 0");
                return device;
            }
        }
        if kind == DeviceKind::Cuda {
            tracing::warn!("CUDA requested but not available, falling back to CPU");
        }
    }

    if want_metal {
        #[cfg(feature = "metal")]
        {
            if let Ok(device) = Device::new_metal(0) {
                tracing::info!("Using Metal device 0");
                return device;
            }
        }
        if kind == DeviceKind::Metal {
            tracing::warn!("Metal requested but not available, falling back to CPU");
        }
    }

    Device::Cpu
}
