//! Backend abstraction - inference backend selection
//!
//! Inference runs on a plain (non-autodiff) backend: no gradients are tracked,
//! dropout is inactive and batch norm uses its running statistics.
//!
//! The device is chosen once at startup. Builds with the `cuda` feature check
//! that a CUDA device actually works and fall back to NdArray on the CPU when
//! it does not.

use std::fmt;

use tracing::{info, warn};

// --------------------------------------------------------------------------------
// BACKENDS: CUDA (accelerator) when compiled in, NdArray (CPU) always
// --------------------------------------------------------------------------------

/// CPU backend, always available
pub type CpuBackend = burn_ndarray::NdArray;

/// Accelerator backend
#[cfg(feature = "cuda")]
pub type AcceleratorBackend = burn_cuda::Cuda;

/// Backend picked for this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBackend {
    /// NdArray on the CPU
    Cpu,
    /// CUDA on the first GPU
    #[cfg(feature = "cuda")]
    Accelerator,
}

impl ComputeBackend {
    /// Human-readable backend name
    pub fn name(&self) -> &'static str {
        match self {
            ComputeBackend::Cpu => "NdArray (CPU)",
            #[cfg(feature = "cuda")]
            ComputeBackend::Accelerator => "CUDA (GPU)",
        }
    }
}

impl fmt::Display for ComputeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the accelerator when it is usable, the CPU otherwise
pub fn choose_backend(accelerator_usable: bool) -> ComputeBackend {
    #[cfg(feature = "cuda")]
    if accelerator_usable {
        return ComputeBackend::Accelerator;
    }

    let _ = accelerator_usable;
    ComputeBackend::Cpu
}

/// Run a one-element allocation on the default CUDA device
///
/// Device initialization panics when no GPU or driver is present, so the
/// check runs under `catch_unwind`.
#[cfg(feature = "cuda")]
fn accelerator_usable() -> bool {
    use burn::tensor::Tensor;

    std::panic::catch_unwind(|| {
        let device = burn_cuda::CudaDevice::default();
        Tensor::<AcceleratorBackend, 1>::zeros([1], &device).into_data()
    })
    .is_ok()
}

#[cfg(not(feature = "cuda"))]
fn accelerator_usable() -> bool {
    false
}

/// Select the backend for this process: accelerator if available, else CPU
pub fn select_backend() -> ComputeBackend {
    let usable = accelerator_usable();
    let backend = choose_backend(usable);

    if cfg!(feature = "cuda") && !usable {
        warn!("CUDA device not usable, falling back to {}", backend);
    }
    info!("Compute backend: {}", backend);
    backend
}
