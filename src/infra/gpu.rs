// ============================================================
// Layer 6 — GPU Query
// ============================================================
// Asks the NVIDIA driver which GPUs this process can see:
//
//   nvidia-smi --query-gpu=name --format=csv,noheader
//
// No nvidia-smi, or a non-zero exit, means "no CUDA here", and
// the smoke test then stays on the CPU backend.

use std::process::Command;

/// What the driver reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuInventory {
    pub names: Vec<String>,
    /// Value of CUDA_VISIBLE_DEVICES, when set
    pub visible_devices: Option<String>,
}

impl GpuInventory {
    pub fn cuda_available(&self) -> bool {
        !self.names.is_empty()
    }

    pub fn device_count(&self) -> usize {
        self.names.len()
    }

    /// Index of the device this process should use: the first
    /// entry of CUDA_VISIBLE_DEVICES as seen from inside, i.e. 0.
    pub fn current_device(&self) -> Option<usize> {
        self.cuda_available().then_some(0)
    }
}

/// Parse `nvidia-smi --format=csv,noheader` output, one name per line.
pub fn parse_gpu_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn query_gpus() -> GpuInventory {
    let visible_devices = std::env::var("CUDA_VISIBLE_DEVICES").ok();

    let names = match Command::new("nvidia-smi")
        .arg("--query-gpu=name")
        .arg("--format=csv,noheader")
        .output()
    {
        Ok(out) if out.status.success() => parse_gpu_names(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::debug!("nvidia-smi exited with {:?}", out.status.code());
            Vec::new()
        }
        Err(e) => {
            tracing::debug!("nvidia-smi not available: {e}");
            Vec::new()
        }
    };

    GpuInventory { names, visible_devices }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        let names = parse_gpu_names("NVIDIA A100-SXM4-40GB\nNVIDIA A100-SXM4-40GB\n\n");
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "NVIDIA A100-SXM4-40GB");
    }

    #[test]
    fn test_empty_inventory() {
        let inv = GpuInventory::default();
        assert!(!inv.cuda_available());
        assert_eq!(inv.device_count(), 0);
        assert_eq!(inv.current_device(), None);
    }
}
