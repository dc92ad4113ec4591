//! Configuration file loading.

use std::path::Path;

use vulnscan_core::VulnScanConfig;

/// Load a [`VulnScanConfig`] from a YAML file.
///
/// Sections and fields left out of the file take their defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the YAML is invalid.
pub fn load_config(path: &Path) -> anyhow::Result<VulnScanConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
    let config: VulnScanConfig = serde_yaml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {}", e))?;
    Ok(config)
}
