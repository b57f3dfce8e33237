//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "HAPTIC_WAND_SW_ROOT";

/// Get the software root directory.
///
/// Parameter files are found in `<root>/params` and sessions are created
/// under `<root>/sessions`.
pub fn get_wand_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Short description of the host, used when logging execution information.
pub fn get_host_info() -> String {
    format!(
        "{} ({}), {} logical cpu(s)",
        env::consts::OS,
        env::consts::ARCH,
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    )
}
