//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable which points at the root of the software checkout.
pub const SW_ROOT_ENV_VAR: &str = "GEARBOT_SW_ROOT";

/// Get the root directory of the software, read from `GEARBOT_SW_ROOT`.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
