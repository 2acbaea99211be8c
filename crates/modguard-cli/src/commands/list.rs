//! Handler for `modguard list`.

use std::path::Path;

use miette::Result;

use modguard_core::config::ModguardConfig;
use modguard_ops::ops_scan;

pub fn exec(root: &Path, config: &ModguardConfig) -> Result<()> {
    ops_scan::list(root, config)
}
