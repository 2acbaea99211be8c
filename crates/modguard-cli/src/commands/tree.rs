//! Handler for `modguard tree`.

use std::path::Path;

use miette::Result;

use modguard_core::config::ModguardConfig;
use modguard_ops::ops_tree::{self, TreeOptions};

pub fn exec(
    root: &Path,
    config: &ModguardConfig,
    module: String,
    depth: Option<usize>,
    why: Option<String>,
    inverted: bool,
    flat: bool,
) -> Result<()> {
    let opts = TreeOptions {
        module,
        depth,
        why,
        inverted,
        flat,
    };
    ops_tree::tree(root, config, &opts)
}
