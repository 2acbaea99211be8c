//! Handler for `modguard crosscheck`.

use std::path::Path;

use miette::Result;

use modguard_core::config::ModguardConfig;
use modguard_ops::ops_crosscheck::{self, CrossCheckOptions};
use modguard_util::errors::ModguardError;

use crate::cli::Format;

pub fn exec(
    root: &Path,
    config: &ModguardConfig,
    opts: &CrossCheckOptions,
    format: Format,
) -> Result<()> {
    let report = ops_crosscheck::crosscheck(root, config, opts)?;

    match format {
        Format::Text => {
            for check in &report.modules {
                println!("{check}");
            }
            for check in &report.bundles {
                println!("{check}");
            }
            for check in &report.builds {
                println!("{check}");
            }
        }
        Format::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(|e| ModguardError::Generic {
                message: format!("Failed to serialize cross-check: {e}"),
            })?;
            println!("{json}");
        }
    }

    let disagreements = report.disagreements();
    if disagreements == 0 {
        Ok(())
    } else {
        Err(ModguardError::VerificationFailed {
            failed: disagreements,
            total: report.total(),
        }
        .into())
    }
}
