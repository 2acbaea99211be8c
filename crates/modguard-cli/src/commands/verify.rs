//! Handler for `modguard verify`.

use std::path::Path;

use miette::Result;

use modguard_core::config::ModguardConfig;
use modguard_ops::ops_verify;
use modguard_util::errors::ModguardError;

use crate::cli::Format;

pub async fn exec(root: &Path, config: &ModguardConfig, format: Format) -> Result<()> {
    let report = ops_verify::verify(root, config).await?;

    match format {
        Format::Text => println!("{report}"),
        Format::Json => {
            let json = report.to_json().map_err(|e| ModguardError::Generic {
                message: format!("Failed to serialize report: {e}"),
            })?;
            println!("{json}");
        }
    }

    if report.is_success() {
        modguard_util::progress::status("Finished", "all checks passed");
        Ok(())
    } else {
        Err(ModguardError::VerificationFailed {
            failed: report.failures().count(),
            total: report.entries().len(),
        }
        .into())
    }
}
