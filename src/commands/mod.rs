//! Command dispatch and handlers.

pub mod convert;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::ServiceContext;

use self::convert::{ConvertRequest, Mode};

/// Dispatch parsed arguments to the convert handler with live adapters.
///
/// # Errors
///
/// Returns an error string if configuration is invalid, the root cannot be
/// scanned, or any conversion fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let mut config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(dir) = &cli.staging_dir {
        config.staging_dir = Some(dir.clone());
    }
    if cli.follow_links {
        config.follow_links = true;
    }

    let mode = if cli.json {
        Mode::Json
    } else if cli.dry_run {
        Mode::DryRun
    } else {
        Mode::Convert
    };
    let request = ConvertRequest { root: cli.root.clone(), config, mode };

    let ctx = ServiceContext::live(cli.yes);
    let stdout = std::io::stdout();
    convert::run_with_context(&ctx, &request, &mut stdout.lock()).map(|_| ())
}
