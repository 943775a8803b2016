//! The scan → report → confirm → convert flow.

use std::io::Write;
use std::path::PathBuf;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::materialize::{ConversionOutcome, Materializer};
use crate::report::Report;
use crate::scan::{rescan_too_long, TreeScanner};

/// What to do after scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the report, ask, then convert.
    Convert,
    /// Print the report only.
    DryRun,
    /// Print the report as JSON only.
    Json,
}

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Folder to scan.
    pub root: PathBuf,
    /// Effective configuration.
    pub config: Config,
    /// What to do after scanning.
    pub mode: Mode,
}

/// What a run did.
#[derive(Debug)]
pub struct RunSummary {
    /// The scan report.
    pub report: Report,
    /// Whether conversion was confirmed.
    pub confirmed: bool,
    /// One entry per attempted conversion.
    pub outcomes: Vec<ConversionOutcome>,
}

impl RunSummary {
    /// Number of shortcuts converted successfully.
    #[must_use]
    pub fn converted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of failed conversions.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.converted()
    }
}

/// Run the flow against `ctx`, writing user-facing output to `out`.
///
/// # Errors
///
/// Returns an error string if the root cannot be scanned, output cannot be
/// written, or any conversion fails. Successful conversions are kept even
/// when a later one fails.
pub fn run_with_context<W: Write>(
    ctx: &ServiceContext,
    request: &ConvertRequest,
    out: &mut W,
) -> Result<RunSummary, String> {
    let config = &request.config;
    let outcome = TreeScanner::new(ctx, config.scan_options())
        .scan(&request.root)
        .map_err(|e| e.to_string())?;
    let long_paths = rescan_too_long(ctx.lister.as_ref(), &outcome.errors, config.max_path_len);
    let report = Report::build(
        request.root.clone(),
        ctx.clock.now(),
        config.max_path_len,
        outcome,
        long_paths,
    );

    if report.has_problems() {
        tracing::warn!(root = %request.root.display(), "parts of the tree could not be examined");
    }

    let mut summary = RunSummary { report, confirmed: false, outcomes: Vec::new() };
    let write_err = |e: std::io::Error| format!("Failed to write output: {e}");

    if request.mode == Mode::Json {
        let json = summary.report.to_json().map_err(|e| format!("Failed to render report: {e}"))?;
        writeln!(out, "{json}").map_err(write_err)?;
        return Ok(summary);
    }

    write!(out, "{}", summary.report).map_err(write_err)?;
    if request.mode == Mode::DryRun || summary.report.accepted.is_empty() {
        return Ok(summary);
    }

    writeln!(out).map_err(write_err)?;
    out.flush().map_err(write_err)?;
    if !ctx.confirm.confirm(&summary.report.accepted) {
        writeln!(out, "Nothing converted.").map_err(write_err)?;
        return Ok(summary);
    }
    summary.confirmed = true;

    summary.outcomes = Materializer::new(ctx, config.materialize_options())
        .materialize_all(&summary.report.accepted);
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(folder) => writeln!(out, "Converted {}", folder.display()),
            Err(err) => writeln!(out, "Failed {}: {}: {}", err.shortcut.display(), err.stage, err.source),
        }
        .map_err(write_err)?;
    }
    writeln!(
        out,
        "Converted {} of {} shortcut(s).",
        summary.converted(),
        summary.outcomes.len()
    )
    .map_err(write_err)?;

    match summary.failed() {
        0 => Ok(summary),
        failed => Err(format!("{failed} conversion(s) failed")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::context::tests::{fake_context, FixedAnswer};
    use crate::ports::ShortcutTargetResolver;

    struct MapResolver(HashMap<PathBuf, PathBuf>);

    impl ShortcutTargetResolver for MapResolver {
        fn resolve(&self, shortcut: &Path) -> Option<PathBuf> {
            self.0.get(shortcut).cloned()
        }
    }

    struct Setup {
        dir: tempfile::TempDir,
        root: PathBuf,
        shortcut: PathBuf,
    }

    /// A root holding `Docs.lnk` that points at an existing folder.
    fn setup() -> (Setup, ServiceContext) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let target = dir.path().join("Projects").join("Docs");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&target).unwrap();
        let shortcut = root.join("Docs.lnk");
        fs::write(&shortcut, b"shortcut").unwrap();

        let mut ctx = fake_context();
        ctx.resolver = Box::new(MapResolver(HashMap::from([(shortcut.clone(), target)])));
        (Setup { dir, root, shortcut }, ctx)
    }

    fn request(setup: &Setup, mode: Mode) -> ConvertRequest {
        let config = Config {
            staging_dir: Some(setup.dir.path().join("staging")),
            ..Config::default()
        };
        ConvertRequest { root: setup.root.clone(), config, mode }
    }

    fn answering(ctx: &mut ServiceContext, answer: bool) -> Arc<AtomicUsize> {
        let asked = Arc::new(AtomicUsize::new(0));
        ctx.confirm = Box::new(FixedAnswer { answer, asked: Arc::clone(&asked) });
        asked
    }

    #[test]
    fn confirmed_run_converts() {
        let (setup, mut ctx) = setup();
        let asked = answering(&mut ctx, true);
        let mut out = Vec::new();

        let summary = run_with_context(&ctx, &request(&setup, Mode::Convert), &mut out).unwrap();

        assert_eq!(asked.load(Ordering::SeqCst), 1);
        assert!(summary.confirmed);
        assert_eq!(summary.converted(), 1);
        assert!(!setup.shortcut.exists());
        assert!(setup.root.join("Docs").join("target.lnk").is_file());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Converted 1 of 1 shortcut(s)."));
    }

    #[test]
    fn declined_run_changes_nothing() {
        let (setup, mut ctx) = setup();
        answering(&mut ctx, false);
        let mut out = Vec::new();

        let summary = run_with_context(&ctx, &request(&setup, Mode::Convert), &mut out).unwrap();

        assert!(!summary.confirmed);
        assert_eq!(summary.report.accepted.len(), 1);
        assert!(summary.outcomes.is_empty());
        assert_eq!(fs::read(&setup.shortcut).unwrap(), b"shortcut");
        assert!(!setup.root.join("Docs").exists());
        assert!(!setup.dir.path().join("staging").exists());
        assert!(String::from_utf8(out).unwrap().contains("Nothing converted."));
    }

    #[test]
    fn dry_run_never_asks() {
        let (setup, mut ctx) = setup();
        let asked = answering(&mut ctx, true);
        let mut out = Vec::new();

        run_with_context(&ctx, &request(&setup, Mode::DryRun), &mut out).unwrap();

        assert_eq!(asked.load(Ordering::SeqCst), 0);
        assert!(setup.shortcut.exists());
        assert!(String::from_utf8(out).unwrap().contains("Docs.lnk -> "));
    }

    #[test]
    fn json_mode_prints_report_only() {
        let (setup, mut ctx) = setup();
        let asked = answering(&mut ctx, true);
        let mut out = Vec::new();

        run_with_context(&ctx, &request(&setup, Mode::Json), &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["accepted"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["generated_at"], "2024-01-02T03:04:05Z");
        assert_eq!(asked.load(Ordering::SeqCst), 0);
        assert!(setup.shortcut.exists());
    }

    #[test]
    fn nothing_accepted_skips_prompt() {
        let (setup, mut ctx) = setup();
        ctx.resolver = Box::new(MapResolver(HashMap::new()));
        let asked = answering(&mut ctx, true);
        let mut out = Vec::new();

        run_with_context(&ctx, &request(&setup, Mode::Convert), &mut out).unwrap();

        assert_eq!(asked.load(Ordering::SeqCst), 0);
        assert!(String::from_utf8(out).unwrap().starts_with("No folder shortcuts found"));
    }

    #[test]
    fn failed_conversion_is_reported_and_fails_the_run() {
        let (setup, mut ctx) = setup();
        answering(&mut ctx, true);
        fs::create_dir(setup.root.join("Docs")).unwrap();
        let mut out = Vec::new();

        let err = run_with_context(&ctx, &request(&setup, Mode::Convert), &mut out).unwrap_err();

        assert_eq!(err, "1 conversion(s) failed");
        assert!(setup.shortcut.exists());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Failed "));
        assert!(text.contains("move into place"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let (setup, ctx) = setup();
        let mut req = request(&setup, Mode::DryRun);
        req.root = setup.dir.path().join("nope");

        let err = run_with_context(&ctx, &req, &mut Vec::new()).unwrap_err();
        assert!(err.contains("cannot read root folder"));
    }
}
