//! Folder-link materializer.
//!
//! Turns one accepted shortcut `X.lnk` into a folder `X` holding a hidden
//! system `desktop.ini` and a verbatim copy of the shortcut named
//! `target.lnk`. The folder is built completely in a staging area and then
//! renamed into place, so the visible result appears in one step.
//!
//! ```text
//! Created ──► Populated ──► Moved ──► Locked ──► original removed
//! ```
//!
//! A failure at any stage leaves the original shortcut untouched. A
//! staging folder orphaned before the move is kept unless
//! [`MaterializeOptions::cleanup_staging_on_failure`] is set.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::context::ServiceContext;
use crate::ports::Attributes;
use crate::scan::{ClassifiedShortcut, MARKER_SHORTCUT_NAME};

/// Name of the marker configuration file.
pub const MARKER_FILE_NAME: &str = "desktop.ini";

/// Content of the marker configuration file.
pub const MARKER_CONTENT: &str =
    "[.ShellClassInfo]\r\nCLSID2={0AFACED1-E828-11D1-9187-B532F1E9575D}\r\nFlags=2\r\n";

/// Prefix of staging folder names.
pub const STAGING_PREFIX: &str = "folder-link-";

#[cfg(windows)]
const CROSS_DEVICE: i32 = 17;
#[cfg(unix)]
const CROSS_DEVICE: i32 = 18;
#[cfg(not(any(windows, unix)))]
const CROSS_DEVICE: i32 = -1;

/// The step a conversion was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Creating the staging folder.
    Create,
    /// Writing the marker file and copying the shortcut.
    Populate,
    /// Renaming the staging folder into place.
    Move,
    /// Marking the folder read-only.
    Lock,
    /// Deleting the original shortcut.
    RemoveOriginal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create staging folder",
            Self::Populate => "populate staging folder",
            Self::Move => "move into place",
            Self::Lock => "mark folder read-only",
            Self::RemoveOriginal => "remove original shortcut",
        })
    }
}

/// A failed conversion of one shortcut.
#[derive(Debug, Error)]
#[error("{stage} failed for {}: {source}", .shortcut.display())]
pub struct MaterializeError {
    /// The step that failed.
    pub stage: Stage,
    /// The shortcut being converted; still present on disk.
    pub shortcut: PathBuf,
    /// Staging folder left behind, if any.
    pub orphan: Option<PathBuf>,
    /// Underlying cause.
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Materializer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Where staging folders are built.
    pub staging_dir: PathBuf,
    /// Remove an orphaned staging folder when a conversion fails.
    pub cleanup_staging_on_failure: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self { staging_dir: std::env::temp_dir(), cleanup_staging_on_failure: false }
    }
}

/// Outcome of converting one shortcut.
#[derive(Debug)]
pub struct ConversionOutcome {
    /// The shortcut that was converted.
    pub shortcut: PathBuf,
    /// The created folder, or why it was not created.
    pub result: Result<PathBuf, MaterializeError>,
}

enum State {
    Created(PathBuf),
    Populated(PathBuf),
    Moved(PathBuf),
    Locked(PathBuf),
}

type RenameFn = fn(&Path, &Path) -> io::Result<()>;

/// Converts shortcuts into folder shell links.
pub struct Materializer<'a> {
    ctx: &'a ServiceContext,
    options: MaterializeOptions,
    rename: RenameFn,
}

impl<'a> Materializer<'a> {
    /// Creates a materializer using the given context's ports.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, options: MaterializeOptions) -> Self {
        Self { ctx, options, rename: rename_dir }
    }

    #[cfg(test)]
    fn with_rename(mut self, rename: RenameFn) -> Self {
        self.rename = rename;
        self
    }

    /// Converts each shortcut in order. A failure on one does not stop the rest.
    #[must_use]
    pub fn materialize_all(&self, shortcuts: &[ClassifiedShortcut]) -> Vec<ConversionOutcome> {
        shortcuts
            .iter()
            .map(|classified| ConversionOutcome {
                shortcut: classified.shortcut.clone(),
                result: self.materialize(&classified.shortcut),
            })
            .collect()
    }

    /// Replaces the shortcut at `shortcut` with a folder shell link and
    /// returns the folder's path.
    ///
    /// # Errors
    ///
    /// Returns an error naming the failed stage. The original shortcut is
    /// still in place whenever an error is returned.
    pub fn materialize(&self, shortcut: &Path) -> Result<PathBuf, MaterializeError> {
        let fail = |stage: Stage,
                    orphan: Option<PathBuf>,
                    source: Box<dyn std::error::Error + Send + Sync>| {
            MaterializeError { stage, shortcut: shortcut.to_path_buf(), orphan, source }
        };
        let destination = destination_for(shortcut).ok_or_else(|| {
            fail(Stage::Create, None, "shortcut path has no parent or file name".into())
        })?;

        let staging = self
            .create(&self.options.staging_dir)
            .map_err(|e| fail(Stage::Create, None, e.into()))?;
        let mut state = State::Created(staging);
        loop {
            state = match state {
                State::Created(staging) => match self.populate(&staging, shortcut) {
                    Ok(()) => State::Populated(staging),
                    Err(e) => return Err(self.abandon(fail(Stage::Populate, Some(staging), e))),
                },
                State::Populated(staging) => {
                    match self.move_into_place(&staging, &destination, shortcut) {
                        Ok(()) => State::Moved(destination.clone()),
                        Err(e) => {
                            let orphan = staging.exists().then_some(staging);
                            return Err(self.abandon(fail(Stage::Move, orphan, e)));
                        }
                    }
                }
                State::Moved(folder) => match self.lock(&folder) {
                    Ok(()) => State::Locked(folder),
                    Err(e) => return Err(fail(Stage::Lock, None, e)),
                },
                State::Locked(folder) => {
                    if !folder.is_dir() {
                        return Err(fail(
                            Stage::RemoveOriginal,
                            None,
                            format!("{} is not a folder after the move", folder.display()).into(),
                        ));
                    }
                    std::fs::remove_file(shortcut)
                        .map_err(|e| fail(Stage::RemoveOriginal, None, e.into()))?;
                    tracing::info!(
                        shortcut = %shortcut.display(),
                        folder = %folder.display(),
                        "converted"
                    );
                    return Ok(folder);
                }
            };
        }
    }

    /// Creates an empty, uniquely named staging folder inside `area`.
    fn create(&self, area: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(area)?;
        let staging = area.join(format!("{STAGING_PREFIX}{}", self.ctx.id_gen.generate_id()));
        std::fs::create_dir(&staging)?;
        tracing::debug!(staging = %staging.display(), "created staging folder");
        Ok(staging)
    }

    /// Writes the marker file and copies the shortcut into `staging`.
    fn populate(
        &self,
        staging: &Path,
        shortcut: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let marker = staging.join(MARKER_FILE_NAME);
        std::fs::write(&marker, MARKER_CONTENT)?;
        self.ctx.attributes.set(&marker, Attributes::HIDDEN_SYSTEM)?;
        std::fs::copy(shortcut, staging.join(MARKER_SHORTCUT_NAME))?;
        Ok(())
    }

    /// Renames `staging` to `destination`.
    ///
    /// When the two are on different volumes the folder is rebuilt next to
    /// the destination and renamed from there.
    fn move_into_place(
        &self,
        staging: &Path,
        destination: &Path,
        shortcut: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if destination.symlink_metadata().is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", destination.display()),
            )
            .into());
        }
        match (self.rename)(staging, destination) {
            Ok(()) => Ok(()),
            Err(err) if is_cross_device(&err) => {
                tracing::debug!(
                    staging = %staging.display(),
                    destination = %destination.display(),
                    "staging area is on another volume; restaging beside destination"
                );
                let parent = destination.parent().unwrap_or_else(|| Path::new("."));
                let local =
                    parent.join(format!(".{STAGING_PREFIX}{}", self.ctx.id_gen.generate_id()));
                std::fs::create_dir(&local)?;
                if let Err(e) = self.populate(&local, shortcut) {
                    remove_staging(&local);
                    return Err(e);
                }
                if let Err(e) = (self.rename)(&local, destination) {
                    remove_staging(&local);
                    return Err(e.into());
                }
                remove_staging(staging);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Marks `folder` read-only and reads the flag back.
    fn lock(&self, folder: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.ctx.attributes.set(folder, Attributes::READ_ONLY)?;
        if !self.ctx.attributes.get(folder)?.contains(Attributes::READ_ONLY) {
            return Err(format!("{} did not keep the read-only flag", folder.display()).into());
        }
        Ok(())
    }

    /// Applies the orphan policy to a failed conversion.
    fn abandon(&self, mut err: MaterializeError) -> MaterializeError {
        let Some(orphan) = err.orphan.clone() else {
            return err;
        };
        if self.options.cleanup_staging_on_failure {
            remove_staging(&orphan);
            if !orphan.exists() {
                err.orphan = None;
            }
        } else {
            tracing::warn!(orphan = %orphan.display(), "staging folder left behind");
        }
        err
    }
}

/// Where the folder for `shortcut` goes: same parent, extension dropped.
#[must_use]
pub fn destination_for(shortcut: &Path) -> Option<PathBuf> {
    let parent = shortcut.parent()?;
    let stem = shortcut.file_stem()?;
    Some(parent.join(stem))
}

fn rename_dir(from: &Path, to: &Path) -> io::Result<()> {
    std::fs::rename(from, to)
}

fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(CROSS_DEVICE)
}

fn remove_staging(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "cannot remove staging folder");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::context::tests::{fake_context, MemoryAttributes};
    use crate::ports::FileAttributes;

    const SHORTCUT_BYTES: &[u8] = b"L\0\0\0 pretend shell link bytes \x01\x02\x03";

    struct Fixture {
        dir: tempfile::TempDir,
        attrs: MemoryAttributes,
        ctx: ServiceContext,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let attrs = MemoryAttributes::default();
            let mut ctx = fake_context();
            ctx.attributes = Box::new(attrs.clone());
            Self { dir, attrs, ctx }
        }

        fn staging(&self) -> PathBuf {
            self.dir.path().join("staging")
        }

        fn options(&self, cleanup: bool) -> MaterializeOptions {
            MaterializeOptions { staging_dir: self.staging(), cleanup_staging_on_failure: cleanup }
        }

        fn shortcut(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join("root").join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, SHORTCUT_BYTES).unwrap();
            path
        }

        fn staging_entries(&self) -> Vec<PathBuf> {
            match fs::read_dir(self.staging()) {
                Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
                Err(_) => Vec::new(),
            }
        }
    }

    /// Fails whenever read-only is requested.
    struct NoReadOnly;

    impl FileAttributes for NoReadOnly {
        fn get(&self, _path: &Path) -> Result<Attributes, Box<dyn std::error::Error + Send + Sync>> {
            Ok(Attributes::default())
        }

        fn set(
            &self,
            _path: &Path,
            attrs: Attributes,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if attrs.read_only {
                Err("access denied".into())
            } else {
                Ok(())
            }
        }
    }

    /// Accepts every write and forgets it.
    struct Forgetful;

    impl FileAttributes for Forgetful {
        fn get(&self, _path: &Path) -> Result<Attributes, Box<dyn std::error::Error + Send + Sync>> {
            Ok(Attributes::default())
        }

        fn set(
            &self,
            _path: &Path,
            _attrs: Attributes,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    /// Refuses renames out of the staging area as if it sat on another volume.
    fn rename_across_volumes(from: &Path, to: &Path) -> io::Result<()> {
        let restaged = from.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if restaged {
            fs::rename(from, to)
        } else {
            Err(io::Error::from_raw_os_error(CROSS_DEVICE))
        }
    }

    fn sorted_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn converts_shortcut_into_folder_link() {
        let fx = Fixture::new();
        let shortcut = fx.shortcut("Docs.lnk");

        let folder = Materializer::new(&fx.ctx, fx.options(false)).materialize(&shortcut).unwrap();

        assert_eq!(folder, fx.dir.path().join("root").join("Docs"));
        assert!(!shortcut.exists());
        assert!(folder.is_dir());

        assert_eq!(sorted_names(&folder), vec!["desktop.ini".to_string(), "target.lnk".to_string()]);

        assert_eq!(fs::read_to_string(folder.join(MARKER_FILE_NAME)).unwrap(), MARKER_CONTENT);
        assert_eq!(fs::read(folder.join(MARKER_SHORTCUT_NAME)).unwrap(), SHORTCUT_BYTES);

        let attrs = fx.attrs.snapshot();
        assert_eq!(attrs.get(&folder), Some(&Attributes::READ_ONLY));
        let marker_attrs: Vec<_> = attrs
            .iter()
            .filter(|(path, _)| path.file_name().is_some_and(|n| n == MARKER_FILE_NAME))
            .map(|(_, a)| *a)
            .collect();
        assert_eq!(marker_attrs, vec![Attributes::HIDDEN_SYSTEM]);

        assert!(fx.staging_entries().is_empty());
    }

    #[test]
    fn marker_content_declares_folder_shortcut() {
        assert_eq!(
            MARKER_CONTENT.lines().collect::<Vec<_>>(),
            vec!["[.ShellClassInfo]", "CLSID2={0AFACED1-E828-11D1-9187-B532F1E9575D}", "Flags=2"]
        );
    }

    #[test]
    fn occupied_destination_keeps_original_and_orphan() {
        let fx = Fixture::new();
        let shortcut = fx.shortcut("Docs.lnk");
        let occupied = fx.dir.path().join("root").join("Docs");
        fs::create_dir(&occupied).unwrap();

        let err = Materializer::new(&fx.ctx, fx.options(false)).materialize(&shortcut).unwrap_err();

        assert_eq!(err.stage, Stage::Move);
        assert_eq!(fs::read(&shortcut).unwrap(), SHORTCUT_BYTES);
        assert_eq!(fs::read_dir(&occupied).unwrap().count(), 0);
        let orphan = err.orphan.clone().unwrap();
        assert!(orphan.join(MARKER_SHORTCUT_NAME).is_file());
        assert_eq!(fx.staging_entries(), vec![orphan]);
    }

    #[test]
    fn cleanup_option_removes_orphan() {
        let fx = Fixture::new();
        let shortcut = fx.shortcut("Docs.lnk");
        fs::write(fx.dir.path().join("root").join("Docs"), "a file in the way").unwrap();

        let err = Materializer::new(&fx.ctx, fx.options(true)).materialize(&shortcut).unwrap_err();

        assert_eq!(err.stage, Stage::Move);
        assert!(err.orphan.is_none());
        assert!(fx.staging_entries().is_empty());
        assert!(shortcut.exists());
    }

    #[test]
    fn vanished_shortcut_fails_while_populating() {
        let fx = Fixture::new();
        let shortcut = fx.dir.path().join("root").join("Gone.lnk");

        let err = Materializer::new(&fx.ctx, fx.options(false)).materialize(&shortcut).unwrap_err();

        assert_eq!(err.stage, Stage::Populate);
        assert!(err.orphan.is_some());
        assert!(!fx.dir.path().join("root").join("Gone").exists());
    }

    #[test]
    fn lock_failure_keeps_original() {
        let mut fx = Fixture::new();
        fx.ctx.attributes = Box::new(NoReadOnly);
        let shortcut = fx.shortcut("Docs.lnk");

        let err = Materializer::new(&fx.ctx, fx.options(false)).materialize(&shortcut).unwrap_err();

        assert_eq!(err.stage, Stage::Lock);
        assert!(shortcut.exists());
        assert!(err.to_string().starts_with("mark folder read-only failed for "));
    }

    #[test]
    fn read_only_flag_that_does_not_stick_fails_the_lock() {
        let mut fx = Fixture::new();
        fx.ctx.attributes = Box::new(Forgetful);
        let shortcut = fx.shortcut("Docs.lnk");

        let err = Materializer::new(&fx.ctx, fx.options(false)).materialize(&shortcut).unwrap_err();

        assert_eq!(err.stage, Stage::Lock);
        assert!(err.source.to_string().ends_with("did not keep the read-only flag"));
        assert_eq!(fs::read(&shortcut).unwrap(), SHORTCUT_BYTES);
    }

    #[test]
    fn restages_beside_destination_when_staging_is_on_another_volume() {
        let fx = Fixture::new();
        let shortcut = fx.shortcut("Docs.lnk");

        let folder = Materializer::new(&fx.ctx, fx.options(false))
            .with_rename(rename_across_volumes)
            .materialize(&shortcut)
            .unwrap();

        assert_eq!(folder, fx.dir.path().join("root").join("Docs"));
        assert_eq!(sorted_names(&fx.dir.path().join("root")), vec!["Docs".to_string()]);
        assert_eq!(sorted_names(&folder), vec!["desktop.ini".to_string(), "target.lnk".to_string()]);
        assert_eq!(fs::read_to_string(folder.join(MARKER_FILE_NAME)).unwrap(), MARKER_CONTENT);
        assert_eq!(fs::read(folder.join(MARKER_SHORTCUT_NAME)).unwrap(), SHORTCUT_BYTES);
        assert_eq!(fx.attrs.snapshot().get(&folder), Some(&Attributes::READ_ONLY));
        assert!(fx.staging_entries().is_empty());
    }

    #[test]
    fn failed_restage_leaves_no_sibling_behind() {
        fn never_renames(_from: &Path, _to: &Path) -> io::Result<()> {
            Err(io::Error::from_raw_os_error(CROSS_DEVICE))
        }
        let fx = Fixture::new();
        let shortcut = fx.shortcut("Docs.lnk");

        let err = Materializer::new(&fx.ctx, fx.options(false))
            .with_rename(never_renames)
            .materialize(&shortcut)
            .unwrap_err();

        assert_eq!(err.stage, Stage::Move);
        assert_eq!(sorted_names(&fx.dir.path().join("root")), vec!["Docs.lnk".to_string()]);
        assert_eq!(fs::read(&shortcut).unwrap(), SHORTCUT_BYTES);
        assert_eq!(fx.staging_entries(), vec![err.orphan.clone().unwrap()]);
    }

    #[test]
    fn unusable_staging_area_fails_at_create() {
        let fx = Fixture::new();
        let shortcut = fx.shortcut("Docs.lnk");
        fs::write(fx.staging(), "not a folder").unwrap();

        let err = Materializer::new(&fx.ctx, fx.options(false)).materialize(&shortcut).unwrap_err();

        assert_eq!(err.stage, Stage::Create);
        assert!(err.orphan.is_none());
        assert!(shortcut.exists());
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let fx = Fixture::new();
        let good = fx.shortcut("Music.lnk");
        let blocked = fx.shortcut("Docs.lnk");
        fs::create_dir(fx.dir.path().join("root").join("Docs")).unwrap();
        let batch: Vec<ClassifiedShortcut> = [&blocked, &good]
            .iter()
            .map(|p| ClassifiedShortcut {
                shortcut: (*p).clone(),
                target: PathBuf::from("C:\\Somewhere"),
                target_is_existing_folder: true,
            })
            .collect();

        let outcomes = Materializer::new(&fx.ctx, fx.options(false)).materialize_all(&batch);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].shortcut, blocked);
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].result.as_ref().unwrap(), &fx.dir.path().join("root").join("Music"));
        assert!(blocked.exists());
        assert!(!good.exists());
    }

    #[test]
    fn destination_drops_only_the_last_extension() {
        assert_eq!(
            destination_for(Path::new("/r/archive.tar.lnk")),
            Some(PathBuf::from("/r/archive.tar"))
        );
        assert_eq!(destination_for(Path::new("/r/Docs.LNK")), Some(PathBuf::from("/r/Docs")));
    }

    #[test]
    fn recognises_cross_device_errors() {
        assert!(is_cross_device(&io::Error::from_raw_os_error(CROSS_DEVICE)));
        assert!(!is_cross_device(&io::Error::other("x")));
    }
}
