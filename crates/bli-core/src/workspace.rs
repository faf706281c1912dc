//! Build directory preparation
//!
//! Pulumi never runs in the user's work directory. Each stack command copies
//! the work directory into `<work>/build/`, renders `Pulumi.yaml` there and
//! points `PULUMI_HOME` at `<work>/build/.pulumi/`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pattern;
use crate::templates::{RenderContext, TemplateRenderer};

pub const BUILD_DIR_NAME: &str = "build";
pub const PULUMI_HOME_DIR_NAME: &str = ".pulumi";
pub const PROJECT_FILE_NAME: &str = "Pulumi.yaml";
pub const FIXED_STATE_FILE_NAME: &str = "fixed-state.json";

/// How a failed Pulumi.yaml render is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFailure {
    /// Propagate the template error
    Fail,
    /// Copy the unprocessed file into the build directory
    CopyRaw,
}

/// Paths used by one stack command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildWorkspace {
    work_dir: PathBuf,
    build_dir: PathBuf,
    pulumi_home: PathBuf,
}

impl BuildWorkspace {
    pub fn new(work_dir: &Path) -> Self {
        let build_dir = work_dir.join(BUILD_DIR_NAME);
        let pulumi_home = build_dir.join(PULUMI_HOME_DIR_NAME);
        Self {
            work_dir: work_dir.to_path_buf(),
            build_dir,
            pulumi_home,
        }
    }

    /// Workspace for `destroy`: an existing `<work>/.pulumi` holds older state and wins
    pub fn for_destroy(work_dir: &Path) -> Self {
        let mut workspace = Self::new(work_dir);
        let legacy_home = work_dir.join(PULUMI_HOME_DIR_NAME);
        if legacy_home.is_dir() {
            debug!("Using existing Pulumi home {}", legacy_home.display());
            workspace.pulumi_home = legacy_home;
        }
        workspace
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn pulumi_home(&self) -> &Path {
        &self.pulumi_home
    }

    /// Rendered project file Pulumi reads
    pub fn project_file(&self) -> PathBuf {
        self.build_dir.join(PROJECT_FILE_NAME)
    }

    /// Where repaired state is written before `pulumi stack import`
    pub fn fixed_state_file(&self) -> PathBuf {
        self.build_dir.join(FIXED_STATE_FILE_NAME)
    }

    pub fn create_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.build_dir)?;
        fs::create_dir_all(&self.pulumi_home)?;
        Ok(())
    }

    /// Copy `Pulumi.*` files (project and stack configs) into the build directory
    pub fn copy_pulumi_files(&self) -> usize {
        let mut copied = 0;
        for path in pattern::matching(&self.work_dir, "Pulumi.*")
            .into_iter()
            .filter(|p| p.is_file())
        {
            if self.copy_into_build(&path) {
                copied += 1;
            }
        }
        copied
    }

    /// Copy every regular file except `Pulumi.yaml` into the build directory
    ///
    /// Individual copy failures are logged and skipped.
    pub fn copy_sources(&self) -> Result<usize> {
        let mut copied = 0;
        for entry in fs::read_dir(&self.work_dir)? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !path.is_file() || entry.file_name() == PROJECT_FILE_NAME {
                continue;
            }
            if self.copy_into_build(&path) {
                copied += 1;
            }
        }
        Ok(copied)
    }

    /// Render `<work>/Pulumi.yaml` into the build directory
    ///
    /// Returns `false` when the work directory has no Pulumi.yaml.
    pub fn render_project(
        &self,
        renderer: &TemplateRenderer,
        context: &RenderContext,
        on_failure: RenderFailure,
    ) -> Result<bool> {
        let source = self.work_dir.join(PROJECT_FILE_NAME);
        if !source.is_file() {
            return Ok(false);
        }
        let dest = self.project_file();

        match renderer.render_file(&source, &dest, context) {
            Ok(()) => Ok(true),
            Err(e) if on_failure == RenderFailure::CopyRaw => {
                warn!("Error rendering template: {}. Copying Pulumi.yaml unprocessed.", e);
                fs::copy(&source, &dest)?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Create directories, copy sources and render the project file
    pub fn prepare(
        &self,
        renderer: &TemplateRenderer,
        context: &RenderContext,
        on_failure: RenderFailure,
    ) -> Result<()> {
        self.create_dirs()?;
        self.copy_pulumi_files();
        let copied = self.copy_sources()?;
        debug!("Copied {} file(s) into {}", copied, self.build_dir.display());
        self.render_project(renderer, context, on_failure)?;
        Ok(())
    }

    /// Write the minimal fallback project when the build directory has none
    ///
    /// Returns `true` when a file was written.
    pub fn ensure_project_file(&self, renderer: &TemplateRenderer) -> Result<bool> {
        let path = self.project_file();
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(&self.build_dir)?;
        fs::write(&path, renderer.fallback_project_file()?)?;
        info!("No Pulumi.yaml found in {}. Created a minimal one.", self.build_dir.display());
        Ok(true)
    }

    /// `<home>/stacks/<stack>/stack.json` exists
    pub fn has_stack_state(&self, stack: &str) -> bool {
        self.pulumi_home
            .join("stacks")
            .join(stack)
            .join("stack.json")
            .is_file()
    }

    /// Search `<home>/stacks/*<stack>*` for a state file or a directory holding one
    pub fn find_stack_state(&self, stack: &str) -> Option<PathBuf> {
        let stacks_dir = self.pulumi_home.join("stacks");
        let candidates = format!("*{}*", glob::Pattern::escape(stack));

        for path in pattern::matching(&stacks_dir, &candidates) {
            if path.is_file() && path.to_string_lossy().contains("stack.json") {
                return Some(path);
            }
            if path.is_dir() {
                let state = path.join("stack.json");
                if state.is_file() {
                    return Some(state);
                }
            }
        }
        None
    }

    fn copy_into_build(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        match fs::copy(path, self.build_dir.join(name)) {
            Ok(_) => {
                debug!("Copied file: {}", name.to_string_lossy());
                true
            }
            Err(e) => {
                warn!("Warning copying {}: {}", name.to_string_lossy(), e);
                false
            }
        }
    }
}
