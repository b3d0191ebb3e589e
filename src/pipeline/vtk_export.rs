//! Writes a grid and selected fields to legacy VTK files.

use super::{FieldSelector, Pipeline, PipelineContext, Verdict, trigger::Trigger};
use crate::coproc_error::CoProcessingError;
use crate::description::DataDescription;
use crate::io::vtk::VtkWriter;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default output file name: grid name, rank and zero-padded step.
pub const DEFAULT_FILE_TEMPLATE: &str = "%g_r%r_%t.vtk";

/// Exports one grid (geometry plus the selected fields) when its trigger fires.
///
/// File names come from a template: `%g` is the grid name, `%t` the time
/// step padded to six digits and `%r` the rank. Files land in the working
/// directory handed over at initialization. Ranks of a parallel run share
/// that directory, so there the template must also contain `%r`.
#[derive(Debug)]
pub struct VtkExportPipeline {
    name: String,
    grid: String,
    fields: Vec<FieldSelector>,
    trigger: Trigger,
    template: String,
    output_dir: PathBuf,
    rank: usize,
    written: Arc<Mutex<Vec<PathBuf>>>,
}

impl VtkExportPipeline {
    pub fn new(
        name: impl Into<String>,
        grid: impl Into<String>,
        fields: Vec<FieldSelector>,
        trigger: Trigger,
    ) -> Result<Self, CoProcessingError> {
        trigger.validate()?;
        Ok(Self {
            name: name.into(),
            grid: grid.into(),
            fields,
            trigger,
            template: DEFAULT_FILE_TEMPLATE.into(),
            output_dir: PathBuf::from("."),
            rank: 0,
            written: Arc::default(),
        })
    }

    /// Replace the file name template.
    ///
    /// # Errors
    /// `InvalidConfig` for an empty template or one without `%t` (every step
    /// would overwrite the same file).
    pub fn with_file_template(mut self, template: impl Into<String>) -> Result<Self, CoProcessingError> {
        let template = template.into();
        if template.trim().is_empty() || !template.contains("%t") {
            return Err(CoProcessingError::InvalidConfig(format!(
                "VTK file template `{template}` must contain `%t`"
            )));
        }
        self.template = template;
        Ok(self)
    }

    /// Handle onto the list of files written so far.
    pub fn written_files(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.written)
    }

    /// Path of the file for `time_step`.
    pub fn file_path(&self, time_step: u64) -> PathBuf {
        let file = self
            .template
            .replace("%g", &self.grid)
            .replace("%t", &format!("{time_step:06}"))
            .replace("%r", &self.rank.to_string());
        self.output_dir.join(file)
    }

    fn write_file(&self, path: &Path, desc: &DataDescription<'_>) -> Result<(), CoProcessingError> {
        let grid = desc.try_grid(&self.grid)?;
        let title = format!("{} step {} time {}", self.grid, desc.time_step(), desc.time());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        VtkWriter::with_title(title).write(file, grid)
    }
}

impl Pipeline for VtkExportPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, ctx: &PipelineContext) -> Result<(), CoProcessingError> {
        if ctx.size > 1 && !self.template.contains("%r") {
            return Err(CoProcessingError::InvalidConfig(format!(
                "VTK file template `{}` needs `%r` on {} ranks",
                self.template, ctx.size
            )));
        }
        fs::create_dir_all(&ctx.working_directory)?;
        self.output_dir = ctx.working_directory.clone();
        self.rank = ctx.rank;
        Ok(())
    }

    fn request_data_description(
        &mut self,
        desc: &mut DataDescription<'_>,
    ) -> Result<Verdict, CoProcessingError> {
        if !self.trigger.fires(desc.time_step(), desc.time()) {
            return Ok(Verdict::Decline);
        }
        let grid = desc.try_grid_mut(&self.grid)?;
        grid.set_needed(true);
        for field in &self.fields {
            field.request(grid)?;
        }
        Ok(Verdict::Act)
    }

    fn co_process(&mut self, desc: &DataDescription<'_>) -> Result<(), CoProcessingError> {
        if !desc.try_grid(&self.grid)?.is_needed() {
            return Ok(());
        }
        let path = self.file_path(desc.time_step());
        self.write_file(&path, desc)?;
        log::info!("[{}] wrote {}", self.name, path.display());
        self.written.lock().push(path);
        Ok(())
    }
}
