//! JSON configuration for a co-processing session.
//!
//! ```json
//! {
//!   "working_directory": "out",
//!   "pipelines": [
//!     { "kind": "field_statistics", "name": "p-stats", "grid": "fluid",
//!       "field": { "name": "pressure", "association": "point" },
//!       "trigger": { "type": "every_n_steps", "frequency": 10 } },
//!     { "kind": "vtk_export", "name": "dump", "grid": "fluid",
//!       "fields": [{ "name": "pressure" }],
//!       "trigger": { "type": "steps", "steps": [0, 100] } }
//!   ]
//! }
//! ```

use crate::comm::Communicator;
use crate::coproc_error::CoProcessingError;
use crate::pipeline::vtk_export::DEFAULT_FILE_TEMPLATE;
use crate::pipeline::{
    FieldSelector, FieldStatisticsPipeline, GeometrySummaryPipeline, Pipeline, Trigger,
    VtkExportPipeline,
};
use crate::processor::Processor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

fn default_template() -> String {
    DEFAULT_FILE_TEMPLATE.to_owned()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoProcessingConfig {
    /// Output root handed to pipelines; current directory when absent.
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    /// OR-reduce the request verdict across ranks.
    #[serde(default = "default_true")]
    pub global_verdict: bool,
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

impl Default for CoProcessingConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            global_verdict: true,
            pipelines: Vec::new(),
        }
    }
}

/// One built-in pipeline definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum PipelineConfig {
    FieldStatistics {
        name: String,
        grid: String,
        field: FieldSelector,
        trigger: Trigger,
    },
    GeometrySummary {
        name: String,
        grid: String,
        trigger: Trigger,
    },
    VtkExport {
        name: String,
        grid: String,
        #[serde(default)]
        fields: Vec<FieldSelector>,
        trigger: Trigger,
        #[serde(default = "default_template")]
        file_name: String,
    },
}

impl PipelineConfig {
    pub fn name(&self) -> &str {
        match self {
            PipelineConfig::FieldStatistics { name, .. }
            | PipelineConfig::GeometrySummary { name, .. }
            | PipelineConfig::VtkExport { name, .. } => name,
        }
    }

    fn grid(&self) -> &str {
        match self {
            PipelineConfig::FieldStatistics { grid, .. }
            | PipelineConfig::GeometrySummary { grid, .. }
            | PipelineConfig::VtkExport { grid, .. } => grid,
        }
    }

    fn trigger(&self) -> &Trigger {
        match self {
            PipelineConfig::FieldStatistics { trigger, .. }
            | PipelineConfig::GeometrySummary { trigger, .. }
            | PipelineConfig::VtkExport { trigger, .. } => trigger,
        }
    }

    pub fn validate(&self) -> Result<(), CoProcessingError> {
        if self.name().trim().is_empty() {
            return Err(CoProcessingError::InvalidConfig(
                "pipeline name must not be empty".into(),
            ));
        }
        if self.grid().trim().is_empty() {
            return Err(CoProcessingError::InvalidConfig(format!(
                "pipeline `{}` names no grid",
                self.name()
            )));
        }
        match self {
            PipelineConfig::FieldStatistics { field, .. } if field.name.trim().is_empty() => {
                return Err(CoProcessingError::InvalidConfig(format!(
                    "pipeline `{}` names no field",
                    self.name()
                )));
            }
            PipelineConfig::VtkExport { file_name, .. } if !file_name.contains("%t") => {
                return Err(CoProcessingError::InvalidConfig(format!(
                    "pipeline `{}`: file name `{file_name}` must contain `%t`",
                    self.name()
                )));
            }
            _ => {}
        }
        self.trigger().validate()
    }

    /// Construct the configured pipeline.
    pub fn build(&self) -> Result<Box<dyn Pipeline>, CoProcessingError> {
        self.validate()?;
        Ok(match self {
            PipelineConfig::FieldStatistics {
                name,
                grid,
                field,
                trigger,
            } => Box::new(FieldStatisticsPipeline::new(
                name.as_str(),
                grid.as_str(),
                field.clone(),
                trigger.clone(),
            )?),
            PipelineConfig::GeometrySummary {
                name,
                grid,
                trigger,
            } => Box::new(GeometrySummaryPipeline::new(
                name.as_str(),
                grid.as_str(),
                trigger.clone(),
            )?),
            PipelineConfig::VtkExport {
                name,
                grid,
                fields,
                trigger,
                file_name,
            } => Box::new(
                VtkExportPipeline::new(name.as_str(), grid.as_str(), fields.clone(), trigger.clone())?
                    .with_file_template(file_name.as_str())?,
            ),
        })
    }
}

impl CoProcessingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CoProcessingError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoProcessingError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoProcessingError::Io(format!("reading {}: {e}", path.display()))
        })?;
        log::debug!("loaded co-processing config from {}", path.display());
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, CoProcessingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), CoProcessingError> {
        if let Some(dir) = &self.working_directory {
            if dir.as_os_str().is_empty() {
                return Err(CoProcessingError::InvalidConfig(
                    "working_directory must not be empty".into(),
                ));
            }
        }
        self.pipelines.iter().try_for_each(PipelineConfig::validate)
    }

    /// Build every configured pipeline, in file order.
    pub fn build_pipelines(&self) -> Result<Vec<Box<dyn Pipeline>>, CoProcessingError> {
        self.pipelines.iter().map(PipelineConfig::build).collect()
    }
}

impl<C: Communicator> Processor<C> {
    /// A processor (not yet initialized) with the configured settings and
    /// pipelines registered in file order.
    pub fn from_config(config: &CoProcessingConfig) -> Result<Self, CoProcessingError> {
        config.validate()?;
        let mut processor = Self::new().with_global_verdict(config.global_verdict);
        if let Some(dir) = &config.working_directory {
            processor = processor.with_working_directory(dir);
        }
        for pipeline in config.build_pipelines()? {
            processor.add_boxed_pipeline(pipeline)?;
        }
        Ok(processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::NoComm;

    const SAMPLE: &str = r#"{
        "working_directory": "out",
        "pipelines": [
            { "kind": "field_statistics", "name": "p-stats", "grid": "fluid",
              "field": { "name": "pressure", "association": "point" },
              "trigger": { "type": "every_n_steps", "frequency": 10 } },
            { "kind": "geometry_summary", "name": "shape", "grid": "fluid",
              "trigger": { "type": "always" } },
            { "kind": "vtk_export", "name": "dump", "grid": "fluid",
              "trigger": { "type": "steps", "steps": [0, 100] } }
        ]
    }"#;

    #[test]
    fn parses_sample_with_defaults() {
        let cfg = CoProcessingConfig::from_json_str(SAMPLE).unwrap();
        assert!(cfg.global_verdict);
        assert_eq!(cfg.working_directory, Some(PathBuf::from("out")));
        assert_eq!(cfg.pipelines.len(), 3);
        match &cfg.pipelines[2] {
            PipelineConfig::VtkExport { fields, file_name, .. } => {
                assert!(fields.is_empty());
                assert_eq!(file_name, DEFAULT_FILE_TEMPLATE);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn registers_in_file_order() {
        let cfg = CoProcessingConfig::from_json_str(SAMPLE).unwrap();
        let p = Processor::<NoComm>::from_config(&cfg).unwrap();
        assert_eq!(p.pipeline_names(), ["p-stats", "shape", "dump"]);
        assert_eq!(p.working_directory(), Path::new("out"));
    }

    #[test]
    fn zero_frequency_is_rejected() {
        let json = r#"{ "pipelines": [ { "kind": "geometry_summary", "name": "g",
            "grid": "fluid", "trigger": { "type": "every_n_steps", "frequency": 0 } } ] }"#;
        assert!(matches!(
            CoProcessingConfig::from_json_str(json),
            Err(CoProcessingError::InvalidTrigger(_))
        ));
    }

    #[test]
    fn empty_name_is_rejected() {
        let json = r#"{ "pipelines": [ { "kind": "geometry_summary", "name": " ",
            "grid": "fluid", "trigger": { "type": "always" } } ] }"#;
        assert!(matches!(
            CoProcessingConfig::from_json_str(json),
            Err(CoProcessingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_kind_is_a_serialization_error() {
        let json = r#"{ "pipelines": [ { "kind": "render", "name": "r" } ] }"#;
        assert!(matches!(
            CoProcessingConfig::from_json_str(json),
            Err(CoProcessingError::Serialization(_))
        ));
    }

    #[test]
    fn survives_json_round_trip() {
        let cfg = CoProcessingConfig::from_json_str(SAMPLE).unwrap();
        let again = CoProcessingConfig::from_json_str(&cfg.to_json_string().unwrap()).unwrap();
        assert_eq!(cfg, again);
    }
}
