//! # Task Loader Module
//!
//! Reads a cascade design task from a JSON file and writes the designed cascade back as a
//! pretty-printed JSON report.
//!
//! ## Task file
//! ```json
//! {
//!   "centrifuge": { "peripheral_velocity": 485.0, "height": 0.5, ... },
//!   "feed_assay": 0.0071, "product_assay": 0.035, "tail_assay": 0.001,
//!   "max_feed": 2.8e-4, "max_centrifuges": 5000,
//!   "settings": { "precision": 1e-12 },
//!   "period": 2626560.0
//! }
//! ```
//! `centrifuge` defaults to the reference machine, `settings` and `period` are optional.
use crate::Cascade::cascade_builder::check_design_assays;
use crate::Cascade::cascade_designer::{Cascade, DeclaredCapacity, StageRow};
use crate::Cascade::cascade_settings::DesignSettings;
use crate::Centrifuge::centrifuge_model::CentrifugeSpec;
use crate::cascade_errors::{CascadeError, CascadeResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One 30.4-day month, s
pub const DEFAULT_PERIOD: f64 = 30.4 * 86400.0;

fn default_period() -> f64 {
    DEFAULT_PERIOD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeTask {
    #[serde(default)]
    pub centrifuge: CentrifugeSpec,
    pub feed_assay: f64,
    pub product_assay: f64,
    pub tail_assay: f64,
    /// uranium feed rate the cascade should process if the budget allows, kg/s
    pub max_feed: f64,
    pub max_centrifuges: usize,
    #[serde(default)]
    pub settings: Option<DesignSettings>,
    /// accounting period of the declared capacities, s
    #[serde(default = "default_period")]
    pub period: f64,
}

impl CascadeTask {
    pub fn validate(&self) -> CascadeResult<()> {
        self.centrifuge.validate()?;
        check_design_assays(self.feed_assay, self.product_assay, self.tail_assay)?;
        if !(self.max_feed.is_finite() && self.max_feed > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "max_feed must be positive, got {}",
                self.max_feed
            )));
        }
        if self.max_centrifuges == 0 {
            return Err(CascadeError::InvalidParameter(
                "max_centrifuges must be at least 1".to_string(),
            ));
        }
        if !(self.period.is_finite() && self.period > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "period must be positive, got {}",
                self.period
            )));
        }
        if let Some(settings) = &self.settings {
            settings.validate()?;
        }
        Ok(())
    }

    pub fn design_settings(&self) -> DesignSettings {
        self.settings.clone().unwrap_or_default()
    }

    /// Builds and sizes the cascade described by the task
    pub fn run(&self) -> CascadeResult<Cascade> {
        self.validate()?;
        Cascade::construct_with_settings(
            self.centrifuge.clone(),
            self.feed_assay,
            self.product_assay,
            self.tail_assay,
            self.max_feed,
            self.max_centrifuges,
            self.design_settings(),
        )
    }
}

/// Loads and validates a task file
pub fn load_task(file_name: &str) -> CascadeResult<CascadeTask> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(CascadeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File '{}' does not exist", file_name),
        )));
    }
    let content = fs::read_to_string(path)?;
    let task: CascadeTask = serde_json::from_str(&content)?;
    task.validate()?;
    info!("task loaded from {}", file_name);
    Ok(task)
}

/// Serializable summary of a designed cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub feed_assay: f64,
    pub product_assay: f64,
    pub tail_assay: f64,
    pub n_enrich: usize,
    pub n_strip: usize,
    pub feed_flow: f64,
    pub product_flow: f64,
    pub tail_flow: f64,
    pub machines: usize,
    pub alpha_ref: f64,
    pub delta_u_ref: f64,
    pub capacity: DeclaredCapacity,
    pub stages: Vec<StageRow>,
}

impl CascadeReport {
    pub fn from_cascade(cascade: &Cascade, period: f64) -> Self {
        Self {
            feed_assay: cascade.feed_assay,
            product_assay: cascade.product_assay,
            tail_assay: cascade.tail_assay,
            n_enrich: cascade.n_enrich,
            n_strip: cascade.n_strip,
            feed_flow: cascade.feed_flow,
            product_flow: cascade.product_flow,
            tail_flow: cascade.tail_flow,
            machines: cascade.n_machines,
            alpha_ref: cascade.alpha_ref,
            delta_u_ref: cascade.delta_u_ref,
            capacity: cascade.declared_capacity(period),
            stages: cascade.stage_table(),
        }
    }

    pub fn save(&self, file_name: &str) -> CascadeResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(file_name, content)?;
        info!("report saved to {}", file_name);
        Ok(())
    }

    pub fn load(file_name: &str) -> CascadeResult<Self> {
        let content = fs::read_to_string(file_name)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TASK: &str = r#"{
        "feed_assay": 0.1,
        "product_assay": 0.2,
        "tail_assay": 0.05,
        "max_feed": 2.8135660331384015e-4,
        "max_centrifuges": 80,
        "settings": { "precision": 1e-12 }
    }"#;

    #[test]
    fn test_load_task_with_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", TASK).unwrap();
        let file_path = temp_file.path().to_str().unwrap();

        let task = load_task(file_path).unwrap();
        assert_eq!(task.centrifuge, CentrifugeSpec::default());
        assert_eq!(task.max_centrifuges, 80);
        assert_eq!(task.period, DEFAULT_PERIOD);
        let settings = task.design_settings();
        assert_eq!(settings.precision, 1e-12);
        assert_eq!(settings.max_stages, DesignSettings::default().max_stages);
        assert_eq!(settings.cascade_cut, 0.5);
    }

    #[test]
    fn test_run_task_and_save_report() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", TASK).unwrap();
        let task = load_task(temp_file.path().to_str().unwrap()).unwrap();
        let cascade = task.run().unwrap();
        assert_eq!(cascade.machine_count(), 80);
        assert!((cascade.feed_flow() - 1.301e-5).abs() < 1e-6);

        let report = CascadeReport::from_cascade(&cascade, task.period);
        assert_eq!(report.stages.len(), 10);
        assert_eq!(report.machines, report.stages.iter().map(|r| r.machines).sum::<usize>());

        let report_file = NamedTempFile::new().unwrap();
        let report_path = report_file.path().to_str().unwrap();
        report.save(report_path).unwrap();
        let restored = CascadeReport::load(report_path).unwrap();
        assert_eq!(restored.n_enrich, 6);
        assert_eq!(restored.n_strip, 4);
        assert_eq!(restored.stages[0].index, -4);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_task("no_such_cascade_task.json"),
            Err(CascadeError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_and_invalid_tasks() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{{ \"feed_assay\": 0.1 ").unwrap();
        assert!(matches!(
            load_task(temp_file.path().to_str().unwrap()),
            Err(CascadeError::Json(_))
        ));

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", TASK.replace("\"tail_assay\": 0.05", "\"tail_assay\": 0.15"))
            .unwrap();
        assert!(matches!(
            load_task(temp_file.path().to_str().unwrap()),
            Err(CascadeError::InvalidParameter(_))
        ));
    }
}
