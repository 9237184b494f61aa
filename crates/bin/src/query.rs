//! Query and input arguments shared by subcommands.

use clap::Args;
use inslens_data::{Dimension, PeriodType, ReportingForm, ValueType, YearQuarter};
use inslens_pipeline::{InputFrames, InsurerSelection, PipelineConfig, QueryParams};
use std::error::Error;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Input tables, one CSV per reporting form.
#[derive(Debug, Args)]
pub(crate) struct DataArgs {
    /// CSV of form 0420158
    #[arg(long = "form158", value_name = "CSV")]
    pub(crate) form158: Option<PathBuf>,

    /// CSV of form 0420162
    #[arg(long = "form162", value_name = "CSV")]
    pub(crate) form162: Option<PathBuf>,
}

impl DataArgs {
    pub(crate) fn paths(&self) -> Vec<(ReportingForm, &Path)> {
        [
            (ReportingForm::Form158, self.form158.as_deref()),
            (ReportingForm::Form162, self.form162.as_deref()),
        ]
        .into_iter()
        .filter_map(|(form, path)| path.map(|p| (form, p)))
        .collect()
    }

    pub(crate) fn load(&self) -> CliResult<InputFrames> {
        let paths = self.paths();
        if paths.is_empty() {
            return Err("no input tables given; pass --form158 and/or --form162".into());
        }
        Ok(InputFrames::load(paths)?)
    }
}

/// Query parameters. Flags override the values of `--query`.
#[derive(Debug, Default, Args)]
pub(crate) struct QueryArgs {
    /// JSON file with query parameters
    #[arg(long, value_name = "JSON")]
    pub(crate) query: Option<PathBuf>,

    /// Reporting form (0420158 or 0420162)
    #[arg(long)]
    pub(crate) form: Option<ReportingForm>,

    /// Last quarter, e.g. 2024Q3
    #[arg(long)]
    pub(crate) end: Option<YearQuarter>,

    /// Period type: qoq, ytd, yoy-q, yoy-y, mat or cumulative_sum
    #[arg(long)]
    pub(crate) period: Option<PeriodType>,

    /// Number of periods, 1 to 6
    #[arg(long)]
    pub(crate) periods: Option<usize>,

    /// Line codes
    #[arg(long, value_delimiter = ',')]
    pub(crate) lines: Vec<String>,

    /// Metric codes
    #[arg(long, value_delimiter = ',')]
    pub(crate) metrics: Vec<String>,

    /// Insurer codes, `total`, `all_insurers` or `top-N`
    #[arg(long, value_delimiter = ',')]
    pub(crate) insurers: Vec<String>,

    /// Value types
    #[arg(long = "value-types", value_delimiter = ',')]
    pub(crate) value_types: Vec<ValueType>,

    /// Row dimensions
    #[arg(long, value_delimiter = ',')]
    pub(crate) index: Vec<Dimension>,

    /// Column dimensions
    #[arg(long, value_delimiter = ',')]
    pub(crate) pivot: Vec<Dimension>,

    /// Segment dimensions
    #[arg(long, value_delimiter = ',')]
    pub(crate) split: Vec<Dimension>,
}

impl QueryArgs {
    pub(crate) fn params(&self) -> CliResult<QueryParams> {
        let mut params: QueryParams = match &self.query {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => QueryParams::default(),
        };
        if let Some(form) = self.form {
            params.reporting_form = form;
        }
        if let Some(end) = self.end {
            params.end_quarter = end;
        }
        if let Some(period) = self.period {
            params.period_type = period;
        }
        if let Some(n) = self.periods {
            params.num_periods = n;
        }
        if !self.lines.is_empty() {
            params.lines.clone_from(&self.lines);
        }
        if !self.metrics.is_empty() {
            params.metrics.clone_from(&self.metrics);
        }
        if !self.insurers.is_empty() {
            params.insurers = InsurerSelection::from(self.insurers.clone());
        }
        if !self.value_types.is_empty() {
            params.value_types.clone_from(&self.value_types);
        }
        if !self.index.is_empty() {
            params.index_cols.clone_from(&self.index);
        }
        if !self.pivot.is_empty() {
            params.pivot_cols.clone_from(&self.pivot);
        }
        if !self.split.is_empty() {
            params.split_cols.clone_from(&self.split);
        }
        Ok(params)
    }
}

/// Default location of the pipeline configuration.
pub(crate) fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inslens")
        .join("config.json")
}

/// Pipeline configuration from `path`, the default location, or defaults.
pub(crate) fn load_config(path: Option<&Path>) -> CliResult<PipelineConfig> {
    match path {
        Some(path) => Ok(PipelineConfig::load(path)?),
        None => {
            let default = default_config_path();
            if default.exists() {
                Ok(PipelineConfig::load(default)?)
            } else {
                Ok(PipelineConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_flags_override_defaults() {
        let args = QueryArgs {
            period: Some(PeriodType::Mat),
            lines: vec!["auto".to_string()],
            insurers: vec!["top-10".to_string()],
            value_types: vec![ValueType::Base, ValueType::Rank],
            ..QueryArgs::default()
        };
        let params = args.params().unwrap();
        assert_eq!(params.period_type, PeriodType::Mat);
        assert_eq!(params.lines, vec!["auto"]);
        assert_eq!(params.insurers, InsurerSelection::TopN(10));
        assert_eq!(params.value_types, vec![ValueType::Base, ValueType::Rank]);
        assert_eq!(params.metrics, QueryParams::default().metrics);
    }

    #[rstest]
    #[case(None, None, 0)]
    #[case(Some("a.csv"), None, 1)]
    #[case(Some("a.csv"), Some("b.csv"), 2)]
    fn test_data_paths(#[case] f158: Option<&str>, #[case] f162: Option<&str>, #[case] n: usize) {
        let args = DataArgs {
            form158: f158.map(PathBuf::from),
            form162: f162.map(PathBuf::from),
        };
        assert_eq!(args.paths().len(), n);
    }

    #[test]
    fn test_config_path_ends_with_app_dir() {
        assert!(default_config_path().ends_with("inslens/config.json"));
    }
}
