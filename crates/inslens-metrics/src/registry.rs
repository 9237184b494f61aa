//! Metric Registry
//!
//! Validated lookup of metric definitions and dependency-ordered resolution of
//! user selections.

use crate::standard::standard_definitions;
use crate::{MetricDefinition, MetricError, MetricKind, Result};
use inslens_data::ReportingForm;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, error};

/// Registry of metric definitions keyed by code.
///
/// Every registry is acyclic and closed: each dependency names a defined
/// metric. Both properties are checked whenever definitions change.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    definitions: Vec<MetricDefinition>,
    index: HashMap<String, usize>,
}

impl MetricRegistry {
    /// Build a registry, rejecting duplicates, dangling dependencies and cycles.
    pub fn from_definitions(definitions: Vec<MetricDefinition>) -> Result<Self> {
        let registry = Self::indexed(definitions)?;
        registry.validate()?;
        Ok(registry)
    }

    /// The standard form 0420158/0420162 registry, validated like any other.
    pub fn try_standard() -> Result<Self> {
        Self::from_definitions(standard_definitions())
    }

    /// The standard registry, validated once per process.
    ///
    /// A standard table that fails validation is logged and replaced by an
    /// empty registry, so every later metric lookup reports it as unknown.
    pub fn standard() -> Self {
        static STANDARD: OnceLock<MetricRegistry> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                Self::try_standard().unwrap_or_else(|e| {
                    error!(error = %e, "standard metric table is invalid");
                    Self::default()
                })
            })
            .clone()
    }

    /// Load additional definitions from a JSON array and register them on top
    /// of the standard set.
    pub fn standard_with_extensions(path: impl AsRef<Path>) -> Result<Self> {
        let extra: Vec<MetricDefinition> =
            serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let mut registry = Self::try_standard()?;
        for definition in extra {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    fn indexed(definitions: Vec<MetricDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.code.clone(), i).is_some() {
                return Err(MetricError::DuplicateMetric(def.code.clone()));
            }
        }
        Ok(Self { definitions, index })
    }

    fn validate(&self) -> Result<()> {
        for def in &self.definitions {
            for dep in def.formula.dependencies() {
                if !self.index.contains_key(dep) {
                    return Err(MetricError::DanglingDependency {
                        metric: def.code.clone(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }

        // 0 = unvisited, 1 = on stack, 2 = done
        let mut state: HashMap<&str, u8> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        for def in &self.definitions {
            self.visit_acyclic(&def.code, &mut state, &mut stack)?;
        }
        Ok(())
    }

    fn visit_acyclic<'a>(
        &'a self,
        code: &'a str,
        state: &mut HashMap<&'a str, u8>,
        stack: &mut Vec<&'a str>,
    ) -> Result<()> {
        match state.get(code).copied().unwrap_or(0) {
            2 => return Ok(()),
            1 => {
                let start = stack.iter().position(|c| *c == code).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|c| (*c).to_string()).collect();
                cycle.push(code.to_string());
                return Err(MetricError::CycleInRegistry(cycle));
            }
            _ => {}
        }
        state.insert(code, 1);
        stack.push(code);
        if let Some(def) = self.get(code) {
            for dep in def.formula.dependencies() {
                self.visit_acyclic(dep, state, stack)?;
            }
        }
        stack.pop();
        state.insert(code, 2);
        Ok(())
    }

    /// Add or replace a definition. The registry is unchanged if the result
    /// would be invalid.
    pub fn register(&mut self, definition: MetricDefinition) -> Result<()> {
        let mut candidate = self.clone();
        if let Some(&i) = candidate.index.get(&definition.code) {
            candidate.definitions[i] = definition;
        } else {
            candidate
                .index
                .insert(definition.code.clone(), candidate.definitions.len());
            candidate.definitions.push(definition);
        }
        candidate.validate()?;
        debug!(metrics = candidate.len(), "registered metric definition");
        *self = candidate;
        Ok(())
    }

    /// Definition by code.
    pub fn get(&self, code: &str) -> Option<&MetricDefinition> {
        self.index.get(code).map(|&i| &self.definitions[i])
    }

    /// Whether `code` is defined.
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// All definitions in registration order.
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Definitions applicable to a reporting form.
    pub fn for_form(&self, form: ReportingForm) -> Vec<&MetricDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.applies_to(form))
            .collect()
    }

    /// Kind of a metric. Codes passed through from the input count as values.
    pub fn kind_of(&self, code: &str) -> MetricKind {
        self.get(code).map_or(MetricKind::Value, |d| d.kind)
    }

    /// Whether market-share rows are meaningful for `code`.
    pub fn is_market_share_eligible(&self, code: &str) -> bool {
        self.kind_of(code).is_additive()
    }

    /// Whether insurers are ranked on `code`.
    pub fn is_rankable(&self, code: &str) -> bool {
        self.kind_of(code).is_additive()
    }

    /// Display label, the code itself when unknown.
    pub fn label<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).map_or(code, |d| d.label.as_str())
    }

    /// Count of definitions per kind.
    pub fn count_by_kind(&self) -> HashMap<MetricKind, usize> {
        let mut counts = HashMap::new();
        for def in &self.definitions {
            *counts.entry(def.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Metrics to materialize for `selected`, dependencies first.
    ///
    /// Each code appears once. Codes without a definition are kept in place
    /// when `available` (the metrics present in the input) contains them;
    /// otherwise resolution fails with [`MetricError::UnknownMetric`].
    pub fn required_metrics(
        &self,
        selected: &[String],
        available: &HashSet<String>,
    ) -> Result<Vec<String>> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        for code in selected {
            self.push_with_dependencies(code, available, &mut seen, &mut ordered)?;
        }
        Ok(ordered)
    }

    fn push_with_dependencies(
        &self,
        code: &str,
        available: &HashSet<String>,
        seen: &mut HashSet<String>,
        ordered: &mut Vec<String>,
    ) -> Result<()> {
        if seen.contains(code) {
            return Ok(());
        }
        match self.get(code) {
            Some(def) => {
                seen.insert(code.to_string());
                for dep in def.formula.dependencies() {
                    self.push_with_dependencies(dep, available, seen, ordered)?;
                }
            }
            None if available.contains(code) => {
                seen.insert(code.to_string());
            }
            None => return Err(MetricError::UnknownMetric(code.to_string())),
        }
        ordered.push(code.to_string());
        Ok(())
    }

    /// Evaluate `code` over a group's values.
    pub fn evaluate(&self, code: &str, values: &HashMap<String, f64>) -> Result<f64> {
        match self.get(code) {
            Some(def) => def.formula.evaluate(code, values),
            None => values
                .get(code)
                .copied()
                .ok_or_else(|| MetricError::UnknownMetric(code.to_string())),
        }
    }
}
