//! Insurance line hierarchy.
//!
//! Loaded from JSON of the form `{"code": {"label": "...", "children": ["child", ...]}}`.
//! Children, ancestor and descendant sets are computed once at construction.

use crate::{DataError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
struct LineNode {
    #[serde(default)]
    label: String,
    #[serde(default)]
    children: Option<Vec<String>>,
}

/// Parent-child structure of insurance lines.
#[derive(Debug, Clone, Default)]
pub struct LineHierarchy {
    labels: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
    ancestors: HashMap<String, BTreeSet<String>>,
    descendants: HashMap<String, BTreeSet<String>>,
    roots: Vec<String>,
    order: Vec<String>,
}

impl LineHierarchy {
    /// Parse a hierarchy from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let nodes: BTreeMap<String, LineNode> = serde_json::from_str(json)?;
        Self::build(nodes)
    }

    /// Load a hierarchy from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn build(nodes: BTreeMap<String, LineNode>) -> Result<Self> {
        let children: HashMap<String, Vec<String>> = nodes
            .iter()
            .map(|(code, node)| (code.clone(), node.children.clone().unwrap_or_default()))
            .collect();

        let mut descendants = HashMap::new();
        for code in nodes.keys() {
            let mut path = Vec::new();
            collect_descendants(code, &children, &mut descendants, &mut path)?;
        }

        let mut ancestors: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (code, below) in &descendants {
            for child in below {
                ancestors
                    .entry(child.clone())
                    .or_default()
                    .insert(code.clone());
            }
        }

        let roots: Vec<String> = nodes
            .keys()
            .filter(|code| ancestors.get(*code).is_none_or(BTreeSet::is_empty))
            .cloned()
            .collect();

        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        for root in &roots {
            walk(root, &children, &mut seen, &mut order);
        }

        Ok(Self {
            labels: nodes
                .into_iter()
                .map(|(code, node)| (code, node.label))
                .collect(),
            children,
            ancestors,
            descendants,
            roots,
            order,
        })
    }

    /// Immediate children of a line.
    pub fn children(&self, code: &str) -> &[String] {
        self.children.get(code).map_or(&[], Vec::as_slice)
    }

    /// All lines below `code`.
    pub fn descendants(&self, code: &str) -> BTreeSet<String> {
        self.descendants.get(code).cloned().unwrap_or_default()
    }

    /// All lines above `code`.
    pub fn ancestors(&self, code: &str) -> BTreeSet<String> {
        self.ancestors.get(code).cloned().unwrap_or_default()
    }

    /// Lines without a parent.
    pub fn top_level_nodes(&self) -> &[String] {
        &self.roots
    }

    /// Display label, empty for unknown codes.
    pub fn label(&self, code: &str) -> &str {
        self.labels.get(code).map_or("", String::as_str)
    }

    /// Whether the line exists.
    pub fn contains(&self, code: &str) -> bool {
        self.labels.contains_key(code)
    }

    /// Lines in depth-first order from the roots.
    pub fn ordered(&self) -> &[String] {
        &self.order
    }

    /// Reconcile a selection after `triggered` lines were picked.
    ///
    /// Without `detailize`, a triggered line deselects its ancestors and
    /// descendants. With `detailize`, every selected parent is replaced by its
    /// children.
    pub fn handle_parent_child_selections(
        &self,
        selected: &[String],
        triggered: &[String],
        detailize: bool,
    ) -> Vec<String> {
        if !detailize {
            return triggered.iter().fold(selected.to_vec(), |acc, line| {
                let below = self.descendants.get(line);
                let above = self.ancestors.get(line);
                acc.into_iter()
                    .filter(|l| {
                        !below.is_some_and(|s| s.contains(l)) && !above.is_some_and(|s| s.contains(l))
                    })
                    .collect()
            });
        }

        let mut out: Vec<String> = Vec::new();
        for line in selected {
            let children = self.children(line);
            let expanded = if children.is_empty() {
                std::slice::from_ref(line)
            } else {
                children
            };
            for code in expanded {
                if !out.contains(code) {
                    out.push(code.clone());
                }
            }
        }
        out
    }
}

fn collect_descendants(
    code: &str,
    children: &HashMap<String, Vec<String>>,
    memo: &mut HashMap<String, BTreeSet<String>>,
    path: &mut Vec<String>,
) -> Result<BTreeSet<String>> {
    if let Some(done) = memo.get(code) {
        return Ok(done.clone());
    }
    if path.iter().any(|p| p == code) {
        return Err(DataError::InvalidHierarchy(format!(
            "cycle through line {code}"
        )));
    }
    path.push(code.to_string());
    let mut out = BTreeSet::new();
    for child in children.get(code).into_iter().flatten() {
        out.insert(child.clone());
        out.extend(collect_descendants(child, children, memo, path)?);
    }
    path.pop();
    memo.insert(code.to_string(), out.clone());
    Ok(out)
}

fn walk(
    code: &str,
    children: &HashMap<String, Vec<String>>,
    seen: &mut BTreeSet<String>,
    order: &mut Vec<String>,
) {
    if !seen.insert(code.to_string()) {
        return;
    }
    order.push(code.to_string());
    for child in children.get(code).into_iter().flatten() {
        walk(child, children, seen, order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "all": {"label": "All lines", "children": ["life", "non_life"]},
        "life": {"label": "Life", "children": null},
        "non_life": {"label": "Non-life", "children": ["auto", "property"]},
        "auto": {"label": "Motor"},
        "property": {"label": "Property", "children": []}
    }"#;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_structure() {
        let tree = LineHierarchy::from_json(TREE).unwrap();
        assert_eq!(tree.top_level_nodes(), &["all".to_string()]);
        assert_eq!(tree.children("non_life"), &strings(&["auto", "property"])[..]);
        assert_eq!(tree.descendants("all").len(), 4);
        assert!(tree.ancestors("auto").contains("all"));
        assert!(tree.ancestors("auto").contains("non_life"));
        assert_eq!(tree.label("auto"), "Motor");
        assert_eq!(tree.label("missing"), "");
        assert!(tree.contains("life"));
    }

    #[test]
    fn test_depth_first_order() {
        let tree = LineHierarchy::from_json(TREE).unwrap();
        assert_eq!(
            tree.ordered(),
            &strings(&["all", "life", "non_life", "auto", "property"])[..]
        );
    }

    #[test]
    fn test_selection_removes_relatives() {
        let tree = LineHierarchy::from_json(TREE).unwrap();
        let selected = strings(&["all", "auto", "life"]);
        let out = tree.handle_parent_child_selections(&selected, &strings(&["auto"]), false);
        assert_eq!(out, strings(&["auto", "life"]));
    }

    #[test]
    fn test_detailize_expands_parents() {
        let tree = LineHierarchy::from_json(TREE).unwrap();
        let out = tree.handle_parent_child_selections(&strings(&["non_life", "auto", "life"]), &[], true);
        assert_eq!(out, strings(&["auto", "property", "life"]));
    }

    #[test]
    fn test_cycle_rejected() {
        let json = r#"{"a": {"label": "A", "children": ["b"]}, "b": {"label": "B", "children": ["a"]}}"#;
        assert!(matches!(
            LineHierarchy::from_json(json),
            Err(DataError::InvalidHierarchy(_))
        ));
    }
}
