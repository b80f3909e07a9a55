//! Decision rule service
//!
//! Reads tree dumps and feature lists from disk, builds the tree and
//! derives rules, statistics and normalized dumps from it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    write_dot, DecisionRule, DecisionTree, DomainError, DotTreeParser, FeatureNames,
    SingleChildPolicy, TreeBuilder,
};
use crate::infrastructure::traits::FileSystem;

/// Where the feature names come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureSource {
    /// Text file with one name per line
    File(PathBuf),
    /// Names given inline, index order
    Names(Vec<String>),
}

/// Summary numbers of a built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub splits: usize,
    pub leaves: usize,
    pub depth: usize,
}

impl From<&DecisionTree> for TreeStats {
    fn from(tree: &DecisionTree) -> Self {
        Self {
            nodes: tree.len(),
            splits: tree.split_count(),
            leaves: tree.leaf_count(),
            depth: tree.depth(),
        }
    }
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:  {}", self.nodes)?;
        writeln!(f, "splits: {}", self.splits)?;
        writeln!(f, "leaves: {}", self.leaves)?;
        write!(f, "depth:  {}", self.depth)
    }
}

/// Service turning tree dump files into decision rules.
pub struct RuleService {
    fs: Arc<dyn FileSystem>,
    builder: TreeBuilder,
}

impl RuleService {
    /// Create a new rule service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            builder: TreeBuilder::new(),
        }
    }

    /// Resolve the feature name list from its source.
    pub fn load_features(&self, source: &FeatureSource) -> ApplicationResult<FeatureNames> {
        let names = match source {
            FeatureSource::Names(names) => FeatureNames::new(names.clone()),
            FeatureSource::File(path) => {
                let content = self
                    .fs
                    .read_to_string(path)
                    .with_path_context("read feature names", path)?;
                FeatureNames::parse_list(&content)
            }
        };
        debug!("load_features: {} names", names.names().len());
        Ok(names)
    }

    /// Read, parse and build the tree stored at `path`.
    ///
    /// Domain errors carry the file path; nothing is returned unless the
    /// whole dump parses and forms a valid tree.
    #[instrument(level = "debug", skip(self, features), fields(path = %path.display()))]
    pub fn load_tree(&self, path: &Path, features: &FeatureNames) -> ApplicationResult<DecisionTree> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read tree", path)?;

        let in_file = |source: DomainError| ApplicationError::InFile {
            path: path.to_path_buf(),
            source,
        };
        let document = DotTreeParser::new(features).parse(&text).map_err(in_file)?;
        let tree = self.builder.build_document(&document).map_err(in_file)?;
        debug!("load_tree: {} nodes, {} leaves", tree.len(), tree.leaf_count());
        Ok(tree)
    }

    /// All decision rules of the tree at `path`, or the first error.
    pub fn rules(
        &self,
        path: &Path,
        features: &FeatureNames,
        policy: SingleChildPolicy,
    ) -> ApplicationResult<Vec<DecisionRule>> {
        let tree = self.load_tree(path, features)?;
        tree.rules(policy).map_err(|source| ApplicationError::InFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rules of the tree at `path` rendered one per line.
    pub fn render_rules(
        &self,
        path: &Path,
        features: &FeatureNames,
        policy: SingleChildPolicy,
    ) -> ApplicationResult<String> {
        let rules = self.rules(path, features, policy)?;
        let mut out = String::new();
        for rule in &rules {
            out.push_str(&rule.to_string());
            out.push('\n');
        }
        Ok(out)
    }

    /// Counts and depth of the tree at `path`.
    pub fn stats(&self, path: &Path, features: &FeatureNames) -> ApplicationResult<TreeStats> {
        let tree = self.load_tree(path, features)?;
        Ok(TreeStats::from(&tree))
    }

    /// Normalized re-serialization of the tree at `path`.
    pub fn normalize(&self, path: &Path, features: &FeatureNames) -> ApplicationResult<String> {
        let tree = self.load_tree(path, features)?;
        Ok(write_dot(&tree))
    }

    /// Write a normalized dump of `tree` to `dest`, creating parent directories.
    pub fn write_tree(&self, tree: &DecisionTree, dest: &Path) -> ApplicationResult<()> {
        self.fs
            .ensure_parent(dest)
            .with_path_context("create parent directory", dest)?;
        self.fs
            .write(dest, &write_dot(tree))
            .with_path_context("write tree", dest)?;
        debug!("write_tree: {}", dest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    const AGE_TREE: &str = "digraph Tree {\n\
        n_0 [label=\"0 0 <= 30.0 samples 10\"];\n\
        n_1 [label=\"1 A samples 6 mistakes 0\"];\n\
        n_2 [label=\"2 B samples 4 mistakes 1\"];\n\
        n_0 -> n_1;\n\
        n_0 -> n_2;\n\
        }\n";

    fn service() -> RuleService {
        RuleService::new(Arc::new(RealFileSystem))
    }

    fn age() -> FeatureNames {
        FeatureNames::new(vec!["age".to_string()])
    }

    #[test]
    fn given_tree_file_when_rendering_rules_then_one_line_per_leaf() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tree.dot");
        std::fs::write(&path, AGE_TREE).unwrap();

        let out = service()
            .render_rules(&path, &age(), SingleChildPolicy::Reject)
            .unwrap();

        assert_eq!(out, "A: age <= 30.0;\nB: age > 30.0;\n");
    }

    #[test]
    fn given_feature_file_when_loading_then_skips_blanks_and_comments() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("features.txt");
        std::fs::write(&path, "# columns\nage\n\n  income  \n").unwrap();

        let names = service()
            .load_features(&FeatureSource::File(path))
            .unwrap();

        assert_eq!(names.names(), ["age", "income"]);
    }

    #[test]
    fn given_missing_tree_file_when_loading_then_not_found() {
        let temp = TempDir::new().unwrap();
        let err = service()
            .load_tree(&temp.path().join("nope.dot"), &age())
            .unwrap_err();
        assert!(err.is_not_found(), "{err}");
        assert!(err.domain().is_none());
    }

    #[test]
    fn given_out_of_range_feature_when_loading_then_range_error_with_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tree.dot");
        std::fs::write(&path, AGE_TREE).unwrap();

        let err = service()
            .rules(&path, &FeatureNames::default(), SingleChildPolicy::Follow)
            .unwrap_err();

        let domain = err.domain().expect("domain error");
        assert_eq!(domain.kind(), ErrorKind::Range);
        assert_eq!(domain.line(), Some(2));
        assert!(err.to_string().contains("tree.dot"));
    }

    #[test]
    fn given_tree_when_computing_stats_then_counts_nodes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tree.dot");
        std::fs::write(&path, AGE_TREE).unwrap();

        let stats = service().stats(&path, &age()).unwrap();

        assert_eq!(
            stats,
            TreeStats {
                nodes: 3,
                splits: 1,
                leaves: 2,
                depth: 2
            }
        );
    }

    #[test]
    fn given_tree_when_writing_to_nested_dest_then_reloads_identically() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("tree.dot");
        std::fs::write(&src, AGE_TREE).unwrap();
        let svc = service();
        let tree = svc.load_tree(&src, &age()).unwrap();

        let dest = temp.path().join("out/normalized.dot");
        svc.write_tree(&tree, &dest).unwrap();

        assert_eq!(svc.load_tree(&dest, &age()).unwrap(), tree);
    }
}
