//! Feature name lookup by index.

use crate::domain::error::{DomainError, DomainResult};

/// Maps a feature index to its name.
///
/// Supplied by the caller and passed by reference into the parser.
pub trait FeatureNameResolver {
    /// Name at `index`, or a range error when `index` is outside the list.
    fn get_name(&self, index: usize) -> DomainResult<&str>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned, ordered feature name list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureNames {
    names: Vec<String>,
}

impl FeatureNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parse a plain-text list: one name per line.
    ///
    /// Lines are trimmed; blank lines and `#` comments are skipped.
    pub fn parse_list(content: &str) -> Self {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl FeatureNameResolver for FeatureNames {
    fn get_name(&self, index: usize) -> DomainResult<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or(DomainError::FeatureIndexOutOfRange {
                index,
                len: self.names.len(),
            })
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;

    #[test]
    fn given_index_in_range_when_resolving_then_returns_name() {
        let names: FeatureNames = ["age", "income"].into_iter().collect();
        assert_eq!(names.get_name(1).unwrap(), "income");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn given_index_out_of_range_when_resolving_then_range_error() {
        let names: FeatureNames = ["a", "b", "c"].into_iter().collect();
        let err = names.get_name(5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert_eq!(err, DomainError::FeatureIndexOutOfRange { index: 5, len: 3 });
    }

    #[test]
    fn given_list_with_comments_when_parsing_then_skips_them() {
        let names = FeatureNames::parse_list("# features\nage\n\n  income  \n# trailing\n");
        assert_eq!(names.names(), &["age".to_string(), "income".to_string()]);
    }
}
