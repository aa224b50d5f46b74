//! Package name inclusion patterns

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Decides which package names take part in an upgrade
///
/// - no patterns: every name is included
/// - first pattern starts with `!`: every name is included except those
///   matching a `!` pattern
/// - otherwise: a name must match a positive pattern and no `!` pattern
///
/// Patterns are case-sensitive globs in which `*` does not cross `/`, so
/// `@types/*` selects every package of the `@types` scope.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    include_all: bool,
    include: GlobSet,
    exclude: GlobSet,
    patterns: Vec<String>,
}

impl PatternFilter {
    /// Filter that includes every name
    pub fn all() -> Self {
        Self {
            include_all: true,
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Compile a pattern list
    ///
    /// # Errors
    /// Returns [`Error::InvalidPattern`] if a pattern is not a valid glob
    pub fn new<I>(patterns: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let Some(first) = patterns.first() else {
            return Ok(Self::all());
        };
        let include_all = first.starts_with('!');

        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        for pattern in &patterns {
            match pattern.strip_prefix('!') {
                Some(negated) => exclude.add(compile(pattern, negated)?),
                None => include.add(compile(pattern, pattern)?),
            };
        }

        Ok(Self {
            include_all,
            include: include
                .build()
                .map_err(|e| Error::InvalidPattern(patterns.join(" "), e.to_string()))?,
            exclude: exclude
                .build()
                .map_err(|e| Error::InvalidPattern(patterns.join(" "), e.to_string()))?,
            patterns,
        })
    }

    /// Whether `name` takes part in the upgrade
    pub fn is_included(&self, name: &str) -> bool {
        (self.include_all || self.include.is_match(name)) && !self.exclude.is_match(name)
    }

    /// The patterns this filter was built from
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for PatternFilter {
    fn default() -> Self {
        Self::all()
    }
}

fn compile(original: &str, glob: &str) -> Result<globset::Glob> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map_err(|e| Error::InvalidPattern(original.to_string(), e.to_string()))
}
