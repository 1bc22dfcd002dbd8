//! Ordered, first-match-wins issue classification.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::github::Issue;

/// What an issue is about, as far as the fixer is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MissingType,
    MissingImport,
    UnusedVariable,
    MissingEnv,
    Documentation,
    Dependency,
    ErrorHandling,
    Accessibility,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::MissingType => "missing_type",
            Category::MissingImport => "missing_import",
            Category::UnusedVariable => "unused_variable",
            Category::MissingEnv => "missing_env",
            Category::Documentation => "documentation",
            Category::Dependency => "dependency",
            Category::ErrorHandling => "error_handling",
            Category::Accessibility => "accessibility",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category → patterns, in priority order. Module-resolution errors come
/// first because they usually carry a `TSxxxx` code as well.
const PATTERN_TABLE: &[(Category, &[&str])] = &[
    (
        Category::MissingImport,
        &[r"import.*missing", r"cannot find.*module", r"module not found"],
    ),
    (
        Category::MissingType,
        &[r"type\s*(error|missing|annotation)", r"typescript.*error", r"TS\d{4}"],
    ),
    (
        Category::UnusedVariable,
        &[
            r"unused\s*(variable|import|declaration)",
            r"declared but.*never (used|read)",
        ],
    ),
    (
        Category::MissingEnv,
        &[r"env(ironment)?\s*var", r"\.env", r"missing.*config"],
    ),
    (
        Category::Documentation,
        &[r"doc(umentation)?", r"readme", r"comment", r"jsdoc"],
    ),
    (
        Category::Dependency,
        &[r"dependency|dependencies|package", r"outdated", r"vulnerab"],
    ),
    (
        Category::ErrorHandling,
        &[
            r"error\s*handling",
            r"try.*catch",
            r"unhandled.*error",
            r"exception",
        ],
    ),
    (
        Category::Accessibility,
        &[r"a11y|accessibility", r"aria|alt\s*text", r"screen\s*reader"],
    ),
];

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(Classifier::compile_default);

pub struct Classifier {
    rules: Vec<(Category, Vec<Regex>)>,
}

impl Classifier {
    /// Shared classifier over the built-in pattern table.
    pub fn standard() -> &'static Classifier {
        &DEFAULT_CLASSIFIER
    }

    fn compile_default() -> Self {
        let rules = PATTERN_TABLE
            .iter()
            .map(|(category, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| {
                        RegexBuilder::new(p)
                            .case_insensitive(true)
                            .build()
                            .unwrap()
                    })
                    .collect();
                (*category, compiled)
            })
            .collect();
        Self { rules }
    }

    /// First category (in table order) with a pattern matching `text`.
    pub fn classify_text(&self, text: &str) -> Option<Category> {
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
            .map(|(category, _)| *category)
    }

    pub fn classify(&self, issue: &Issue) -> Option<Category> {
        self.classify_text(&issue.text())
    }
}
