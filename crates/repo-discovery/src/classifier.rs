//! Repository category classification
//!
//! Classification walks an ordered table of rules; the first rule whose
//! indicator is present (and whose content check, if any, passes) decides
//! the category. Smart-contract markers come before the generic
//! `package.json` checks, which is why the table order matters.

use std::collections::HashSet;
use std::path::Path;

use repo_meta::RepoCategory;
use serde_json::Value;

use crate::{Error, Result};

/// Server-side frameworks that mark a package as `backend`
pub const BACKEND_FRAMEWORKS: &[&str] = &[
    "express", "fastify", "koa", "nestjs", "next", "nuxt", "hapi", "restify", "sails",
    "loopback", "feathers",
];

/// UI frameworks that mark a package as `frontend`
pub const FRONTEND_FRAMEWORKS: &[&str] = &[
    "react", "vue", "angular", "svelte", "preact", "next", "nuxt", "gatsby", "remix",
    "sveltekit",
];

/// Extra check run against the file an indicator matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCheck {
    /// `package.json` lists one of these in `dependencies` or `devDependencies`
    PackageDependsOnAny(&'static [&'static str]),
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub category: RepoCategory,
    /// Indicator patterns, see [`repo_fs::Indicator`]
    pub indicators: &'static [&'static str],
    pub content: Option<ContentCheck>,
}

/// Built-in classification table, evaluated top to bottom
pub const DEFAULT_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        category: RepoCategory::Contracts,
        indicators: &["foundry.toml", "hardhat.config.*", "truffle-config.*"],
        content: None,
    },
    ClassificationRule {
        category: RepoCategory::Backend,
        indicators: &["package.json"],
        content: Some(ContentCheck::PackageDependsOnAny(BACKEND_FRAMEWORKS)),
    },
    ClassificationRule {
        category: RepoCategory::Frontend,
        indicators: &["package.json"],
        content: Some(ContentCheck::PackageDependsOnAny(FRONTEND_FRAMEWORKS)),
    },
    ClassificationRule {
        category: RepoCategory::Infrastructure,
        indicators: &["terraform/", "cdk.json", "serverless.yml"],
        content: None,
    },
];

/// Assigns a category to a repository directory.
#[derive(Debug, Clone)]
pub struct RepoClassifier {
    rules: Vec<ClassificationRule>,
}

impl Default for RepoClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoClassifier {
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }

    pub fn with_rules(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Classify `path`, returning [`RepoCategory::Unknown`] when no rule matches.
    pub async fn classify(&self, path: &Path) -> RepoCategory {
        for rule in &self.rules {
            for pattern in rule.indicators {
                let Some(found) = repo_fs::find_indicator(path, pattern).await else {
                    continue;
                };

                let matched = match rule.content {
                    None => true,
                    Some(check) => match check.evaluate(&found).await {
                        Ok(matched) => matched,
                        Err(e) => {
                            tracing::debug!(error = %e, "Content check treated as no match");
                            false
                        }
                    },
                };

                if matched {
                    tracing::debug!(path = ?path, category = %rule.category, "Classified repository");
                    return rule.category;
                }
            }
        }
        RepoCategory::Unknown
    }
}

impl ContentCheck {
    async fn evaluate(&self, file: &Path) -> Result<bool> {
        match self {
            ContentCheck::PackageDependsOnAny(frameworks) => {
                let deps = package_dependencies(file).await?;
                Ok(frameworks.iter().any(|f| deps.contains(*f)))
            }
        }
    }
}

/// Names from `dependencies` and `devDependencies` of a `package.json`.
async fn package_dependencies(file: &Path) -> Result<HashSet<String>> {
    let content = repo_fs::io::read_text_async(file).await?;
    let pkg: Value = serde_json::from_str(&content).map_err(|e| Error::Manifest {
        path: file.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut names = HashSet::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = pkg.get(section).and_then(Value::as_object) {
            names.extend(map.keys().cloned());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[rstest]
    #[case("foundry.toml", "", RepoCategory::Contracts)]
    #[case("hardhat.config.ts", "export default {}", RepoCategory::Contracts)]
    #[case("truffle-config.js", "module.exports = {}", RepoCategory::Contracts)]
    #[case("package.json", r#"{"dependencies":{"express":"4"}}"#, RepoCategory::Backend)]
    #[case("package.json", r#"{"devDependencies":{"vue":"3"}}"#, RepoCategory::Frontend)]
    #[case("package.json", r#"{"dependencies":{"lodash":"4"}}"#, RepoCategory::Unknown)]
    #[case("cdk.json", "{}", RepoCategory::Infrastructure)]
    #[case("serverless.yml", "service: x", RepoCategory::Infrastructure)]
    #[case("README.md", "# hi", RepoCategory::Unknown)]
    #[tokio::test]
    async fn test_single_indicator(
        #[case] file: &str,
        #[case] content: &str,
        #[case] expected: RepoCategory,
    ) {
        let temp = TempDir::new().unwrap();
        write(temp.path(), file, content);
        assert_eq!(RepoClassifier::new().classify(temp.path()).await, expected);
    }

    #[tokio::test]
    async fn test_contracts_take_precedence_over_package() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"dependencies":{"express":"4"}}"#);
        write(temp.path(), "hardhat.config.js", "module.exports = {}");

        assert_eq!(
            RepoClassifier::new().classify(temp.path()).await,
            RepoCategory::Contracts
        );
    }

    #[tokio::test]
    async fn test_next_resolves_to_backend_first() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"dependencies":{"next":"14","react":"18"}}"#);
        assert_eq!(
            RepoClassifier::new().classify(temp.path()).await,
            RepoCategory::Backend
        );
    }

    #[tokio::test]
    async fn test_unparsable_package_is_no_match() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{ not json");
        write(temp.path(), "terraform/main.tf", "");

        assert_eq!(
            RepoClassifier::new().classify(temp.path()).await,
            RepoCategory::Infrastructure
        );
    }

    #[tokio::test]
    async fn test_terraform_must_be_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "terraform", "not a dir");
        assert_eq!(
            RepoClassifier::new().classify(temp.path()).await,
            RepoCategory::Unknown
        );
    }

    #[tokio::test]
    async fn test_custom_rule_table() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "cdk.json", "{}");

        let classifier = RepoClassifier::with_rules(vec![ClassificationRule {
            category: RepoCategory::Backend,
            indicators: &["cdk.json"],
            content: None,
        }]);
        assert_eq!(classifier.classify(temp.path()).await, RepoCategory::Backend);
    }
}
