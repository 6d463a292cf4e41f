// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project scaffolding.
//!
//! Freshly started projects inherit a distribution template full of
//! placeholders. Seeding swaps those placeholders for values derived from the
//! name of the repository, e.g., a repository named "demo" gets a local site
//! URL of `https://web.demo.localhost`.

use crate::{envfile, path::EnvFiles};

use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Single find and replace rule applied to the distribution template.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Placeholder {
    pub from: String,
    pub to: String,
}

impl Placeholder {
    fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Placeholders to replace for target repository name.
pub fn placeholders(repo_name: &str) -> Vec<Placeholder> {
    vec![
        Placeholder::new(r#""SITE""#, format!(r#""{repo_name}""#)),
        Placeholder::new(
            r#"DRUSH_OPTIONS_URI="""#,
            format!(r#"DRUSH_OPTIONS_URI="https://web.{repo_name}.localhost""#),
        ),
    ]
}

/// Replace placeholders of distribution template in place.
///
/// Returns number of replacements made. A template without placeholders is
/// left untouched.
///
/// # Errors
///
/// - Return [`ScaffoldError::MissingTemplate`] if there is no template.
/// - Return [`ScaffoldError::EnvFile`] if template cannot be read or written.
#[instrument(skip(files), level = "debug")]
pub fn seed_template(files: &EnvFiles, repo_name: &str) -> Result<usize> {
    let template = files.template();
    if !template.is_file() {
        return Err(ScaffoldError::MissingTemplate {
            path: template.to_path_buf(),
        });
    }

    let mut content = envfile::read_or_empty(template)?;
    let mut replaced = 0;
    for placeholder in placeholders(repo_name) {
        let count = content.matches(placeholder.from.as_str()).count();
        if count > 0 {
            content = content.replace(placeholder.from.as_str(), placeholder.to.as_str());
            replaced += count;
        }
    }

    if replaced == 0 {
        warn!("no placeholders left in {:?}", template.display());
        return Ok(0);
    }

    envfile::replace(template, content)?;
    info!("seeded {replaced} placeholders in {:?}", template.display());

    Ok(replaced)
}

/// Scaffolding error types.
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    /// Distribution template does not exist.
    #[error("no distribution template at {:?}", path.display())]
    MissingTemplate { path: PathBuf },

    /// Distribution template cannot be read or written.
    #[error(transparent)]
    EnvFile(#[from] envfile::EnvFileError),
}

/// Friendly result alias :3
pub type Result<T, E = ScaffoldError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn seed_template_replaces_placeholders() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let files = EnvFiles::new(dir.path());
        std::fs::write(
            files.template(),
            indoc! {r#"
                TS_PROJECT="SITE"
                TERMINUS_SITE="SITE"
                DRUSH_OPTIONS_URI=""
            "#},
        )?;

        assert_eq!(seed_template(&files, "demo")?, 3);

        let expect = indoc! {r#"
            TS_PROJECT="demo"
            TERMINUS_SITE="demo"
            DRUSH_OPTIONS_URI="https://web.demo.localhost"
        "#};
        assert_eq!(std::fs::read_to_string(files.template())?, expect);

        // Seeding twice is a no-op.
        assert_eq!(seed_template(&files, "other")?, 0);
        assert_eq!(std::fs::read_to_string(files.template())?, expect);

        Ok(())
    }

    #[test]
    fn seed_template_requires_template() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let result = seed_template(&EnvFiles::new(dir.path()), "demo");

        assert!(matches!(result, Err(ScaffoldError::MissingTemplate { .. })));

        Ok(())
    }
}
