// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::RepoFixture;

use anyhow::Result;
use indoc::indoc;
use pressenv::{
    envfile,
    git::{Git2Head, HeadReader},
    scaffold::seed_template,
    ConfigResolver, ConfigureOptions, Configured, EnvFileSynthesizer, Override, PressflowSettings,
    Sources,
};
use pretty_assertions::assert_eq;
use std::{fs::read_to_string, path::Path};

fn configure(dir: &Path, env: &[(&str, &str)], options: &ConfigureOptions) -> Result<Configured> {
    let sources = Sources::new(dir)
        .with_process_env(env.iter().copied())
        .load_env_file();
    let properties = ConfigResolver::<Git2Head>::default().resolve(&sources)?;

    Ok(EnvFileSynthesizer::from_sources(&sources)?.configure(properties, options)?)
}

#[test]
fn configure_fresh_checkout_on_production_branch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    RepoFixture::new(dir.path(), "main")?;

    let options = ConfigureOptions {
        profile: Override::Set("minimal".into()),
        ..Default::default()
    };
    let configured = configure(
        dir.path(),
        &[("TS_PROJECT", "demo"), ("TS_WEB_ROOT", "web")],
        &options,
    )?;

    assert_eq!(configured.properties.web_root, dir.path().join("web"));
    assert_eq!(configured.properties.db_name, "demo_main");
    assert_eq!(configured.properties.terminus_env.as_deref(), Some("dev"));

    let live = read_to_string(dir.path().join(".env"))?;
    assert!(live.contains("# Generated configuration\n"));
    assert!(live.contains("TERMINUS_ENV=dev\n"));
    assert!(live.contains("TS_BRANCH=main\n"));
    assert!(live.contains("TS_PROD_BRANCH=main\n"));
    assert!(live.contains("TS_INSTALL_PROFILE=minimal\n"));

    // Salt lands in the template first, so the live file inherits it.
    let template = read_to_string(dir.path().join(".env.dist"))?;
    let salt_line = format!("TS_HASH_SALT={}\n", configured.properties.hash_salt);
    assert_eq!(template, salt_line);
    assert!(live.starts_with(salt_line.as_str()));

    let vars = envfile::load(dir.path().join(".env"))?;
    let settings: PressflowSettings = vars["PRESSFLOW_SETTINGS"].parse()?;
    assert_eq!(settings, configured.settings);
    assert_eq!(settings.databases.default.default.database, "demo_main");

    Ok(())
}

#[test]
fn configure_feature_branch_after_commit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path(), "feature-x")?;
    fixture.stage_and_commit("composer.json", "{}")?;

    let configured = configure(
        dir.path(),
        &[("TS_PROJECT", "demo")],
        &ConfigureOptions::default(),
    )?;

    assert_eq!(configured.properties.branch, "feature-x");
    assert_eq!(configured.properties.db_name, "demo_feature_x");
    assert_eq!(configured.properties.terminus_env.as_deref(), Some("feature-x"));

    Ok(())
}

#[test]
fn configure_detached_head_continues_with_empty_branch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let fixture = RepoFixture::new(dir.path(), "main")?;
    let oid = fixture.stage_and_commit("composer.json", "{}")?;
    fixture.detach_head(oid)?;

    let configured = configure(
        dir.path(),
        &[("TS_PROJECT", "demo")],
        &ConfigureOptions::default(),
    )?;

    assert_eq!(configured.properties.branch, "");
    assert_eq!(configured.properties.db_name, "demo_");
    assert!(read_to_string(dir.path().join(".env"))?.contains("\nTS_BRANCH=\n"));

    Ok(())
}

#[test]
fn later_runs_read_back_earlier_configuration() -> Result<()> {
    let dir = tempfile::tempdir()?;
    RepoFixture::new(dir.path(), "main")?;

    let options = ConfigureOptions {
        branch: Override::Set("release-1".into()),
        db_pass: "NULL".parse::<Override>()?,
        ..Default::default()
    };
    let first = configure(dir.path(), &[("TS_PROJECT", "demo")], &options)?;
    assert_eq!(first.properties.db_name, "demo_main");

    let sources = Sources::new(dir.path()).load_env_file();
    let properties = ConfigResolver::<Git2Head>::default().resolve(&sources)?;

    assert_eq!(properties.branch, "release-1");
    assert_eq!(properties.hash_salt, first.properties.hash_salt);
    assert_eq!(properties.db_name, "demo_main");
    assert_eq!(properties.db_pass.as_deref(), Some(""));

    let second = configure(dir.path(), &[], &ConfigureOptions::default())?;
    assert_eq!(second.properties.hash_salt, first.properties.hash_salt);
    assert_eq!(second.settings, first.settings);

    Ok(())
}

#[test]
fn init_seeds_template_with_repository_name() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let top = dir.path().join("demo-site");
    std::fs::create_dir(&top)?;
    RepoFixture::new(&top, "main")?;
    std::fs::write(
        top.join(".env.dist"),
        indoc! {r#"
            TS_PROJECT="SITE"
            DRUSH_OPTIONS_URI=""
        "#},
    )?;

    let sources = Sources::new(&top);
    let name = Git2Head.repo_name(sources.working_dir())?;
    assert_eq!(seed_template(&sources.env_files(), &name)?, 2);

    let properties = ConfigResolver::<Git2Head>::default().resolve(&sources.load_env_file())?;
    assert_eq!(properties.project, "demo-site");
    assert_eq!(properties.db_name, "demo_site_main");

    Ok(())
}
