// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use pressenv::{
    configure::{ConfigureOptions, EnvFileSynthesizer, Override},
    git::HeadReader,
    resolve::{ConfigResolver, Sources},
    scaffold::seed_template,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::exit;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "pressenv [options] <pressenv-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let sources = Sources::capture()?;
        let resolver: ConfigResolver = ConfigResolver::default();

        match self.command {
            Command::Configure(opts) => run_configure(opts, &sources, &resolver),
            Command::Init(opts) => run_init(opts, &sources, &resolver),
            Command::Show => run_show(&sources, &resolver),
            Command::SiteEnv(opts) => run_site_env(opts, &sources),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate configuration in live environment file.
    #[command(override_usage = "pressenv configure [options]")]
    Configure(ConfigureArgs),

    /// Seed distribution template placeholders with repository name.
    #[command(override_usage = "pressenv init [options]")]
    Init(InitArgs),

    /// Show resolved project properties.
    #[command(override_usage = "pressenv show")]
    Show,

    /// Print "<site>.<env>" as used by terminus commands.
    #[command(override_usage = "pressenv site-env [<env>]")]
    SiteEnv(SiteEnvArgs),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ConfigureArgs {
    /// Database password, "NULL" for empty password.
    #[arg(long, value_name = "password")]
    pub db_pass: Option<Override>,

    /// Database user, "NULL" for empty user.
    #[arg(long, value_name = "user")]
    pub db_user: Option<Override>,

    /// Database name.
    #[arg(long, value_name = "name")]
    pub db_name: Option<Override>,

    /// Database host.
    #[arg(long, value_name = "host")]
    pub db_host: Option<Override>,

    /// Local migration source database name.
    #[arg(long, value_name = "name")]
    pub db_upgrade: Option<Override>,

    /// Branch to configure instead of the current git branch.
    #[arg(long, value_name = "branch")]
    pub branch: Option<Override>,

    /// Drupal install profile.
    #[arg(long, value_name = "profile")]
    pub profile: Option<Override>,

    /// Branch that deploys to the "dev" environment.
    #[arg(long, value_name = "branch")]
    pub prod_branch: Option<Override>,
}

impl From<ConfigureArgs> for ConfigureOptions {
    fn from(args: ConfigureArgs) -> Self {
        Self {
            db_pass: args.db_pass.into(),
            db_user: args.db_user.into(),
            db_name: args.db_name.into(),
            db_host: args.db_host.into(),
            db_upgrade: args.db_upgrade.into(),
            branch: args.branch.into(),
            profile: args.profile.into(),
            prod_branch: args.prod_branch.into(),
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitArgs {
    /// Repository name to use instead of the git top-level directory name.
    #[arg(short, long, value_name = "name")]
    pub name: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SiteEnvArgs {
    /// Environment name, defaults to TERMINUS_ENV.
    #[arg(value_name = "env")]
    pub env: Option<String>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_configure(opts: ConfigureArgs, sources: &Sources, resolver: &ConfigResolver) -> Result<()> {
    let options = ConfigureOptions::from(opts);
    let properties = resolver.resolve(sources)?;
    let configured = EnvFileSynthesizer::from_sources(sources)?.configure(properties, &options)?;
    info!("wrote {:?}", configured.live_file.display());

    Ok(())
}

fn run_init(opts: InitArgs, sources: &Sources, resolver: &ConfigResolver) -> Result<()> {
    let name = match opts.name {
        Some(name) => name,
        None => resolver.head().repo_name(sources.working_dir())?,
    };
    seed_template(&sources.env_files(), &name)?;

    Ok(())
}

fn run_show(sources: &Sources, resolver: &ConfigResolver) -> Result<()> {
    print!("{}", resolver.resolve(sources)?);

    Ok(())
}

fn run_site_env(opts: SiteEnvArgs, sources: &Sources) -> Result<()> {
    println!("{}", sources.platform().site_env(opts.env.as_deref()));

    Ok(())
}
