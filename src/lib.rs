// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project configuration for Drupal sites on a git-based host.
//!
//! Pressenv resolves the configuration of a site checkout from several layered
//! sources, and synthesizes the environment file that the site, and every
//! other automation command, reads at runtime.
//!
//! # Pipeline
//!
//! 1. [`ConfigResolver`] runs on every invocation. It merges fixed defaults,
//!    the environment file, and the process environment into
//!    [`ProjectProperties`]. The current branch comes from git.
//! 2. [`EnvFileSynthesizer`] runs on `pressenv configure` only. It overlays
//!    explicit overrides on top of resolved properties, builds the
//!    [`PressflowSettings`] blob, and rewrites the live environment file.
//!
//! Nothing is ever written to the process environment. Later runs pick up
//! the results of earlier runs by reading the live environment file again.

pub mod config;
pub mod configure;
pub mod envfile;
pub mod git;
pub mod path;
pub mod resolve;
pub mod scaffold;
pub mod settings;

pub use config::{PlatformContext, ProjectProperties, PropertyDefaults};
pub use configure::{ConfigureOptions, Configured, EnvFileSynthesizer, Override};
pub use git::{Git2Head, HeadReader};
pub use path::{escape_arg, EnvFiles};
pub use resolve::{ConfigResolver, Sources};
pub use settings::PressflowSettings;
