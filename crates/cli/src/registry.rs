//! Destination registry: maps a configured `type` to its adapter constructor

use anyhow::{Context, Result, bail};
use feed_relay_adapters::mastodon::{self, MastodonDestination, Visibility};
use feed_relay_adapters::outbox::{OutboxDestination, OutboxWriter};
use feed_relay_adapters::stub::StubDestination;
use feed_relay_adapters::x::{self, XDestination};
use feed_relay_domain::Destination;
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::DestinationConfig;

const DEFAULT_MASTODON_TOKEN_ENV: &str = "MASTODON_ACCESS_TOKEN";
const DEFAULT_X_TOKEN_ENV: &str = "X_USER_TOKEN";

/// What constructors may need beyond the destination's own config
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Missing credentials become placeholders; nothing gets posted
    pub dry_run: bool,
    /// Shared writer for `outbox` destinations
    pub outbox: Option<OutboxWriter>,
}

type Constructor = fn(&DestinationConfig, &BuildContext) -> Result<Arc<dyn Destination>>;

pub struct DestinationRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl Default for DestinationRegistry {
    fn default() -> Self {
        let mut registry = Self {
            constructors: BTreeMap::new(),
        };
        registry.register("mastodon", build_mastodon);
        registry.register("x", build_x);
        registry.register("outbox", build_outbox);
        registry.register("stub", build_stub);
        registry
    }
}

impl DestinationRegistry {
    pub fn register(&mut self, kind: &'static str, constructor: Constructor) {
        self.constructors.insert(kind, constructor);
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    fn resolve(&self, kind: &str) -> Result<Constructor> {
        match self.constructors.get(kind.trim().to_lowercase().as_str()) {
            Some(constructor) => Ok(*constructor),
            None => bail!(
                "Unknown destination type '{}' (expected one of: {})",
                kind,
                self.kinds().join(", ")
            ),
        }
    }

    /// Fail on the first destination whose type has no constructor
    pub fn check_kinds<'a>(
        &self,
        destinations: impl IntoIterator<Item = &'a DestinationConfig>,
    ) -> Result<()> {
        for destination in destinations {
            self.resolve(&destination.kind)
                .with_context(|| format!("Destination {}", destination.name))?;
        }
        Ok(())
    }

    pub fn build(
        &self,
        config: &DestinationConfig,
        ctx: &BuildContext,
    ) -> Result<Arc<dyn Destination>> {
        let constructor = self
            .resolve(&config.kind)
            .with_context(|| format!("Destination {}", config.name))?;
        constructor(config, ctx)
            .with_context(|| format!("Failed to build destination {}", config.name))
    }
}

/// Length limit a destination would apply, for adapters standing in for it
pub fn max_chars_for(config: &DestinationConfig) -> Option<usize> {
    config
        .max_chars
        .or(match config.kind.trim().to_lowercase().as_str() {
            "mastodon" => Some(mastodon::DEFAULT_MAX_CHARS),
            "x" => Some(x::DEFAULT_MAX_CHARS),
            _ => None,
        })
}

/// Read a credential from the environment
pub fn load_secret(env_var: &str, destination: &str, dry_run: bool) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No credential env var configured for destination {}", destination);
    }

    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::new(value.into())),
        _ if dry_run => {
            tracing::warn!(
                destination = %destination,
                env_var = %env_var,
                "Credential not set, ignored in dry-run mode"
            );
            Ok(SecretString::new("dry-run".into()))
        }
        _ => bail!(
            "Missing credential env var {} for destination {}",
            env_var,
            destination
        ),
    }
}

pub fn secret_env_var(config: &DestinationConfig) -> Option<&str> {
    match config.kind.trim().to_lowercase().as_str() {
        "mastodon" => Some(
            config
                .access_token_env
                .as_deref()
                .unwrap_or(DEFAULT_MASTODON_TOKEN_ENV),
        ),
        "x" => Some(
            config
                .user_token_env
                .as_deref()
                .unwrap_or(DEFAULT_X_TOKEN_ENV),
        ),
        _ => None,
    }
}

fn build_mastodon(config: &DestinationConfig, ctx: &BuildContext) -> Result<Arc<dyn Destination>> {
    let Some(instance_url) = config.instance_url.as_deref() else {
        bail!("instance_url is required for mastodon destinations");
    };

    let token = load_secret(
        secret_env_var(config).unwrap_or(DEFAULT_MASTODON_TOKEN_ENV),
        &config.name,
        ctx.dry_run,
    )?;

    let visibility = match config.visibility.as_deref() {
        Some(raw) => raw.parse::<Visibility>().map_err(anyhow::Error::msg)?,
        None => Visibility::default(),
    };

    let mut destination = MastodonDestination::new(token, instance_url).with_visibility(visibility);
    if let Some(max_chars) = config.max_chars {
        destination = destination.with_max_chars(max_chars);
    }

    Ok(Arc::new(destination))
}

fn build_x(config: &DestinationConfig, ctx: &BuildContext) -> Result<Arc<dyn Destination>> {
    let token = load_secret(
        secret_env_var(config).unwrap_or(DEFAULT_X_TOKEN_ENV),
        &config.name,
        ctx.dry_run,
    )?;

    let mut destination = XDestination::new(token);
    if let Some(max_chars) = config.max_chars {
        destination = destination.with_max_chars(max_chars);
    }

    Ok(Arc::new(destination))
}

fn build_outbox(config: &DestinationConfig, ctx: &BuildContext) -> Result<Arc<dyn Destination>> {
    let Some(writer) = ctx.outbox.clone() else {
        bail!("No outbox file available");
    };

    Ok(Arc::new(
        OutboxDestination::new(writer, &config.name).with_max_chars(config.max_chars),
    ))
}

fn build_stub(config: &DestinationConfig, _ctx: &BuildContext) -> Result<Arc<dyn Destination>> {
    Ok(Arc::new(
        StubDestination::new(&config.name).with_max_chars(config.max_chars),
    ))
}
