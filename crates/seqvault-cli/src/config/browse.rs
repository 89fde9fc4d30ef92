//! Explorer configuration for the `browse` command.

use anyhow::bail;
use clap::Args;
use seqvault_core::Laboratory;
use seqvault_explorer::{FileTreeConfig, HttpListingConfig};

use crate::TRACING_TARGET_CONFIG;

/// What to browse and where the listing service runs.
#[derive(Debug, Clone, Args)]
#[must_use = "config does nothing unless you use it"]
pub struct BrowseConfig {
    /// Listing service connection.
    #[clap(flatten)]
    pub client: HttpListingConfig,

    /// Laboratory whose storage is browsed.
    #[arg(long = "laboratory", env = "SEQVAULT_LABORATORY_ID")]
    pub laboratory_id: String,

    /// Organization owning the laboratory; selects the default root prefix.
    #[arg(long = "organization", env = "SEQVAULT_ORGANIZATION_ID")]
    pub organization_id: Option<String>,

    /// Bucket override.
    #[arg(long, env = "SEQVAULT_BUCKET")]
    pub bucket: Option<String>,

    /// Prefix shown as the root, instead of `{organization}/{laboratory}/`.
    #[arg(long, env = "SEQVAULT_ROOT_PREFIX")]
    pub root_prefix: Option<String>,

    /// Folder to open, relative to the root (e.g. `runs/2024-03`).
    pub path: Option<String>,
}

impl BrowseConfig {
    /// Builds the file tree configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when neither a root prefix nor an organization is set.
    pub fn tree_config(&self) -> anyhow::Result<FileTreeConfig> {
        let root_prefix = match (&self.root_prefix, &self.organization_id) {
            (Some(prefix), _) => prefix.clone(),
            (None, Some(organization_id)) => {
                Laboratory::new(self.laboratory_id.as_str(), organization_id.as_str())
                    .default_prefix()
            }
            (None, None) => bail!("either --root-prefix or --organization is required"),
        };

        let config = FileTreeConfig::new(self.laboratory_id.as_str(), root_prefix);
        Ok(match &self.bucket {
            Some(bucket) => config.with_bucket(bucket.as_str()),
            None => config,
        })
    }

    /// Logs the browse configuration without the token.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            endpoint = %self.client.endpoint,
            authenticated = self.client.token.is_some(),
            laboratory_id = %self.laboratory_id,
            bucket = ?self.bucket,
            "Browse configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BrowseConfig {
        BrowseConfig {
            client: HttpListingConfig::new("http://127.0.0.1:8080".parse().unwrap()),
            laboratory_id: "LAB-1".to_owned(),
            organization_id: None,
            bucket: None,
            root_prefix: None,
            path: None,
        }
    }

    #[test]
    fn root_prefix_from_organization() -> anyhow::Result<()> {
        let browse = BrowseConfig {
            organization_id: Some("ORG-1".to_owned()),
            bucket: Some("genomics".to_owned()),
            ..config()
        };

        let tree = browse.tree_config()?;
        assert_eq!(tree.root_prefix, "ORG-1/LAB-1/");
        assert_eq!(tree.bucket.as_deref(), Some("genomics"));
        Ok(())
    }

    #[test]
    fn explicit_root_prefix_wins() -> anyhow::Result<()> {
        let browse = BrowseConfig {
            organization_id: Some("ORG-1".to_owned()),
            root_prefix: Some("shared/".to_owned()),
            ..config()
        };

        assert_eq!(browse.tree_config()?.root_prefix, "shared/");
        Ok(())
    }

    #[test]
    fn requires_a_root() {
        assert!(config().tree_config().is_err());
    }
}
