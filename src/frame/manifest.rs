use serde::{Deserialize, Serialize};
use url::{Host, Url};

/// Describes the frame to the host. Hosts refuse to add a frame whose
/// manifest does not validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameManifest {
    pub name: String,
    pub description: String,
    pub home_url: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest name is empty")]
    EmptyName,
    #[error("{field} url {url:?} is malformed: {source}")]
    MalformedUrl {
        field: &'static str,
        url: String,
        source: url::ParseError,
    },
    #[error("{field} url {url:?} is not an https url")]
    InsecureUrl { field: &'static str, url: String },
    #[error("{field} url {url:?} does not name a public host")]
    MissingHost { field: &'static str, url: String },
}

impl FrameManifest {
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::EmptyName);
        }
        check_url("home", &self.home_url)?;
        if let Some(icon_url) = &self.icon_url {
            check_url("icon", icon_url)?;
        }
        Ok(())
    }
}

/// Hosts fetch both urls from the open web, so each must be https on a
/// dotted domain or an ip address.
fn check_url(field: &'static str, raw: &str) -> Result<(), ManifestError> {
    let parsed = Url::parse(raw).map_err(|source| ManifestError::MalformedUrl {
        field,
        url: raw.to_string(),
        source,
    })?;

    if parsed.scheme() != "https" {
        return Err(ManifestError::InsecureUrl {
            field,
            url: raw.to_string(),
        });
    }

    match parsed.host() {
        Some(Host::Domain(domain)) if domain.contains('.') && !domain.ends_with('.') => Ok(()),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(()),
        _ => Err(ManifestError::MissingHost {
            field,
            url: raw.to_string(),
        }),
    }
}
