//! ARM resource identifiers.
//!
//! Identifiers look like
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`
//! with any number of nested `{childType}/{childName}` pairs appended.

use std::fmt;
use std::str::FromStr;

use crate::error::{ArmError, ProviderError, Result};

const SUBSCRIPTIONS: &str = "subscriptions";
const RESOURCE_GROUPS: &str = "resourceGroups";
const PROVIDERS: &str = "providers";

/// A parsed ARM resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    subscription_id: String,
    resource_group: String,
    provider: Option<String>,
    path: Vec<(String, String)>,
}

impl ResourceId {
    /// Parses a resource identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty, has an odd number of
    /// segments, or lacks a subscription or resource group.
    pub fn parse(id: &str) -> Result<Self> {
        let trimmed = id.trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid(id, "identifier is empty"));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() % 2 != 0 {
            return Err(invalid(id, "number of path segments is not divisible by 2"));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid(id, "identifier contains an empty segment"));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut path = Vec::new();

        for pair in segments.chunks_exact(2) {
            let (key, value) = (pair[0], pair[1]);
            // Keys are matched case-insensitively; ARM echoes ids in mixed case.
            if subscription_id.is_none() && key.eq_ignore_ascii_case(SUBSCRIPTIONS) {
                subscription_id = Some(value.to_string());
            } else if resource_group.is_none() && key.eq_ignore_ascii_case(RESOURCE_GROUPS) {
                resource_group = Some(value.to_string());
            } else if provider.is_none() && key.eq_ignore_ascii_case(PROVIDERS) {
                provider = Some(value.to_string());
            } else {
                path.push((key.to_string(), value.to_string()));
            }
        }

        let subscription_id =
            subscription_id.ok_or_else(|| invalid(id, "no subscription ID found"))?;
        let resource_group =
            resource_group.ok_or_else(|| invalid(id, "no resource group name found"))?;

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path,
        })
    }

    /// Returns the subscription ID.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Returns the resource group name.
    #[must_use]
    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    /// Looks up the name for a resource type segment (e.g. `loadBalancers`).
    #[must_use]
    pub fn path(&self, key: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the identifier of the enclosing resource.
    ///
    /// Returns `None` for a top-level resource.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.path.len() < 2 {
            return None;
        }
        let mut parent = self.clone();
        parent.path.pop();
        Some(parent)
    }

    /// Returns the value of a required path segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is absent.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.path(key).ok_or_else(|| {
            invalid(&self.to_string(), &format!("no '{key}' segment found"))
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{SUBSCRIPTIONS}/{}/{RESOURCE_GROUPS}/{}",
            self.subscription_id, self.resource_group
        )?;
        if let Some(provider) = &self.provider {
            write!(f, "/{PROVIDERS}/{provider}")?;
        }
        for (key, value) in &self.path {
            write!(f, "/{key}/{value}")?;
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn invalid(id: &str, reason: &str) -> ProviderError {
    ProviderError::Arm(ArmError::invalid_id(id, reason))
}
