use serde::{Deserialize, Serialize};

use crate::config::CryptoConfig;
use crate::crypto::{CredentialCodec, CryptoError};

/// Named credential fields of a datacenter profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    Region,
    Username,
    Password,
    VcloudUrl,
    VseUrl,
    ExternalNetwork,
    AccessKeyId,
    SecretAccessKey,
    SubscriptionId,
    ClientId,
    ClientSecret,
    TenantId,
    Environment,
    Token,
    Secret,
}

impl CredentialField {
    pub const ALL: [CredentialField; 15] = [
        Self::Region,
        Self::Username,
        Self::Password,
        Self::VcloudUrl,
        Self::VseUrl,
        Self::ExternalNetwork,
        Self::AccessKeyId,
        Self::SecretAccessKey,
        Self::SubscriptionId,
        Self::ClientId,
        Self::ClientSecret,
        Self::TenantId,
        Self::Environment,
        Self::Token,
        Self::Secret,
    ];

    /// JSON key and column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Username => "username",
            Self::Password => "password",
            Self::VcloudUrl => "vcloud_url",
            Self::VseUrl => "vse_url",
            Self::ExternalNetwork => "external_network",
            Self::AccessKeyId => "access_key_id",
            Self::SecretAccessKey => "secret_access_key",
            Self::SubscriptionId => "subscription_id",
            Self::ClientId => "client_id",
            Self::ClientSecret => "client_secret",
            Self::TenantId => "tenant_id",
            Self::Environment => "environment",
            Self::Token => "token",
            Self::Secret => "secret",
        }
    }

    /// Sensitivity before any deployment policy is applied.
    pub fn is_sensitive(&self) -> bool {
        match self {
            Self::Region
            | Self::Username
            | Self::VcloudUrl
            | Self::VseUrl
            | Self::ExternalNetwork
            | Self::Environment => false,
            Self::Password
            | Self::AccessKeyId
            | Self::SecretAccessKey
            | Self::SubscriptionId
            | Self::ClientId
            | Self::ClientSecret
            | Self::TenantId
            | Self::Token
            | Self::Secret => true,
        }
    }
}

/// Per-deployment override for the login fields, whose treatment differs
/// between installations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensitivityPolicy {
    pub encrypt_username: bool,
    pub encrypt_password: bool,
}

impl Default for SensitivityPolicy {
    fn default() -> Self {
        Self {
            encrypt_username: false,
            encrypt_password: true,
        }
    }
}

impl From<&CryptoConfig> for SensitivityPolicy {
    fn from(config: &CryptoConfig) -> Self {
        Self {
            encrypt_username: config.encrypt_username,
            encrypt_password: config.encrypt_password,
        }
    }
}

impl SensitivityPolicy {
    pub fn is_sensitive(&self, field: CredentialField) -> bool {
        match field {
            CredentialField::Username => self.encrypt_username,
            CredentialField::Password => self.encrypt_password,
            other => other.is_sensitive(),
        }
    }

    pub fn sensitive_fields(&self) -> impl Iterator<Item = CredentialField> + '_ {
        CredentialField::ALL
            .into_iter()
            .filter(move |f| self.is_sensitive(*f))
    }
}

/// The fixed credential set, flattened into the record's JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub region: String,
    pub username: String,
    pub password: String,
    pub vcloud_url: String,
    pub vse_url: String,
    pub external_network: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub subscription_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub environment: String,
    pub token: String,
    pub secret: String,
}

impl Credentials {
    pub fn get(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::Region => &self.region,
            CredentialField::Username => &self.username,
            CredentialField::Password => &self.password,
            CredentialField::VcloudUrl => &self.vcloud_url,
            CredentialField::VseUrl => &self.vse_url,
            CredentialField::ExternalNetwork => &self.external_network,
            CredentialField::AccessKeyId => &self.access_key_id,
            CredentialField::SecretAccessKey => &self.secret_access_key,
            CredentialField::SubscriptionId => &self.subscription_id,
            CredentialField::ClientId => &self.client_id,
            CredentialField::ClientSecret => &self.client_secret,
            CredentialField::TenantId => &self.tenant_id,
            CredentialField::Environment => &self.environment,
            CredentialField::Token => &self.token,
            CredentialField::Secret => &self.secret,
        }
    }

    pub fn get_mut(&mut self, field: CredentialField) -> &mut String {
        match field {
            CredentialField::Region => &mut self.region,
            CredentialField::Username => &mut self.username,
            CredentialField::Password => &mut self.password,
            CredentialField::VcloudUrl => &mut self.vcloud_url,
            CredentialField::VseUrl => &mut self.vse_url,
            CredentialField::ExternalNetwork => &mut self.external_network,
            CredentialField::AccessKeyId => &mut self.access_key_id,
            CredentialField::SecretAccessKey => &mut self.secret_access_key,
            CredentialField::SubscriptionId => &mut self.subscription_id,
            CredentialField::ClientId => &mut self.client_id,
            CredentialField::ClientSecret => &mut self.client_secret,
            CredentialField::TenantId => &mut self.tenant_id,
            CredentialField::Environment => &mut self.environment,
            CredentialField::Token => &mut self.token,
            CredentialField::Secret => &mut self.secret,
        }
    }

    /// Encrypts every sensitive field in place. Empty values stay empty.
    ///
    /// Nothing is modified unless every field encrypts.
    pub fn seal(
        &mut self,
        codec: &CredentialCodec,
        policy: &SensitivityPolicy,
    ) -> Result<(), CryptoError> {
        let sealed = policy
            .sensitive_fields()
            .map(|field| Ok((field, codec.encrypt(self.get(field))?)))
            .collect::<Result<Vec<_>, CryptoError>>()?;

        for (field, value) in sealed {
            *self.get_mut(field) = value;
        }
        Ok(())
    }

    /// Overlays `incoming` onto `self`: non-empty values replace, empty values
    /// preserve. Sensitive values are encrypted before they replace, except a
    /// value equal to the stored one, which is the ciphertext echoed back.
    pub fn merge_from(
        &mut self,
        incoming: &Credentials,
        codec: &CredentialCodec,
        policy: &SensitivityPolicy,
    ) -> Result<(), CryptoError> {
        let mut replaced = Vec::new();
        for field in CredentialField::ALL {
            let value = incoming.get(field);
            if value.is_empty() {
                continue;
            }
            let stored = if policy.is_sensitive(field) {
                if value == self.get(field) {
                    continue;
                }
                codec.encrypt(value)?
            } else {
                value.to_string()
            };
            replaced.push((field, stored));
        }

        for (field, value) in replaced {
            *self.get_mut(field) = value;
        }
        Ok(())
    }
}
