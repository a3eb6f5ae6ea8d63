use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::credentials::Credentials;

/// One cloud-provider connection profile.
///
/// `(group_id, name, type)` is unique; see `database::ensure_indexes`.
/// `deleted_at` exists for compatibility with older rows but deletes are
/// always physical.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datacenters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(default_value = 0)]
    pub group_id: i32,
    pub name: String,
    pub r#type: String,

    #[sea_orm(default_value = "")]
    pub region: String,
    #[sea_orm(default_value = "")]
    pub username: String,
    #[sea_orm(default_value = "")]
    pub password: String,
    #[sea_orm(default_value = "")]
    pub vcloud_url: String,
    #[sea_orm(default_value = "")]
    pub vse_url: String,
    #[sea_orm(default_value = "")]
    pub external_network: String,
    #[sea_orm(default_value = "")]
    pub access_key_id: String,
    #[sea_orm(default_value = "")]
    pub secret_access_key: String,
    #[sea_orm(default_value = "")]
    pub subscription_id: String,
    #[sea_orm(default_value = "")]
    pub client_id: String,
    #[sea_orm(default_value = "")]
    pub client_secret: String,
    #[sea_orm(default_value = "")]
    pub tenant_id: String,
    #[sea_orm(default_value = "")]
    pub environment: String,
    #[sea_orm(default_value = "")]
    pub token: String,
    #[sea_orm(default_value = "")]
    pub secret: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            region: self.region.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            vcloud_url: self.vcloud_url.clone(),
            vse_url: self.vse_url.clone(),
            external_network: self.external_network.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            subscription_id: self.subscription_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            tenant_id: self.tenant_id.clone(),
            environment: self.environment.clone(),
            token: self.token.clone(),
            secret: self.secret.clone(),
        }
    }

    pub fn set_credentials(&mut self, c: Credentials) {
        self.region = c.region;
        self.username = c.username;
        self.password = c.password;
        self.vcloud_url = c.vcloud_url;
        self.vse_url = c.vse_url;
        self.external_network = c.external_network;
        self.access_key_id = c.access_key_id;
        self.secret_access_key = c.secret_access_key;
        self.subscription_id = c.subscription_id;
        self.client_id = c.client_id;
        self.client_secret = c.client_secret;
        self.tenant_id = c.tenant_id;
        self.environment = c.environment;
        self.token = c.token;
        self.secret = c.secret;
    }
}
