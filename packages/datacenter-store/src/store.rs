//! Datacenter persistence: lookup, find, create, merge-update and delete.
//!
//! Sensitive credentials are encrypted on the way in and returned as stored;
//! nothing here decrypts.

use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::{debug, info, instrument};

use crate::crypto::{CredentialCodec, CryptoError};
use crate::dispatch::Store;
use crate::entity::datacenter;
use crate::error::{AppError, Result};
use crate::models::{Datacenter, DatacenterInput, SensitivityPolicy};

#[derive(Debug, Clone)]
pub struct DatacenterStore {
    db: DatabaseConnection,
    codec: CredentialCodec,
    policy: SensitivityPolicy,
}

impl DatacenterStore {
    pub fn new(db: DatabaseConnection, codec: CredentialCodec, policy: SensitivityPolicy) -> Self {
        Self { db, codec, policy }
    }

    /// Records matching `filter`, ordered by id. No match is an empty list.
    #[instrument(skip_all, fields(ids = filter.ids.len(), names = filter.names.len()))]
    pub async fn search(&self, filter: &DatacenterInput) -> Result<Vec<datacenter::Model>> {
        let found = find_query(filter).all(&self.db).await?;
        debug!(count = found.len(), "Find resolved");
        Ok(found)
    }

    /// Resolves the stored record for `input`: by id when set, otherwise by
    /// name (scoped to `group_id` when given).
    pub async fn load(&self, input: &DatacenterInput) -> Result<Option<datacenter::Model>> {
        let query = if input.has_id() {
            datacenter::Entity::find_by_id(input.id)
        } else if let Some(name) = input.lookup_name() {
            let mut query = datacenter::Entity::find().filter(datacenter::Column::Name.eq(name));
            if let Some(group_id) = input.group_id {
                query = query.filter(datacenter::Column::GroupId.eq(group_id));
            }
            query
        } else {
            return Ok(None);
        };

        let stored = query
            .filter(datacenter::Column::DeletedAt.is_null())
            .order_by_asc(datacenter::Column::Id)
            .one(&self.db)
            .await?;
        Ok(stored)
    }

    /// Like [`load`](Self::load) but absence is [`AppError::NotFound`].
    pub async fn load_or_fail(&self, input: &DatacenterInput) -> Result<datacenter::Model> {
        self.load(input).await?.ok_or_else(|| not_found(input))
    }

    /// Inserts a new record. Every sensitive field is encrypted first; if any
    /// fails nothing is written.
    #[instrument(skip_all, fields(name = ?input.name))]
    pub async fn create(&self, input: &DatacenterInput) -> Result<datacenter::Model> {
        let record = new_record(input, &self.codec, &self.policy, Utc::now())?;

        self.ensure_unique(
            input.group_id.unwrap_or_default(),
            input.name.as_deref().unwrap_or_default(),
            input.kind.as_deref().unwrap_or_default(),
            None,
        )
        .await?;

        let model = record.insert(&self.db).await.map_err(conflict_or_db)?;
        info!(id = model.id, name = %model.name, "Created datacenter");
        Ok(model)
    }

    /// Merges `input` over the record stored under `input.id`.
    #[instrument(skip_all, fields(id = input.id))]
    pub async fn update(&self, input: &DatacenterInput) -> Result<datacenter::Model> {
        let stored = datacenter::Entity::find_by_id(input.id)
            .filter(datacenter::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found(input))?;

        let renamed = input.name.as_ref().is_some_and(|n| *n != stored.name)
            || input.group_id.is_some_and(|g| g != stored.group_id)
            || input
                .kind
                .as_ref()
                .is_some_and(|k| !k.is_empty() && *k != stored.r#type);

        let merged = merge_update(stored, input, &self.codec, &self.policy, Utc::now())?;

        if renamed {
            self.ensure_unique(merged.group_id, &merged.name, &merged.r#type, Some(merged.id))
                .await?;
        }

        let model = datacenter::ActiveModel::from(merged)
            .reset_all()
            .update(&self.db)
            .await
            .map_err(conflict_or_db)?;
        info!(id = model.id, name = %model.name, "Updated datacenter");
        Ok(model)
    }

    /// Physically removes the record. Returns whether a row was removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = datacenter::Entity::delete_by_id(id).exec(&self.db).await?;
        info!(id, rows = res.rows_affected, "Deleted datacenter");
        Ok(res.rows_affected > 0)
    }

    async fn ensure_unique(
        &self,
        group_id: i32,
        name: &str,
        kind: &str,
        exclude_id: Option<i32>,
    ) -> Result<()> {
        let query = duplicate_query(group_id, name, kind, exclude_id);
        if let Some(existing) = query.one(&self.db).await? {
            return Err(AppError::Conflict(format!(
                "datacenter '{name}' of type '{kind}' already exists in group {group_id} (id {})",
                existing.id
            )));
        }
        Ok(())
    }
}

fn not_found(input: &DatacenterInput) -> AppError {
    if input.has_id() {
        AppError::NotFound(format!("Datacenter {}", input.id))
    } else {
        AppError::NotFound(format!(
            "Datacenter '{}'",
            input.lookup_name().unwrap_or_default()
        ))
    }
}

fn conflict_or_db(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => AppError::Conflict(msg),
        _ => AppError::Database(err),
    }
}

/// Builds the find query. Precedence, most specific first: id list, name
/// list, name and group, name, group, everything.
pub fn find_query(filter: &DatacenterInput) -> Select<datacenter::Entity> {
    let query = datacenter::Entity::find().filter(datacenter::Column::DeletedAt.is_null());

    let query = if !filter.ids.is_empty() {
        query.filter(datacenter::Column::Id.is_in(filter.ids.clone()))
    } else if !filter.names.is_empty() {
        query.filter(datacenter::Column::Name.is_in(filter.names.clone()))
    } else {
        match (filter.lookup_name(), filter.group_id) {
            (Some(name), Some(group_id)) => query
                .filter(datacenter::Column::Name.eq(name))
                .filter(datacenter::Column::GroupId.eq(group_id)),
            (Some(name), None) => query.filter(datacenter::Column::Name.eq(name)),
            (None, Some(group_id)) => query.filter(datacenter::Column::GroupId.eq(group_id)),
            (None, None) => query,
        }
    };

    query.order_by_asc(datacenter::Column::Id)
}

/// Rows that would collide with `(group_id, name, type)` under the unique
/// index. Soft-deleted rows count, since the index covers them too.
pub fn duplicate_query(
    group_id: i32,
    name: &str,
    kind: &str,
    exclude_id: Option<i32>,
) -> Select<datacenter::Entity> {
    let query = datacenter::Entity::find()
        .filter(datacenter::Column::GroupId.eq(group_id))
        .filter(datacenter::Column::Name.eq(name))
        .filter(datacenter::Column::Type.eq(kind));
    match exclude_id {
        Some(id) => query.filter(datacenter::Column::Id.ne(id)),
        None => query,
    }
}

/// The row inserted for a create request, with sensitive credentials sealed.
pub fn new_record(
    input: &DatacenterInput,
    codec: &CredentialCodec,
    policy: &SensitivityPolicy,
    now: DateTime<Utc>,
) -> std::result::Result<datacenter::ActiveModel, CryptoError> {
    let mut credentials = input.credentials.clone();
    credentials.seal(codec, policy)?;

    let mut model = datacenter::Model {
        id: 0,
        group_id: input.group_id.unwrap_or_default(),
        name: input.name.clone().unwrap_or_default(),
        r#type: input.kind.clone().unwrap_or_default(),
        region: String::new(),
        username: String::new(),
        password: String::new(),
        vcloud_url: String::new(),
        vse_url: String::new(),
        external_network: String::new(),
        access_key_id: String::new(),
        secret_access_key: String::new(),
        subscription_id: String::new(),
        client_id: String::new(),
        client_secret: String::new(),
        tenant_id: String::new(),
        environment: String::new(),
        token: String::new(),
        secret: String::new(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    model.set_credentials(credentials);

    let mut active = datacenter::ActiveModel::from(model).reset_all();
    active.id = NotSet;
    Ok(active)
}

/// Overlays `input` onto `stored`.
///
/// `name` and `group_id` are replaced whenever their keys were sent. `type`
/// and credentials are replaced only by non-empty values, and sensitive
/// credentials are encrypted before replacing. A sensitive value equal to the
/// stored ciphertext is kept as is, so a fetched record sent back unchanged
/// keeps its secrets.
pub fn merge_update(
    mut stored: datacenter::Model,
    input: &DatacenterInput,
    codec: &CredentialCodec,
    policy: &SensitivityPolicy,
    now: DateTime<Utc>,
) -> std::result::Result<datacenter::Model, CryptoError> {
    let mut credentials = stored.credentials();
    credentials.merge_from(&input.credentials, codec, policy)?;

    if let Some(name) = &input.name {
        stored.name = name.clone();
    }
    if let Some(group_id) = input.group_id {
        stored.group_id = group_id;
    }
    if let Some(kind) = input.kind.as_ref().filter(|k| !k.is_empty()) {
        stored.r#type = kind.clone();
    }
    stored.set_credentials(credentials);
    stored.updated_at = now;

    Ok(stored)
}

#[async_trait::async_trait]
impl Store for DatacenterStore {
    type Record = Datacenter;

    async fn get(&self, body: &[u8]) -> Result<Datacenter> {
        let input = DatacenterInput::from_slice(body);
        Ok(self.load_or_fail(&input).await?.into())
    }

    /// Creates when no id is given, otherwise merge-updates the stored record.
    async fn set(&self, body: &[u8]) -> Result<Datacenter> {
        let input = DatacenterInput::from_slice(body);
        let model = if input.has_id() {
            self.update(&input).await?
        } else {
            self.create(&input).await?
        };
        Ok(model.into())
    }

    async fn del(&self, body: &[u8]) -> Result<()> {
        let input = DatacenterInput::from_slice(body);
        let stored = self.load_or_fail(&input).await?;
        self.delete(stored.id).await?;
        Ok(())
    }

    async fn find(&self, body: &[u8]) -> Result<Vec<Datacenter>> {
        let filter = DatacenterInput::from_slice(body);
        let found = self.search(&filter).await?;
        Ok(found.into_iter().map(Datacenter::from).collect())
    }
}
