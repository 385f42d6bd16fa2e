//! Record resource surface
//!
//! The shape an orchestration tool binds to: three fields, all of which force
//! recreation when changed, and the create/read/delete/exists hooks. Also
//! loads desired-state manifests and plans the change for each record.

use crate::error::RecordError;
use crate::record::{canonical_name, validate_name, RecordReconciler};
use crate::store::KeyValueStore;
use crate::types::LogicalRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    StringSet,
}

/// One field of the record resource schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Changing the field replaces the resource instead of updating it.
    pub force_new: bool,
}

pub const RECORD_SCHEMA: &[FieldSchema] = &[
    FieldSchema {
        name: "name",
        kind: FieldKind::String,
        required: true,
        force_new: true,
    },
    FieldSchema {
        name: "ttl",
        kind: FieldKind::Int,
        required: true,
        force_new: true,
    },
    FieldSchema {
        name: "records",
        kind: FieldKind::StringSet,
        required: true,
        force_new: true,
    },
];

/// Desired state of one DNS record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResource {
    pub name: String,
    pub ttl: u32,
    pub records: BTreeSet<String>,
}

/// What it takes to move from prior to desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAction {
    NoOp,
    Create,
    /// Fields that changed; the old record goes and the new one is written.
    Replace { changed: Vec<&'static str> },
    Destroy,
}

impl ResourceAction {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceAction::NoOp => "no-op",
            ResourceAction::Create => "create",
            ResourceAction::Replace { .. } => "replace",
            ResourceAction::Destroy => "destroy",
        }
    }
}

impl RecordResource {
    pub fn validate(&self) -> Result<(), RecordError> {
        validate_name(&self.name)?;
        if self.ttl == 0 {
            return Err(RecordError::InvalidRecord(format!(
                "{}: ttl must be positive",
                self.name
            )));
        }
        if self.records.is_empty() {
            return Err(RecordError::InvalidRecord(format!(
                "{}: records must not be empty",
                self.name
            )));
        }
        if self.records.iter().any(|r| r.trim().is_empty()) {
            return Err(RecordError::InvalidRecord(format!(
                "{}: records must not contain blank entries",
                self.name
            )));
        }
        Ok(())
    }

    /// Names of fields that differ from `other`.
    ///
    /// Names are compared in canonical form: `www.example.com.` and
    /// `www.example.com` are the same record.
    pub fn changed_fields(&self, other: &RecordResource) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if canonical_name(&self.name) != canonical_name(&other.name) {
            changed.push("name");
        }
        if self.ttl != other.ttl {
            changed.push("ttl");
        }
        if self.records != other.records {
            changed.push("records");
        }
        changed
    }

    /// Create hook. Returns the resource id.
    pub async fn create<S: KeyValueStore>(
        &self,
        reconciler: &RecordReconciler<S>,
    ) -> Result<String, RecordError> {
        self.validate()?;
        reconciler
            .create_or_replace(&self.name, self.ttl, &self.records)
            .await
    }

    /// Read hook. `None` means the record is gone from the store.
    ///
    /// A record stored without a ttl keeps the prior value.
    pub async fn read<S: KeyValueStore>(
        &self,
        reconciler: &RecordReconciler<S>,
    ) -> Result<Option<RecordResource>, RecordError> {
        match reconciler.read(&self.name).await {
            Ok(record) => Ok(Some(RecordResource {
                name: self.name.clone(),
                ttl: record.ttl.unwrap_or(self.ttl),
                records: record.hosts,
            })),
            Err(RecordError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn delete<S: KeyValueStore>(
        &self,
        reconciler: &RecordReconciler<S>,
    ) -> Result<(), RecordError> {
        reconciler.delete(&self.name).await
    }

    pub async fn exists<S: KeyValueStore>(
        &self,
        reconciler: &RecordReconciler<S>,
    ) -> Result<bool, RecordError> {
        reconciler.exists(&self.name).await
    }
}

impl From<LogicalRecord> for RecordResource {
    fn from(record: LogicalRecord) -> Self {
        Self {
            name: record.name,
            ttl: record.ttl.unwrap_or(0),
            records: record.hosts,
        }
    }
}

/// Recreate-on-change policy: any field difference is a replacement.
pub fn plan(prior: Option<&RecordResource>, desired: Option<&RecordResource>) -> ResourceAction {
    match (prior, desired) {
        (None, None) => ResourceAction::NoOp,
        (None, Some(_)) => ResourceAction::Create,
        (Some(_), None) => ResourceAction::Destroy,
        (Some(prior), Some(desired)) => {
            let changed = prior.changed_fields(desired);
            if changed.is_empty() {
                ResourceAction::NoOp
            } else {
                ResourceAction::Replace { changed }
            }
        }
    }
}

/// Carry out `plan(prior, desired)`.
///
/// On replacement the old record is removed first, unless the name changed,
/// in which case the new record is written before the old one is removed.
pub async fn apply<S: KeyValueStore>(
    reconciler: &RecordReconciler<S>,
    prior: Option<&RecordResource>,
    desired: Option<&RecordResource>,
) -> Result<ResourceAction, RecordError> {
    if let Some(desired) = desired {
        desired.validate()?;
    }
    let action = plan(prior, desired);
    match (&action, prior, desired) {
        (ResourceAction::Create, _, Some(desired)) => {
            desired.create(reconciler).await?;
        }
        (ResourceAction::Destroy, Some(prior), _) => {
            prior.delete(reconciler).await?;
        }
        (ResourceAction::Replace { changed }, Some(prior), Some(desired)) => {
            if changed.contains(&"name") {
                desired.create(reconciler).await?;
                prior.delete(reconciler).await?;
            } else {
                prior.delete(reconciler).await?;
                desired.create(reconciler).await?;
            }
        }
        _ => {}
    }
    if let Some(name) = desired.or(prior).map(|r| r.name.as_str()) {
        info!(record = name, action = action.label(), "resource applied");
    }
    Ok(action)
}

/// Current state of `name` in the store as a resource, if any.
pub async fn observe<S: KeyValueStore>(
    reconciler: &RecordReconciler<S>,
    name: &str,
) -> Result<Option<RecordResource>, RecordError> {
    match reconciler.read(name).await {
        Ok(record) => Ok(Some(RecordResource::from(record))),
        Err(RecordError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Desired-state document: a `records` array of resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordManifest {
    #[serde(default)]
    pub records: Vec<RecordResource>,
}

impl RecordManifest {
    /// Load from a TOML, YAML or JSON file (by extension).
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        if !path.exists() {
            return Err(RecordError::Config(format!(
                "Manifest not found: {}",
                path.display()
            )));
        }
        let manifest: RecordManifest = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        let mut seen = BTreeSet::new();
        for record in &self.records {
            record.validate()?;
            if !seen.insert(canonical_name(&record.name)) {
                return Err(RecordError::InvalidRecord(format!(
                    "{} is declared more than once",
                    record.name
                )));
            }
        }
        Ok(())
    }
}
