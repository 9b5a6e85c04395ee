//! Visual identities and the project registry.
//!
//! A [`VisualIdentity`] is the stored, reusable visual definition of a
//! character or location: the structured description captured when it was
//! first synthesized plus the reproducibility seed used. Once set, that
//! pair is the sole consistency basis for every later panel until an
//! explicit regeneration replaces it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::scene::StructuredScene;
use crate::types::{Seed, Timestamp};

// ---------------------------------------------------------------------------
// Ad-hoc sentinels
// ---------------------------------------------------------------------------

/// Shot-plan sentinel for a character that is not in the registry.
pub const IDENTITY_REF_GENERIC: &str = "generic";

/// Shot-plan sentinel for a location that is not in the registry.
pub const IDENTITY_REF_NEW: &str = "new";

/// True when `identity_ref` explicitly asks the synthesizer to invent
/// details instead of resolving against the registry.
pub fn is_ad_hoc_ref(identity_ref: &str) -> bool {
    identity_ref == IDENTITY_REF_GENERIC || identity_ref == IDENTITY_REF_NEW
}

// ---------------------------------------------------------------------------
// VisualIdentity
// ---------------------------------------------------------------------------

/// Whether an identity describes a character or a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    Character,
    Location,
}

/// A stored visual definition of a character or location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualIdentity {
    pub id: String,
    pub name: String,
    pub kind: IdentityKind,
    /// The structured description captured when the identity was first
    /// synthesized (the description the capability actually used).
    pub structured_description: StructuredScene,
    /// Reproducibility seed from the first synthesis, if one was reported.
    pub seed: Option<Seed>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// IdentityRegistry
// ---------------------------------------------------------------------------

struct RegistryInner {
    identities: HashMap<String, VisualIdentity>,
    /// Registration order, for stable listings.
    order: Vec<String>,
    /// Canonical seed owned by the first identity registered with one.
    master_seed: Option<Seed>,
}

/// In-memory registry of visual identities for one project session.
///
/// The pipeline only ever reads from the registry; writes happen through
/// the registration and regeneration entry points. All methods take one
/// lock acquisition, so each call is atomic with respect to the others.
pub struct IdentityRegistry {
    inner: RwLock<RegistryInner>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                identities: HashMap::new(),
                order: Vec::new(),
                master_seed: None,
            }),
        }
    }

    /// Register a new identity.
    ///
    /// Fails with [`CoreError::Conflict`] if the id or name is already
    /// taken. The first identity registered with a seed becomes the owner
    /// of the master seed.
    pub async fn register(&self, identity: VisualIdentity) -> Result<VisualIdentity, CoreError> {
        let mut inner = self.inner.write().await;

        if inner.identities.contains_key(&identity.id) {
            return Err(CoreError::Conflict(format!(
                "Identity id already registered: {}",
                identity.id
            )));
        }
        if inner
            .identities
            .values()
            .any(|existing| existing.name == identity.name)
        {
            return Err(CoreError::Conflict(format!(
                "Identity name already registered: {}",
                identity.name
            )));
        }

        if inner.master_seed.is_none() {
            inner.master_seed = identity.seed;
        }

        inner.order.push(identity.id.clone());
        inner
            .identities
            .insert(identity.id.clone(), identity.clone());
        Ok(identity)
    }

    /// Replace an identity's description and seed (explicit regeneration).
    ///
    /// This is the only mutation an existing identity supports.
    pub async fn regenerate(
        &self,
        id: &str,
        structured_description: StructuredScene,
        seed: Option<Seed>,
    ) -> Result<VisualIdentity, CoreError> {
        let mut inner = self.inner.write().await;
        let identity = inner
            .identities
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Identity",
                id: id.to_string(),
            })?;

        identity.structured_description = structured_description;
        identity.seed = seed;
        Ok(identity.clone())
    }

    pub async fn get(&self, id: &str) -> Option<VisualIdentity> {
        self.inner.read().await.identities.get(id).cloned()
    }

    /// All identities in registration order.
    pub async fn list(&self) -> Vec<VisualIdentity> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.identities.get(id).cloned())
            .collect()
    }

    /// `(id, name)` pairs in registration order, for planner instructions.
    pub async fn name_pairs(&self) -> Vec<(String, String)> {
        self.list()
            .await
            .into_iter()
            .map(|identity| (identity.id, identity.name))
            .collect()
    }

    /// The canonical seed, owned by the first identity registered with one.
    pub async fn master_seed(&self) -> Option<Seed> {
        self.inner.read().await.master_seed
    }

    /// Point-in-time copy keyed by id, for the consistency resolver.
    pub async fn snapshot(&self) -> HashMap<String, VisualIdentity> {
        self.inner.read().await.identities.clone()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
