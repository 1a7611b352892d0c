//! Node registry: node id to KEM key material
//!
//! On disk this is the `nodes.json` array:
//!
//! ```json
//! [{ "address": "0x…", "publicKey": "…", "secretKey": "…" }]
//! ```
//!
//! `secretKey` is optional. It is only present for local demos where the
//! node also plays every recipient and verifies its own deliveries.

use crate::error::{DeliveryError, Result};
use rand::Rng;
use relaygate_core::NodeId;
use relaygate_crypto::{KeyEncapsulation, KeyPair, PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// One registered node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub address: NodeId,

    #[serde(rename = "publicKey")]
    pub public_key: PublicKey,

    #[serde(rename = "secretKey", default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<SecretKey>,
}

/// Read-only view of every registered node, in file order
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<NodeId, usize>,
}

impl NodeRegistry {
    /// Build a registry, rejecting duplicate addresses
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.address.clone(), position).is_some() {
                return Err(DeliveryError::configuration(format!(
                    "duplicate registry address {}",
                    entry.address
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// Generate `count` nodes with random addresses and fresh key pairs
    pub fn generate<R: Rng + ?Sized>(
        kem: &dyn KeyEncapsulation,
        count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(count);
        while entries.len() < count {
            let address = NodeId::random_address(rng);
            if entries.iter().any(|e: &RegistryEntry| e.address == address) {
                continue;
            }
            let KeyPair {
                public_key,
                secret_key,
            } = kem.generate_keypair()?;
            entries.push(RegistryEntry {
                address,
                public_key,
                secret_key: Some(secret_key),
            });
        }

        info!(count, algorithm = %kem.algorithm(), "Generated node registry");
        Self::from_entries(entries)
    }

    /// Parse the JSON registry format
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<RegistryEntry> = serde_json::from_str(json)
            .map_err(|e| DeliveryError::configuration(format!("invalid registry: {}", e)))?;
        Self::from_entries(entries)
    }

    /// Render the JSON registry format
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| DeliveryError::Serialization(e.to_string()))
    }

    /// Load a registry file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DeliveryError::configuration(format!("cannot read registry {}: {}", path.display(), e))
        })?;
        let registry = Self::from_json(&json)?;
        debug!(path = %path.display(), nodes = registry.len(), "Loaded node registry");
        Ok(registry)
    }

    /// Write the registry file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check every entry's key material against `kem`.
    ///
    /// Public keys must encapsulate; where a secret key is present it must
    /// belong to the public key.
    pub fn validate(&self, kem: &dyn KeyEncapsulation) -> Result<()> {
        for entry in &self.entries {
            match &entry.secret_key {
                Some(secret_key) => {
                    let keypair = KeyPair {
                        public_key: entry.public_key.clone(),
                        secret_key: secret_key.clone(),
                    };
                    kem.validate_keypair(&keypair).map_err(|e| {
                        DeliveryError::configuration(format!(
                            "key pair for {} is not valid for {}: {}",
                            entry.address,
                            kem.algorithm(),
                            e
                        ))
                    })?;
                }
                None => {
                    kem.encapsulate(&entry.public_key).map_err(|e| {
                        DeliveryError::configuration(format!(
                            "public key for {} is not valid for {}: {}",
                            entry.address,
                            kem.algorithm(),
                            e
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Copy of the registry with every secret key removed
    pub fn without_secrets(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|e| RegistryEntry {
                address: e.address.clone(),
                public_key: e.public_key.clone(),
                secret_key: None,
            })
            .collect();
        Self {
            entries,
            index: self.index.clone(),
        }
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&RegistryEntry> {
        self.index.get(node_id).map(|&i| &self.entries[i])
    }

    /// Public key of a registered node
    pub fn public_key(&self, node_id: &NodeId) -> Result<&PublicKey> {
        self.get(node_id)
            .map(|e| &e.public_key)
            .ok_or_else(|| DeliveryError::configuration(format!("no public key for {}", node_id)))
    }

    pub fn secret_key(&self, node_id: &NodeId) -> Option<&SecretKey> {
        self.get(node_id).and_then(|e| e.secret_key.as_ref())
    }

    /// Node ids in registry order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.entries.iter().map(|e| e.address.clone()).collect()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
