//! Persistent role store (LMDB)
//!
//! The authority side of the mutation protocol. Roles live in three
//! sub-databases:
//! - `roles`: id -> role record (JSON)
//! - `names`: name -> id (uniqueness index)
//! - `meta`: `next_id` counter
//!
//! Name uniqueness is enforced here, inside the write transaction, never by
//! callers.

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use crate::error::{err, Result, RoleError};
use crate::matrix::PermissionMatrix;
use crate::validate::RolePayload;

/// A role known to the authority, identified by an opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRole {
    pub id: String,
    pub name: String,
    pub permissions: PermissionMatrix,
}

/// Successful mutation result: the canonical persisted copy plus a
/// user-facing confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub role: PersistedRole,
    pub message: String,
}

/// All database handles
struct Dbs {
    roles: Database<Str, Str>,
    names: Database<Str, Str>,
    meta: Database<Str, Str>,
}

// Global state
static ENV: OnceLock<Env> = OnceLock::new();
static DBS: OnceLock<Dbs> = OnceLock::new();
static INIT_PATH: OnceLock<String> = OnceLock::new();
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn dbs() -> Result<&'static Dbs> {
    DBS.get().ok_or_else(|| RoleError::Storage("Not initialized".into()))
}

fn env() -> Result<&'static Env> {
    ENV.get().ok_or_else(|| RoleError::Storage("Not initialized".into()))
}

fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(f: F) -> Result<T> {
    f(dbs()?, &env()?.read_txn().map_err(err)?)
}

fn write<T, F: FnOnce(&Dbs, &mut RwTxn) -> Result<T>>(f: F) -> Result<T> {
    let mut txn = env()?.write_txn().map_err(err)?;
    let r = f(dbs()?, &mut txn)?;
    txn.commit().map_err(err)?;
    Ok(r)
}

/// Initialize the store. Idempotent for the same path, an error for a
/// different one.
pub fn init(path: &str) -> Result<()> {
    if let Some(p) = INIT_PATH.get() {
        return if p == path {
            Ok(())
        } else {
            Err(RoleError::Storage(format!("Already init at {}", p)))
        };
    }
    std::fs::create_dir_all(path).map_err(err)?;
    // SAFETY: LMDB requires no other processes access this path concurrently during open.
    let e = unsafe {
        EnvOpenOptions::new()
            .map_size(1 << 30)
            .max_dbs(3)
            .open(Path::new(path))
            .map_err(err)?
    };
    let mut tx = e.write_txn().map_err(err)?;
    let d = Dbs {
        roles: e.create_database(&mut tx, Some("roles")).map_err(err)?,
        names: e.create_database(&mut tx, Some("names")).map_err(err)?,
        meta: e.create_database(&mut tx, Some("meta")).map_err(err)?,
    };
    tx.commit().map_err(err)?;
    let _ = (ENV.set(e), DBS.set(d), INIT_PATH.set(path.to_string()));
    Ok(())
}

/// Clear all databases (for testing)
pub fn clear_all() -> Result<()> {
    write(|d, tx| {
        d.roles.clear(tx).map_err(err)?;
        d.names.clear(tx).map_err(err)?;
        d.meta.clear(tx).map_err(err)
    })
}

/// Get the test lock (for single-threaded tests)
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

fn next_id(d: &Dbs, tx: &mut RwTxn) -> Result<u64> {
    let id = d
        .meta
        .get(tx, "next_id")
        .map_err(err)?
        .and_then(|s| s.parse().ok())
        .unwrap_or(1u64);
    d.meta.put(tx, "next_id", &(id + 1).to_string()).map_err(err)?;
    Ok(id)
}

fn put_role(d: &Dbs, tx: &mut RwTxn, role: &PersistedRole) -> Result<()> {
    let record = serde_json::to_string(role).map_err(err)?;
    d.roles.put(tx, &role.id, &record).map_err(err)?;
    d.names.put(tx, &role.name, &role.id).map_err(err)
}

/// Create a role. Fails with [`RoleError::NameTaken`] when the name index
/// already holds the name.
pub fn create_role(payload: &RolePayload) -> Result<MutationOutcome> {
    write(|d, tx| {
        if d.names.get(tx, &payload.name).map_err(err)?.is_some() {
            return Err(RoleError::NameTaken(payload.name.clone()));
        }
        let role = PersistedRole {
            id: next_id(d, tx)?.to_string(),
            name: payload.name.clone(),
            permissions: payload.permissions.clone(),
        };
        put_role(d, tx, &role)?;
        Ok(MutationOutcome { role, message: "Role created successfully.".into() })
    })
}

/// Update a role. Fails with [`RoleError::NotFound`] for a missing id and
/// [`RoleError::NameTaken`] when renaming onto another role's name.
pub fn update_role(role_id: &str, payload: &RolePayload) -> Result<MutationOutcome> {
    write(|d, tx| {
        let record = d
            .roles
            .get(tx, role_id)
            .map_err(err)?
            .ok_or_else(|| RoleError::NotFound(role_id.to_string()))?;
        let existing: PersistedRole = serde_json::from_str(record).map_err(err)?;

        if let Some(holder) = d.names.get(tx, &payload.name).map_err(err)? {
            if holder != role_id {
                return Err(RoleError::NameTaken(payload.name.clone()));
            }
        }
        if existing.name != payload.name {
            d.names.delete(tx, &existing.name).map_err(err)?;
        }

        let role = PersistedRole {
            id: role_id.to_string(),
            name: payload.name.clone(),
            permissions: payload.permissions.clone(),
        };
        put_role(d, tx, &role)?;
        Ok(MutationOutcome { role, message: "Role updated successfully.".into() })
    })
}

/// Fetch one role by id.
pub fn get_role(role_id: &str) -> Result<Option<PersistedRole>> {
    read(|d, tx| match d.roles.get(tx, role_id).map_err(err)? {
        Some(record) => Ok(Some(serde_json::from_str(record).map_err(err)?)),
        None => Ok(None),
    })
}

/// Fetch one role by name.
pub fn find_role_by_name(name: &str) -> Result<Option<PersistedRole>> {
    read(|d, tx| match d.names.get(tx, name).map_err(err)? {
        Some(id) => match d.roles.get(tx, id).map_err(err)? {
            Some(record) => Ok(Some(serde_json::from_str(record).map_err(err)?)),
            None => Ok(None),
        },
        None => Ok(None),
    })
}

/// List all roles in id order.
pub fn list_roles() -> Result<Vec<PersistedRole>> {
    read(|d, tx| {
        let mut roles = Vec::new();
        for item in d.roles.iter(tx).map_err(err)? {
            let (_, record) = item.map_err(err)?;
            roles.push(serde_json::from_str(record).map_err(err)?);
        }
        roles.sort_by_key(|r: &PersistedRole| r.id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(roles)
    })
}
