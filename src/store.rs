//! Storage collaborator for the request aggregate.
//!
//! The service only talks to [`RequestStore`]; [`SledStore`] is the embedded
//! implementation. Requests, audit entries and per-year number counters live
//! in separate trees and every write that touches more than one of them goes
//! through a single sled transaction.
use super::audit::AuditEntry;
use super::error::StoreError;
use super::request::{Request, RequestId, RequestNumber};
use super::status::Status;
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use std::sync::Arc;

const REQUESTS: &str = "requests";
const AUDIT: &str = "audit";
const COUNTERS: &str = "request_numbers";

/// What a compare-and-set expects to find before it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guard {
    pub id: RequestId,
    pub status: Status,
    pub revision: u64,
}

impl Guard {
    pub fn of(request: &Request) -> Self {
        Self {
            id: request.id,
            status: request.status,
            revision: request.revision,
        }
    }
}

pub trait RequestStore: Send + Sync {
    /// Allocate an id and the next number for `year`, then persist whatever `build`
    /// makes of them together with its audit entry.
    fn create(
        &self,
        year: i32,
        build: &dyn Fn(RequestId, RequestNumber) -> (Request, AuditEntry),
    ) -> Result<Request, StoreError>;

    fn load(&self, id: RequestId) -> Result<Request, StoreError>;

    /// Replace the request only if it still matches `guard`, appending `entry` in the same write.
    fn compare_and_set(
        &self,
        guard: Guard,
        updated: &Request,
        entry: &AuditEntry,
    ) -> Result<(), StoreError>;

    fn append(&self, entry: &AuditEntry) -> Result<(), StoreError>;

    fn scan(&self) -> Result<Vec<Request>, StoreError>;

    fn entries(&self, id: RequestId) -> Result<Vec<AuditEntry>, StoreError>;
}

pub struct SledStore {
    instance: Arc<sled::Db>,
    requests: sled::Tree,
    audit: sled::Tree,
    counters: sled::Tree,
}

impl SledStore {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, StoreError> {
        let requests = instance.open_tree(REQUESTS)?;
        let audit = instance.open_tree(AUDIT)?;
        let counters = instance.open_tree(COUNTERS)?;

        Ok(Self {
            instance,
            requests,
            audit,
            counters,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.instance.flush()?;
        Ok(())
    }
}

fn request_key(id: RequestId) -> [u8; 8] {
    id.to_be_bytes()
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, StoreError> {
    minicbor::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

fn entry_key(entry: &AuditEntry) -> Result<Vec<u8>, StoreError> {
    entry
        .storage_key()
        .ok_or_else(|| StoreError::Encode(format!("audit entry id `{}` is not a uuid", entry.id)))
}

fn settle<T>(result: TransactionResult<T, StoreError>) -> Result<T, StoreError> {
    result.map_err(|e| match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StoreError::Sled(e),
    })
}

fn abort<T>(e: StoreError) -> Result<T, ConflictableTransactionError<StoreError>> {
    Err(ConflictableTransactionError::Abort(e))
}

impl RequestStore for SledStore {
    fn create(
        &self,
        year: i32,
        build: &dyn Fn(RequestId, RequestNumber) -> (Request, AuditEntry),
    ) -> Result<Request, StoreError> {
        let id = self.instance.generate_id()?;
        let counter_key = year.to_be_bytes();

        // sled retries the closure on conflict, so two creates can never read the same counter
        let result: TransactionResult<Request, StoreError> =
            (&self.counters, &self.requests, &self.audit).transaction(
                |(counters, requests, audit)| {
                    let last = match counters.get(counter_key)? {
                        Some(raw) => match <[u8; 4]>::try_from(raw.as_ref()) {
                            Ok(bytes) => u32::from_be_bytes(bytes),
                            Err(_) => {
                                return abort(StoreError::Encode(format!(
                                    "counter for {year} is corrupt"
                                )));
                            }
                        },
                        None => 0,
                    };
                    let number = RequestNumber::new(year, last + 1);
                    let (request, entry) = build(id, number);

                    let encoded = encode(&request).or_else(abort)?;
                    let encoded_entry = encode(&entry).or_else(abort)?;
                    let key = entry_key(&entry).or_else(abort)?;

                    counters.insert(&counter_key[..], &number.seq.to_be_bytes()[..])?;
                    requests.insert(&request_key(id)[..], encoded)?;
                    audit.insert(key, encoded_entry)?;

                    Ok(request)
                },
            );

        let request = settle(result)?;
        tracing::debug!(id, number = %request.number, "request stored");
        Ok(request)
    }

    fn load(&self, id: RequestId) -> Result<Request, StoreError> {
        let raw = self
            .requests
            .get(request_key(id))?
            .ok_or(StoreError::Missing(id))?;

        Ok(minicbor::decode(&raw)?)
    }

    fn compare_and_set(
        &self,
        guard: Guard,
        updated: &Request,
        entry: &AuditEntry,
    ) -> Result<(), StoreError> {
        let encoded = encode(updated)?;
        let encoded_entry = encode(entry)?;
        let key = entry_key(entry)?;

        let result: TransactionResult<(), StoreError> =
            (&self.requests, &self.audit).transaction(|(requests, audit)| {
                let Some(raw) = requests.get(request_key(guard.id))? else {
                    return abort(StoreError::Missing(guard.id));
                };
                let current: Request = match minicbor::decode(&raw) {
                    Ok(current) => current,
                    Err(e) => return abort(StoreError::Decode(e)),
                };
                if current.status != guard.status || current.revision != guard.revision {
                    return abort(StoreError::Stale {
                        id: guard.id,
                        expected: guard.status,
                    });
                }

                requests.insert(&request_key(guard.id)[..], encoded.clone())?;
                audit.insert(key.clone(), encoded_entry.clone())?;
                Ok(())
            });

        settle(result)?;
        tracing::debug!(
            id = guard.id,
            from = %guard.status,
            to = %updated.status,
            revision = updated.revision,
            "request swapped"
        );
        Ok(())
    }

    fn append(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        if !self.requests.contains_key(request_key(entry.request_id))? {
            return Err(StoreError::Missing(entry.request_id));
        }
        self.audit.insert(entry_key(entry)?, encode(entry)?)?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<Request>, StoreError> {
        self.requests
            .iter()
            .values()
            .map(|raw| -> Result<Request, StoreError> { Ok(minicbor::decode(&raw?)?) })
            .collect()
    }

    fn entries(&self, id: RequestId) -> Result<Vec<AuditEntry>, StoreError> {
        self.audit
            .scan_prefix(request_key(id))
            .values()
            .map(|raw| -> Result<AuditEntry, StoreError> { Ok(minicbor::decode(&raw?)?) })
            .collect()
    }
}
