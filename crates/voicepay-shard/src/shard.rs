//! A single user's state: recipients, schedules, transactions and login
//! nonce, backed by one SQLite file (spec §4.1).
//!
//! All operations take `&self` and serialize through the shard's own
//! `Mutex<Connection>` — the same single-writer-per-database shape as the
//! teacher's `Database` wrapper, just scoped to one user instead of one
//! global table.

use alloy::primitives::Signature;
use chrono::Utc;
use rand::RngCore;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use voicepay_types::{
    auth::signed_message_template, resolve_by_name, AuthState, Recipient, ResolveOutcome,
    Schedule, ScheduleId, Transaction, UserAddress,
};

use crate::db;
use crate::error::ShardError;

pub struct Shard {
    address: UserAddress,
    conn: Mutex<Connection>,
}

impl Shard {
    /// Open (or create) the shard file for `address` under `base_dir`.
    pub fn open(base_dir: &Path, address: UserAddress) -> Result<Self, ShardError> {
        std::fs::create_dir_all(base_dir)?;
        let path = Self::path_for(base_dir, &address);
        let conn = Connection::open(path)?;
        db::init_schema(&conn)?;
        Ok(Self {
            address,
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory shard, used by tests and by any caller that doesn't
    /// need persistence across restarts.
    pub fn open_in_memory(address: UserAddress) -> Result<Self, ShardError> {
        let conn = Connection::open_in_memory()?;
        db::init_schema(&conn)?;
        Ok(Self {
            address,
            conn: Mutex::new(conn),
        })
    }

    fn path_for(base_dir: &Path, address: &UserAddress) -> PathBuf {
        base_dir.join(format!("{}.db", address.as_str()))
    }

    pub fn address(&self) -> &UserAddress {
        &self.address
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // --- recipients -------------------------------------------------------

    pub fn get_recipients(&self) -> Result<Vec<Recipient>, ShardError> {
        db::list_recipients(&self.lock())
    }

    pub fn add_recipient(&self, recipient: Recipient) -> Result<Recipient, ShardError> {
        db::insert_recipient(&self.lock(), &recipient)?;
        Ok(recipient)
    }

    /// Replace the recipient currently keyed by `old_wallet` (spec §4.1
    /// `update_recipient(old_wallet, {new_wallet?, new_name?, new_note?})`).
    pub fn update_recipient(
        &self,
        old_wallet: &UserAddress,
        updated: Recipient,
    ) -> Result<Recipient, ShardError> {
        db::update_recipient(&self.lock(), old_wallet.as_str(), &updated)?;
        Ok(updated)
    }

    pub fn delete_recipient(&self, wallet: &UserAddress) -> Result<(), ShardError> {
        db::delete_recipient(&self.lock(), wallet.as_str())
    }

    /// Resolve a spoken/typed recipient name against this user's address
    /// book (spec §4.1 `resolve_by_name`).
    pub fn resolve_by_name(&self, query: &str) -> Result<ResolveOutcome, ShardError> {
        let recipients = db::list_recipients(&self.lock())?;
        Ok(resolve_by_name(&recipients, query))
    }

    // --- auth: nonce issuance + signature verification ---------------------

    /// Issue a fresh single-use login nonce, overwriting any previous one.
    pub fn issue_nonce(&self) -> Result<String, ShardError> {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let nonce = hex::encode(bytes);

        let conn = self.lock();
        db::set_auth_state(
            &conn,
            &AuthState {
                nonce: Some(nonce.clone()),
                updated_at: Some(Utc::now()),
            },
        )?;
        Ok(nonce)
    }

    /// Verify an EIP-191 `personal_sign` signature over the canonical
    /// template embedding the outstanding nonce. Consumes the nonce on
    /// success so it cannot be replayed (spec §4.1, I3).
    pub fn verify_signature(&self, signature_hex: &str) -> Result<UserAddress, ShardError> {
        let conn = self.lock();
        let state = db::get_auth_state(&conn)?;
        let nonce = state.nonce.ok_or(ShardError::NoNonce)?;

        let sig_bytes = hex::decode(signature_hex.trim_start_matches("0x"))
            .map_err(|_| ShardError::InvalidSignature)?;
        let signature =
            Signature::from_raw(&sig_bytes).map_err(|_| ShardError::InvalidSignature)?;

        let message = signed_message_template(&nonce);
        let recovered = signature
            .recover_address_from_msg(message.as_bytes())
            .map_err(|_| ShardError::InvalidSignature)?;

        let recovered_address = UserAddress::from_str(&format!("{recovered:#x}"))
            .expect("alloy addresses are always well-formed 20-byte hex");

        if recovered_address != self.address {
            return Err(ShardError::InvalidSignature);
        }

        // Single-use: clear the nonce once it has authenticated a signature.
        db::set_auth_state(
            &conn,
            &AuthState {
                nonce: None,
                updated_at: Some(Utc::now()),
            },
        )?;

        Ok(recovered_address)
    }

    // --- schedules ----------------------------------------------------------

    pub fn append_schedule(&self, schedule: Schedule) -> Result<Schedule, ShardError> {
        db::insert_schedule(&self.lock(), &schedule)?;
        Ok(schedule)
    }

    pub fn update_schedule(&self, schedule: Schedule) -> Result<Schedule, ShardError> {
        db::update_schedule(&self.lock(), &schedule)?;
        Ok(schedule)
    }

    pub fn delete_schedule(&self, id: ScheduleId) -> Result<(), ShardError> {
        db::delete_schedule(&self.lock(), id)
    }

    pub fn get_schedule(&self, id: ScheduleId) -> Result<Schedule, ShardError> {
        db::get_schedule(&self.lock(), id)
    }

    pub fn list_schedules(&self) -> Result<Vec<Schedule>, ShardError> {
        db::list_schedules(&self.lock())
    }

    // --- transactions ---------------------------------------------------------

    pub fn append_transaction(&self, tx: Transaction) -> Result<Transaction, ShardError> {
        db::insert_transaction(&self.lock(), &tx)?;
        Ok(tx)
    }

    pub fn list_transactions(&self) -> Result<Vec<Transaction>, ShardError> {
        db::list_transactions(&self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    fn addr_from_signer(signer: &PrivateKeySigner) -> UserAddress {
        UserAddress::from_str(&format!("{:#x}", signer.address())).unwrap()
    }

    #[test]
    fn nonce_is_single_use() {
        let signer = PrivateKeySigner::random();
        let address = addr_from_signer(&signer);
        let shard = Shard::open_in_memory(address.clone()).unwrap();

        let nonce = shard.issue_nonce().unwrap();
        let message = signed_message_template(&nonce);
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", hex::encode(signature.as_bytes()));

        let recovered = shard.verify_signature(&sig_hex).unwrap();
        assert_eq!(recovered, address);

        // Replaying the same signature must fail: the nonce was consumed.
        let replay = shard.verify_signature(&sig_hex);
        assert!(replay.is_err());
    }

    #[test]
    fn verify_without_issued_nonce_fails() {
        let signer = PrivateKeySigner::random();
        let address = addr_from_signer(&signer);
        let shard = Shard::open_in_memory(address).unwrap();
        let err = shard.verify_signature("0xdeadbeef").unwrap_err();
        assert!(matches!(err, ShardError::NoNonce));
    }

    #[test]
    fn signature_from_wrong_signer_is_rejected() {
        let owner = PrivateKeySigner::random();
        let impostor = PrivateKeySigner::random();
        let address = addr_from_signer(&owner);
        let shard = Shard::open_in_memory(address).unwrap();

        let nonce = shard.issue_nonce().unwrap();
        let message = signed_message_template(&nonce);
        let signature = impostor.sign_message_sync(message.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", hex::encode(signature.as_bytes()));

        let err = shard.verify_signature(&sig_hex).unwrap_err();
        assert!(matches!(err, ShardError::InvalidSignature));
    }

    #[test]
    fn duplicate_wallet_is_rejected_even_under_a_different_name() {
        let shard = Shard::open_in_memory("0x1111111111111111111111111111111111111111".parse().unwrap()).unwrap();
        let wallet: UserAddress = "0x2222222222222222222222222222222222222222".parse().unwrap();
        shard
            .add_recipient(Recipient { name: "bob".to_string(), wallet: wallet.clone(), note: None })
            .unwrap();
        let err = shard
            .add_recipient(Recipient { name: "bobby".to_string(), wallet, note: None })
            .unwrap_err();
        assert!(matches!(err, ShardError::Duplicate(_)));
    }

    #[test]
    fn update_recipient_renames_by_wallet_key() {
        let shard = Shard::open_in_memory("0x1111111111111111111111111111111111111111".parse().unwrap()).unwrap();
        let wallet: UserAddress = "0x3333333333333333333333333333333333333333".parse().unwrap();
        shard
            .add_recipient(Recipient { name: "bob".to_string(), wallet: wallet.clone(), note: None })
            .unwrap();
        shard
            .update_recipient(&wallet, Recipient { name: "robert".to_string(), wallet: wallet.clone(), note: None })
            .unwrap();
        let all = shard.get_recipients().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "robert");
    }

    #[test]
    fn delete_recipient_by_wallet() {
        let shard = Shard::open_in_memory("0x1111111111111111111111111111111111111111".parse().unwrap()).unwrap();
        let wallet: UserAddress = "0x4444444444444444444444444444444444444444".parse().unwrap();
        shard
            .add_recipient(Recipient { name: "carol".to_string(), wallet: wallet.clone(), note: None })
            .unwrap();
        shard.delete_recipient(&wallet).unwrap();
        assert!(shard.get_recipients().unwrap().is_empty());
    }
}
