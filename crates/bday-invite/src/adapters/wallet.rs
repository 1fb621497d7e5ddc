//! Keypair Signer and Local Wallet Adapters
//!
//! `KeypairSigner` implements `TransactionSigner` with an ed25519 key held in
//! memory. `LocalWallet` implements `WalletProvider` as a connect/disconnect
//! slot.

use ed25519_dalek::{Signer, SigningKey};
use parking_lot::RwLock;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::read_keypair_file;
use std::path::Path;
use std::sync::Arc;

use crate::domain::InviteError;
use crate::ports::outbound::{TransactionSigner, WalletProvider};

/// In-memory ed25519 signer.
pub struct KeypairSigner {
    key: SigningKey,
}

impl KeypairSigner {
    /// Build from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Build from the 64-byte `secret || public` layout wallets export.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, InviteError> {
        let bytes: &[u8; 64] = bytes.try_into().map_err(|_| {
            InviteError::Config(format!("keypair must be 64 bytes, got {}", bytes.len()))
        })?;
        let key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|e| InviteError::Config(format!("invalid keypair: {}", e)))?;
        Ok(Self { key })
    }

    /// Load a keypair file holding a JSON array of 64 bytes.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InviteError> {
        let path = path.as_ref();
        let keypair = read_keypair_file(path)
            .map_err(|e| InviteError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_keypair_bytes(&keypair.to_bytes())
    }
}

impl TransactionSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.key.verifying_key().to_bytes())
    }

    fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], InviteError> {
        Ok(self.key.sign(message).to_bytes())
    }
}

/// Wallet slot that is either connected to a signer or not.
#[derive(Default)]
pub struct LocalWallet {
    signer: RwLock<Option<Arc<dyn TransactionSigner>>>,
}

impl LocalWallet {
    /// Disconnected wallet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet already connected to `signer`.
    pub fn connected(signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            signer: RwLock::new(Some(signer)),
        }
    }

    /// Connect, replacing any previous signer.
    pub fn connect(&self, signer: Arc<dyn TransactionSigner>) {
        tracing::info!(identity = %signer.pubkey(), "Wallet connected");
        *self.signer.write() = Some(signer);
    }

    /// Disconnect.
    pub fn disconnect(&self) {
        if self.signer.write().take().is_some() {
            tracing::info!("Wallet disconnected");
        }
    }
}

impl WalletProvider for LocalWallet {
    fn current_signer(&self) -> Option<Arc<dyn TransactionSigner>> {
        self.signer.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use solana_sdk::signature::{write_keypair_file, Signer as _};
    use solana_sdk::signer::keypair::keypair_from_seed;

    #[test]
    fn test_signature_verifies() {
        let signer = KeypairSigner::from_seed([1u8; 32]);
        let sig = signer.sign_message(b"hello").unwrap();

        let key = VerifyingKey::from_bytes(&signer.pubkey().to_bytes()).unwrap();
        assert!(key.verify(b"hello", &Signature::from_bytes(&sig)).is_ok());
    }

    #[test]
    fn test_keypair_bytes_round_trip() {
        let seeded = KeypairSigner::from_seed([2u8; 32]);
        let mut bytes = [2u8; 32].to_vec();
        bytes.extend_from_slice(&seeded.pubkey().to_bytes());

        let loaded = KeypairSigner::from_keypair_bytes(&bytes).unwrap();
        assert_eq!(loaded.pubkey(), seeded.pubkey());
    }

    #[test]
    fn test_keypair_wrong_length() {
        assert!(matches!(
            KeypairSigner::from_keypair_bytes(&[0u8; 10]),
            Err(InviteError::Config(_))
        ));
    }

    #[test]
    fn test_keypair_mismatched_public_half() {
        let mut bytes = [3u8; 32].to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        assert!(KeypairSigner::from_keypair_bytes(&bytes).is_err());
    }

    #[test]
    fn test_load_keypair_file() {
        let keypair = keypair_from_seed(&[6u8; 32]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        write_keypair_file(&keypair, &path).unwrap();

        let signer = KeypairSigner::from_json_file(&path).unwrap();
        assert_eq!(signer.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_missing_keypair_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            KeypairSigner::from_json_file(dir.path().join("absent.json")),
            Err(InviteError::Config(_))
        ));
    }

    #[test]
    fn test_wallet_connect_disconnect() {
        let wallet = LocalWallet::new();
        assert!(!wallet.is_connected());

        let signer = Arc::new(KeypairSigner::from_seed([4u8; 32]));
        let identity = signer.pubkey();
        wallet.connect(signer);
        assert!(wallet.is_connected());
        assert_eq!(wallet.current_signer().unwrap().pubkey(), identity);

        wallet.disconnect();
        assert!(wallet.current_signer().is_none());
    }
}
