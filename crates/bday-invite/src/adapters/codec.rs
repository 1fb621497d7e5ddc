//! Program Wire Codec
//!
//! Account layout, instruction data and transactions for the invite
//! program. Accounts and instructions carry an 8-byte discriminator taken
//! from `sha256("account:<Type>")` and `sha256("global:<method>")`.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::system_program;
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::domain::InviteError;
use crate::ports::outbound::{ProgramOperation, TransactionSigner};
use crate::ports::records::{RawComment, RawEventAccount, RawNumber};

/// Account type name of event accounts.
pub const EVENT_ACCOUNT_NAME: &str = "BirthdayEvent";

/// Discriminator length.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Comment as laid out on chain.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OnChainComment {
    /// Sequence number
    pub comment_id: u64,
    /// Author key bytes
    pub comment_author: [u8; 32],
    /// Body
    pub content: String,
}

/// Event account as laid out on chain, after the discriminator.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OnChainEvent {
    /// Creator key bytes
    pub creator: [u8; 32],
    /// Event name
    pub event_name: String,
    /// Seconds since epoch
    pub event_date: i64,
    /// Confirmed attendees
    pub coming_count: u64,
    /// Declined attendees
    pub busy_count: u64,
    /// Comments in submission order
    pub comments: Vec<OnChainComment>,
}

impl OnChainEvent {
    /// Convert to the raw record shape gateways hand over.
    pub fn into_raw(self) -> RawEventAccount {
        RawEventAccount {
            event_name: self.event_name,
            event_date: RawNumber::from(self.event_date),
            creator: Pubkey::new_from_array(self.creator).to_string(),
            coming_count: RawNumber::from(self.coming_count),
            busy_count: RawNumber::from(self.busy_count),
            comments: Some(
                self.comments
                    .into_iter()
                    .map(|c| RawComment {
                        comment_id: Some(RawNumber::from(c.comment_id)),
                        comment_author: Pubkey::new_from_array(c.comment_author).to_string(),
                        content: c.content,
                    })
                    .collect(),
            ),
        }
    }
}

fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// Discriminator prefixing accounts of type `name`.
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("account", name)
}

/// Discriminator prefixing instruction data of method `snake_name`.
pub fn instruction_discriminator(snake_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("global", snake_name)
}

/// `initializeBdayEvent` -> `initialize_bday_event`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Decode account data into a raw event.
///
/// Trailing bytes after the encoded body are allocation padding and ignored.
pub fn decode_event_account(data: &[u8]) -> Result<RawEventAccount, InviteError> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(InviteError::Fetch(format!(
            "account data too short: {} bytes",
            data.len()
        )));
    }
    let (tag, mut body) = data.split_at(DISCRIMINATOR_LEN);
    if tag != account_discriminator(EVENT_ACCOUNT_NAME) {
        return Err(InviteError::Fetch(
            "account is not a BirthdayEvent".to_string(),
        ));
    }
    OnChainEvent::deserialize(&mut body)
        .map(OnChainEvent::into_raw)
        .map_err(|e| InviteError::Fetch(format!("account decode: {}", e)))
}

/// Encode an event account including its discriminator.
pub fn encode_event_account(event: &OnChainEvent) -> Result<Vec<u8>, InviteError> {
    let mut data = account_discriminator(EVENT_ACCOUNT_NAME).to_vec();
    event
        .serialize(&mut data)
        .map_err(|e| InviteError::Submission(format!("account encode: {}", e)))?;
    Ok(data)
}

/// Instruction data: discriminator followed by borsh-encoded arguments.
pub fn instruction_data(operation: &ProgramOperation) -> Result<Vec<u8>, InviteError> {
    let mut data = instruction_discriminator(&to_snake_case(operation.method_name())).to_vec();
    let encoded = match operation {
        ProgramOperation::InitializeBdayEvent {
            name, date_seconds, ..
        } => name
            .serialize(&mut data)
            .and_then(|_| date_seconds.serialize(&mut data)),
        ProgramOperation::ConfirmAttendance { name, .. }
        | ProgramOperation::DeclineAttendance { name, .. } => name.serialize(&mut data),
        ProgramOperation::AddComment { name, text, .. } => name
            .serialize(&mut data)
            .and_then(|_| text.serialize(&mut data)),
    };
    encoded.map_err(|e| InviteError::Submission(format!("instruction encode: {}", e)))?;
    Ok(data)
}

/// Build the program instruction for `operation` signed by `signer`.
pub fn build_instruction(
    program_id: &Pubkey,
    operation: &ProgramOperation,
    signer: &Pubkey,
) -> Result<Instruction, InviteError> {
    let mut accounts = vec![
        AccountMeta::new(*signer, true),
        AccountMeta::new(*operation.event(), false),
    ];
    if matches!(operation, ProgramOperation::InitializeBdayEvent { .. }) {
        accounts.push(AccountMeta::new_readonly(system_program::ID, false));
    }
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction_data(operation)?,
    })
}

/// Legacy transaction for `instruction`, paid for and signed by `signer`.
pub fn build_transaction(
    instruction: Instruction,
    signer: &dyn TransactionSigner,
    blockhash: Hash,
) -> Result<Transaction, InviteError> {
    let payer = signer.pubkey();
    let message = Message::new_with_blockhash(&[instruction], Some(&payer), &blockhash);
    let mut tx = Transaction::new_unsigned(message);
    let signature = signer.sign_message(&tx.message_data())?;
    tx.signatures = vec![Signature::from(signature)];
    Ok(tx)
}

/// Wire bytes of a transaction, as `sendTransaction` expects them.
pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>, InviteError> {
    bincode::serialize(tx)
        .map_err(|e| InviteError::Submission(format!("transaction encoding: {}", e)))
}
