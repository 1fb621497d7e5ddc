//! # Event Address Derivation
//!
//! Event accounts live at program-derived addresses seeded with
//! `[event_name, "EVENT_SEED", creator]`. Two creators can reuse a name;
//! one creator cannot create the same name twice.

use solana_program::pubkey::Pubkey;

use crate::domain::{validate_event_name, InviteError, EVENT_SEED};

/// Seeds for an event account, in canonical order.
pub fn event_seeds<'a>(event_name: &'a str, creator: &'a Pubkey) -> [&'a [u8]; 3] {
    [event_name.as_bytes(), EVENT_SEED, creator.as_ref()]
}

/// Derive the event account address and its bump.
///
/// Fails with [`InviteError::Validation`] for an empty or over-long name.
pub fn derive_event_address(
    program_id: &Pubkey,
    event_name: &str,
    creator: &Pubkey,
) -> Result<(Pubkey, u8), InviteError> {
    validate_event_name(event_name)?;

    Pubkey::try_find_program_address(&event_seeds(event_name, creator), program_id).ok_or_else(
        || InviteError::Validation(format!("No valid event address for {:?}", event_name)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn program() -> Pubkey {
        Pubkey::new_from_array([7u8; 32])
    }

    #[test]
    fn test_same_inputs_same_address() {
        let creator = Pubkey::new_from_array([1u8; 32]);
        let a = derive_event_address(&program(), "Alice's 30th", &creator).unwrap();
        let b = derive_event_address(&program(), "Alice's 30th", &creator).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_creator_namespaces_names() {
        let alice = Pubkey::new_from_array([1u8; 32]);
        let bob = Pubkey::new_from_array([2u8; 32]);
        let (a, _) = derive_event_address(&program(), "Party", &alice).unwrap();
        let (b, _) = derive_event_address(&program(), "Party", &bob).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_matches_create_program_address_with_bump() {
        let creator = Pubkey::new_from_array([3u8; 32]);
        let (address, bump) = derive_event_address(&program(), "Party", &creator).unwrap();

        let bump_seed = [bump];
        let expected = Pubkey::create_program_address(
            &[b"Party", b"EVENT_SEED", creator.as_ref(), &bump_seed],
            &program(),
        )
        .unwrap();
        assert_eq!(address, expected);
    }

    #[test]
    fn test_seed_order_matters() {
        let creator = Pubkey::new_from_array([4u8; 32]);
        let (canonical, _) = derive_event_address(&program(), "Party", &creator).unwrap();
        let (swapped, _) = Pubkey::find_program_address(
            &[EVENT_SEED, b"Party", creator.as_ref()],
            &program(),
        );
        assert_ne!(canonical, swapped);
    }

    #[test]
    fn test_program_id_namespaces_addresses() {
        let creator = Pubkey::new_from_array([5u8; 32]);
        let other_program = Pubkey::new_from_array([8u8; 32]);
        let (a, _) = derive_event_address(&program(), "Party", &creator).unwrap();
        let (b, _) = derive_event_address(&other_program, "Party", &creator).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let creator = Pubkey::new_from_array([1u8; 32]);
        assert!(matches!(
            derive_event_address(&program(), "", &creator),
            Err(InviteError::Validation(_))
        ));
        assert!(matches!(
            derive_event_address(&program(), &"x".repeat(33), &creator),
            Err(InviteError::Validation(_))
        ));
        assert!(derive_event_address(&program(), &"x".repeat(32), &creator).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_derivation_is_pure(name in "[a-zA-Z0-9 ']{1,32}", key in any::<[u8; 32]>()) {
            let creator = Pubkey::new_from_array(key);
            let first = derive_event_address(&program(), &name, &creator).unwrap();
            let second = derive_event_address(&program(), &name, &creator).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_distinct_names_distinct_addresses(
            a in "[a-z]{1,16}",
            b in "[a-z]{1,16}",
            key in any::<[u8; 32]>(),
        ) {
            prop_assume!(a != b);
            let creator = Pubkey::new_from_array(key);
            let (first, _) = derive_event_address(&program(), &a, &creator).unwrap();
            let (second, _) = derive_event_address(&program(), &b, &creator).unwrap();
            prop_assert_ne!(first, second);
        }
    }
}
