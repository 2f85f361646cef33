#![cfg(test)]
use crate::api::{Submission, UpdatesFilter};
use crate::casino::{sic_bo, BetRecord, GameType};
use crate::execution::{Instruction, Transaction};
use commonware_codec::{Encode, EncodeSize};
use commonware_cryptography::{ed25519::PrivateKey, Signer};

#[test]
fn updates_filter_encoding_is_stable() {
    assert_eq!(UpdatesFilter::All.encode().as_ref(), &[0u8]);

    let key = PrivateKey::from_seed(1).public_key();
    let encoded = UpdatesFilter::Account(key.clone()).encode();
    assert_eq!(encoded[0], 1);
    assert_eq!(&encoded[1..], key.encode().as_ref());
}

#[test]
fn submission_encoding_is_stable() {
    let private = PrivateKey::from_seed(1);
    let tx = Transaction::sign(
        &private,
        0,
        Instruction::CasinoStartGame {
            game_type: GameType::Baccarat,
            bet: 100,
            session_id: 1,
        },
    );
    let tx_bytes = tx.encode();
    let encoded = Submission::Transactions(vec![tx]).encode();

    // [kind=1][varint count=1][transaction]
    assert_eq!(&encoded[..2], &[1u8, 1]);
    assert_eq!(&encoded[2..], tx_bytes.as_ref());
    assert_eq!(
        &tx_bytes[..26],
        &[
            0, 0, 0, 0, 0, 0, 0, 0, // nonce
            12, 0, // start game, baccarat
            0, 0, 0, 0, 0, 0, 0, 100, // bet
            0, 0, 0, 0, 0, 0, 0, 1, // session id
        ]
    );
    assert!(tx_bytes[26..].starts_with(private.public_key().encode().as_ref()));
}

#[test]
fn game_move_wraps_codec_payload() {
    let bet = BetRecord::parse::<sic_bo::BetType>("SMALL", None, 10).unwrap();
    let payload = sic_bo::atomic_batch(&[bet]).unwrap();
    let instruction = Instruction::CasinoGameMove {
        session_id: 7,
        payload: payload.clone(),
    };
    let encoded = instruction.encode();
    assert_eq!(encoded.len(), instruction.encode_size());
    assert_eq!(&encoded[..1], &[13]);
    assert_eq!(&encoded[9..13], &(payload.len() as u32).to_be_bytes());
    assert_eq!(&encoded[13..], payload.as_slice());
}
