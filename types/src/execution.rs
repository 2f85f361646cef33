use crate::casino::GameType;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    Signer, Verifier,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_SUPERSOCIETY";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

/// Maximum length of a game move payload accepted by the ledger.
pub const MAX_PAYLOAD_LENGTH: usize = 256;

/// Maximum length of a game state blob carried by events.
pub const MAX_STATE_LENGTH: usize = 1024;

/// Maximum length of the message carried by a [Event::CasinoError].
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    /// Bytes covered by the signature: `[nonce:u64 BE][instruction]`.
    pub fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::with_capacity(u64::SIZE + instruction.encode_size());
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

/// Game instructions understood by the casino program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Start a new casino game session.
    /// Binary: [12] [gameType:u8] [bet:u64 BE] [sessionId:u64 BE]
    CasinoStartGame {
        game_type: GameType,
        bet: u64,
        session_id: u64,
    },

    /// Make a move in an active casino game.
    /// Binary: [13] [sessionId:u64 BE] [payloadLen:u32 BE] [payload...]
    CasinoGameMove { session_id: u64, payload: Vec<u8> },
}

impl Instruction {
    /// Session the instruction is addressed to.
    pub fn session_id(&self) -> u64 {
        match self {
            Self::CasinoStartGame { session_id, .. } | Self::CasinoGameMove { session_id, .. } => {
                *session_id
            }
        }
    }
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::CasinoStartGame {
                game_type,
                bet,
                session_id,
            } => {
                12u8.write(writer);
                game_type.write(writer);
                bet.write(writer);
                session_id.write(writer);
            }
            Self::CasinoGameMove {
                session_id,
                payload,
            } => {
                13u8.write(writer);
                session_id.write(writer);
                (payload.len() as u32).write(writer);
                writer.put_slice(payload);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            12 => Self::CasinoStartGame {
                game_type: GameType::read(reader)?,
                bet: u64::read(reader)?,
                session_id: u64::read(reader)?,
            },
            13 => {
                let session_id = u64::read(reader)?;
                let payload = read_bytes(reader, MAX_PAYLOAD_LENGTH, "casino payload too long")?;
                Self::CasinoGameMove {
                    session_id,
                    payload,
                }
            }
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::CasinoStartGame { .. } => GameType::SIZE + u64::SIZE + u64::SIZE,
                Self::CasinoGameMove { payload, .. } => u64::SIZE + u32::SIZE + payload.len(),
            }
    }
}

/// Reads a `u32` length-prefixed byte string bounded by `max`.
fn read_bytes(reader: &mut impl Buf, max: usize, too_long: &'static str) -> Result<Vec<u8>, Error> {
    let len = u32::read(reader)? as usize;
    if len > max {
        return Err(Error::Invalid("Instruction", too_long));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    Ok(bytes)
}

/// Events emitted by the casino program that the gateway correlates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CasinoGameStarted {
        session_id: u64,
        player: PublicKey,
        game_type: GameType,
        bet: u64,
        initial_state: Vec<u8>,
    },
    CasinoGameMoved {
        session_id: u64,
        move_number: u32,
        new_state: Vec<u8>,
    },
    CasinoGameCompleted {
        session_id: u64,
        player: PublicKey,
        game_type: GameType,
        payout: i64,
        final_chips: u64,
        was_shielded: bool,
        was_doubled: bool,
    },
    CasinoError {
        player: PublicKey,
        session_id: Option<u64>,
        error_code: u8,
        message: String,
    },
}

/// Discriminant of an [Event], used when waiting for a specific outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Started,
    Moved,
    Completed,
    Error,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::CasinoGameStarted { .. } => EventKind::Started,
            Self::CasinoGameMoved { .. } => EventKind::Moved,
            Self::CasinoGameCompleted { .. } => EventKind::Completed,
            Self::CasinoError { .. } => EventKind::Error,
        }
    }

    /// Game session the event belongs to, if it names one.
    pub fn session_id(&self) -> Option<u64> {
        match self {
            Self::CasinoGameStarted { session_id, .. }
            | Self::CasinoGameMoved { session_id, .. }
            | Self::CasinoGameCompleted { session_id, .. } => Some(*session_id),
            Self::CasinoError { session_id, .. } => *session_id,
        }
    }

    /// Account the event is addressed to. Move events only carry the session.
    pub fn player(&self) -> Option<&PublicKey> {
        match self {
            Self::CasinoGameStarted { player, .. }
            | Self::CasinoGameCompleted { player, .. }
            | Self::CasinoError { player, .. } => Some(player),
            Self::CasinoGameMoved { .. } => None,
        }
    }

    /// Whether `tag` introduces one of the game events above. The ledger emits other kinds
    /// (registrations, leaderboard and tournament updates) that gateways do not decode.
    pub fn is_game_event(tag: u8) -> bool {
        matches!(tag, 21 | 22 | 23 | 29)
    }
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::CasinoGameStarted {
                session_id,
                player,
                game_type,
                bet,
                initial_state,
            } => {
                21u8.write(writer);
                session_id.write(writer);
                player.write(writer);
                game_type.write(writer);
                bet.write(writer);
                initial_state.write(writer);
            }
            Self::CasinoGameMoved {
                session_id,
                move_number,
                new_state,
            } => {
                22u8.write(writer);
                session_id.write(writer);
                move_number.write(writer);
                new_state.write(writer);
            }
            Self::CasinoGameCompleted {
                session_id,
                player,
                game_type,
                payout,
                final_chips,
                was_shielded,
                was_doubled,
            } => {
                23u8.write(writer);
                session_id.write(writer);
                player.write(writer);
                game_type.write(writer);
                payout.write(writer);
                final_chips.write(writer);
                was_shielded.write(writer);
                was_doubled.write(writer);
            }
            Self::CasinoError {
                player,
                session_id,
                error_code,
                message,
            } => {
                29u8.write(writer);
                player.write(writer);
                session_id.write(writer);
                error_code.write(writer);
                (message.len() as u32).write(writer);
                writer.put_slice(message.as_bytes());
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            21 => Self::CasinoGameStarted {
                session_id: u64::read(reader)?,
                player: PublicKey::read(reader)?,
                game_type: GameType::read(reader)?,
                bet: u64::read(reader)?,
                initial_state: Vec::<u8>::read_range(reader, 0..=MAX_STATE_LENGTH)?,
            },
            22 => Self::CasinoGameMoved {
                session_id: u64::read(reader)?,
                move_number: u32::read(reader)?,
                new_state: Vec::<u8>::read_range(reader, 0..=MAX_STATE_LENGTH)?,
            },
            23 => Self::CasinoGameCompleted {
                session_id: u64::read(reader)?,
                player: PublicKey::read(reader)?,
                game_type: GameType::read(reader)?,
                payout: i64::read(reader)?,
                final_chips: u64::read(reader)?,
                was_shielded: bool::read(reader)?,
                was_doubled: bool::read(reader)?,
            },
            29 => {
                let player = PublicKey::read(reader)?;
                let session_id = Option::<u64>::read(reader)?;
                let error_code = u8::read(reader)?;
                let message_len = u32::read(reader)? as usize;
                if message_len > MAX_ERROR_MESSAGE_LENGTH {
                    return Err(Error::Invalid("Event", "error message too long"));
                }
                if reader.remaining() < message_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut message_bytes = vec![0u8; message_len];
                reader.copy_to_slice(&mut message_bytes);
                let message = String::from_utf8(message_bytes)
                    .map_err(|_| Error::Invalid("Event", "invalid UTF-8 in error message"))?;
                Self::CasinoError {
                    player,
                    session_id,
                    error_code,
                    message,
                }
            }
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::CasinoGameStarted {
                    session_id,
                    player,
                    game_type,
                    bet,
                    initial_state,
                } => {
                    session_id.encode_size()
                        + player.encode_size()
                        + game_type.encode_size()
                        + bet.encode_size()
                        + initial_state.encode_size()
                }
                Self::CasinoGameMoved {
                    session_id,
                    move_number,
                    new_state,
                } => session_id.encode_size() + move_number.encode_size() + new_state.encode_size(),
                Self::CasinoGameCompleted {
                    session_id,
                    player,
                    game_type,
                    payout,
                    final_chips,
                    was_shielded,
                    was_doubled,
                } => {
                    session_id.encode_size()
                        + player.encode_size()
                        + game_type.encode_size()
                        + payout.encode_size()
                        + final_chips.encode_size()
                        + was_shielded.encode_size()
                        + was_doubled.encode_size()
                }
                Self::CasinoError {
                    player,
                    session_id,
                    error_code,
                    message,
                } => {
                    player.encode_size()
                        + session_id.encode_size()
                        + error_code.encode_size()
                        + u32::SIZE
                        + message.len()
                }
            }
    }
}
