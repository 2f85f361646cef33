use crate::execution::{Event, Transaction};
use bytes::{Buf, BufMut, Bytes};
use commonware_codec::{
    DecodeExt, Encode, EncodeSize, Error, RangeCfg, Read, ReadExt, ReadRangeExt, Write,
};
use commonware_cryptography::ed25519::PublicKey;

/// Maximum number of transactions accepted in a single submission.
pub const MAX_SUBMISSION_TRANSACTIONS: usize = 128;

/// Maximum number of events carried by a single update frame.
pub const MAX_UPDATE_EVENTS: usize = 500;

/// Maximum encoded size of one event in an update frame.
pub const MAX_EVENT_SIZE: usize = 4 * 1024;

/// Body of `POST /submit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Transactions(Vec<Transaction>),
}

impl Write for Submission {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Submission::Transactions(txs) => {
                1u8.write(writer);
                txs.write(writer);
            }
        }
    }
}

impl Read for Submission {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            1 => Ok(Submission::Transactions(Vec::read_range(
                reader,
                1..=MAX_SUBMISSION_TRANSACTIONS,
            )?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Submission {
    fn encode_size(&self) -> usize {
        1 + match self {
            Submission::Transactions(txs) => txs.encode_size(),
        }
    }
}

/// Subscription filter for updates stream
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum UpdatesFilter {
    /// Subscribe to all events
    All,
    /// Subscribe to events for a specific account
    Account(PublicKey),
}

impl Write for UpdatesFilter {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            UpdatesFilter::All => 0u8.write(writer),
            UpdatesFilter::Account(key) => {
                1u8.write(writer);
                key.write(writer);
            }
        }
    }
}

impl Read for UpdatesFilter {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(UpdatesFilter::All),
            1 => Ok(UpdatesFilter::Account(PublicKey::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for UpdatesFilter {
    fn encode_size(&self) -> usize {
        1 + match self {
            UpdatesFilter::All => 0,
            UpdatesFilter::Account(key) => key.encode_size(),
        }
    }
}

/// One frame of the updates stream: the events of a finalized block that
/// passed the subscriber's filter.
///
/// Every event is length-delimited (`[height:u64][count][(len, event) × count]`), so kinds
/// other than game events are stepped over while reading instead of failing the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Events {
    pub height: u64,
    pub events: Vec<Event>,
}

impl Write for Events {
    fn write(&self, writer: &mut impl BufMut) {
        self.height.write(writer);
        self.events.len().write(writer);
        for event in &self.events {
            event.encode().freeze().write(writer);
        }
    }
}

impl Read for Events {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let height = u64::read(reader)?;
        let count = usize::read_cfg(reader, &RangeCfg::from(0..=MAX_UPDATE_EVENTS))?;
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            let item = Bytes::read_cfg(reader, &RangeCfg::from(0..=MAX_EVENT_SIZE))?;
            // Other event kinds are not for gateways
            if item.first().is_some_and(|tag| Event::is_game_event(*tag)) {
                events.push(Event::decode(item)?);
            }
        }
        Ok(Self { height, events })
    }
}

impl EncodeSize for Events {
    fn encode_size(&self) -> usize {
        self.height.encode_size()
            + self.events.len().encode_size()
            + self
                .events
                .iter()
                .map(|event| {
                    let size = event.encode_size();
                    size.encode_size() + size
                })
                .sum::<usize>()
    }
}
