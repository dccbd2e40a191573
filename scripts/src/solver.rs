// BP foundation libraries Bitcoin crates implementing the foundations of
// Bitcoin protocol by LNP/BP Association (https://lnp-bp.org)
//
// Written in 2020-2022 by
//     Dr. Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// This software is distributed without any warranty.
//
// You should have received a copy of the Apache-2.0 License
// along with this software.
// If not, see <https://opensource.org/licenses/Apache-2.0>.

//! Template matching of `scriptPubkey` against the closed set of standard
//! output templates.

use amplify::Wrapper;
use bitcoin::blockdata::opcodes::all::*;
use bitcoin::blockdata::opcodes::{self, Class, ClassifyContext};
use bitcoin::blockdata::script::Instruction;
use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, ScriptHash};
use tracing::trace;

use crate::policy::{
    MAX_MULTISIG_DATA_OP_DROP_SIZE, MAX_MULTISIG_KEYS, MAX_ZEROCOIN_MINT_SCRIPT_SIZE,
    OP_ZEROCOINMINT,
};
use crate::{PubkeyScript, TxoutType};

/// Parameters captured from a `scriptPubkey` by the template matcher. Each
/// variant corresponds to a single [`TxoutType`] and holds only the data the
/// template actually encodes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Solution {
    /// Script does not match any of the known templates.
    NonStandard,

    /// Serialized public key from a P2PK script (33 or 65 bytes).
    Pubkey(Box<[u8]>),

    /// Public key hash from a P2PKH script.
    PubkeyHash(PubkeyHash),

    /// Redeem script hash from a P2SH script.
    ScriptHash(ScriptHash),

    /// Bare `m`-of-`n` multisig.
    Multisig {
        /// Number of signatures required to spend (`m`).
        required: u8,
        /// Serialized public keys in the order of the script (`n` keys).
        keys: Vec<Box<[u8]>>,
    },

    /// Bare multisig followed by a data push dropped from the stack.
    MultisigData {
        /// Number of signatures required to spend (`m`).
        required: u8,
        /// Serialized public keys in the order of the script (`n` keys).
        keys: Vec<Box<[u8]>>,
        /// Data payload, no longer than
        /// [`crate::policy::MAX_MULTISIG_DATA_OP_DROP_SIZE`].
        data: Box<[u8]>,
    },

    /// `OP_RETURN` output. Carries no spendable destination.
    NullData,

    /// Zerocoin mint commitment, uninterpreted.
    ZerocoinMint(Box<[u8]>),
}

impl Solution {
    /// Returns output type matching the solution.
    pub fn txout_type(&self) -> TxoutType {
        match self {
            Solution::NonStandard => TxoutType::NonStandard,
            Solution::Pubkey(_) => TxoutType::Pubkey,
            Solution::PubkeyHash(_) => TxoutType::PubkeyHash,
            Solution::ScriptHash(_) => TxoutType::ScriptHash,
            Solution::Multisig { .. } => TxoutType::Multisig,
            Solution::MultisigData { .. } => TxoutType::MultisigData,
            Solution::NullData => TxoutType::NullData,
            Solution::ZerocoinMint(_) => TxoutType::ZerocoinMint,
        }
    }

    /// Number of `sigScript` stack items a satisfying spend must provide.
    pub fn sig_args_expected(&self) -> SigArgs {
        match self {
            Solution::Pubkey(_) => SigArgs::Exact(1),
            Solution::PubkeyHash(_) => SigArgs::Exact(2),
            Solution::ScriptHash(_) => SigArgs::RedeemScript,
            // OP_CHECKMULTISIG pops one extra stack item
            Solution::Multisig { required, .. } | Solution::MultisigData { required, .. } => {
                SigArgs::Exact(*required as usize + 1)
            }
            Solution::NullData | Solution::ZerocoinMint(_) | Solution::NonStandard => {
                SigArgs::Unknown
            }
        }
    }

    /// Renders captured parameters as an ordered list of byte buffers: a
    /// single-byte `m`, the keys and a single-byte `n` for multisig (followed
    /// by the data for [`Solution::MultisigData`]); the hash, key or
    /// commitment for single-element templates; and an empty list otherwise.
    pub fn to_pushes(&self) -> Vec<Vec<u8>> {
        match self {
            Solution::NonStandard | Solution::NullData => vec![],
            Solution::Pubkey(key) => vec![key.to_vec()],
            Solution::PubkeyHash(hash) => vec![hash.to_vec()],
            Solution::ScriptHash(hash) => vec![hash.to_vec()],
            Solution::ZerocoinMint(commitment) => vec![commitment.to_vec()],
            Solution::Multisig { required, keys } => multisig_pushes(*required, keys).collect(),
            Solution::MultisigData {
                required,
                keys,
                data,
            } => multisig_pushes(*required, keys)
                .chain(Some(data.to_vec()))
                .collect(),
        }
    }
}

fn multisig_pushes<'a>(
    required: u8,
    keys: &'a [Box<[u8]>],
) -> impl Iterator<Item = Vec<u8>> + 'a {
    Some(vec![required])
        .into_iter()
        .chain(keys.iter().map(|key| key.to_vec()))
        .chain(Some(vec![keys.len() as u8]))
}

/// Number of `sigScript` arguments expected by a [`Solution`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
pub enum SigArgs {
    /// Exact number of stack items.
    #[display("{0}")]
    Exact(usize),

    /// Depends on the redeem script, which must be evaluated recursively
    /// by the caller.
    #[display("redeem-script")]
    RedeemScript,

    /// Output is unspendable or its spending conditions are unknown.
    #[display("unknown")]
    Unknown,
}

impl SigArgs {
    /// Returns the exact number of arguments, if known.
    #[inline]
    pub fn count(self) -> Option<usize> {
        match self {
            SigArgs::Exact(count) => Some(count),
            SigArgs::RedeemScript | SigArgs::Unknown => None,
        }
    }

    /// Legacy integer representation: the count, or `-1` for unknown.
    /// Returns `None` for [`SigArgs::RedeemScript`], which has no integer
    /// form.
    pub fn as_i32(self) -> Option<i32> {
        match self {
            SigArgs::Exact(count) => Some(count as i32),
            SigArgs::Unknown => Some(-1),
            SigArgs::RedeemScript => None,
        }
    }
}

impl PubkeyScript {
    /// Classifies the script against the standard output templates,
    /// capturing template parameters.
    ///
    /// The function never fails: scripts matching none of the templates
    /// (including the ones which can't be decoded) produce
    /// [`Solution::NonStandard`].
    pub fn solve(&self) -> Solution {
        let bytes = self.as_bytes();

        // P2SH and P2PKH are matched on exact bytes: only canonical pushes
        // form them
        if self.is_p2sh() {
            return Solution::ScriptHash(
                ScriptHash::from_slice(&bytes[2..22]).expect("P2SH script has 20-byte hash"),
            );
        }

        if bytes.first() == Some(&OP_ZEROCOINMINT) {
            return if (2..=MAX_ZEROCOIN_MINT_SCRIPT_SIZE).contains(&bytes.len()) {
                Solution::ZerocoinMint(Box::from(&bytes[2..]))
            } else {
                trace!(len = bytes.len(), "zerocoin mint script of non-standard size");
                Solution::NonStandard
            };
        }

        if self.is_p2pkh() {
            return Solution::PubkeyHash(
                PubkeyHash::from_slice(&bytes[3..23]).expect("P2PKH script has 20-byte hash"),
            );
        }

        let instructions = match self
            .as_inner()
            .instructions()
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(instructions) => instructions,
            Err(err) => {
                trace!(%err, "output script can't be decoded");
                return Solution::NonStandard;
            }
        };

        solve_null_data(&instructions)
            .or_else(|| solve_pubkey(&instructions))
            .or_else(|| solve_multisig(&instructions))
            .unwrap_or(Solution::NonStandard)
    }

    /// Detects type of the output script.
    #[inline]
    pub fn txout_type(&self) -> TxoutType { self.solve().txout_type() }
}

/// Checks whether the length of a pushed data matches the one of a
/// serialized public key.
#[inline]
pub(crate) fn is_pubkey_len(len: usize) -> bool { len == 33 || len == 65 }

fn is_op(instruction: &Instruction<'_>, opcode: opcodes::All) -> bool {
    matches!(instruction, Instruction::Op(op) if *op == opcode)
}

fn small_int(instruction: &Instruction<'_>) -> Option<u8> {
    match instruction {
        Instruction::Op(op) => match op.classify(ClassifyContext::Legacy) {
            Class::PushNum(n) if (1..=16).contains(&n) => Some(n as u8),
            _ => None,
        },
        _ => None,
    }
}

fn pubkey_push<'a>(instruction: &Instruction<'a>) -> Option<&'a [u8]> {
    match *instruction {
        Instruction::PushBytes(key) if is_pubkey_len(key.len()) => Some(key),
        _ => None,
    }
}

fn solve_null_data(instructions: &[Instruction<'_>]) -> Option<Solution> {
    let (first, rest) = instructions.split_first()?;
    if !is_op(first, OP_RETURN) {
        return None;
    }
    match rest {
        [] | [Instruction::PushBytes(_)] => Some(Solution::NullData),
        [push] if small_int(push).is_some() => Some(Solution::NullData),
        _ => None,
    }
}

fn solve_pubkey(instructions: &[Instruction<'_>]) -> Option<Solution> {
    match instructions {
        [push, checksig] if is_op(checksig, OP_CHECKSIG) => {
            pubkey_push(push).map(|key| Solution::Pubkey(Box::from(key)))
        }
        _ => None,
    }
}

fn solve_multisig(instructions: &[Instruction<'_>]) -> Option<Solution> {
    let (first, rest) = instructions.split_first()?;
    let required = small_int(first)?;

    let keys = rest
        .iter()
        .map_while(pubkey_push)
        .map(Box::from)
        .collect::<Vec<Box<[u8]>>>();
    let (last, rest) = rest[keys.len()..].split_first()?;
    let total = small_int(last)?;

    if keys.is_empty()
        || keys.len() > MAX_MULTISIG_KEYS
        || total as usize != keys.len()
        || required > total
    {
        return None;
    }

    match rest {
        [checkmultisig] if is_op(checkmultisig, OP_CHECKMULTISIG) => {
            Some(Solution::Multisig { required, keys })
        }
        [checkmultisig, Instruction::PushBytes(data), drop]
            if is_op(checkmultisig, OP_CHECKMULTISIG) && is_op(drop, OP_DROP) =>
        {
            if data.len() > MAX_MULTISIG_DATA_OP_DROP_SIZE {
                trace!(len = data.len(), "multisig data payload exceeds the limit");
                return None;
            }
            Some(Solution::MultisigData {
                required,
                keys,
                data: Box::from(*data),
            })
        }
        _ => None,
    }
}
