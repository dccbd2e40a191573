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

//! Payment destinations extracted from output scripts and construction of
//! standard output scripts.

use bitcoin::blockdata::opcodes::all::*;
use bitcoin::blockdata::script::Builder;
use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, PublicKey, Script, ScriptHash};
use tracing::trace;

use crate::policy::{MAX_MULTISIG_DATA_OP_DROP_SIZE, MAX_MULTISIG_KEYS};
use crate::{PubkeyScript, RedeemScript, Solution, TxoutType};

/// Payment destination of an output script. Ordered as `NoDestination` <
/// `KeyId` < `ScriptId`, with values of the same kind ordered by their
/// hashes.
#[derive(
    Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, From
)]
pub enum Destination {
    /// No destination is set or the script has none.
    #[display("none")]
    NoDestination,

    /// Hash160 of a public key (P2PKH or P2PK outputs).
    #[from]
    #[display("key({0})")]
    KeyId(PubkeyHash),

    /// Hash160 of a redeem script (P2SH outputs).
    #[from]
    #[display("script({0})")]
    ScriptId(ScriptHash),
}

impl Default for Destination {
    fn default() -> Self { Destination::NoDestination }
}

impl Destination {
    /// Constructs P2SH destination committing to the redeem script.
    #[inline]
    pub fn for_redeem_script(script: &RedeemScript) -> Self {
        Destination::ScriptId(script.script_hash())
    }

    /// Checks whether the destination is set.
    #[inline]
    pub fn is_some(self) -> bool { self != Destination::NoDestination }

    /// Generates `scriptPubkey` paying to the destination. For
    /// [`Destination::NoDestination`] the script is empty.
    pub fn script_pubkey(self) -> PubkeyScript {
        match self {
            Destination::NoDestination => Script::new(),
            Destination::KeyId(hash) => Script::new_p2pkh(&hash),
            Destination::ScriptId(hash) => Script::new_p2sh(&hash),
        }
        .into()
    }
}

impl From<Destination> for PubkeyScript {
    #[inline]
    fn from(destination: Destination) -> Self { destination.script_pubkey() }
}

/// All destinations of an output script, together with the number of
/// signatures required to spend it.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Destinations {
    /// Type of the output script.
    pub txout_type: TxoutType,

    /// Destinations in the order they appear in the script.
    pub addresses: Vec<Destination>,

    /// Number of signatures required to spend the output.
    pub required: usize,
}

/// Errors constructing bare multisig output scripts.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum MultisigError {
    /// multisig must require at least one signature
    NoSignatures,

    /// multisig requires {required} signatures, while only {keys} keys are given
    Threshold {
        /// Number of required signatures.
        required: usize,
        /// Number of provided keys.
        keys: usize,
    },

    /// multisig with {0} keys exceeds the limit of 16 keys
    TooManyKeys(usize),

    /// multisig data payload of {0} bytes exceeds the limit of 80 bytes
    DataTooLarge(usize),
}

/// Checks that the serialized key length matches its header byte: 33 bytes
/// for compressed keys and 65 for uncompressed and hybrid ones.
fn is_valid_key_size(key: &[u8]) -> bool {
    match key.first() {
        Some(0x02) | Some(0x03) => key.len() == 33,
        Some(0x04) | Some(0x06) | Some(0x07) => key.len() == 65,
        _ => false,
    }
}

fn single_destination(solution: &Solution) -> Option<Destination> {
    match solution {
        Solution::Pubkey(key) => key_id(key),
        Solution::PubkeyHash(hash) => Some(Destination::KeyId(*hash)),
        Solution::ScriptHash(hash) => Some(Destination::ScriptId(*hash)),
        Solution::Multisig { .. }
        | Solution::MultisigData { .. }
        | Solution::NullData
        | Solution::ZerocoinMint(_)
        | Solution::NonStandard => None,
    }
}

fn key_id(key: &[u8]) -> Option<Destination> {
    if !is_valid_key_size(key) {
        trace!(len = key.len(), "public key size does not match its header");
        return None;
    }
    Some(Destination::KeyId(PubkeyHash::hash(key)))
}

impl PubkeyScript {
    /// Extracts the single destination of the output script.
    ///
    /// Returns `None` for multisig (use [`PubkeyScript::destinations`]),
    /// data-carrying and non-standard outputs.
    pub fn destination(&self) -> Option<Destination> { single_destination(&self.solve()) }

    /// Extracts all destinations of the output script.
    ///
    /// For bare multisig outputs lists key ids of all keys in the script
    /// order, skipping keys of invalid size. Returns `None` for multisig data,
    /// data-carrying and non-standard outputs, and for multisig without any
    /// valid key; the output type is still available with
    /// [`PubkeyScript::txout_type`].
    pub fn destinations(&self) -> Option<Destinations> {
        let solution = self.solve();
        let txout_type = solution.txout_type();
        match solution {
            Solution::Multisig { required, keys } => {
                let addresses = keys
                    .iter()
                    .filter_map(|key| key_id(key))
                    .collect::<Vec<_>>();
                if addresses.is_empty() {
                    return None;
                }
                Some(Destinations {
                    txout_type,
                    addresses,
                    required: required as usize,
                })
            }
            ref solution => single_destination(solution).map(|destination| Destinations {
                txout_type,
                addresses: vec![destination],
                required: 1,
            }),
        }
    }

    /// Constructs bare `m`-of-`n` multisig output script, keeping the order
    /// of the keys.
    pub fn multisig(required: usize, keys: &[PublicKey]) -> Result<PubkeyScript, MultisigError> {
        Ok(multisig_builder(required, keys)?.into_script().into())
    }

    /// Constructs bare multisig output script carrying a data payload, which
    /// is dropped from the stack after the signature check.
    pub fn multisig_data(
        required: usize,
        keys: &[PublicKey],
        data: &[u8],
    ) -> Result<PubkeyScript, MultisigError> {
        if data.len() > MAX_MULTISIG_DATA_OP_DROP_SIZE {
            return Err(MultisigError::DataTooLarge(data.len()));
        }
        Ok(multisig_builder(required, keys)?
            .push_slice(data)
            .push_opcode(OP_DROP)
            .into_script()
            .into())
    }

    /// Constructs `OP_RETURN` output script carrying the data.
    #[inline]
    pub fn null_data(data: &[u8]) -> PubkeyScript { Script::new_op_return(data).into() }

    /// Returns the script as a redeem script for P2SH wrapping.
    #[inline]
    pub fn to_redeem_script(&self) -> RedeemScript { RedeemScript::from(self.clone()) }
}

fn multisig_builder(required: usize, keys: &[PublicKey]) -> Result<Builder, MultisigError> {
    if required == 0 {
        return Err(MultisigError::NoSignatures);
    }
    if keys.len() > MAX_MULTISIG_KEYS {
        return Err(MultisigError::TooManyKeys(keys.len()));
    }
    if required > keys.len() {
        return Err(MultisigError::Threshold {
            required,
            keys: keys.len(),
        });
    }
    Ok(keys
        .iter()
        .fold(Builder::new().push_int(required as i64), |builder, key| {
            builder.push_key(key)
        })
        .push_int(keys.len() as i64)
        .push_opcode(OP_CHECKMULTISIG))
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use bitcoin::hashes::hex::FromHex;

    use super::*;
    use crate::solver::test::{gen_bitcoin_pubkeys, key_bytes};

    #[test]
    fn pubkey_hash_round_trip() {
        let hash = PubkeyHash::from_inner([0x11; 20]);
        let destination = Destination::from(hash);
        let script = destination.script_pubkey();
        assert_eq!(script.as_bytes().len(), 25);
        assert_eq!(script.txout_type(), TxoutType::PubkeyHash);
        assert_eq!(script.destination(), Some(destination));
        assert_eq!(script.destinations(), Some(Destinations {
            txout_type: TxoutType::PubkeyHash,
            addresses: vec![destination],
            required: 1,
        }));
    }

    #[test]
    fn script_hash_round_trip() {
        let hash = ScriptHash::from_inner([0x22; 20]);
        let script = PubkeyScript::from(Destination::ScriptId(hash));
        assert_eq!(script.as_bytes().len(), 23);
        assert_eq!(script.txout_type(), TxoutType::ScriptHash);
        assert_eq!(script.destination(), Some(Destination::ScriptId(hash)));
    }

    #[test]
    fn no_destination() {
        let script = Destination::NoDestination.script_pubkey();
        assert!(script.is_empty());
        assert_eq!(script.txout_type(), TxoutType::NonStandard);
        assert_eq!(script.destination(), None);
        assert_eq!(Destination::default(), Destination::NoDestination);
        assert!(!Destination::default().is_some());
    }

    #[test]
    fn pubkey_destination() {
        for compressed in [true, false] {
            let key = gen_bitcoin_pubkeys(1, compressed)[0];
            let script = PubkeyScript::from(
                Builder::new()
                    .push_key(&key)
                    .push_opcode(OP_CHECKSIG)
                    .into_script(),
            );
            assert_eq!(script.txout_type(), TxoutType::Pubkey);
            assert_eq!(script.destination(), Some(Destination::KeyId(key.pubkey_hash())));
        }

        // 33-byte push with an uncompressed key header
        let mut bytes = vec![0x21, 0x04];
        bytes.extend([0x01; 32]);
        bytes.push(0xac);
        let script = PubkeyScript::from(bytes);
        assert_eq!(script.txout_type(), TxoutType::Pubkey);
        assert_eq!(script.destination(), None);
        assert_eq!(script.destinations(), None);
    }

    #[test]
    fn multisig_destinations() {
        let keys = gen_bitcoin_pubkeys(3, true);
        let script = PubkeyScript::multisig(2, &keys).unwrap();
        assert_eq!(script.solve(), Solution::Multisig {
            required: 2,
            keys: key_bytes(&keys),
        });
        assert_eq!(script.destination(), None);
        assert_eq!(script.destinations(), Some(Destinations {
            txout_type: TxoutType::Multisig,
            addresses: keys
                .iter()
                .map(|key| Destination::KeyId(key.pubkey_hash()))
                .collect(),
            required: 2,
        }));
    }

    #[test]
    fn multisig_key_order() {
        let mut keys = gen_bitcoin_pubkeys(4, false);
        keys.reverse();
        let script = PubkeyScript::multisig(1, &keys).unwrap();
        assert_eq!(script.solve(), Solution::Multisig {
            required: 1,
            keys: key_bytes(&keys),
        });
        let destinations = script.destinations().unwrap();
        assert_eq!(destinations.addresses[0], Destination::KeyId(keys[0].pubkey_hash()));
        assert_eq!(destinations.addresses[3], Destination::KeyId(keys[3].pubkey_hash()));
    }

    #[test]
    fn multisig_invalid_keys_skipped() {
        let keys = gen_bitcoin_pubkeys(1, true);
        // 1-of-2 with a 33-byte key and a 65-byte push carrying a compressed
        // key header
        let mut bad_key = vec![0x02];
        bad_key.extend([0x05; 64]);
        let script = PubkeyScript::from(
            Builder::new()
                .push_int(1)
                .push_key(&keys[0])
                .push_slice(&bad_key)
                .push_int(2)
                .push_opcode(OP_CHECKMULTISIG)
                .into_script(),
        );
        assert_eq!(script.txout_type(), TxoutType::Multisig);
        let destinations = script.destinations().unwrap();
        assert_eq!(destinations.addresses, vec![Destination::KeyId(keys[0].pubkey_hash())]);
        assert_eq!(destinations.required, 1);

        let script = PubkeyScript::from(
            Builder::new()
                .push_int(1)
                .push_slice(&bad_key)
                .push_int(1)
                .push_opcode(OP_CHECKMULTISIG)
                .into_script(),
        );
        assert_eq!(script.destinations(), None);
        assert_eq!(script.txout_type(), TxoutType::Multisig);
    }

    #[test]
    fn multisig_data_script() {
        let keys = gen_bitcoin_pubkeys(3, true);
        let script = PubkeyScript::multisig_data(2, &keys, b"payload").unwrap();
        assert_eq!(script.solve(), Solution::MultisigData {
            required: 2,
            keys: key_bytes(&keys),
            data: Box::from(&b"payload"[..]),
        });
        assert_eq!(script.txout_type(), TxoutType::MultisigData);
        assert_eq!(script.destination(), None);
        assert_eq!(script.destinations(), None);

        let script = PubkeyScript::multisig_data(1, &keys[..2], b"x").unwrap();
        assert_eq!(script.destinations(), None);
        assert_eq!(script.txout_type(), TxoutType::MultisigData);

        assert_eq!(
            PubkeyScript::multisig_data(1, &keys, &[0; 81]),
            Err(MultisigError::DataTooLarge(81))
        );
    }

    #[test]
    fn multisig_errors() {
        let keys = gen_bitcoin_pubkeys(17, true);
        assert_eq!(PubkeyScript::multisig(0, &keys[..2]), Err(MultisigError::NoSignatures));
        assert_eq!(
            PubkeyScript::multisig(3, &keys[..2]),
            Err(MultisigError::Threshold {
                required: 3,
                keys: 2
            })
        );
        assert_eq!(PubkeyScript::multisig(1, &keys), Err(MultisigError::TooManyKeys(17)));
        assert_eq!(
            PubkeyScript::multisig(1, &[]),
            Err(MultisigError::Threshold {
                required: 1,
                keys: 0
            })
        );
        assert_eq!(
            MultisigError::Threshold {
                required: 3,
                keys: 2
            }
            .to_string(),
            "multisig requires 3 signatures, while only 2 keys are given"
        );
        assert!(PubkeyScript::multisig(16, &keys[..16]).is_ok());
    }

    #[test]
    fn null_data_script() {
        let script = PubkeyScript::null_data(&[0xca, 0xfe]);
        assert_eq!(script.as_bytes(), &[0x6a, 0x02, 0xca, 0xfe]);
        assert_eq!(script.txout_type(), TxoutType::NullData);
        assert_eq!(script.destination(), None);
        assert_eq!(script.destinations(), None);
    }

    #[test]
    fn zerocoin_and_non_standard() {
        let mut bytes = vec![0xc1, 0x04];
        bytes.extend([0x01; 4]);
        let script = PubkeyScript::from(bytes);
        assert_eq!(script.txout_type(), TxoutType::ZerocoinMint);
        assert_eq!(script.destination(), None);

        let script = PubkeyScript::from(vec![0x51]);
        assert_eq!(script.destination(), None);
        assert_eq!(script.destinations(), None);
    }

    #[test]
    fn redeem_script_destination() {
        let keys = gen_bitcoin_pubkeys(2, true);
        let redeem = PubkeyScript::multisig(1, &keys).unwrap().to_redeem_script();
        let destination = Destination::for_redeem_script(&redeem);
        assert_eq!(destination, Destination::ScriptId(redeem.script_hash()));
        assert_eq!(redeem.to_p2sh().destination(), Some(destination));
    }

    #[test]
    fn ordering() {
        let key_id = Destination::KeyId(PubkeyHash::from_inner([0xff; 20]));
        let script_id = Destination::ScriptId(ScriptHash::from_inner([0x00; 20]));
        assert!(Destination::NoDestination < key_id);
        assert!(key_id < script_id);
        assert_eq!(Destination::NoDestination, Destination::NoDestination);
        assert!(
            Destination::KeyId(PubkeyHash::from_inner([0x01; 20]))
                < Destination::KeyId(PubkeyHash::from_inner([0x02; 20]))
        );

        let mut map = BTreeMap::new();
        map.insert(script_id, "script");
        map.insert(key_id, "key");
        map.insert(Destination::NoDestination, "none");
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec!["none", "key", "script"]);
    }

    #[test]
    fn display() {
        let hash =
            PubkeyHash::from_hex("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        assert_eq!(
            Destination::KeyId(hash).to_string(),
            "key(751e76e8199196d454941c45d1b3a323f1433bd6)"
        );
        assert_eq!(Destination::NoDestination.to_string(), "none");
    }
}
