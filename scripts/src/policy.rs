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

//! Relay and mempool policy applied to output scripts.
//!
//! # Warning
//! The limits present in this module are stricter than consensus rules and
//! must not be relied upon as if they were consensus rules: a transaction
//! violating them may still be included into a valid block.

use tracing::debug;

use crate::{PubkeyScript, Solution, TxoutType};

/// Maximum size, in bytes, of a standard `OP_RETURN` output script (+1 byte
/// for `OP_RETURN`, +3 bytes for the push opcodes).
pub const MAX_OP_RETURN_RELAY: usize = 644;

/// Maximum size of the data payload trailing a multisig data script.
pub const MAX_MULTISIG_DATA_OP_DROP_SIZE: usize = 80;

/// Maximum number of public keys in a bare multisig script accepted by
/// relay policy.
pub const MAX_STANDARD_MULTISIG_KEYS: usize = 3;

/// Maximum number of public keys in a bare multisig script.
pub const MAX_MULTISIG_KEYS: usize = 16;

/// Maximum size of a zerocoin mint output script.
pub const MAX_ZEROCOIN_MINT_SCRIPT_SIZE: usize = 150;

/// Opcode marking zerocoin mint output scripts.
pub const OP_ZEROCOINMINT: u8 = 0xc1;

/// Node standardness policy settings for output scripts.
///
/// Settings are read once on node start and then passed by reference to
/// every standardness check.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "kebab-case", default)
)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct StandardnessPolicy {
    /// Relay and mine `OP_RETURN` data carrier outputs.
    pub accept_datacarrier: bool,

    /// Maximum size of a data carrier output script.
    pub max_datacarrier_bytes: usize,

    /// Maximum number of keys in a standard bare multisig.
    pub max_multisig_keys: usize,
}

impl Default for StandardnessPolicy {
    fn default() -> Self {
        StandardnessPolicy {
            accept_datacarrier: true,
            max_datacarrier_bytes: MAX_OP_RETURN_RELAY,
            max_multisig_keys: MAX_STANDARD_MULTISIG_KEYS,
        }
    }
}

/// Reasons for an output script to be rejected by the standardness policy.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[display(doc_comments)]
pub enum RejectReason {
    /// script does not match any standard template
    NonStandard,

    /// bare multisig with {keys} keys, while at most {max} keys are allowed
    MultisigKeys {
        /// Number of keys in the script.
        keys: usize,
        /// Maximum number of keys allowed by the policy.
        max: usize,
    },

    /// multisig data payload of {len} bytes exceeds 80 bytes
    MultisigData {
        /// Length of the payload.
        len: usize,
    },

    /// data carrier outputs are not relayed
    DatacarrierDisabled,

    /// data carrier output script of {size} bytes exceeds {max} bytes limit
    DatacarrierSize {
        /// Size of the output script.
        size: usize,
        /// Maximum size allowed by the policy.
        max: usize,
    },
}

/// Output script rejected by the standardness policy.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display, Error)]
#[display("{txout_type} output script rejected: {reason}")]
pub struct NonStandardScript {
    /// Type of the rejected script.
    pub txout_type: TxoutType,

    /// Reason for the rejection.
    pub reason: RejectReason,
}

impl StandardnessPolicy {
    /// Checks the solved output script against the policy.
    pub fn check(&self, solution: &Solution, script_len: usize) -> Result<(), RejectReason> {
        match solution {
            Solution::NonStandard => Err(RejectReason::NonStandard),
            Solution::Multisig { keys, .. }
                if keys.is_empty() || keys.len() > self.max_multisig_keys =>
            {
                Err(RejectReason::MultisigKeys {
                    keys: keys.len(),
                    max: self.max_multisig_keys,
                })
            }
            Solution::MultisigData { data, .. } if data.len() > MAX_MULTISIG_DATA_OP_DROP_SIZE => {
                Err(RejectReason::MultisigData { len: data.len() })
            }
            Solution::NullData if !self.accept_datacarrier => {
                Err(RejectReason::DatacarrierDisabled)
            }
            Solution::NullData if script_len > self.max_datacarrier_bytes => {
                Err(RejectReason::DatacarrierSize {
                    size: script_len,
                    max: self.max_datacarrier_bytes,
                })
            }
            _ => Ok(()),
        }
    }
}

impl PubkeyScript {
    /// Checks whether the output script is standard under the given policy.
    /// Returns the type of the script; on rejection the type is reported
    /// together with the reason.
    pub fn check_standard(
        &self,
        policy: &StandardnessPolicy,
    ) -> Result<TxoutType, NonStandardScript> {
        let solution = self.solve();
        let txout_type = solution.txout_type();
        policy
            .check(&solution, self.len())
            .map(|_| txout_type)
            .map_err(|reason| {
                debug!(%txout_type, %reason, "output script rejected by standardness policy");
                NonStandardScript { txout_type, reason }
            })
    }

    /// Checks whether the output script is standard under the given policy,
    /// returning the verdict together with the script type.
    pub fn is_standard(&self, policy: &StandardnessPolicy) -> (bool, TxoutType) {
        match self.check_standard(policy) {
            Ok(txout_type) => (true, txout_type),
            Err(NonStandardScript { txout_type, .. }) => (false, txout_type),
        }
    }
}

#[cfg(test)]
mod test {
    use bitcoin::blockdata::opcodes::all::*;
    use bitcoin::blockdata::script::Builder;
    use bitcoin::hashes::Hash;
    use bitcoin::{PubkeyHash, Script};

    use super::*;
    use crate::solver::test::gen_bitcoin_pubkeys;

    fn null_data(payload_len: usize) -> PubkeyScript {
        Builder::new()
            .push_opcode(OP_RETURN)
            .push_slice(&vec![0xfe; payload_len])
            .into_script()
            .into()
    }

    #[test]
    fn default_policy() {
        let policy = StandardnessPolicy::default();
        assert!(policy.accept_datacarrier);
        assert_eq!(policy.max_datacarrier_bytes, 644);
        assert_eq!(policy.max_multisig_keys, 3);
    }

    #[test]
    fn pubkey_hash_is_standard() {
        let script = PubkeyScript::from(Script::new_p2pkh(&PubkeyHash::from_inner([7; 20])));
        let policy = StandardnessPolicy::default();
        assert_eq!(script.is_standard(&policy), (true, TxoutType::PubkeyHash));
        assert_eq!(script.check_standard(&policy), Ok(TxoutType::PubkeyHash));
    }

    #[test]
    fn non_standard_rejected() {
        let script = PubkeyScript::from(vec![0x51, 0x52, 0x93]);
        let policy = StandardnessPolicy::default();
        assert_eq!(script.is_standard(&policy), (false, TxoutType::NonStandard));
        let err = script.check_standard(&policy).unwrap_err();
        assert_eq!(err.reason, RejectReason::NonStandard);
        assert_eq!(
            err.to_string(),
            "nonstandard output script rejected: script does not match any standard template"
        );
    }

    #[test]
    fn multisig_key_bound() {
        let keys = gen_bitcoin_pubkeys(16, true);
        let policy = StandardnessPolicy::default();
        for n in 1..=16usize {
            let script = PubkeyScript::multisig(1, &keys[..n]).unwrap();
            assert_eq!(script.txout_type(), TxoutType::Multisig);
            if n <= MAX_STANDARD_MULTISIG_KEYS {
                assert_eq!(script.is_standard(&policy), (true, TxoutType::Multisig));
            } else {
                assert_eq!(script.check_standard(&policy), Err(NonStandardScript {
                    txout_type: TxoutType::Multisig,
                    reason: RejectReason::MultisigKeys { keys: n, max: 3 },
                }));
            }
        }

        let relaxed = StandardnessPolicy {
            max_multisig_keys: MAX_MULTISIG_KEYS,
            ..default!()
        };
        let script = PubkeyScript::multisig(9, &keys).unwrap();
        assert_eq!(script.is_standard(&relaxed), (true, TxoutType::Multisig));
    }

    #[test]
    fn multisig_data_is_standard() {
        let keys = gen_bitcoin_pubkeys(5, true);
        let policy = StandardnessPolicy::default();
        let script = PubkeyScript::multisig_data(2, &keys, &[0xaa; 80]).unwrap();
        assert_eq!(script.is_standard(&policy), (true, TxoutType::MultisigData));

        let oversized = Solution::MultisigData {
            required: 1,
            keys: vec![],
            data: Box::from(&[0u8; 81][..]),
        };
        assert_eq!(
            policy.check(&oversized, 0),
            Err(RejectReason::MultisigData { len: 81 })
        );
    }

    #[test]
    fn null_data_size() {
        let policy = StandardnessPolicy::default();

        // OP_RETURN OP_PUSHDATA2 <len:2> <payload>
        let script = null_data(MAX_OP_RETURN_RELAY - 4);
        assert_eq!(script.len(), MAX_OP_RETURN_RELAY);
        assert_eq!(script.is_standard(&policy), (true, TxoutType::NullData));

        let script = null_data(MAX_OP_RETURN_RELAY - 3);
        assert_eq!(script.len(), MAX_OP_RETURN_RELAY + 1);
        assert_eq!(script.check_standard(&policy), Err(NonStandardScript {
            txout_type: TxoutType::NullData,
            reason: RejectReason::DatacarrierSize {
                size: MAX_OP_RETURN_RELAY + 1,
                max: MAX_OP_RETURN_RELAY
            },
        }));

        let small = StandardnessPolicy {
            max_datacarrier_bytes: 83,
            ..default!()
        };
        // OP_RETURN OP_PUSHDATA1 <len:1> <payload>
        assert_eq!(null_data(80).is_standard(&small), (true, TxoutType::NullData));
        assert_eq!(null_data(81).is_standard(&small), (false, TxoutType::NullData));
        assert_eq!(
            PubkeyScript::from(vec![0x6a]).is_standard(&small),
            (true, TxoutType::NullData)
        );
    }

    #[test]
    fn null_data_disabled() {
        let policy = StandardnessPolicy {
            accept_datacarrier: false,
            ..default!()
        };
        assert_eq!(
            null_data(4).check_standard(&policy).unwrap_err().reason,
            RejectReason::DatacarrierDisabled
        );
        let script = PubkeyScript::from(Script::new_p2pkh(&PubkeyHash::from_inner([7; 20])));
        assert_eq!(script.is_standard(&policy), (true, TxoutType::PubkeyHash));
    }

    #[test]
    fn zerocoin_mint_is_standard() {
        let mut bytes = vec![OP_ZEROCOINMINT, 0x20];
        bytes.extend([0x33; 0x20]);
        let script = PubkeyScript::from(bytes);
        assert_eq!(
            script.is_standard(&StandardnessPolicy::default()),
            (true, TxoutType::ZerocoinMint)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn policy_yaml() {
        let policy: StandardnessPolicy =
            serde_yaml::from_str("max-datacarrier-bytes: 83\n").unwrap();
        assert_eq!(policy, StandardnessPolicy {
            max_datacarrier_bytes: 83,
            ..default!()
        });

        let yaml = serde_yaml::to_string(&StandardnessPolicy::default()).unwrap();
        assert_eq!(
            serde_yaml::from_str::<StandardnessPolicy>(&yaml).unwrap(),
            StandardnessPolicy::default()
        );
    }
}
