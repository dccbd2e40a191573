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

use std::str::FromStr;

/// Template of a transaction output script (`scriptPubkey`), as recognized by
/// [`crate::PubkeyScript::solve`]. Each script has exactly one type.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Display, Hash)]
#[repr(u8)]
pub enum TxoutType {
    /// Script matching none of the known templates.
    #[display("nonstandard")]
    NonStandard,

    /// Bare public key followed by `OP_CHECKSIG` (**P2PK**).
    #[display("pubkey")]
    Pubkey,

    /// Hash of a public key (**P2PKH**).
    #[display("pubkeyhash")]
    PubkeyHash,

    /// BIP-16 hash of a redeem script (**P2SH**).
    #[display("scripthash")]
    ScriptHash,

    /// Bare `m`-of-`n` `OP_CHECKMULTISIG`.
    #[display("multisig")]
    Multisig,

    /// Bare multisig carrying a trailing data push dropped with `OP_DROP`.
    #[display("multisig_data")]
    #[cfg_attr(feature = "serde", serde(rename = "multisig_data"))]
    MultisigData,

    /// Provably unspendable `OP_RETURN` output carrying auxiliary data.
    #[display("nulldata")]
    NullData,

    /// Zerocoin mint output with an opaque coin commitment.
    #[display("zerocoinmint")]
    ZerocoinMint,
}

impl TxoutType {
    /// All output types in their canonical order.
    pub const ALL: [TxoutType; 8] = [
        TxoutType::NonStandard,
        TxoutType::Pubkey,
        TxoutType::PubkeyHash,
        TxoutType::ScriptHash,
        TxoutType::Multisig,
        TxoutType::MultisigData,
        TxoutType::NullData,
        TxoutType::ZerocoinMint,
    ];

    /// Human-readable name of the output type, as used by node RPC.
    pub fn name(self) -> &'static str {
        match self {
            TxoutType::NonStandard => "nonstandard",
            TxoutType::Pubkey => "pubkey",
            TxoutType::PubkeyHash => "pubkeyhash",
            TxoutType::ScriptHash => "scripthash",
            TxoutType::Multisig => "multisig",
            TxoutType::MultisigData => "multisig_data",
            TxoutType::NullData => "nulldata",
            TxoutType::ZerocoinMint => "zerocoinmint",
        }
    }

    /// Detects whether outputs of this type can be spent with a signature
    /// script.
    #[inline]
    pub fn is_spendable(self) -> bool {
        !matches!(
            self,
            TxoutType::NonStandard | TxoutType::NullData | TxoutType::ZerocoinMint
        )
    }

    /// Detects whether the output is one of the bare multisig forms.
    #[inline]
    pub fn is_multisig(self) -> bool {
        matches!(self, TxoutType::Multisig | TxoutType::MultisigData)
    }
}

/// Error parsing [`TxoutType`] from a string.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Display, Error)]
#[display("unknown output script type `{0}`")]
pub struct TxoutTypeParseError(String);

impl FromStr for TxoutType {
    type Err = TxoutTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        TxoutType::ALL
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or(TxoutTypeParseError(s))
    }
}
