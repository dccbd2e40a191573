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

use amplify::Wrapper;
use bitcoin::{Script, ScriptHash};

/// A content of `scriptPubkey` from a transaction output.
///
/// The type is the entry point for template matching ([`PubkeyScript::solve`]),
/// standardness checks ([`PubkeyScript::check_standard`]) and destination
/// extraction ([`PubkeyScript::destination`]).
#[derive(
    Wrapper, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Display, From
)]
#[display("{0}", alt = "{0:x}")]
#[wrapper(Deref, LowerHex, UpperHex)]
pub struct PubkeyScript(Script);

impl From<Vec<u8>> for PubkeyScript {
    fn from(bytes: Vec<u8>) -> Self { PubkeyScript(Script::from(bytes)) }
}

impl PubkeyScript {
    /// Returns raw script bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] { self.as_inner().as_bytes() }
}

/// A script whose hash is committed to by a BIP-16 **P2SH** `scriptPubkey`
/// and which is revealed in the `sigScript` of the spending input.
#[derive(
    Wrapper, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Display, From
)]
#[display("{0}", alt = "{0:x}")]
#[wrapper(Deref, LowerHex, UpperHex)]
pub struct RedeemScript(Script);

impl RedeemScript {
    /// Computes script commitment hash which participates in the P2SH
    /// `scriptPubkey`: Hash160 of the serialized script.
    #[inline]
    pub fn script_hash(&self) -> ScriptHash { self.as_inner().script_hash() }

    /// Generates P2SH `scriptPubkey` paying to this redeem script.
    #[inline]
    pub fn to_p2sh(&self) -> PubkeyScript { Script::new_p2sh(&self.script_hash()).into() }
}

impl From<PubkeyScript> for RedeemScript {
    /// Bare scripts (like multisig) are commonly wrapped into P2SH by using
    /// them as redeem scripts.
    fn from(script: PubkeyScript) -> Self { RedeemScript(script.into_inner()) }
}
