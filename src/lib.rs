// Descriptor wallet library extending bitcoin & miniscript functionality
// by LNP/BP Association (https://lnp-bp.org)
// Written in 2020-2022 by
//     Dr. Maxim Orlovsky <orlovsky@pandoracore.com>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the Apache-2.0 License
// along with this software.
// If not, see <https://opensource.org/licenses/Apache-2.0>.

//! Standard output script library: template recognition, relay standardness
//! policy and payment destination mapping for `scriptPubkey`s.

// Coding conventions
#![recursion_limit = "256"]
#![deny(dead_code, missing_docs)]

#[cfg(feature = "serde")]
#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub extern crate standard_scripts as scripts;

#[cfg(feature = "serde")]
pub mod config;

pub mod policy {
    //! Relay and mempool policy applied to output scripts.
    pub use scripts::policy::*;
}
pub mod flags {
    //! Script verification flag sets.
    pub use scripts::flags::*;
}

#[cfg(feature = "serde")]
pub use config::{Config, ConfigError};
pub use scripts::{
    Destination, Destinations, MultisigError, NonStandardScript, PubkeyScript, RedeemScript,
    RejectReason, SigArgs, Solution, StandardnessPolicy, TxoutType, TxoutTypeParseError,
};
