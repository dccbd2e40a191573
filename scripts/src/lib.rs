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

//! Standard output script templates.
//!
//! General workflow for working with `scriptPubkey` data:
//! ```text
//! PubkeyScript -> Solution -> { TxoutType, Destination(s), standardness }
//!
//! Destination | key set -> PubkeyScript
//! ```

// Coding conventions
#![recursion_limit = "256"]
#![deny(dead_code, missing_docs)]

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

mod destination;
pub mod flags;
pub mod policy;
mod solver;
mod txtype;
mod types;

pub use destination::{Destination, Destinations, MultisigError};
pub use policy::{NonStandardScript, RejectReason, StandardnessPolicy};
pub use solver::{SigArgs, Solution};
pub use txtype::{TxoutType, TxoutTypeParseError};
pub use types::{PubkeyScript, RedeemScript};
