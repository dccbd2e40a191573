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

//! Script verification flag sets used by transaction and block validation.

use std::fmt::{self, Display, Formatter};
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Script interpreter verification flags (bitmask). Bit positions match the
/// ones of the script interpreter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct VerifyFlags(pub u32);

impl VerifyFlags {
    /// No verification flags.
    pub const NONE: VerifyFlags = VerifyFlags(0);
    /// Evaluate BIP-16 P2SH subscripts.
    pub const P2SH: VerifyFlags = VerifyFlags(1 << 0);
    /// Enforce strict public key and signature encoding.
    pub const STRICTENC: VerifyFlags = VerifyFlags(1 << 1);
    /// Enforce strict DER signatures (BIP-66).
    pub const DERSIG: VerifyFlags = VerifyFlags(1 << 2);
    /// Enforce low S values in signatures.
    pub const LOW_S: VerifyFlags = VerifyFlags(1 << 3);
    /// Require the `OP_CHECKMULTISIG` dummy argument to be empty.
    pub const NULLDUMMY: VerifyFlags = VerifyFlags(1 << 4);
    /// Require `sigScript` to contain only push operations.
    pub const SIGPUSHONLY: VerifyFlags = VerifyFlags(1 << 5);
    /// Require minimal encoding of pushes and numbers.
    pub const MINIMALDATA: VerifyFlags = VerifyFlags(1 << 6);
    /// Fail on upgradable `OP_NOP`s.
    pub const DISCOURAGE_UPGRADABLE_NOPS: VerifyFlags = VerifyFlags(1 << 7);
    /// Require a single stack element after evaluation.
    pub const CLEANSTACK: VerifyFlags = VerifyFlags(1 << 8);
    /// Verify `OP_CHECKLOCKTIMEVERIFY` (BIP-65).
    pub const CHECKLOCKTIMEVERIFY: VerifyFlags = VerifyFlags(1 << 9);
    /// Verify `OP_CHECKSEQUENCEVERIFY` (BIP-112).
    pub const CHECKSEQUENCEVERIFY: VerifyFlags = VerifyFlags(1 << 10);
    /// Require `OP_IF`/`OP_NOTIF` arguments to be minimal.
    pub const MINIMALIF: VerifyFlags = VerifyFlags(1 << 13);
    /// Require failed signature checks to have empty signatures.
    pub const NULLFAIL: VerifyFlags = VerifyFlags(1 << 14);

    /// Named flags in the order of their bits.
    pub const NAMED: [(VerifyFlags, &'static str); 13] = [
        (VerifyFlags::P2SH, "P2SH"),
        (VerifyFlags::STRICTENC, "STRICTENC"),
        (VerifyFlags::DERSIG, "DERSIG"),
        (VerifyFlags::LOW_S, "LOW_S"),
        (VerifyFlags::NULLDUMMY, "NULLDUMMY"),
        (VerifyFlags::SIGPUSHONLY, "SIGPUSHONLY"),
        (VerifyFlags::MINIMALDATA, "MINIMALDATA"),
        (VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS, "DISCOURAGE_UPGRADABLE_NOPS"),
        (VerifyFlags::CLEANSTACK, "CLEANSTACK"),
        (VerifyFlags::CHECKLOCKTIMEVERIFY, "CHECKLOCKTIMEVERIFY"),
        (VerifyFlags::CHECKSEQUENCEVERIFY, "CHECKSEQUENCEVERIFY"),
        (VerifyFlags::MINIMALIF, "MINIMALIF"),
        (VerifyFlags::NULLFAIL, "NULLFAIL"),
    ];

    /// Returns flags set in either `self` or `other`.
    #[inline]
    pub const fn union(self, other: VerifyFlags) -> VerifyFlags { VerifyFlags(self.0 | other.0) }

    /// Returns flags set in `self` but not in `other`.
    #[inline]
    pub const fn difference(self, other: VerifyFlags) -> VerifyFlags {
        VerifyFlags(self.0 & !other.0)
    }

    /// Checks whether all of the `flags` are set.
    #[inline]
    pub const fn contains(self, flags: VerifyFlags) -> bool { self.0 & flags.0 == flags.0 }

    /// Checks whether no flags are set.
    #[inline]
    pub const fn is_empty(self) -> bool { self.0 == 0 }

    /// Returns raw bit representation.
    #[inline]
    pub const fn bits(self) -> u32 { self.0 }
}

/// Mandatory script verification flags that all new blocks must comply
/// with. Failing them is a consensus failure.
pub const MANDATORY_SCRIPT_VERIFY_FLAGS: VerifyFlags = VerifyFlags::P2SH
    .union(VerifyFlags::STRICTENC)
    .union(VerifyFlags::LOW_S)
    .union(VerifyFlags::DERSIG)
    .union(VerifyFlags::NULLDUMMY)
    .union(VerifyFlags::SIGPUSHONLY)
    .union(VerifyFlags::MINIMALDATA)
    .union(VerifyFlags::CLEANSTACK)
    .union(VerifyFlags::MINIMALIF)
    .union(VerifyFlags::NULLFAIL)
    .union(VerifyFlags::CHECKLOCKTIMEVERIFY)
    .union(VerifyFlags::CHECKSEQUENCEVERIFY);

/// Flags standard transactions comply with. Scripts violating them may
/// still be present in valid blocks.
pub const STANDARD_SCRIPT_VERIFY_FLAGS: VerifyFlags =
    MANDATORY_SCRIPT_VERIFY_FLAGS.union(VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS);

/// Standard but not mandatory verification flags.
pub const STANDARD_NOT_MANDATORY_VERIFY_FLAGS: VerifyFlags =
    STANDARD_SCRIPT_VERIFY_FLAGS.difference(MANDATORY_SCRIPT_VERIFY_FLAGS);

impl BitOr for VerifyFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { self.union(rhs) }
}

impl BitOrAssign for VerifyFlags {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

impl BitAnd for VerifyFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self { VerifyFlags(self.0 & rhs.0) }
}

impl Not for VerifyFlags {
    type Output = Self;
    fn not(self) -> Self { VerifyFlags(!self.0) }
}

impl Display for VerifyFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut rest = *self;
        let mut first = true;
        for (flag, name) in VerifyFlags::NAMED {
            if self.contains(flag) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
                rest = rest.difference(flag);
                first = false;
            }
        }
        if !rest.is_empty() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{:#x}", rest.0)?;
        }
        Ok(())
    }
}
