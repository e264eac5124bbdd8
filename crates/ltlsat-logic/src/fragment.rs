//! Logic fragments restricting which syntax elements may occur in a node.
//!
//! Fragments form a small lattice:
//!
//! ```text
//!        Foltlp
//!       /      \
//!    Ltlp     Foltl
//!       \      /
//!         Ltl
//! ```
//!
//! The runtime side is [`FragmentId`], checked by the interning table at
//! construction. The static side is the marker types [`Ltl`], [`Ltlp`],
//! [`Foltl`] and [`Foltlp`] together with [`Within`], which is implemented
//! exactly for the pairs of the lattice so that a formula of a smaller
//! fragment can be passed where a bigger one is expected, but not the reverse.

use serde::Serialize;
use std::fmt;

const PAST: u8 = 0b01;
const FIRST_ORDER: u8 = 0b10;

/// Runtime fragment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FragmentId {
    /// Propositional LTL with future operators only.
    Ltl,
    /// Propositional LTL with past operators.
    Ltlp,
    /// First-order LTL with future operators only.
    Foltl,
    /// First-order LTL with past operators.
    Foltlp,
}

impl FragmentId {
    pub const ALL: [FragmentId; 4] = [
        FragmentId::Ltl,
        FragmentId::Ltlp,
        FragmentId::Foltl,
        FragmentId::Foltlp,
    ];

    fn bits(self) -> u8 {
        match self {
            FragmentId::Ltl => 0,
            FragmentId::Ltlp => PAST,
            FragmentId::Foltl => FIRST_ORDER,
            FragmentId::Foltlp => PAST | FIRST_ORDER,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & (PAST | FIRST_ORDER) {
            0 => FragmentId::Ltl,
            PAST => FragmentId::Ltlp,
            FIRST_ORDER => FragmentId::Foltl,
            _ => FragmentId::Foltlp,
        }
    }

    /// Whether every node of `other` is also a node of `self`.
    pub fn includes(self, other: FragmentId) -> bool {
        self.bits() | other.bits() == self.bits()
    }

    /// Smallest fragment including both.
    pub fn join(self, other: FragmentId) -> FragmentId {
        FragmentId::from_bits(self.bits() | other.bits())
    }

    pub fn has_past(self) -> bool {
        self.bits() & PAST != 0
    }

    pub fn is_first_order(self) -> bool {
        self.bits() & FIRST_ORDER != 0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FragmentId::Ltl => "LTL",
            FragmentId::Ltlp => "LTL+Past",
            FragmentId::Foltl => "FO-LTL",
            FragmentId::Foltlp => "FO-LTL+Past",
        };
        f.write_str(name)
    }
}

/// Static fragment marker.
pub trait Fragment:
    Copy + Default + Eq + std::hash::Hash + fmt::Debug + Send + Sync + 'static
{
    const ID: FragmentId;
}

/// `Self` is a sub-fragment of `G`.
pub trait Within<G: Fragment>: Fragment {}

macro_rules! fragment_marker {
    ($name:ident, $id:expr) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl Fragment for $name {
            const ID: FragmentId = $id;
        }
    };
}

fragment_marker!(Ltl, FragmentId::Ltl);
fragment_marker!(Ltlp, FragmentId::Ltlp);
fragment_marker!(Foltl, FragmentId::Foltl);
fragment_marker!(Foltlp, FragmentId::Foltlp);

macro_rules! within {
    ($($sub:ident => $($sup:ident),+;)*) => {
        $($(impl Within<$sup> for $sub {})+)*
    };
}

within! {
    Ltl => Ltl, Ltlp, Foltl, Foltlp;
    Ltlp => Ltlp, Foltlp;
    Foltl => Foltl, Foltlp;
    Foltlp => Foltlp;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusion_follows_the_lattice() {
        use FragmentId::*;
        assert!(Ltlp.includes(Ltl));
        assert!(Foltl.includes(Ltl));
        assert!(Foltlp.includes(Ltlp));
        assert!(Foltlp.includes(Foltl));
        assert!(!Ltl.includes(Ltlp));
        assert!(!Ltlp.includes(Foltl));
        assert!(!Foltl.includes(Ltlp));
        for f in FragmentId::ALL {
            assert!(f.includes(f));
            assert!(Foltlp.includes(f));
            assert!(f.includes(Ltl));
        }
    }

    #[test]
    fn join_is_least_upper_bound() {
        use FragmentId::*;
        assert_eq!(Ltlp.join(Foltl), Foltlp);
        assert_eq!(Ltl.join(Ltlp), Ltlp);
        assert_eq!(Ltl.join(Ltl), Ltl);
        assert_eq!(Foltl.join(Ltl), Foltl);
    }

    #[test]
    fn marker_ids_match() {
        assert_eq!(<Ltl as Fragment>::ID, FragmentId::Ltl);
        assert_eq!(<Foltlp as Fragment>::ID, FragmentId::Foltlp);
    }
}
