//! Fixed-width permission sets for events and states.
//!
//! Both sets are 32 bits wide. An id at or above [`MAX_IDS`] can never be a
//! member, which makes 32 the ceiling on states per descriptor and on event
//! ids a descriptor can gate.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::{EventId, StateId};

/// Width of every permission set.
pub const MAX_IDS: u32 = u32::BITS;

macro_rules! id_mask {
    ($(#[$meta:meta])* $name:ident, $id:ty) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            /// The empty set.
            pub const EMPTY: Self = Self(0);

            /// Builds a set directly from its bit representation.
            #[must_use]
            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }

            /// Set containing only `id`.
            ///
            /// # Panics
            ///
            /// Panics if `id >= MAX_IDS`.
            #[must_use]
            pub const fn bit(id: $id) -> Self {
                assert!(id < MAX_IDS, "id does not fit the 32-bit permission set");
                Self(1 << id)
            }

            /// Returns a copy of `self` with `id` added.
            #[must_use]
            pub fn with(self, id: impl Into<$id>) -> Self {
                Self(self.0 | Self::bit(id.into()).0)
            }

            /// Whether `id` is a member. Ids beyond the set width never are.
            #[must_use]
            pub const fn contains(self, id: $id) -> bool {
                id < MAX_IDS && self.0 & (1 << id) != 0
            }

            #[must_use]
            pub const fn bits(self) -> u32 {
                self.0
            }

            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Highest member id, if any.
            #[must_use]
            pub const fn highest(self) -> Option<$id> {
                if self.0 == 0 {
                    None
                } else {
                    Some(MAX_IDS - 1 - self.0.leading_zeros())
                }
            }

            /// Member ids in ascending order.
            pub fn iter(self) -> impl Iterator<Item = $id> {
                (0..MAX_IDS).filter(move |id| self.contains(*id))
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl<T: Into<$id>> FromIterator<T> for $name {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                iter.into_iter().fold(Self::EMPTY, |mask, id| mask.with(id))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }
    };
}

id_mask!(
    /// Set of event ids accepted in a state (or in every state).
    EventMask,
    EventId
);

id_mask!(
    /// Set of state ids a state may transition into.
    StateMask,
    StateId
);
