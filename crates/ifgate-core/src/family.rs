//! Address family hints and supported-family masks
//!
//! Gates and extension lookups speak in address families. Configuration
//! spells them `ipv4` / `ipv6`; anything that is not named resolves to
//! [`AddressFamily::Unspecified`].

use std::fmt;
use std::net::IpAddr;

/// Address family hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressFamily {
    /// No preference: match or resolve any family
    #[default]
    Unspecified,
    /// IPv4 only
    Ipv4,
    /// IPv6 only
    Ipv6,
    /// A raw family number this crate has no mask bit for
    Other(i32),
}

impl AddressFamily {
    /// Parse a configuration family name (`ipv4` or `ipv6`)
    ///
    /// Returns `None` for unknown names; callers turn that into a
    /// configuration error.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ipv4" => Some(Self::Ipv4),
            "ipv6" => Some(Self::Ipv6),
            _ => None,
        }
    }

    /// Mask used for registry lookups
    ///
    /// `Unspecified` matches every family, `Other` matches none.
    pub fn mask(self) -> FamilyMask {
        match self {
            Self::Unspecified => FamilyMask::ALL,
            Self::Ipv4 => FamilyMask::IPV4,
            Self::Ipv6 => FamilyMask::IPV6,
            Self::Other(_) => FamilyMask::NONE,
        }
    }

    /// Whether an address belongs to this family
    pub fn admits(self, addr: &IpAddr) -> bool {
        match (self, addr) {
            (Self::Unspecified, _) => true,
            (Self::Ipv4, IpAddr::V4(_)) => true,
            (Self::Ipv6, IpAddr::V6(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspec"),
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Ipv6 => write!(f, "ipv6"),
            Self::Other(af) => write!(f, "af-{}", af),
        }
    }
}

/// Bitmask of address families an extension supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FamilyMask(u32);

impl FamilyMask {
    /// Matches nothing
    pub const NONE: Self = Self(0);
    /// IPv4 bit
    pub const IPV4: Self = Self(1 << 0);
    /// IPv6 bit
    pub const IPV6: Self = Self(1 << 1);
    /// Every bit set
    pub const ALL: Self = Self(!0);

    /// Raw bits
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether the two masks share at least one family
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two masks
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Build a mask from configuration family names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, crate::Error> {
        names.iter().try_fold(Self::NONE, |mask, name| {
            let name = name.as_ref();
            match AddressFamily::from_name(name) {
                Some(af) => Ok(mask.union(af.mask())),
                None => Err(crate::Error::config(format!(
                    "unknown address family \"{}\"",
                    name
                ))),
            }
        })
    }
}

impl std::ops::BitOr for FamilyMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}
