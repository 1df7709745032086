use std::{
    convert::Infallible,
    fmt::Display,
    ops::{BitOr, BitOrAssign},
    str::FromStr,
};

use tracing::warn;

use crate::auth::roles::Roles;

/// Bitflag of the roles a catalog user holds. `ADMIN` implies every other role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct CatalogRoles(u8);

impl CatalogRoles {
    pub const NONE: CatalogRoles = CatalogRoles(0);
    pub const READ: CatalogRoles = CatalogRoles(1);
    pub const WRITE: CatalogRoles = CatalogRoles(2);
    pub const ADMIN: CatalogRoles = CatalogRoles(4);

    const NAMED: [(CatalogRoles, &'static str); 3] = [
        (Self::READ, "CATALOG_READ"),
        (Self::WRITE, "CATALOG_WRITE"),
        (Self::ADMIN, "CATALOG_ADMIN"),
    ];
}

impl Roles for CatalogRoles {
    fn none() -> Self {
        Self::NONE
    }

    fn all() -> Self {
        Self::READ | Self::WRITE | Self::ADMIN
    }

    fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    fn contains(&self, other: Self) -> bool {
        self.0 & Self::ADMIN.0 != 0 || self.0 & other.0 == other.0
    }

    fn add(&mut self, other: Self) {
        *self |= other;
    }
}

impl Display for CatalogRoles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        let mut first = true;
        for (role, name) in Self::NAMED {
            if self.0 & role.0 != 0 {
                if !first {
                    write!(f, ",")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        write!(f, "]")
    }
}

impl BitOr for CatalogRoles {
    type Output = CatalogRoles;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CatalogRoles {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromStr for CatalogRoles {
    type Err = Infallible; // unknown roles are ignored

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_matches('"');
        match Self::NAMED.iter().find(|(_, name)| *name == s) {
            Some((role, _)) => Ok(*role),
            None => {
                warn!("unknown role: {s}. Ignoring");
                Ok(Self::NONE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_contains() {
        let roles = CatalogRoles::READ | CatalogRoles::WRITE;

        assert!(roles.contains(CatalogRoles::READ));
        assert!(roles.contains(CatalogRoles::WRITE));
        assert!(roles.contains(CatalogRoles::READ | CatalogRoles::WRITE));
        assert!(!roles.contains(CatalogRoles::ADMIN));
        assert!(!CatalogRoles::READ.contains(CatalogRoles::WRITE));
    }

    #[test]
    fn admin_implies_every_role() {
        assert!(CatalogRoles::ADMIN.contains(CatalogRoles::READ));
        assert!(CatalogRoles::ADMIN.contains(CatalogRoles::WRITE));
        assert!(CatalogRoles::ADMIN.contains(CatalogRoles::all()));
    }

    #[test]
    fn roles_display() {
        assert_eq!("[CATALOG_READ]", CatalogRoles::READ.to_string());
        assert_eq!(
            "[CATALOG_READ,CATALOG_ADMIN]",
            (CatalogRoles::READ | CatalogRoles::ADMIN).to_string()
        );
        assert_eq!("[]", CatalogRoles::NONE.to_string());
    }

    #[test]
    fn unknown_roles_parse_to_none() {
        assert_eq!(Ok(CatalogRoles::WRITE), "\"CATALOG_WRITE\"".parse());
        assert_eq!(Ok(CatalogRoles::NONE), "offline_access".parse());
    }
}
