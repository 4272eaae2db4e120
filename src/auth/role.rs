use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Admin when any of the markers says so; the role string is compared
    /// case-insensitively.
    pub fn from_flags(is_superuser: Option<bool>, is_staff: Option<bool>, role: Option<&str>) -> Self {
        let named_admin = role.is_some_and(|r| r.trim().eq_ignore_ascii_case("admin"));
        if is_superuser == Some(true) || is_staff == Some(true) || named_admin {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// Interprets a cached role string. Anything but "admin" is a plain user.
    pub fn from_cached(value: &str) -> Self {
        Self::from_flags(None, None, Some(value))
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::superuser(Some(true), None, None, Role::Admin)]
    #[case::staff(None, Some(true), None, Role::Admin)]
    #[case::role_name(None, None, Some("admin"), Role::Admin)]
    #[case::role_name_any_case(Some(false), Some(false), Some("ADMIN"), Role::Admin)]
    #[case::plain_user(Some(false), Some(false), Some("user"), Role::User)]
    #[case::nothing_known(None, None, None, Role::User)]
    fn role_from_markers(
        #[case] is_superuser: Option<bool>,
        #[case] is_staff: Option<bool>,
        #[case] role: Option<&str>,
        #[case] expected: Role,
    ) {
        assert_eq!(Role::from_flags(is_superuser, is_staff, role), expected);
    }

    #[test]
    fn cached_strings() {
        assert_eq!(Role::from_cached("Admin"), Role::Admin);
        assert_eq!(Role::from_cached("user"), Role::User);
        assert_eq!(Role::from_cached(""), Role::User);
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
