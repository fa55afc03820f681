use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Department a user belongs to
///
/// The wire and storage form is the uppercase key (`"DEV"`, `"HR"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Department {
    #[default]
    Dev,
    Sales,
    Manager,
    Hr,
    Finance,
    Marketing,
    Admin,
}

impl Department {
    pub const ALL: [Department; 7] = [
        Department::Dev,
        Department::Sales,
        Department::Manager,
        Department::Hr,
        Department::Finance,
        Department::Marketing,
        Department::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Dev => "DEV",
            Department::Sales => "SALES",
            Department::Manager => "MANAGER",
            Department::Hr => "HR",
            Department::Finance => "FINANCE",
            Department::Marketing => "MARKETING",
            Department::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = ValidationError;

    /// Keys are matched exactly; `"dev"` is not a department.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .iter()
            .copied()
            .find(|dept| dept.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidChoice(s.to_string()))
    }
}

/// Filter accepted by the department listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentFilter {
    All,
    Only(Department),
}

impl fmt::Display for DepartmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepartmentFilter::All => f.write_str("ALL"),
            DepartmentFilter::Only(dept) => dept.fmt(f),
        }
    }
}

impl FromStr for DepartmentFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ALL" {
            return Ok(DepartmentFilter::All);
        }
        s.parse::<Department>()
            .map(DepartmentFilter::Only)
            .map_err(|_| ValidationError::InvalidDepartment(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_department_round_trips_through_its_key() {
        for dept in Department::ALL {
            assert_eq!(dept.as_str().parse::<Department>(), Ok(dept));
        }
    }

    #[test]
    fn test_default_department_is_dev() {
        assert_eq!(Department::default(), Department::Dev);
    }

    #[test]
    fn test_department_keys_are_case_sensitive() {
        assert!("dev".parse::<Department>().is_err());
        assert!("Admin".parse::<Department>().is_err());
    }

    #[test]
    fn test_department_serializes_as_uppercase_key() {
        let json = serde_json::to_string(&Department::Hr).unwrap();
        assert_eq!(json, "\"HR\"");
        let parsed: Department = serde_json::from_str("\"MARKETING\"").unwrap();
        assert_eq!(parsed, Department::Marketing);
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("ALL".parse::<DepartmentFilter>(), Ok(DepartmentFilter::All));
        assert_eq!(
            "ADMIN".parse::<DepartmentFilter>(),
            Ok(DepartmentFilter::Only(Department::Admin))
        );
        assert_eq!(
            "XX".parse::<DepartmentFilter>(),
            Err(ValidationError::InvalidDepartment("XX".to_string()))
        );
        assert!("all".parse::<DepartmentFilter>().is_err());
    }
}
