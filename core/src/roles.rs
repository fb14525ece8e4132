//! Role predicates over a user's `role` string.
//!
//! Comparison is case-insensitive and ignores surrounding whitespace.
//! Missing users or unrecognized roles yield `false` / `"Unknown"`.

use crate::types::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Staff,
    Management,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "staff" => Some(Role::Staff),
            "management" => Some(Role::Management),
            _ => None,
        }
    }

    pub fn of(user: Option<&UserProfile>) -> Option<Self> {
        user.and_then(|u| u.role()).and_then(Role::parse)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Staff => "Staff",
            Role::Management => "Management",
        }
    }
}

pub fn is_student(user: Option<&UserProfile>) -> bool {
    Role::of(user) == Some(Role::Student)
}

pub fn is_staff(user: Option<&UserProfile>) -> bool {
    Role::of(user) == Some(Role::Staff)
}

pub fn is_management(user: Option<&UserProfile>) -> bool {
    Role::of(user) == Some(Role::Management)
}

/// Staff and management may create, edit and delete shared records.
pub fn can_perform_admin_actions(user: Option<&UserProfile>) -> bool {
    matches!(Role::of(user), Some(Role::Staff | Role::Management))
}

/// Compares the raw role string, so roles outside the known three still match.
pub fn has_role(user: Option<&UserProfile>, role: &str) -> bool {
    user.and_then(|u| u.role())
        .map(|r| r.trim().eq_ignore_ascii_case(role.trim()))
        .unwrap_or(false)
}

/// Both users carry the same non-empty role.
pub fn same_role(a: Option<&UserProfile>, b: Option<&UserProfile>) -> bool {
    match b.and_then(|u| u.role()).map(str::trim) {
        Some(role) if !role.is_empty() => has_role(a, role),
        _ => false,
    }
}

pub fn role_display_name(user: Option<&UserProfile>) -> &'static str {
    Role::of(user).map(|r| r.display_name()).unwrap_or("Unknown")
}
