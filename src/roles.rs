//! Static role registry.
//!
//! Authorization policy lives in one immutable lookup table populated at
//! startup and keyed by role name. The core only exposes the bundle;
//! endpoint handlers compare the relevant boolean against the action being
//! attempted.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::error::AuthError;

/// Role assigned to newly registered users.
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotePermissions {
    pub create_own: bool,
    pub read_own: bool,
    pub edit_own: bool,
    pub delete_own: bool,
    pub read_all: bool,
    pub edit_all: bool,
    pub delete_all: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfilePermissions {
    pub view_own: bool,
    pub edit_own: bool,
    pub change_password: bool,
    pub change_avatar: bool,
    pub delete_own: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserManagementPermissions {
    pub view_all_users: bool,
    pub create_users: bool,
    pub edit_users: bool,
    pub delete_users: bool,
    pub block_users: bool,
    pub change_roles: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SystemPermissions {
    pub access_admin_panel: bool,
    pub view_logs: bool,
    pub manage_settings: bool,
    pub monitor_system: bool,
    pub manage_storage: bool,
    pub view_analytics: bool,
}

/// Immutable set of boolean capabilities associated with a named role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RolePermissionBundle {
    pub notes: NotePermissions,
    pub profile: ProfilePermissions,
    pub user_management: UserManagementPermissions,
    pub system: SystemPermissions,
}

const OWN_NOTES: NotePermissions = NotePermissions {
    create_own: true,
    read_own: true,
    edit_own: true,
    delete_own: true,
    read_all: false,
    edit_all: false,
    delete_all: false,
};

const ALL_NOTES: NotePermissions = NotePermissions {
    create_own: true,
    read_own: true,
    edit_own: true,
    delete_own: true,
    read_all: true,
    edit_all: true,
    delete_all: true,
};

const FULL_PROFILE: ProfilePermissions = ProfilePermissions {
    view_own: true,
    edit_own: true,
    change_password: true,
    change_avatar: true,
    delete_own: true,
};

lazy_static! {
    static ref ROLE_REGISTRY: HashMap<&'static str, RolePermissionBundle> = {
        let mut roles = HashMap::new();

        roles.insert(
            "admin",
            RolePermissionBundle {
                notes: ALL_NOTES,
                profile: FULL_PROFILE,
                user_management: UserManagementPermissions {
                    view_all_users: true,
                    create_users: true,
                    edit_users: true,
                    delete_users: true,
                    block_users: true,
                    change_roles: true,
                },
                system: SystemPermissions {
                    access_admin_panel: true,
                    view_logs: true,
                    manage_settings: true,
                    monitor_system: true,
                    manage_storage: true,
                    view_analytics: true,
                },
            },
        );

        roles.insert(
            "moderator",
            RolePermissionBundle {
                notes: ALL_NOTES,
                profile: FULL_PROFILE,
                user_management: UserManagementPermissions {
                    view_all_users: true,
                    block_users: true,
                    ..Default::default()
                },
                system: SystemPermissions {
                    view_logs: true,
                    view_analytics: true,
                    ..Default::default()
                },
            },
        );

        roles.insert(
            "user",
            RolePermissionBundle {
                notes: OWN_NOTES,
                profile: FULL_PROFILE,
                user_management: UserManagementPermissions::default(),
                system: SystemPermissions::default(),
            },
        );

        roles.insert(
            "readonly",
            RolePermissionBundle {
                notes: NotePermissions {
                    read_own: true,
                    ..Default::default()
                },
                profile: ProfilePermissions {
                    view_own: true,
                    change_password: true,
                    ..Default::default()
                },
                user_management: UserManagementPermissions::default(),
                system: SystemPermissions::default(),
            },
        );

        roles.insert(
            "guest",
            RolePermissionBundle {
                notes: NotePermissions::default(),
                profile: ProfilePermissions {
                    view_own: true,
                    ..Default::default()
                },
                user_management: UserManagementPermissions::default(),
                system: SystemPermissions::default(),
            },
        );

        roles
    };
}

/// Resolves a role name to its permission bundle; fails closed for unknown
/// names.
pub fn permissions_for(role: &str) -> Result<&'static RolePermissionBundle, AuthError> {
    ROLE_REGISTRY
        .get(role)
        .ok_or_else(|| AuthError::RoleNotFound(role.to_string()))
}

pub fn role_exists(role: &str) -> bool {
    ROLE_REGISTRY.contains_key(role)
}
