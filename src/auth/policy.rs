/*!
 * # Policy Module
 *
 * Role and permission definitions. Permissions are `resource:action`
 * strings; a role maps to the set of grants baked into its tokens. The
 * `*` and `resource:*` wildcards cover whole resources.
 */

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::errors::ServiceError;

use super::AuthUser;

/// Role names
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_VIEWER: &str = "viewer";

/// Permission actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Approve,
    Fulfill,
    Adjust,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Fulfill => "fulfill",
            Action::Adjust => "adjust",
        }
    }
}

/// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Items,
    Categories,
    Subcategories,
    Departments,
    Suppliers,
    Events,
    Requests,
    Transactions,
    Reports,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Items => "items",
            ResourceKind::Categories => "categories",
            ResourceKind::Subcategories => "subcategories",
            ResourceKind::Departments => "departments",
            ResourceKind::Suppliers => "suppliers",
            ResourceKind::Events => "events",
            ResourceKind::Requests => "requests",
            ResourceKind::Transactions => "transactions",
            ResourceKind::Reports => "reports",
        }
    }
}

/// Builds the `resource:action` permission string
pub fn permission(resource: ResourceKind, action: Action) -> String {
    format!("{}:{}", resource.as_str(), action.as_str())
}

/// Common permission string constants for compile-time safety
pub mod consts {
    // Items
    pub const ITEMS_READ: &str = "items:read";
    pub const ITEMS_CREATE: &str = "items:create";
    pub const ITEMS_UPDATE: &str = "items:update";
    pub const ITEMS_DELETE: &str = "items:delete";

    // Categories, subcategories
    pub const CATEGORIES_READ: &str = "categories:read";
    pub const CATEGORIES_CREATE: &str = "categories:create";
    pub const CATEGORIES_UPDATE: &str = "categories:update";
    pub const CATEGORIES_DELETE: &str = "categories:delete";
    pub const SUBCATEGORIES_READ: &str = "subcategories:read";
    pub const SUBCATEGORIES_CREATE: &str = "subcategories:create";
    pub const SUBCATEGORIES_UPDATE: &str = "subcategories:update";
    pub const SUBCATEGORIES_DELETE: &str = "subcategories:delete";

    // Departments
    pub const DEPARTMENTS_READ: &str = "departments:read";
    pub const DEPARTMENTS_CREATE: &str = "departments:create";
    pub const DEPARTMENTS_UPDATE: &str = "departments:update";
    pub const DEPARTMENTS_DELETE: &str = "departments:delete";

    // Suppliers
    pub const SUPPLIERS_READ: &str = "suppliers:read";
    pub const SUPPLIERS_CREATE: &str = "suppliers:create";
    pub const SUPPLIERS_UPDATE: &str = "suppliers:update";
    pub const SUPPLIERS_DELETE: &str = "suppliers:delete";

    // Events
    pub const EVENTS_READ: &str = "events:read";
    pub const EVENTS_CREATE: &str = "events:create";
    pub const EVENTS_UPDATE: &str = "events:update";
    pub const EVENTS_DELETE: &str = "events:delete";

    // Requests
    pub const REQUESTS_READ: &str = "requests:read";
    pub const REQUESTS_CREATE: &str = "requests:create";
    pub const REQUESTS_APPROVE: &str = "requests:approve";
    pub const REQUESTS_FULFILL: &str = "requests:fulfill";

    // Stock transactions
    pub const TRANSACTIONS_READ: &str = "transactions:read";
    pub const TRANSACTIONS_ADJUST: &str = "transactions:adjust";

    // Reports
    pub const REPORTS_READ: &str = "reports:read";
}

lazy_static! {
    /// Role to permission-grant table
    static ref ROLE_PERMISSIONS: HashMap<&'static str, Vec<&'static str>> = {
        let mut map = HashMap::new();

        map.insert(ROLE_ADMIN, vec!["*"]);

        map.insert(
            ROLE_MANAGER,
            vec![
                "items:*",
                "categories:*",
                "subcategories:*",
                "departments:*",
                "suppliers:*",
                "events:*",
                "requests:*",
                "transactions:*",
                "reports:read",
            ],
        );

        map.insert(
            ROLE_STAFF,
            vec![
                consts::ITEMS_READ,
                consts::CATEGORIES_READ,
                consts::SUBCATEGORIES_READ,
                consts::DEPARTMENTS_READ,
                consts::SUPPLIERS_READ,
                consts::EVENTS_READ,
                consts::REQUESTS_READ,
                consts::REQUESTS_CREATE,
                consts::TRANSACTIONS_READ,
            ],
        );

        map.insert(
            ROLE_VIEWER,
            vec![
                consts::ITEMS_READ,
                consts::CATEGORIES_READ,
                consts::SUBCATEGORIES_READ,
                consts::DEPARTMENTS_READ,
                consts::SUPPLIERS_READ,
                consts::EVENTS_READ,
                consts::REQUESTS_READ,
                consts::TRANSACTIONS_READ,
                consts::REPORTS_READ,
            ],
        );

        map
    };
}

/// Returns true for roles defined in the grant table
pub fn is_known_role(role: &str) -> bool {
    ROLE_PERMISSIONS.contains_key(role)
}

/// Permission strings granted to a role. Unknown roles get nothing.
pub fn permissions_for_role(role: &str) -> Vec<String> {
    ROLE_PERMISSIONS
        .get(role)
        .map(|perms| perms.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

/// Whether a granted permission string covers a required one
pub fn grant_covers(granted: &str, required: &str) -> bool {
    if granted == "*" || granted == required {
        return true;
    }
    if let Some(resource) = granted.strip_suffix(":*") {
        if let Some((required_resource, _)) = required.split_once(':') {
            return resource == required_resource;
        }
    }
    false
}

/// Service-level authorization check. The HTTP layer already gates routes;
/// this guards operations invoked from inside other services.
pub fn authorize(
    subject: &AuthUser,
    action: Action,
    resource: ResourceKind,
) -> Result<(), ServiceError> {
    if subject.is_admin() {
        return Ok(());
    }

    let required = permission(resource, action);
    if subject.has_permission(&required) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "{} lacks permission {}",
            subject.username, required
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user_with_role(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "test".into(),
            role: role.into(),
            permissions: permissions_for_role(role),
        }
    }

    #[test]
    fn wildcard_grants_cover_resource_actions() {
        assert!(grant_covers("*", "items:delete"));
        assert!(grant_covers("items:*", "items:delete"));
        assert!(!grant_covers("items:*", "requests:approve"));
        assert!(!grant_covers("items:read", "items:delete"));
    }

    #[test]
    fn manager_can_approve_but_viewer_cannot() {
        let manager = user_with_role(ROLE_MANAGER);
        let viewer = user_with_role(ROLE_VIEWER);

        assert!(authorize(&manager, Action::Approve, ResourceKind::Requests).is_ok());
        assert!(matches!(
            authorize(&viewer, Action::Approve, ResourceKind::Requests),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn staff_can_create_requests_but_not_adjust_stock() {
        let staff = user_with_role(ROLE_STAFF);

        assert!(authorize(&staff, Action::Create, ResourceKind::Requests).is_ok());
        assert!(authorize(&staff, Action::Adjust, ResourceKind::Transactions).is_err());
    }

    #[test]
    fn admin_bypasses_every_check() {
        let admin = user_with_role(ROLE_ADMIN);
        assert!(authorize(&admin, Action::Delete, ResourceKind::Departments).is_ok());
    }

    #[test]
    fn unknown_role_gets_no_permissions() {
        assert!(permissions_for_role("intern").is_empty());
        assert!(!is_known_role("intern"));
    }
}
