//! Reference data written into a fresh database.

pub const ADMIN_ROLE: &str = "admin";
pub const REGULAR_ROLE: &str = "regular_user";

pub struct SeedRole {
    pub role_name: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_super: bool,
}

pub const DEFAULT_ROLES: [SeedRole; 2] = [
    SeedRole {
        role_name: ADMIN_ROLE,
        name: "Administrator",
        description: "Full access to every route",
        is_super: true,
    },
    SeedRole {
        role_name: REGULAR_ROLE,
        name: "Regular user",
        description: "Self-service access for registered users",
        is_super: false,
    },
];

pub struct SeedPermission {
    pub method: &'static str,
    pub path_pattern: &'static str,
    pub description: &'static str,
    /// granted to regular users as well as admins
    pub self_service: bool,
}

const fn admin(
    method: &'static str,
    path_pattern: &'static str,
    description: &'static str,
) -> SeedPermission {
    SeedPermission {
        method,
        path_pattern,
        description,
        self_service: false,
    }
}

const fn member(
    method: &'static str,
    path_pattern: &'static str,
    description: &'static str,
) -> SeedPermission {
    SeedPermission {
        method,
        path_pattern,
        description,
        self_service: true,
    }
}

pub const DEFAULT_PERMISSIONS: &[SeedPermission] = &[
    // users
    admin("GET", "/api/v1/users", "List users"),
    admin("GET", "/api/v1/users/*", "View any user and their roles"),
    admin("PUT", "/api/v1/users/*", "Update any user"),
    admin("DELETE", "/api/v1/users/*", "Delete users and unassign roles"),
    admin("POST", "/api/v1/users/*/roles", "Assign roles to users"),
    // roles
    admin("GET", "/api/v1/roles", "List roles"),
    admin("POST", "/api/v1/roles", "Create roles"),
    admin("GET", "/api/v1/roles/*", "View roles and their permissions"),
    admin("PUT", "/api/v1/roles/*", "Update roles"),
    admin("DELETE", "/api/v1/roles/*", "Delete roles and detach permissions"),
    admin("POST", "/api/v1/roles/*/permissions", "Attach permissions to roles"),
    // permissions
    admin("GET", "/api/v1/permissions", "List permissions"),
    admin("POST", "/api/v1/permissions", "Create permissions"),
    admin("GET", "/api/v1/permissions/*", "View permissions"),
    admin("PUT", "/api/v1/permissions/*", "Update permissions"),
    admin("DELETE", "/api/v1/permissions/*", "Delete permissions"),
    // manual settlement
    admin("POST", "/api/v1/member/order/*/pay", "Mark orders as paid"),
    // self service
    member("POST", "/api/v1/auth/verify", "Check own permissions"),
    member("POST", "/api/v1/auth/refresh", "Refresh own token"),
    member("GET", "/api/v1/member/info", "View own membership"),
    member("GET", "/api/v1/member/check", "Use the service"),
    member("GET", "/api/v1/member/orders", "List own orders"),
    member("POST", "/api/v1/member/order", "Create orders"),
    member("POST", "/api/v1/member/order/*/cancel", "Cancel own orders"),
    member("POST", "/api/v1/payment/create", "Pay for orders"),
];

pub struct SeedMemberCard {
    pub name: &'static str,
    pub duration_days: i32,
    pub price: i64,
    pub description: &'static str,
}

/// Prices are in fen
pub const DEFAULT_MEMBER_CARDS: [SeedMemberCard; 5] = [
    SeedMemberCard {
        name: "Day card",
        duration_days: 1,
        price: 998,
        description: "One day of unlimited use",
    },
    SeedMemberCard {
        name: "Week card",
        duration_days: 7,
        price: 2998,
        description: "Seven days of unlimited use",
    },
    SeedMemberCard {
        name: "Two-week card",
        duration_days: 14,
        price: 4998,
        description: "Fourteen days of unlimited use",
    },
    SeedMemberCard {
        name: "Month card",
        duration_days: 30,
        price: 8998,
        description: "Thirty days of unlimited use",
    },
    SeedMemberCard {
        name: "Two-month card",
        duration_days: 60,
        price: 15998,
        description: "Sixty days of unlimited use",
    },
];
