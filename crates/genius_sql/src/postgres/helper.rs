pub struct PostgresQueryHelper;

impl PostgresQueryHelper {
    pub fn get_user_insert_query() -> String {
        "INSERT INTO users (
        id,
        username,
        password_hash,
        email,
        member_expiry,
        last_use_date,
        daily_use_count,
        created_at,
        updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            .to_string()
    }

    pub fn get_role_insert_query() -> String {
        "INSERT INTO roles (
        role_name,
        name,
        description,
        is_super,
        created_at,
        updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id"
            .to_string()
    }

    pub fn get_permission_insert_query() -> String {
        "INSERT INTO permissions (
        id,
        method,
        path_pattern,
        description,
        created_at
        )
        VALUES ($1, $2, $3, $4, $5)"
            .to_string()
    }

    pub fn get_member_card_insert_query() -> String {
        "INSERT INTO member_cards (
        name,
        duration_days,
        price,
        description,
        created_at
        )
        VALUES ($1, $2, $3, $4, $5)"
            .to_string()
    }

    pub fn get_order_insert_query() -> String {
        "INSERT INTO orders (
        id,
        user_id,
        card_id,
        amount,
        status,
        purchase_time,
        payment_time,
        created_at,
        updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            .to_string()
    }

    /// Every (role, permission) pair reachable from a user. Roles without
    /// permissions still produce one row so their super flag is visible.
    pub fn get_permission_grants_query() -> String {
        "SELECT
        r.is_super AS is_super,
        p.method AS method,
        p.path_pattern AS path_pattern
        FROM user_role ur
        JOIN roles r ON r.id = ur.role_id
        LEFT JOIN role_permission rp ON rp.role_id = r.id
        LEFT JOIN permissions p ON p.id = rp.permission_id
        WHERE ur.user_id = $1"
            .to_string()
    }

    /// Binds: today, updated_at, user_id, daily_limit
    pub fn get_consume_daily_use_query() -> String {
        "UPDATE users
        SET daily_use_count = CASE
                WHEN last_use_date IS NULL OR last_use_date < $1 THEN 1
                ELSE daily_use_count + 1
            END,
            last_use_date = $1,
            updated_at = $2
        WHERE id = $3
        AND (CASE
                WHEN last_use_date IS NULL OR last_use_date < $1 THEN 0
                ELSE daily_use_count
            END) < $4
        RETURNING daily_use_count"
            .to_string()
    }
}
