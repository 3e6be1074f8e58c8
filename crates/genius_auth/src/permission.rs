use genius_error::AuthError;
use genius_sql::base::SqlClient;
use genius_sql::schemas::schema::PermissionGrant;
use genius_utils::glob::glob_match;
use tracing::debug;

/// Decide whether a set of grants allows `method` on `path`.
///
/// Any super role allows everything. Otherwise one grant must match the
/// method (case-insensitive) and glob-match the path.
pub fn evaluate_grants(grants: &[PermissionGrant], method: &str, path: &str) -> bool {
    let method = method.trim();

    grants.iter().any(|grant| {
        if grant.is_super {
            return true;
        }

        match (&grant.method, &grant.path_pattern) {
            (Some(granted_method), Some(pattern)) => {
                granted_method.eq_ignore_ascii_case(method) && glob_match(pattern, path)
            }
            _ => false,
        }
    })
}

/// Check whether a user may call `method` on `path`
pub async fn has_permission<T: SqlClient>(
    sql_client: &T,
    user_id: &str,
    method: &str,
    path: &str,
) -> Result<bool, AuthError> {
    let grants = sql_client.get_permission_grants(user_id).await?;
    let allowed = evaluate_grants(&grants, method, path);

    debug!(
        "Permission check for user {}: {} {} -> {}",
        user_id, method, path, allowed
    );

    Ok(allowed)
}
