/// Match `text` against a glob style `pattern`.
///
/// `*` matches any run of characters (including none) and `?` matches exactly
/// one character. Every other character, `%` and `_` included, only matches
/// itself.
///
/// # Arguments
///
/// * `pattern` - The glob pattern, e.g. `/api/v1/users/*`
/// * `text` - The string to test, e.g. a request path
///
/// # Returns
///
/// * `bool` - true if the whole of `text` is matched by `pattern`
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // position of the last `*` seen and the text index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = backtrack {
            // let the last star swallow one more character
            p = star_p + 1;
            t = star_t + 1;
            backtrack = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(glob_match("/api/v1/users", "/api/v1/users"));
        assert!(!glob_match("/api/v1/users", "/api/v1/users/1"));
        assert!(!glob_match("/api/v1/users/1", "/api/v1/users"));
        assert!(glob_match("", ""));
        assert!(!glob_match("", "/"));
    }

    #[test]
    fn test_star() {
        assert!(glob_match("/api/v1/user/*", "/api/v1/user/123"));
        assert!(glob_match("/api/v1/user/*", "/api/v1/user/"));
        assert!(glob_match("/api/v1/user/*", "/api/v1/user/123/roles"));
        assert!(!glob_match("/api/v1/user/*", "/api/v1/user"));
        assert!(glob_match("*", "anything at all"));
        assert!(glob_match("*", ""));
        assert!(glob_match("/api/*/roles", "/api/v1/users/42/roles"));
        assert!(!glob_match("/api/*/roles", "/api/v1/users/42/role"));
        assert!(glob_match("/a*b*c", "/aXXbYYc"));
        assert!(glob_match("/a*b*c", "/abbbc"));
        assert!(!glob_match("/a*b*c", "/acb"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("/api/v?/users", "/api/v1/users"));
        assert!(glob_match("/api/v?/users", "/api/v2/users"));
        assert!(!glob_match("/api/v?/users", "/api/v10/users"));
        assert!(!glob_match("/api/v?/users", "/api/v/users"));
    }

    #[test]
    fn test_sql_wildcards_are_literal() {
        assert!(!glob_match("/api/v1/%", "/api/v1/users"));
        assert!(glob_match("/api/v1/%", "/api/v1/%"));
        assert!(!glob_match("/api/v1/user_", "/api/v1/users"));
        assert!(glob_match("/api/v1/user_", "/api/v1/user_"));
    }

    #[test]
    fn test_unicode() {
        assert!(glob_match("/files/?", "/files/文"));
        assert!(glob_match("/files/*", "/files/文件"));
    }
}
