/// 用户记录缓存键前缀
const USER_RECORD_PREFIX: &str = "pf:user:";

/// 请求频率计数键前缀
const RATE_LIMIT_PREFIX: &str = "pf:rate_limit:";

/// 生成用户记录缓存键
pub fn user_record_key(user_id: i32) -> String {
    format!("{}{}", USER_RECORD_PREFIX, user_id)
}

/// 生成请求频率计数键
pub fn rate_limit_key(ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        assert_eq!(user_record_key(42), "pf:user:42");
        assert_eq!(rate_limit_key("10.0.0.1"), "pf:rate_limit:10.0.0.1");
    }
}
