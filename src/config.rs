use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthDbConfig {
    pub hosts: Vec<String>,
    pub username: String,
    pub password: String,
    pub timeout_milliseconds: u32,
    pub database: String,
    pub collection: String,
}

impl AuthDbConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let hosts = parse_hosts(
            &std::env::var("AUTH_DB_HOSTS").unwrap_or_else(|_| "localhost:27017".into()),
        );
        if hosts.is_empty() {
            anyhow::bail!("AUTH_DB_HOSTS must name at least one host");
        }
        Ok(Self {
            hosts,
            username: std::env::var("AUTH_DB_USERNAME").unwrap_or_default(),
            password: std::env::var("AUTH_DB_PASSWORD").unwrap_or_default(),
            timeout_milliseconds: std::env::var("AUTH_DB_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(3000),
            database: std::env::var("AUTH_DB_DATABASE").unwrap_or_else(|_| "auth".into()),
            collection: std::env::var("AUTH_DB_COLLECTION").unwrap_or_else(|_| "users".into()),
        })
    }
}

fn parse_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_are_split_and_trimmed() {
        let hosts = parse_hosts("db1:27017, db2:27017 ,,");
        assert_eq!(hosts, vec!["db1:27017", "db2:27017"]);
    }

    #[test]
    fn empty_host_list_parses_to_nothing() {
        assert!(parse_hosts(" , ").is_empty());
    }
}
