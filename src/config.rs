use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MongoDB,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StorageBackend::MongoDB),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("Invalid STORAGE_BACKEND: {}. Supported: mongodb, memory", other)),
        }
    }
}

/// Token and password hashing parameters
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: "default-secret-change-me".to_string(),
            jwt_issuer: "bill-split-service".to_string(),
            jwt_audience: "bill-split-api".to_string(),
            token_ttl_hours: 24 * 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub auth: AuthSettings,
}

impl Settings {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AuthSettings::default();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", lookup("PORT"), 5000u16)?;

        let storage = match lookup("STORAGE_BACKEND") {
            Some(value) => StorageBackend::parse(&value)?,
            None => StorageBackend::MongoDB,
        };

        let database_url = lookup("DATABASE_URL");
        if storage == StorageBackend::MongoDB && database_url.is_none() {
            return Err("DATABASE_URL must be set when STORAGE_BACKEND=mongodb".to_string());
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string(), "http://localhost:3000".to_string()]);

        let bcrypt_cost = parse_or("BCRYPT_COST", lookup("BCRYPT_COST"), defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(format!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost));
        }

        let auth = AuthSettings {
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            jwt_audience: lookup("JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            token_ttl_hours: parse_or("JWT_TTL_HOURS", lookup("JWT_TTL_HOURS"), defaults.token_ttl_hours)?,
            bcrypt_cost,
        };

        Ok(Settings {
            host,
            port,
            storage,
            database_url,
            cors_origins,
            auth,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, String> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid value for {}: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let s = settings(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(s.storage, StorageBackend::Memory);
        assert_eq!(s.port, 5000);
        assert_eq!(s.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn mongodb_backend_requires_url() {
        assert!(settings(&[]).is_err());

        let s = settings(&[("DATABASE_URL", "mongodb://localhost:27017/split")]).unwrap();
        assert_eq!(s.storage, StorageBackend::MongoDB);
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings(&[
            ("STORAGE_BACKEND", "memory"),
            ("PORT", "8080"),
            ("JWT_TTL_HOURS", "2"),
            ("BCRYPT_COST", "4"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
        ])
        .unwrap();

        assert_eq!(s.port, 8080);
        assert_eq!(s.auth.token_ttl_hours, 2);
        assert_eq!(s.auth.bcrypt_cost, 4);
        assert_eq!(s.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(settings(&[("STORAGE_BACKEND", "memory"), ("PORT", "http")]).is_err());
        assert!(settings(&[("STORAGE_BACKEND", "memory"), ("BCRYPT_COST", "2")]).is_err());
        assert!(settings(&[("STORAGE_BACKEND", "sqlite")]).is_err());
    }
}
