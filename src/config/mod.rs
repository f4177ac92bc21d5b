use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub virus_scan: VirusScanConfig,
    pub notify: NotifyConfig,
    pub regions: RegionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; when absent it is assembled from DB_HOST/DB_PORT/DB_USER_API/DB_USER_API_PASS/DB_DATABASE.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub max_upload_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub keycloak: KeycloakConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeycloakConfig {
    /// Expected `iss` claim, e.g. https://host/auth/realms/restoration
    pub issuer: Option<String>,
    /// Expected `aud` claim (client id). Audience is not validated when unset.
    pub audience: Option<String>,
    /// Realm RS256 public key (PEM). Takes precedence over `jwt_secret`.
    pub public_key_pem: Option<String>,
    /// Shared HS256 secret, intended for local development only.
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_dir: String,
    pub public_base_url: String,
    pub signed_url_expiry_secs: u64,
    pub signing_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirusScanConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Email endpoint, e.g. https://host/v2/notifications/email
    pub api_url: String,
    pub api_key: Option<String>,
    pub admin_email: Option<String>,
    pub access_request_template: Option<String>,
    pub access_approval_template: Option<String>,
    pub app_host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub wfs_url: String,
    pub layer_name: String,
    pub name_property: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") | Ok("test") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("LOG_LEVEL") {
            self.log_level = v;
        }

        // Database overrides
        self.database.url = env::var("DATABASE_URL").ok().or_else(Self::database_url_from_parts);
        if let Ok(v) = env::var("DB_POOL_SIZE") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DB_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DB_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }
        if let Ok(v) = env::var("DB_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("MAX_REQ_BODY_SIZE") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("MAX_UPLOAD_FILE_SIZE") {
            self.api.max_upload_size_bytes = v.parse().unwrap_or(self.api.max_upload_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let (Ok(host), Ok(realm)) = (env::var("KEYCLOAK_HOST"), env::var("KEYCLOAK_REALM")) {
            self.security.keycloak.issuer = Some(format!("{}/realms/{}", host.trim_end_matches('/'), realm));
        }
        if let Ok(v) = env::var("KEYCLOAK_CLIENT_ID") {
            self.security.keycloak.audience = Some(v);
        }
        if let Ok(v) = env::var("KEYCLOAK_PUBLIC_KEY") {
            self.security.keycloak.public_key_pem = Some(v.replace("\\n", "\n"));
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.keycloak.jwt_secret = Some(v);
        }

        // Storage overrides
        if let Ok(v) = env::var("OBJECT_STORE_ROOT") {
            self.storage.root_dir = v;
        }
        if let Ok(v) = env::var("OBJECT_STORE_URL") {
            self.storage.public_base_url = v;
        }
        if let Ok(v) = env::var("OBJECT_STORE_URL_EXPIRY") {
            self.storage.signed_url_expiry_secs = v.parse().unwrap_or(self.storage.signed_url_expiry_secs);
        }
        if let Ok(v) = env::var("OBJECT_STORE_SIGNING_SECRET") {
            self.storage.signing_secret = v;
        }

        // Virus scan overrides
        if let Ok(v) = env::var("ENABLE_FILE_VIRUS_SCAN") {
            self.virus_scan.enabled = v.parse().unwrap_or(self.virus_scan.enabled);
        }
        if let Ok(v) = env::var("CLAMAV_HOST") {
            self.virus_scan.host = v;
        }
        if let Ok(v) = env::var("CLAMAV_PORT") {
            self.virus_scan.port = v.parse().unwrap_or(self.virus_scan.port);
        }

        // GC Notify overrides
        if let Ok(v) = env::var("GCNOTIFY_EMAIL_URL") {
            self.notify.api_url = v;
        }
        self.notify.api_key = env::var("GCNOTIFY_SECRET_API_KEY").ok().or(self.notify.api_key);
        self.notify.admin_email = env::var("GCNOTIFY_ADMIN_EMAIL").ok().or(self.notify.admin_email);
        self.notify.access_request_template = env::var("GCNOTIFY_REQUEST_ACCESS_TEMPLATE")
            .ok()
            .or(self.notify.access_request_template);
        self.notify.access_approval_template = env::var("GCNOTIFY_APPROVAL_TEMPLATE")
            .ok()
            .or(self.notify.access_approval_template);
        if let Ok(v) = env::var("APP_HOST") {
            self.notify.app_host = v;
        }

        // Region lookup overrides
        if let Ok(v) = env::var("WFS_URL") {
            self.regions.wfs_url = v;
        }
        if let Ok(v) = env::var("NRM_REGIONS_LAYER") {
            self.regions.layer_name = v;
        }

        self
    }

    fn database_url_from_parts() -> Option<String> {
        let host = env::var("DB_HOST").ok()?;
        let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let user = env::var("DB_USER_API").ok()?;
        let password = env::var("DB_USER_API_PASS").unwrap_or_default();
        let database = env::var("DB_DATABASE").unwrap_or_else(|_| "restoration".to_string());

        let mut url = url::Url::parse(&format!("postgres://{}:{}", host, port)).ok()?;
        url.set_username(&user).ok()?;
        if !password.is_empty() {
            url.set_password(Some(&password)).ok()?;
        }
        url.set_path(&format!("/{}", database));
        Some(url.into())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            log_level: "debug".to_string(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 6100,
                enable_request_logging: true,
                max_request_size_bytes: 50 * 1024 * 1024, // 50MB
                max_upload_size_bytes: 50 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:7100".to_string(), "http://localhost:3000".to_string()],
                keycloak: KeycloakConfig::default(),
            },
            storage: StorageConfig {
                root_dir: "./object-store".to_string(),
                public_base_url: "http://localhost:6100/files".to_string(),
                signed_url_expiry_secs: 300,
                signing_secret: "development-signing-secret".to_string(),
            },
            virus_scan: VirusScanConfig {
                enabled: false,
                host: "localhost".to_string(),
                port: 3310,
            },
            notify: Self::default_notify(),
            regions: Self::default_regions(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            log_level: "info".to_string(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 6100,
                enable_request_logging: true,
                max_request_size_bytes: 50 * 1024 * 1024,
                max_upload_size_bytes: 50 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![],
                keycloak: KeycloakConfig::default(),
            },
            storage: StorageConfig {
                root_dir: "/opt/object-store".to_string(),
                public_base_url: String::new(),
                signed_url_expiry_secs: 300,
                signing_secret: String::new(),
            },
            virus_scan: VirusScanConfig {
                enabled: true,
                host: "clamav".to_string(),
                port: 3310,
            },
            notify: Self::default_notify(),
            regions: Self::default_regions(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            log_level: "warn".to_string(),
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 6100,
                enable_request_logging: false,
                max_request_size_bytes: 50 * 1024 * 1024,
                max_upload_size_bytes: 50 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![],
                keycloak: KeycloakConfig::default(),
            },
            storage: StorageConfig {
                root_dir: "/opt/object-store".to_string(),
                public_base_url: String::new(),
                signed_url_expiry_secs: 300,
                signing_secret: String::new(),
            },
            virus_scan: VirusScanConfig {
                enabled: true,
                host: "clamav".to_string(),
                port: 3310,
            },
            notify: Self::default_notify(),
            regions: Self::default_regions(),
        }
    }

    fn default_notify() -> NotifyConfig {
        NotifyConfig {
            api_url: "https://api.notification.canada.ca/v2/notifications/email".to_string(),
            app_host: "http://localhost:7100".to_string(),
            ..Default::default()
        }
    }

    fn default_regions() -> RegionConfig {
        RegionConfig {
            wfs_url: "https://openmaps.gov.bc.ca/geo/pub/wfs".to_string(),
            layer_name: "pub:WHSE_ADMIN_BOUNDARIES.ADM_NR_REGIONS_SPG".to_string(),
            name_property: "REGION_NAME".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_run_migrations_without_virus_scan() {
        let config = AppConfig::development();
        assert!(config.database.run_migrations);
        assert!(!config.virus_scan.enabled);
        assert_eq!(config.api.port, 6100);
    }

    #[test]
    fn production_defaults_scan_uploads() {
        let config = AppConfig::production();
        assert!(!config.database.run_migrations);
        assert!(config.virus_scan.enabled);
        assert!(!config.database.enable_query_logging);
    }
}
