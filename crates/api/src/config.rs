//! Process configuration, read from the environment.

/// Seed data for an initial SuperAdmin staff account, so a fresh deployment
/// is not locked out of the admin-gated routes.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub uid: String,
    pub correo: String,
    pub nombres: String,
    pub apellidos: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// CORS origin allow-list. Empty means no cross-origin access.
    pub allowed_origins: Vec<String>,
    /// Break-glass account: an email granted SuperAdmin even without a staff
    /// document. Replaces a hardcoded email check in an earlier iteration of
    /// the platform; unset in normal deployments.
    pub break_glass_email: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);

        let bootstrap_admin = std::env::var("BOOTSTRAP_ADMIN_UID").ok().map(|uid| {
            let correo = std::env::var("BOOTSTRAP_ADMIN_EMAIL").unwrap_or_default();
            BootstrapAdmin {
                uid,
                correo,
                nombres: std::env::var("BOOTSTRAP_ADMIN_NOMBRES")
                    .unwrap_or_else(|_| "Admin".to_string()),
                apellidos: std::env::var("BOOTSTRAP_ADMIN_APELLIDOS").unwrap_or_default(),
            }
        });

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret,
            allowed_origins,
            break_glass_email: std::env::var("BREAK_GLASS_EMAIL").ok(),
            bootstrap_admin,
        }
    }

    /// Config for tests: everything local, no bootstrap, no break-glass.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.to_string(),
            allowed_origins: Vec::new(),
            break_glass_email: None,
            bootstrap_admin: None,
        }
    }
}
