use crewopt_core::types::normalize_token;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8002`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Crew bases expanded by the `run all` command.
    pub crew_bases: Vec<String>,
    /// How many prior terminal attempts the registry keeps per key.
    pub job_history_limit: usize,
    /// External optimizer command line. When unset, the simulated solver
    /// is used instead.
    pub solver_cmd: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                            |
    /// |-------------------------|------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                          |
    /// | `PORT`                  | `8002`                             |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`            |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                               |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                               |
    /// | `CREW_BASES`            | `BUR,DAL,HPN,LAS,SCF,OPF,OAK,SNA`  |
    /// | `JOB_HISTORY_LIMIT`     | `8`                                |
    /// | `SOLVER_CMD`            | unset (simulated solver)           |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8002".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let crew_bases: Vec<String> = std::env::var("CREW_BASES")
            .unwrap_or_else(|_| "BUR,DAL,HPN,LAS,SCF,OPF,OAK,SNA".into())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                normalize_token(s, "base")
                    .unwrap_or_else(|e| panic!("Invalid CREW_BASES entry '{s}': {e}"))
            })
            .collect();

        let job_history_limit: usize = std::env::var("JOB_HISTORY_LIMIT")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("JOB_HISTORY_LIMIT must be a valid usize");

        let solver_cmd = std::env::var("SOLVER_CMD")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            crew_bases,
            job_history_limit,
            solver_cmd,
        }
    }
}
