use std::env;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_RPC_FUNCTION: &str = "public.execute_sql";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// 执行方式：拼接文本走远程过程，或占位符直接绑定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Rpc,
    Parameterized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub rpc_function: String,
    pub execution_mode: ExecutionMode,
    pub enforce_allowlist: bool,
}

impl AppConfig {
    /// 先加载 .env，再读取进程环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DB_MAX_CONNECTIONS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let rpc_function =
            lookup("QUERY_RPC_FUNCTION").unwrap_or_else(|| DEFAULT_RPC_FUNCTION.to_string());
        if rpc_function.is_empty()
            || !rpc_function
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(ConfigError::Invalid {
                key: "QUERY_RPC_FUNCTION",
                value: rpc_function,
            });
        }

        let execution_mode = match lookup("QUERY_EXECUTION_MODE").as_deref() {
            None | Some("rpc") => ExecutionMode::Rpc,
            Some("parameterized") => ExecutionMode::Parameterized,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "QUERY_EXECUTION_MODE",
                    value: other.to_string(),
                })
            }
        };

        let enforce_allowlist = match lookup("ENFORCE_COLUMN_ALLOWLIST") {
            None => true,
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ENFORCE_COLUMN_ALLOWLIST",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            rpc_function,
            execution_mode,
            enforce_allowlist,
        })
    }
}
