use error_stack::{Report, ResultExt};
use tracing::info;

const CATALOG_PORT: &str = "CATALOG_PORT";
const CATALOG_STORE: &str = "CATALOG_STORE";
const DATABASE_URL: &str = "DATABASE_URL";
const CATALOG_DB_POOL_SIZE: &str = "CATALOG_DB_POOL_SIZE";
const CATALOG_METRICS: &str = "CATALOG_METRICS";
const CATALOG_AUTH: &str = "CATALOG_AUTH";

const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, thiserror::Error)]
#[error("invalid value for {0}")]
pub struct ConfigErr(pub &'static str);

pub type ConfigResult<T> = Result<T, Report<ConfigErr>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Store {
    Postgres {
        url: String,
        pool_size: Option<usize>,
    },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Jwt,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub store: Store,
    pub metrics: bool,
    pub auth: AuthMode,
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> ConfigResult<Self> {
        let port = match lookup(CATALOG_PORT) {
            Some(port) => port
                .parse()
                .change_context(ConfigErr(CATALOG_PORT))
                .attach_with(|| format!("'{port}' is not a port number"))?,
            None => {
                info!("{CATALOG_PORT} not specified, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }
        };

        let store = match lookup(CATALOG_STORE).as_deref() {
            None | Some("postgres") => Store::Postgres {
                url: lookup(DATABASE_URL).ok_or_else(|| {
                    Report::new(ConfigErr(DATABASE_URL)).attach("DATABASE_URL is missing")
                })?,
                pool_size: lookup(CATALOG_DB_POOL_SIZE)
                    .map(|size| size.parse().change_context(ConfigErr(CATALOG_DB_POOL_SIZE)))
                    .transpose()?,
            },
            Some("memory") => Store::Memory,
            Some(other) => {
                return Err(Report::new(ConfigErr(CATALOG_STORE))
                    .attach(format!("'{other}' is not one of postgres, memory")));
            }
        };

        let metrics = match lookup(CATALOG_METRICS).as_deref() {
            None | Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(Report::new(ConfigErr(CATALOG_METRICS))
                    .attach(format!("'{other}' is not one of true, false")));
            }
        };

        let auth = match lookup(CATALOG_AUTH).as_deref() {
            None | Some("jwt") => AuthMode::Jwt,
            Some("disabled") => AuthMode::Disabled,
            Some(other) => {
                return Err(Report::new(ConfigErr(CATALOG_AUTH))
                    .attach(format!("'{other}' is not one of jwt, disabled")));
            }
        };

        Ok(Self {
            port,
            store,
            metrics,
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_postgres_with_jwt_and_metrics() {
        let config = Config::from_lookup(lookup(&[(DATABASE_URL, "postgres://db/catalog")]))
            .expect("valid config");

        assert_eq!(
            Config {
                port: 3001,
                store: Store::Postgres {
                    url: "postgres://db/catalog".to_string(),
                    pool_size: None,
                },
                metrics: true,
                auth: AuthMode::Jwt,
            },
            config
        );
    }

    #[test]
    fn memory_store_needs_no_database() {
        let config = Config::from_lookup(lookup(&[
            (CATALOG_STORE, "memory"),
            (CATALOG_PORT, "8080"),
            (CATALOG_METRICS, "false"),
            (CATALOG_AUTH, "disabled"),
        ]))
        .expect("valid config");

        assert_eq!(Store::Memory, config.store);
        assert_eq!(8080, config.port);
        assert!(!config.metrics);
        assert_eq!(AuthMode::Disabled, config.auth);
    }

    #[test]
    fn pool_size_is_read_for_postgres() {
        let config = Config::from_lookup(lookup(&[
            (DATABASE_URL, "postgres://db/catalog"),
            (CATALOG_DB_POOL_SIZE, "4"),
        ]))
        .expect("valid config");

        assert_eq!(
            Store::Postgres {
                url: "postgres://db/catalog".to_string(),
                pool_size: Some(4),
            },
            config.store
        );
    }

    #[rstest]
    #[case::missing_database_url(&[], DATABASE_URL)]
    #[case::bad_port(&[(CATALOG_STORE, "memory"), (CATALOG_PORT, "http")], CATALOG_PORT)]
    #[case::unknown_store(&[(CATALOG_STORE, "sqlite")], CATALOG_STORE)]
    #[case::bad_pool_size(&[(DATABASE_URL, "postgres://db"), (CATALOG_DB_POOL_SIZE, "-1")], CATALOG_DB_POOL_SIZE)]
    #[case::bad_metrics_flag(&[(CATALOG_STORE, "memory"), (CATALOG_METRICS, "yes")], CATALOG_METRICS)]
    #[case::unknown_auth(&[(CATALOG_STORE, "memory"), (CATALOG_AUTH, "basic")], CATALOG_AUTH)]
    fn invalid_values_name_the_variable(
        #[case] vars: &[(&'static str, &str)],
        #[case] variable: &str,
    ) {
        let err = Config::from_lookup(lookup(vars)).expect_err("config is invalid");

        assert_eq!(variable, err.current_context().0);
    }
}
