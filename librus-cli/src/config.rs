//! Configuration resolution from CLI args and environment

use crate::cli::{Args, Command};
use crate::error::CliError;
use std::io::Write;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

const LOGIN_VAR: &str = "LIBRUS_LOGIN";
const PASSWORD_VAR: &str = "LIBRUS_PASSWORD";
const TOKEN_VAR: &str = "LIBRUS_TOKEN";

/// Resolved runtime configuration
pub struct Config {
    pub command: Command,
    /// Token cache directory path
    pub cache_dir: PathBuf,
    /// Session token from the environment, takes precedence over the cache
    pub token: Option<Zeroizing<String>>,
    /// Quiet mode
    pub quiet: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        Config {
            command: args.command,
            cache_dir: expand_tilde(&args.cache_dir),
            token: non_empty_var(TOKEN_VAR),
            quiet: args.quiet,
        }
    }
}

/// Login and password for a fresh authentication (zeroized on drop)
pub struct Login {
    pub login: Zeroizing<String>,
    pub password: Zeroizing<String>,
}

impl Login {
    /// Take login and password from the environment, prompting for what is missing
    pub fn resolve() -> Result<Self, CliError> {
        let login = match non_empty_var(LOGIN_VAR) {
            Some(login) => login,
            None => prompt_login()?,
        };
        let password = match non_empty_var(PASSWORD_VAR) {
            Some(password) => password,
            None => prompt_password()?,
        };
        Ok(Self { login, password })
    }
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str()
        && let Some(rest) = path_str
            .strip_prefix("~/")
            .or_else(|| (path_str == "~").then_some(""))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn non_empty_var(name: &str) -> Option<Zeroizing<String>> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .map(Zeroizing::new)
}

fn prompt_login() -> Result<Zeroizing<String>, CliError> {
    eprint!("Librus login: ");
    std::io::stderr().flush().ok();

    let mut input = Zeroizing::new(String::new());
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::Config(format!("Failed to read login: {}", e)))?;

    let login = input.trim();
    if login.is_empty() {
        return Err(CliError::Config("Login is required.".to_string()));
    }
    Ok(Zeroizing::new(login.to_string()))
}

fn prompt_password() -> Result<Zeroizing<String>, CliError> {
    let password = rpassword::prompt_password("Librus password: ")
        .map_err(|e| CliError::Config(format!("Failed to read password: {}", e)))?;
    if password.is_empty() {
        return Err(CliError::Config("Password is required.".to_string()));
    }
    Ok(Zeroizing::new(password))
}
