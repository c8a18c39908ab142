use crate::sdk::{Config, Workspace};
use crate::Result;

/// Opens the [`Workspace`] for this environment.
///
/// The data directory is `KAIROS_DATA_DIR` if set, otherwise `default_dir`; see
/// [`Config::from_env`] for the other variables. The workspace starts locked.
///
/// # Examples
///
/// ```no_run
/// use kairos_store::sdk;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let workspace = sdk::open("./data")?;
///     workspace.unlock("correct horse battery staple").await?;
///     Ok(())
/// }
/// ```
pub fn open(default_dir: &str) -> Result<Workspace> {
    let config = Config::from_env(default_dir);
    log::debug!("Opening workspace in {:?}", config.data_dir);
    Workspace::open(&config)
}
