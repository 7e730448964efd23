//! config command - read and write manifest configuration.
//!
//! `config add name <name>` is how a repository enters the system: the
//! manifest is created implicitly on the first write.

use anyhow::{bail, Result};

use super::Session;

/// Set a dotted key. Creates the manifest when absent.
pub fn add(session: &mut Session, key: &str, value: &str) -> Result<()> {
    session.manifest.set(key, value)?;
    session.manifest.save(&session.manifest_path)?;
    Ok(())
}

/// Print a dotted key's value.
pub fn get(session: &Session, key: &str) -> Result<()> {
    match session.manifest.get(key) {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => bail!("'{key}' is not set"),
    }
}

/// Print the canonical manifest.
pub fn list(session: &Session) -> Result<()> {
    print!("{}", session.manifest.to_canonical_json());
    Ok(())
}
