use anyhow::{Result, bail};
use log::info;
use std::io::Write;

use crate::storage::{Storage, TOKEN_KEY};

/// Stores the bearer token sent with every later request.
#[tracing::instrument(skip(storage, token, out))]
pub fn login<W: Write>(storage: &dyn Storage, token: &str, out: &mut W) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        bail!("Token must not be empty");
    }
    storage.set_item(TOKEN_KEY, token)?;
    info!("Stored bearer token");
    writeln!(out, "Token saved.")?;
    Ok(())
}

#[tracing::instrument(skip(storage, out))]
pub fn logout<W: Write>(storage: &dyn Storage, out: &mut W) -> Result<()> {
    if storage.get_item(TOKEN_KEY).is_none() {
        writeln!(out, "No token stored.")?;
        return Ok(());
    }
    storage.remove_item(TOKEN_KEY)?;
    info!("Removed bearer token");
    writeln!(out, "Token removed.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockStorage;
    use mockall::predicate::eq;

    #[test]
    fn test_login_stores_trimmed_token() {
        let mut storage = MockStorage::new();
        storage
            .expect_set_item()
            .with(eq(TOKEN_KEY), eq("abc"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut out = Vec::new();
        login(&storage, "  abc\n", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Token saved.\n");
    }

    #[test]
    fn test_login_rejects_empty_token() {
        let mut storage = MockStorage::new();
        storage.expect_set_item().never();

        let mut out = Vec::new();
        assert!(login(&storage, "   ", &mut out).is_err());
    }

    #[test]
    fn test_logout_removes_token() {
        let mut storage = MockStorage::new();
        storage
            .expect_get_item()
            .with(eq(TOKEN_KEY))
            .returning(|_| Some("abc".to_string()));
        storage
            .expect_remove_item()
            .with(eq(TOKEN_KEY))
            .times(1)
            .returning(|_| Ok(()));

        let mut out = Vec::new();
        logout(&storage, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Token removed.\n");
    }

    #[test]
    fn test_logout_without_token() {
        let mut storage = MockStorage::new();
        storage.expect_get_item().returning(|_| None);
        storage.expect_remove_item().never();

        let mut out = Vec::new();
        logout(&storage, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No token stored.\n");
    }
}
