use std::net::SocketAddr;

use uuid::Uuid;

use crate::error::Result;
use crate::Database;

const COOKIE_KEYS: &str = "cookie_keys";

/// Creates an easily bindable address using the `0.0.0.0` meta-address and
/// any available port.
pub fn get_available_address() -> Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("0.0.0.0:0")?;
    let addr = listener.local_addr()?;
    Ok(addr)
}

/// Loads the key used for encrypting private cookies, generating and storing
/// a new one if there is none yet.
pub fn cookie_key(db: &Database) -> Result<cookie::Key> {
    let stored = db
        .get_at::<Vec<u8>>(COOKIE_KEYS, Uuid::nil())
        .ok()
        .and_then(|k| cookie::Key::try_from(k.as_slice()).ok());
    match stored {
        Some(k) => Ok(k),
        None => {
            let k = cookie::Key::generate();
            db.set_raw_at(COOKIE_KEYS, &k.master().to_vec(), Uuid::nil())?;
            Ok(k)
        }
    }
}

/// Re-generates cookie key and stores it in place of the old one. All admin
/// cookies issued so far become invalid.
pub fn regen_cookie_key(db: &Database) -> Result<()> {
    let key = cookie::Key::generate();
    db.set_raw_at(COOKIE_KEYS, &key.master().to_vec(), Uuid::nil())?;
    Ok(())
}
