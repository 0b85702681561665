use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Address and login of one appliance.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Host, or `host:port`.
    pub address: String,
    pub account: String,
    pub secret: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("account", &self.account)
            .field("secret", &"***")
            .finish()
    }
}

pub fn load_credentials(path: &Path) -> io::Result<Vec<Credential>> {
    let file = File::open(path)?;
    parse_credentials(BufReader::new(file))
}

/// Reads `"address","account","secret"` lines. Lines without exactly three fields are skipped.
///
/// Lines are not required to be UTF-8, invalid bytes are replaced rather than failing the file.
pub fn parse_credentials(reader: impl BufRead) -> io::Result<Vec<Credential>> {
    let mut credentials = Vec::new();
    for line in reader.split(b'\n') {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let line = String::from_utf8_lossy(&line);
        let fields: Vec<&str> = line.split(',').collect();
        if let [address, account, secret] = fields.as_slice() {
            credentials.push(Credential {
                address: unquote(address),
                account: unquote(account),
                secret: unquote(secret),
            });
        }
    }
    Ok(credentials)
}

fn unquote(field: &str) -> String {
    field.trim_matches('"').to_string()
}
