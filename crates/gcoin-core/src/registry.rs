// crates/gcoin-core/src/registry.rs
//
// In-memory ICAP registry.
//
// Indirect ICAP layout (20 characters):
//   XE | 2 check digits | asset (3) | institution (4) | client (9)
// Check digits follow IBAN mod-97: moving the first four characters to the
// end and mapping A..Z to 10..35 must leave a remainder of 1.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::RegistryError;
use crate::identity::Account;
use crate::traits::{IcapResolution, Registry};

const ICAP_LENGTH: usize = 20;
const COUNTRY_CODE: &str = "XE";

/// Registry of known assets and institutions.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    assets: BTreeSet<String>,
    institutions: BTreeMap<String, Account>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_asset(&mut self, symbol: &str) {
        self.assets.insert(symbol.to_ascii_uppercase());
    }

    /// Map a four-character institution code to its settlement account.
    pub fn register_institution(&mut self, code: &str, account: Account) {
        self.institutions.insert(code.to_ascii_uppercase(), account);
    }

    /// Build a checksummed ICAP from its parts.
    pub fn encode(asset: &str, institution: &str, client: &str) -> String {
        let body = format!(
            "{}{}{}",
            asset.to_ascii_uppercase(),
            institution.to_ascii_uppercase(),
            client.to_ascii_uppercase()
        );
        let remainder = mod97(&format!("{}{}00", body, COUNTRY_CODE)).unwrap_or(0);
        format!("{}{:02}{}", COUNTRY_CODE, 98 - remainder, body)
    }
}

/// IBAN-style remainder of `digits_and_letters` modulo 97.
/// Returns None on characters outside 0-9 / A-Z.
fn mod97(input: &str) -> Option<u32> {
    let mut remainder = 0u32;
    for c in input.chars() {
        match c {
            '0'..='9' => {
                remainder = (remainder * 10 + c.to_digit(10)?) % 97;
            }
            'A'..='Z' => {
                let value = c as u32 - 'A' as u32 + 10;
                remainder = (remainder * 100 + value) % 97;
            }
            _ => return None,
        }
    }
    Some(remainder)
}

impl Registry for StaticRegistry {
    fn parse(&self, encoded: &str) -> Result<IcapResolution, RegistryError> {
        let icap = encoded.trim().to_ascii_uppercase();
        if icap.len() != ICAP_LENGTH || !icap.is_ascii() {
            return Err(RegistryError::WrongLength);
        }
        if &icap[..2] != COUNTRY_CODE {
            return Err(RegistryError::BadCountryCode);
        }
        let rearranged = format!("{}{}", &icap[4..], &icap[..4]);
        if mod97(&rearranged) != Some(1) {
            return Err(RegistryError::BadChecksum);
        }

        let asset = &icap[4..7];
        let institution = &icap[7..11];
        if !self.assets.contains(asset) {
            return Err(RegistryError::UnregisteredAsset);
        }
        let account = self
            .institutions
            .get(institution)
            .ok_or(RegistryError::UnregisteredInstitution)?;

        Ok(IcapResolution {
            account: *account,
            asset: asset.to_string(),
        })
    }
}
