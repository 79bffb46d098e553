//! Vendor access codes: minting, resolution and premium catalog unlock.
//!
//! A code is 6 characters over `A-Z0-9`. Codes are unique across
//! accounts (enforced by a unique index in the store) and exist only
//! while the owning account's vendor status is `Active`.

use gm_core::error::{GmError, GmResult};
use gm_core::models::product::{Product, ProductStatus};
use gm_core::repository::{AccountRepository, ProductRepository};
use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MarketError;

pub const CODE_LENGTH: usize = 6;
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of candidate codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniformly random codes from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Canonical form of user input: trimmed, upper-cased, and exactly
/// [`CODE_LENGTH`] ASCII letters or digits.
pub fn normalize_code(input: &str) -> Result<String, MarketError> {
    let code = input.trim().to_ascii_uppercase();
    if code.len() != CODE_LENGTH || !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
        return Err(MarketError::MalformedCode);
    }
    Ok(code)
}

/// Vendor identity behind a valid code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorAccess {
    pub vendor_id: Uuid,
    pub vendor_name: String,
}

/// Result of unlocking a vendor's premium listing.
#[derive(Debug, Clone)]
pub struct UnlockedCatalog {
    pub vendor: VendorAccess,
    /// The vendor's `Active` products.
    pub products: Vec<Product>,
}

pub struct AccessCodeAuthorizer<A: AccountRepository, G: CodeGenerator = RandomCodeGenerator> {
    account_repo: A,
    generator: G,
    max_attempts: u32,
}

impl<A: AccountRepository, G: CodeGenerator> AccessCodeAuthorizer<A, G> {
    pub fn new(account_repo: A, generator: G, max_attempts: u32) -> Self {
        Self {
            account_repo,
            generator,
            max_attempts,
        }
    }

    /// Draw candidates until one is neither held nor revoked by any
    /// account.
    ///
    /// The check and the later write are not atomic; the unique index
    /// rejects a code taken in between, and callers re-mint on
    /// `AlreadyExists`.
    pub async fn mint_code(&self) -> GmResult<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generator.generate();
            if self.is_free(&candidate).await? {
                return Ok(candidate);
            }
            debug!(attempt, "vendor code collision, drawing again");
        }
        warn!(attempts = self.max_attempts, "vendor code space exhausted");
        Err(MarketError::CodeSpaceExhausted(self.max_attempts).into())
    }

    async fn is_free(&self, code: &str) -> GmResult<bool> {
        match self.account_repo.get_by_vendor_code(code).await {
            Ok(_) => return Ok(false),
            Err(GmError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        match self.account_repo.get_by_revoked_code(code).await {
            Ok(_) => Ok(false),
            Err(GmError::NotFound { .. }) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Map a user-supplied code to the vendor that owns it.
    pub async fn resolve_code(&self, input: &str) -> GmResult<VendorAccess> {
        let code = normalize_code(input)?;

        let account = match self.account_repo.get_by_vendor_code(&code).await {
            Ok(account) => account,
            Err(GmError::NotFound { .. }) => {
                return match self.account_repo.get_by_revoked_code(&code).await {
                    Ok(_) => Err(MarketError::VendorInactive.into()),
                    Err(GmError::NotFound { .. }) => Err(MarketError::CodeNotFound.into()),
                    Err(e) => Err(e),
                };
            }
            Err(e) => return Err(e),
        };

        // A stale code on a non-active account never grants access.
        if !account.is_active_vendor() {
            return Err(MarketError::VendorInactive.into());
        }

        Ok(VendorAccess {
            vendor_id: account.id,
            vendor_name: account.name,
        })
    }

    /// Resolve `input` and fetch the vendor's moderated products.
    pub async fn unlock_vendor_catalog<P: ProductRepository>(
        &self,
        products: &P,
        input: &str,
    ) -> GmResult<UnlockedCatalog> {
        let vendor = self.resolve_code(input).await?;
        let products = products
            .list_by_vendor(vendor.vendor_id)
            .await?
            .into_iter()
            .filter(|p| p.status == ProductStatus::Active)
            .collect();
        debug!(vendor_id = %vendor.vendor_id, "premium catalog unlocked");
        Ok(UnlockedCatalog { vendor, products })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_are_well_formed() {
        let generator = RandomCodeGenerator;
        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(normalize_code(&code).unwrap(), code);
        }
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  k7p2qx\n").unwrap(), "K7P2QX");
    }

    #[test]
    fn normalize_rejects_bad_shapes() {
        for bad in ["", "ABC", "ABCDEFG", "AB-CDE", "ÀBCDEF", "AB CDE"] {
            assert!(
                matches!(normalize_code(bad), Err(MarketError::MalformedCode)),
                "{bad:?} accepted"
            );
        }
    }
}
