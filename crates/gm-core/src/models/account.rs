//! Account domain model, including the vendor sub-state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Privilege level. Authoritative over the legacy `is_admin` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Client,
    Vendor,
    Manager,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Vendor => "vendeur",
            Role::Manager => "manager",
            Role::SuperAdmin => "super-admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Role::Client),
            "vendeur" => Some(Role::Vendor),
            "manager" => Some(Role::Manager),
            "super-admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Manager | Role::SuperAdmin)
    }
}

/// Vendor sub-state of an account.
///
/// `None → Pending → {Active, Rejected}`, `Active → Rejected` (revocation),
/// `Rejected → Pending` (re-application).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VendorStatus {
    #[default]
    None,
    Pending,
    Active,
    Rejected,
}

impl VendorStatus {
    pub const ALL: [VendorStatus; 4] = [
        VendorStatus::None,
        VendorStatus::Pending,
        VendorStatus::Active,
        VendorStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::None => "none",
            VendorStatus::Pending => "pending",
            VendorStatus::Active => "active",
            VendorStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(VendorStatus::None),
            "pending" => Some(VendorStatus::Pending),
            "active" => Some(VendorStatus::Active),
            "rejected" => Some(VendorStatus::Rejected),
            _ => None,
        }
    }

    /// Transitions reachable through the application queue.
    pub fn can_transition_to(&self, next: VendorStatus) -> bool {
        use VendorStatus::*;
        matches!(
            (self, next),
            (None, Pending)
                | (Rejected, Pending)
                | (Pending, Active)
                | (Pending, Rejected)
                | (Active, Rejected)
        )
    }

    /// States an administrator may activate directly, skipping the request.
    pub fn can_activate_directly(&self) -> bool {
        !matches!(self, VendorStatus::Active)
    }

    /// All states from which `next` is reachable through the queue.
    pub fn predecessors(next: VendorStatus) -> Vec<VendorStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Role,
    /// Legacy mirror of `role.is_admin()`.
    pub is_admin: bool,
    pub is_vendor: bool,
    pub vendor_status: VendorStatus,
    /// Present iff `vendor_status` is `Active`; unique across accounts.
    pub vendor_code: Option<String>,
    /// Every code taken away by rejection or rotation. These are never
    /// minted again, and resolving one reports the vendor as inactive.
    pub revoked_vendor_codes: Vec<String>,
    pub vendor_application_date: Option<DateTime<Utc>>,
    pub vendor_approval_date: Option<DateTime<Utc>>,
    /// One-deep mailbox for administrator notifications.
    pub admin_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active_vendor(&self) -> bool {
        self.vendor_status == VendorStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Partial account update.
///
/// For the `Option<Option<_>>` fields: `Some(Some(val))` = set,
/// `Some(None)` = clear, `None` = no change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAccount {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<Option<String>>,
    /// Also rewrites `is_admin`.
    pub role: Option<Role>,
    pub is_vendor: Option<bool>,
    pub vendor_status: Option<VendorStatus>,
    pub vendor_code: Option<Option<String>>,
    /// Appended to `revoked_vendor_codes`; existing entries are kept.
    pub revoke_vendor_code: Option<String>,
    pub vendor_application_date: Option<Option<DateTime<Utc>>>,
    pub vendor_approval_date: Option<Option<DateTime<Utc>>>,
    pub admin_message: Option<Option<String>>,
}
