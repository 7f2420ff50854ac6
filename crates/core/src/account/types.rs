//! Account identity and snapshot types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use khata_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Path key of the singleton cash account.
pub const CASH_ACCOUNT_KEY: &str = "main";

/// Kind of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Buys from the business.
    Customer,
    /// Sells to the business.
    Supplier,
    /// Transports goods for the business.
    Shipper,
    /// A business bank account.
    Bank,
    /// The cash box.
    Cash,
}

impl AccountKind {
    /// Parses a kind from its lowercase name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "supplier" => Some(Self::Supplier),
            "shipper" => Some(Self::Shipper),
            "bank" => Some(Self::Bank),
            "cash" => Some(Self::Cash),
            _ => None,
        }
    }

    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
            Self::Shipper => "shipper",
            Self::Bank => "bank",
            Self::Cash => "cash",
        }
    }

    /// Bank and cash hold the business's own money.
    #[must_use]
    pub const fn is_fund(self) -> bool {
        matches!(self, Self::Bank | Self::Cash)
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to exactly one account.
///
/// The derived ordering is the lock order used by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum AccountRef {
    /// A customer account.
    Customer(AccountId),
    /// A supplier account.
    Supplier(AccountId),
    /// A shipper account.
    Shipper(AccountId),
    /// A bank account.
    Bank(AccountId),
    /// The singleton cash account.
    Cash,
}

impl AccountRef {
    /// Builds a reference from a kind and its path id.
    ///
    /// Cash is addressed as `main`; every other kind needs a UUID.
    #[must_use]
    pub fn from_parts(kind: AccountKind, id: &str) -> Option<Self> {
        if kind == AccountKind::Cash {
            return (id == CASH_ACCOUNT_KEY).then_some(Self::Cash);
        }
        let id: AccountId = id.parse().ok()?;
        Some(Self::with_id(kind, id))
    }

    /// Builds a reference for a freshly created account.
    #[must_use]
    pub const fn with_id(kind: AccountKind, id: AccountId) -> Self {
        match kind {
            AccountKind::Customer => Self::Customer(id),
            AccountKind::Supplier => Self::Supplier(id),
            AccountKind::Shipper => Self::Shipper(id),
            AccountKind::Bank => Self::Bank(id),
            AccountKind::Cash => Self::Cash,
        }
    }

    /// Returns the account kind.
    #[must_use]
    pub const fn kind(self) -> AccountKind {
        match self {
            Self::Customer(_) => AccountKind::Customer,
            Self::Supplier(_) => AccountKind::Supplier,
            Self::Shipper(_) => AccountKind::Shipper,
            Self::Bank(_) => AccountKind::Bank,
            Self::Cash => AccountKind::Cash,
        }
    }

    /// Returns the account id, `None` for cash.
    #[must_use]
    pub const fn id(self) -> Option<AccountId> {
        match self {
            Self::Customer(id) | Self::Supplier(id) | Self::Shipper(id) | Self::Bank(id) => {
                Some(id)
            }
            Self::Cash => None,
        }
    }

    /// Whether this is a bank or cash account.
    #[must_use]
    pub const fn is_fund(self) -> bool {
        self.kind().is_fund()
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}/{id}", self.kind()),
            None => write!(f, "{}/{CASH_ACCOUNT_KEY}", self.kind()),
        }
    }
}

/// An account with its stored balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Which account this is.
    pub reference: AccountRef,
    /// Display name.
    pub name: String,
    /// Signed balance, convention depends on the kind.
    pub balance: Decimal,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns the account kind.
    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        self.reference.kind()
    }
}

/// Accounts locked for one operation, keyed by reference.
///
/// Planning functions only read accounts present here. A missing entry means
/// the persistence layer does not know the account.
#[derive(Debug, Clone, Default)]
pub struct AccountSnapshot {
    accounts: BTreeMap<AccountRef, Account>,
}

impl AccountSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an account.
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.reference, account);
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, account: Account) -> Self {
        self.insert(account);
        self
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, reference: &AccountRef) -> Option<&Account> {
        self.accounts.get(reference)
    }

    /// Whether the account is known.
    #[must_use]
    pub fn contains(&self, reference: &AccountRef) -> bool {
        self.accounts.contains_key(reference)
    }
}

impl FromIterator<Account> for AccountSnapshot {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for account in iter {
            snapshot.insert(account);
        }
        snapshot
    }
}
