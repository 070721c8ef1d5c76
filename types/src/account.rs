use serde::{Deserialize, Serialize};

use crate::catalog::STARTING_SPINS;

/// Opaque numeric identity assigned by the chat platform. Always positive.
pub type AccountId = i64;

/// Subscription tier. Upgraded by purchase, never downgraded by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Plus,
    Pro,
    Prem,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Plus, Tier::Pro, Tier::Prem];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Plus => "plus",
            Tier::Pro => "pro",
            Tier::Prem => "prem",
        }
    }

    /// Parse the wire spelling used in purchase payloads.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Tier::Free),
            "plus" => Some(Tier::Plus),
            "pro" => Some(Tier::Pro),
            "prem" => Some(Tier::Prem),
            _ => None,
        }
    }
}

/// Cached profile fields mirrored from the chat platform. Cosmetic only:
/// nothing in the economy depends on them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub photo_ref: Option<String>,
}

impl Profile {
    /// Overwrite the fields the patch provides; leave the rest cached.
    pub fn merge(&mut self, patch: &Profile) {
        if patch.username.is_some() {
            self.username = patch.username.clone();
        }
        if patch.display_name.is_some() {
            self.display_name = patch.display_name.clone();
        }
        if patch.photo_ref.is_some() {
            self.photo_ref = patch.photo_ref.clone();
        }
    }
}

/// One end-user account. Created lazily, never deleted, and mutated
/// exclusively through [`Account::apply`] under the ledger's per-account
/// serialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: u64,
    pub spins_left: u32,
    pub golden_tickets: u32,
    pub tier: Tier,
    pub invites: u32,
    pub last_seen: u64,
    pub profile: Profile,
}

impl Account {
    /// Default row for a freshly seen identity.
    pub fn new(now: u64) -> Self {
        Self {
            balance: 0,
            spins_left: STARTING_SPINS,
            golden_tickets: 0,
            tier: Tier::Free,
            invites: 0,
            last_seen: now,
            profile: Profile::default(),
        }
    }

    /// Apply a delta in place, stamping `last_seen`.
    ///
    /// Balances saturate at zero rather than wrapping; callers that must not
    /// overdraw (the spin path) check their precondition before building the
    /// delta.
    pub fn apply(&mut self, delta: &Delta, now: u64) {
        self.balance = add_signed_u64(self.balance, delta.balance);
        self.spins_left = add_signed_u32(self.spins_left, delta.spins);
        self.golden_tickets = add_signed_u32(self.golden_tickets, delta.tickets);
        if let Some(tier) = delta.set_tier {
            self.tier = tier;
        }
        if let Some(patch) = &delta.profile {
            self.profile.merge(patch);
        }
        self.invites = self.invites.saturating_add(delta.invites);
        self.last_seen = now;
    }
}

fn add_signed_u64(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

fn add_signed_u32(value: u32, delta: i32) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta as u32)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

/// A single economy mutation. Each logical event (spin settlement, referral
/// credit, bundle grant, reward, payment grant, profile sync) maps to
/// exactly one delta.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    pub balance: i64,
    pub spins: i32,
    pub tickets: i32,
    pub invites: u32,
    pub set_tier: Option<Tier>,
    pub profile: Option<Profile>,
}

impl Delta {
    pub fn balance(amount: i64) -> Self {
        Self {
            balance: amount,
            ..Self::default()
        }
    }

    pub fn tier(tier: Tier) -> Self {
        Self {
            set_tier: Some(tier),
            ..Self::default()
        }
    }

    /// Settlement for one resolved spin: prize in, spin credits out.
    pub fn spin_settlement(prize: u64, turbo: u32) -> Self {
        Self {
            balance: prize as i64,
            spins: -(turbo as i32),
            ..Self::default()
        }
    }

    pub fn grant(coins: u64, spins: u32, tickets: u32) -> Self {
        Self {
            balance: coins as i64,
            spins: spins as i32,
            tickets: tickets as i32,
            ..Self::default()
        }
    }

    pub fn profile(patch: Profile) -> Self {
        Self {
            profile: Some(patch),
            ..Self::default()
        }
    }
}
