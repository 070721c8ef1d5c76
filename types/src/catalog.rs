//! Static game-economy catalogs: payout table, tier parameters, bundles,
//! and cosmetic skins.
//!
//! All of this is process-wide immutable configuration. It is injected as a
//! read-only [`Catalog`] value rather than consulted through module-level
//! state so tests can run against alternate catalogs; [`Catalog::default`]
//! is the production data.

use serde::{Deserialize, Serialize};

use crate::account::Tier;

/// Number of wheel segments. The client renders exactly this many.
pub const SEGMENT_COUNT: usize = 25;

/// Base prize per segment, 0-indexed.
///
/// This table is exposed bit-exactly for client-server agreement; any change
/// requires a synchronized deployment with the presentation layer.
pub const PAYOUT_TABLE: [u64; SEGMENT_COUNT] = [
    100, // jackpot
    1, 2, 1, 5, 1, 2, 1, 5, 1, 2, 1, 5, 1, 2, 1, 20, 1, 2, 1, 50, 1, 2, 1, 20,
];

/// Accepted turbo multipliers. Anything else degrades to a single spin.
pub const TURBO_VALUES: [u32; 5] = [1, 5, 10, 20, 50];

/// Spin credits granted to a freshly created account.
pub const STARTING_SPINS: u32 = 20;

/// Referral reward, credited to both sides of the pair.
pub const REFERRAL_COIN_REWARD: u64 = 200;
pub const REFERRAL_SPIN_REWARD: u32 = 20;

/// Per-tier prize multiplier, spin-capacity cap, and purchase price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierParams {
    pub multiplier: u64,
    pub spin_cap: u32,
    /// Platform-currency price. Zero means the tier is not purchasable.
    pub price: u64,
}

/// Purchasable bundle identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleId {
    Mini = 0,
    Medium = 1,
    Maxi = 2,
}

impl BundleId {
    pub const ALL: [BundleId; 3] = [BundleId::Mini, BundleId::Medium, BundleId::Maxi];

    pub fn as_str(&self) -> &'static str {
        match self {
            BundleId::Mini => "mini",
            BundleId::Medium => "medium",
            BundleId::Maxi => "maxi",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mini" => Some(BundleId::Mini),
            "medium" => Some(BundleId::Medium),
            "maxi" => Some(BundleId::Maxi),
            _ => None,
        }
    }
}

/// A purchasable package of currency, spin credits, and golden tickets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub price: u64,
    pub coins: u64,
    pub spins: u32,
    pub tickets: u32,
}

/// Cosmetic item family. Inventory rows are keyed on `(owner, kind, id)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinKind {
    Wheel,
    Background,
}

impl SkinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinKind::Wheel => "wheel",
            SkinKind::Background => "background",
        }
    }
}

/// One priced cosmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkinEntry {
    pub id: u32,
    pub price: u64,
}

/// Injected read-only catalog data.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub payouts: [u64; SEGMENT_COUNT],
    tiers: [TierParams; 4],
    bundles: [Bundle; 3],
    wheel_skins: Vec<SkinEntry>,
    backgrounds: Vec<SkinEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            payouts: PAYOUT_TABLE,
            tiers: [
                // free
                TierParams {
                    multiplier: 1,
                    spin_cap: 20,
                    price: 0,
                },
                // plus
                TierParams {
                    multiplier: 2,
                    spin_cap: 40,
                    price: 700,
                },
                // pro
                TierParams {
                    multiplier: 3,
                    spin_cap: 60,
                    price: 1_500,
                },
                // prem
                TierParams {
                    multiplier: 5,
                    spin_cap: 100,
                    price: 2_500,
                },
            ],
            bundles: [
                // mini
                Bundle {
                    price: 100,
                    coins: 100,
                    spins: 10,
                    tickets: 0,
                },
                // medium
                Bundle {
                    price: 250,
                    coins: 300,
                    spins: 30,
                    tickets: 1,
                },
                // maxi
                Bundle {
                    price: 500,
                    coins: 700,
                    spins: 75,
                    tickets: 3,
                },
            ],
            wheel_skins: vec![
                SkinEntry { id: 1, price: 150 },
                SkinEntry { id: 2, price: 150 },
                SkinEntry { id: 3, price: 250 },
                SkinEntry { id: 4, price: 400 },
            ],
            backgrounds: vec![
                SkinEntry { id: 1, price: 100 },
                SkinEntry { id: 2, price: 100 },
                SkinEntry { id: 3, price: 200 },
            ],
        }
    }
}

impl Catalog {
    pub fn payout(&self, segment: u8) -> u64 {
        self.payouts[segment as usize]
    }

    pub fn tier(&self, tier: Tier) -> &TierParams {
        &self.tiers[tier as usize]
    }

    pub fn multiplier(&self, tier: Tier) -> u64 {
        self.tier(tier).multiplier
    }

    pub fn spin_cap(&self, tier: Tier) -> u32 {
        self.tier(tier).spin_cap
    }

    /// Purchase price of a tier. `None` for tiers that are not sold.
    pub fn tier_price(&self, tier: Tier) -> Option<u64> {
        let price = self.tier(tier).price;
        (price > 0).then_some(price)
    }

    pub fn bundle(&self, id: BundleId) -> &Bundle {
        &self.bundles[id as usize]
    }

    pub fn skin_price(&self, kind: SkinKind, id: u32) -> Option<u64> {
        let entries = match kind {
            SkinKind::Wheel => &self.wheel_skins,
            SkinKind::Background => &self.backgrounds,
        };
        entries.iter().find(|entry| entry.id == id).map(|entry| entry.price)
    }

    /// Single clamp policy for bundle spin grants: the grant fills up to the
    /// tier's capacity cap and no further. A balance already over the cap
    /// (from uncapped reward credits) is left untouched. Reward and referral
    /// credits do not pass through here.
    pub fn clamp_spin_grant(&self, tier: Tier, current: u32, grant: u32) -> u32 {
        let cap = self.spin_cap(tier);
        grant.min(cap.saturating_sub(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payout_table_is_bit_exact() {
        // Spot checks phrased in the 1-indexed terms the presentation layer
        // uses: 1st segment is the jackpot, even segments pay 1, and so on.
        assert_eq!(PAYOUT_TABLE[0], 100);
        for pos in (2..=24).step_by(2) {
            assert_eq!(PAYOUT_TABLE[pos - 1], 1, "position {pos}");
        }
        for pos in [3, 7, 11, 15, 19, 23] {
            assert_eq!(PAYOUT_TABLE[pos - 1], 2, "position {pos}");
        }
        for pos in [5, 9, 13] {
            assert_eq!(PAYOUT_TABLE[pos - 1], 5, "position {pos}");
        }
        for pos in [17, 25] {
            assert_eq!(PAYOUT_TABLE[pos - 1], 20, "position {pos}");
        }
        assert_eq!(PAYOUT_TABLE[20], 50);
        assert_eq!(PAYOUT_TABLE.len(), SEGMENT_COUNT);
    }

    #[test]
    fn tier_parameters() {
        let catalog = Catalog::default();
        assert_eq!(catalog.multiplier(Tier::Free), 1);
        assert_eq!(catalog.multiplier(Tier::Plus), 2);
        assert_eq!(catalog.multiplier(Tier::Pro), 3);
        assert_eq!(catalog.multiplier(Tier::Prem), 5);
        assert_eq!(catalog.spin_cap(Tier::Free), 20);
        assert_eq!(catalog.spin_cap(Tier::Plus), 40);
        assert_eq!(catalog.spin_cap(Tier::Pro), 60);
        assert_eq!(catalog.spin_cap(Tier::Prem), 100);
    }

    #[test]
    fn free_tier_is_not_purchasable() {
        let catalog = Catalog::default();
        assert_eq!(catalog.tier_price(Tier::Free), None);
        assert_eq!(catalog.tier_price(Tier::Plus), Some(700));
    }

    #[test]
    fn skin_lookup() {
        let catalog = Catalog::default();
        assert_eq!(catalog.skin_price(SkinKind::Wheel, 3), Some(250));
        assert_eq!(catalog.skin_price(SkinKind::Background, 1), Some(100));
        assert_eq!(catalog.skin_price(SkinKind::Wheel, 99), None);
    }

    #[test]
    fn clamp_fills_to_cap_only() {
        let catalog = Catalog::default();
        // Room for the whole grant.
        assert_eq!(catalog.clamp_spin_grant(Tier::Plus, 10, 20), 20);
        // Partial room.
        assert_eq!(catalog.clamp_spin_grant(Tier::Free, 15, 10), 5);
        // At the cap.
        assert_eq!(catalog.clamp_spin_grant(Tier::Free, 20, 10), 0);
        // Over the cap (uncapped rewards got it there): grant nothing,
        // reduce nothing.
        assert_eq!(catalog.clamp_spin_grant(Tier::Free, 50, 10), 0);
    }

    #[test]
    fn bundle_id_round_trip() {
        for id in BundleId::ALL {
            assert_eq!(BundleId::parse(id.as_str()), Some(id));
        }
        assert_eq!(BundleId::parse("mega"), None);
    }
}
