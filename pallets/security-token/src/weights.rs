//! Weights for pallet-security-token.
//!
//! Transfers read both parties' identities and the issuer rules, which is
//! reflected in their higher constants.

use frame_support::weights::Weight;

pub trait WeightInfo {
    fn transfer() -> Weight;
    fn transfer_from() -> Weight;
    fn approve() -> Weight;
    fn mint_initial_supply() -> Weight;
    fn mint() -> Weight;
    fn burn() -> Weight;
    fn freeze_token() -> Weight;
    fn unfreeze_token() -> Weight;
    fn freeze() -> Weight;
    fn unfreeze() -> Weight;
    fn set_country_rule() -> Weight;
    fn remove_country_rule() -> Weight;
    fn set_investor_limit() -> Weight;
}

impl WeightInfo for () {
    fn transfer() -> Weight {
        Weight::from_parts(40_000, 0)
    }

    fn transfer_from() -> Weight {
        Weight::from_parts(50_000, 0)
    }

    fn approve() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn mint_initial_supply() -> Weight {
        Weight::from_parts(20_000, 0)
    }

    fn mint() -> Weight {
        Weight::from_parts(15_000, 0)
    }

    fn burn() -> Weight {
        Weight::from_parts(15_000, 0)
    }

    fn freeze_token() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn unfreeze_token() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn freeze() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn unfreeze() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn set_country_rule() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn remove_country_rule() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn set_investor_limit() -> Weight {
        Weight::from_parts(10_000, 0)
    }
}
