//! Weights for pallet-kyc-registrar.
//!
//! The `()` implementation carries conservative constants until the
//! benchmarks in `benchmarking.rs` are run against a production runtime.

use frame_support::weights::Weight;

pub trait WeightInfo {
    fn add_investor(a: u32) -> Weight;
    fn add_addresses(a: u32) -> Weight;
    fn update_investor() -> Weight;
    fn set_investor_restriction() -> Weight;
}

impl WeightInfo for () {
    fn add_investor(a: u32) -> Weight {
        Weight::from_parts(20_000, 0)
            .saturating_add(Weight::from_parts(5_000, 0).saturating_mul(a as u64))
    }

    fn add_addresses(a: u32) -> Weight {
        Weight::from_parts(15_000, 0)
            .saturating_add(Weight::from_parts(5_000, 0).saturating_mul(a as u64))
    }

    fn update_investor() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn set_investor_restriction() -> Weight {
        Weight::from_parts(10_000, 0)
    }
}
