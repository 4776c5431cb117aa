//! Benchmarking setup for pallet-security-token

use super::*;

#[allow(unused)]
use crate::Pallet as SecurityToken;
use frame_benchmarking::v2::*;
use frame_system::RawOrigin;

const SENDER_ID: InvestorId = [1u8; 32];
const RECEIVER_ID: InvestorId = [2u8; 32];

/// Two registered investors, the first holding `balance`. The investor
/// limit is set so that the receiver passes through the limit checks.
fn funded_investors<T: Config>(balance: u128) -> (T::AccountId, T::AccountId) {
    let sender: T::AccountId = whitelisted_caller();
    let receiver: T::AccountId = account("receiver", 0, 0);
    T::BenchmarkHelper::register_investor(&sender, SENDER_ID);
    T::BenchmarkHelper::register_investor(&receiver, RECEIVER_ID);

    Balances::<T>::insert(&sender, balance);
    TotalSupply::<T>::put(balance);
    InvestorHoldings::<T>::insert(SENDER_ID, balance);
    InvestorCount::<T>::put(1);
    CountedCountry::<T>::insert(SENDER_ID, 0);
    CountryInvestorCount::<T>::insert(0, 1);
    InvestorLimit::<T>::put(100);
    (sender, receiver)
}

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn transfer() {
        let (sender, receiver) = funded_investors::<T>(10_000_000);

        #[extrinsic_call]
        _(RawOrigin::Signed(sender), receiver.clone(), 1_000_000);

        assert_eq!(Balances::<T>::get(&receiver), 1_000_000);
        assert_eq!(InvestorCount::<T>::get(), 2);
    }

    #[benchmark]
    fn transfer_from() {
        let (owner, receiver) = funded_investors::<T>(10_000_000);
        let spender: T::AccountId = account("spender", 0, 0);
        Allowances::<T>::insert(&owner, &spender, 1_000_000);

        #[extrinsic_call]
        _(RawOrigin::Signed(spender.clone()), owner.clone(), receiver.clone(), 1_000_000);

        assert_eq!(Balances::<T>::get(&receiver), 1_000_000);
        assert_eq!(Allowances::<T>::get(&owner, &spender), 0);
    }

    #[benchmark]
    fn approve() {
        let owner: T::AccountId = whitelisted_caller();
        let spender: T::AccountId = account("spender", 0, 0);

        #[extrinsic_call]
        _(RawOrigin::Signed(owner.clone()), spender.clone(), 1_000_000);

        assert_eq!(Allowances::<T>::get(&owner, &spender), 1_000_000);
    }

    #[benchmark]
    fn mint_initial_supply() {
        let issuer: T::AccountId = account("issuer", 0, 0);
        Issuer::<T>::put(&issuer);
        SupplyMinted::<T>::kill();
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, 1_000_000);

        assert!(SupplyMinted::<T>::get());
    }

    #[benchmark]
    fn mint() {
        let issuer: T::AccountId = account("issuer", 0, 0);
        Issuer::<T>::put(&issuer);
        SupplyMinted::<T>::put(true);
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, 1_000_000);

        assert_eq!(Balances::<T>::get(&issuer), 1_000_000);
    }

    #[benchmark]
    fn burn() {
        let issuer: T::AccountId = account("issuer", 0, 0);
        Issuer::<T>::put(&issuer);
        Balances::<T>::insert(&issuer, 1_000_000);
        TotalSupply::<T>::put(1_000_000);
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, 1_000_000);

        assert_eq!(TotalSupply::<T>::get(), 0);
    }

    #[benchmark]
    fn freeze_token() {
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin);

        assert!(TokenFrozen::<T>::get());
    }

    #[benchmark]
    fn unfreeze_token() {
        TokenFrozen::<T>::put(true);
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin);

        assert!(!TokenFrozen::<T>::get());
    }

    #[benchmark]
    fn freeze() {
        let account: T::AccountId = whitelisted_caller();
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, account.clone());

        assert!(Frozen::<T>::get(&account));
    }

    #[benchmark]
    fn unfreeze() {
        let account: T::AccountId = whitelisted_caller();
        Frozen::<T>::insert(&account, true);
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, account.clone());

        assert!(!Frozen::<T>::get(&account));
    }

    #[benchmark]
    fn set_country_rule() {
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, 44, true, 2, 100);

        assert!(CountryRules::<T>::contains_key(44));
    }

    #[benchmark]
    fn remove_country_rule() {
        CountryRules::<T>::insert(
            44,
            CountryRule { permitted: true, min_rating: 2, investor_limit: 100 },
        );
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, 44);

        assert!(!CountryRules::<T>::contains_key(44));
    }

    #[benchmark]
    fn set_investor_limit() {
        let origin = T::IssuerOrigin::try_successful_origin().expect("Issuer origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, 50);

        assert_eq!(InvestorLimit::<T>::get(), 50);
    }

    impl_benchmark_test_suite!(SecurityToken, crate::mock::new_test_ext(), crate::mock::Test);
}
