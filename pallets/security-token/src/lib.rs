//! # Security Token Pallet
//!
//! A permissioned token whose transfers settle only between investors the KYC
//! registrar vouches for. Balances and allowances are kept per address while
//! eligibility and investor counting are evaluated per identity.
//!
//! - [`Pallet::transfer`], [`Pallet::approve`] and [`Pallet::transfer_from`]
//!   form the ledger. Every transfer is checked against the allowance, then
//!   the balance, then the restriction engine, before any storage is written.
//! - The issuer holds the supply and is exempt from registry checks on its
//!   own address. Its privileged calls require `IssuerOrigin`.

#![cfg_attr(not(feature = "std"), no_std)]
// Storage getters and the explicit `RuntimeEvent` bound are deprecated upstream
#![allow(deprecated)]
#![allow(clippy::let_unit_value)]

use frame_support::{
    dispatch::DispatchResult,
    ensure,
    pallet_prelude::*,
    traits::{EnsureOrigin, UnixTime},
};
use frame_system::{ensure_signed, pallet_prelude::*};
use pallet_kyc_registrar::{IdentityRegistry, Investor, InvestorId};
use sp_std::prelude::*;

pub use pallet::*;
pub use restrictions::{Assessment, CountryRule, RestrictionReason};
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod restrictions;
pub mod weights;

const LOG_TARGET: &str = "runtime::security-token";

/// Registers investors directly so benchmarks can reach the transfer paths.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
    fn register_investor(who: &AccountId, id: InvestorId);
}

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Origin of the issuing entity's privileged calls.
        type IssuerOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Investor identities consulted before every transfer.
        type Registry: IdentityRegistry<Self::AccountId>;

        /// Wall clock used for identity expiry.
        type Time: UnixTime;

        type WeightInfo: WeightInfo;

        #[cfg(feature = "runtime-benchmarks")]
        type BenchmarkHelper: BenchmarkHelper<Self::AccountId>;
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// Token name (e.g., "Sovereign Bond Token")
    #[pallet::storage]
    #[pallet::getter(fn token_name)]
    pub type TokenName<T> = StorageValue<_, BoundedVec<u8, ConstU32<64>>, ValueQuery>;

    /// Token symbol (e.g., "SBT")
    #[pallet::storage]
    #[pallet::getter(fn token_symbol)]
    pub type TokenSymbol<T> = StorageValue<_, BoundedVec<u8, ConstU32<16>>, ValueQuery>;

    /// Token decimals
    #[pallet::storage]
    #[pallet::getter(fn decimals)]
    pub type Decimals<T> = StorageValue<_, u8, ValueQuery>;

    /// Total token supply
    #[pallet::storage]
    #[pallet::getter(fn total_supply)]
    pub type TotalSupply<T> = StorageValue<_, u128, ValueQuery>;

    /// Account balances
    #[pallet::storage]
    #[pallet::getter(fn balance_of)]
    pub type Balances<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, u128, ValueQuery>;

    /// Amount a spender may move on behalf of an owner: (owner, spender) -> amount
    #[pallet::storage]
    #[pallet::getter(fn allowance)]
    pub type Allowances<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AccountId,
        Blake2_128Concat,
        T::AccountId,
        u128,
        ValueQuery,
    >;

    /// Address of the issuing entity
    #[pallet::storage]
    #[pallet::getter(fn issuer)]
    pub type Issuer<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

    /// Set once the initial supply has been minted
    #[pallet::storage]
    #[pallet::getter(fn supply_minted)]
    pub type SupplyMinted<T> = StorageValue<_, bool, ValueQuery>;

    /// Issuer-wide transfer halt
    #[pallet::storage]
    #[pallet::getter(fn token_frozen)]
    pub type TokenFrozen<T> = StorageValue<_, bool, ValueQuery>;

    /// Frozen accounts (cannot send transfers)
    #[pallet::storage]
    #[pallet::getter(fn is_frozen)]
    pub type Frozen<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, bool, ValueQuery>;

    /// Maximum number of investors holding the token, 0 for unlimited
    #[pallet::storage]
    #[pallet::getter(fn investor_limit)]
    pub type InvestorLimit<T> = StorageValue<_, u32, ValueQuery>;

    /// Per-country issuer rules
    #[pallet::storage]
    #[pallet::getter(fn country_rule)]
    pub type CountryRules<T> = StorageMap<_, Twox64Concat, u16, CountryRule, OptionQuery>;

    /// Tokens held across all addresses of an identity
    #[pallet::storage]
    #[pallet::getter(fn investor_holdings)]
    pub type InvestorHoldings<T> = StorageMap<_, Blake2_128Concat, InvestorId, u128, ValueQuery>;

    /// Number of identities with non-zero holdings
    #[pallet::storage]
    #[pallet::getter(fn investor_count)]
    pub type InvestorCount<T> = StorageValue<_, u32, ValueQuery>;

    /// Country each holding identity is counted under in `CountryInvestorCount`
    #[pallet::storage]
    #[pallet::getter(fn counted_country)]
    pub type CountedCountry<T> = StorageMap<_, Blake2_128Concat, InvestorId, u16, OptionQuery>;

    /// Number of identities with non-zero holdings, per country
    #[pallet::storage]
    #[pallet::getter(fn country_investor_count)]
    pub type CountryInvestorCount<T> = StorageMap<_, Twox64Concat, u16, u32, ValueQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// Tokens transferred from one account to another
        Transferred { from: T::AccountId, to: T::AccountId, amount: u128 },
        /// Allowance set for a spender
        Approved { owner: T::AccountId, spender: T::AccountId, amount: u128 },
        /// New tokens minted
        Minted { to: T::AccountId, amount: u128 },
        /// Tokens destroyed
        Burned { from: T::AccountId, amount: u128 },
        /// All transfers halted
        TokenFrozen,
        /// Transfers resumed
        TokenUnfrozen,
        /// Account frozen (cannot send transfers)
        Frozen { account: T::AccountId },
        /// Account unfrozen
        Unfrozen { account: T::AccountId },
        /// Country rule set or replaced
        CountryRuleSet { country: u16, rule: CountryRule },
        /// Country rule removed
        CountryRuleRemoved { country: u16 },
        /// Investor limit changed
        InvestorLimitSet { limit: u32 },
    }

    #[pallet::error]
    pub enum Error<T> {
        InsufficientBalance,
        InsufficientAllowance,
        /// The restriction engine refused the transfer
        Restricted(RestrictionReason),
        /// No issuer address configured
        IssuerNotSet,
        /// Initial supply can only be minted once
        AlreadyMinted,
        /// Further minting requires the initial supply
        InitialSupplyNotMinted,
        Overflow,
    }

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        #[cfg(feature = "try-runtime")]
        fn try_state(_n: BlockNumberFor<T>) -> Result<(), sp_runtime::TryRuntimeError> {
            Self::do_try_state()
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::transfer())]
        pub fn transfer(origin: OriginFor<T>, to: T::AccountId, amount: u128) -> DispatchResult {
            let sender = ensure_signed(origin)?;
            Self::do_transfer(&sender, &to, amount)
        }

        /// Overwrite the caller's allowance for `spender`. Moves no value, so
        /// no restriction applies.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::approve())]
        pub fn approve(
            origin: OriginFor<T>,
            spender: T::AccountId,
            amount: u128,
        ) -> DispatchResult {
            let owner = ensure_signed(origin)?;
            Allowances::<T>::insert(&owner, &spender, amount);
            Self::deposit_event(Event::Approved { owner, spender, amount });
            Ok(())
        }

        /// Move `amount` from `owner` to `to` on the caller's authority.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::transfer_from())]
        pub fn transfer_from(
            origin: OriginFor<T>,
            owner: T::AccountId,
            to: T::AccountId,
            amount: u128,
        ) -> DispatchResult {
            let spender = ensure_signed(origin)?;
            Self::do_transfer_from(&spender, &owner, &to, amount)
        }

        /// Credit the issuer with the initial supply. Only possible once.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::mint_initial_supply())]
        pub fn mint_initial_supply(origin: OriginFor<T>, amount: u128) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            ensure!(!SupplyMinted::<T>::get(), Error::<T>::AlreadyMinted);
            let issuer = Issuer::<T>::get().ok_or(Error::<T>::IssuerNotSet)?;

            Self::do_mint(issuer, amount)?;
            SupplyMinted::<T>::put(true);
            log::info!(target: LOG_TARGET, "Initial supply of {} minted", amount);
            Ok(())
        }

        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::mint())]
        pub fn mint(origin: OriginFor<T>, amount: u128) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            ensure!(SupplyMinted::<T>::get(), Error::<T>::InitialSupplyNotMinted);
            let issuer = Issuer::<T>::get().ok_or(Error::<T>::IssuerNotSet)?;
            Self::do_mint(issuer, amount)
        }

        #[pallet::call_index(5)]
        #[pallet::weight(T::WeightInfo::burn())]
        pub fn burn(origin: OriginFor<T>, amount: u128) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            let issuer = Issuer::<T>::get().ok_or(Error::<T>::IssuerNotSet)?;
            let remaining = Balances::<T>::get(&issuer)
                .checked_sub(amount)
                .ok_or(Error::<T>::InsufficientBalance)?;

            Balances::<T>::insert(&issuer, remaining);
            TotalSupply::<T>::mutate(|supply| *supply = supply.saturating_sub(amount));
            Self::deposit_event(Event::Burned { from: issuer, amount });
            Ok(())
        }

        #[pallet::call_index(6)]
        #[pallet::weight(T::WeightInfo::freeze_token())]
        pub fn freeze_token(origin: OriginFor<T>) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            TokenFrozen::<T>::put(true);
            log::info!(target: LOG_TARGET, "Token frozen");
            Self::deposit_event(Event::TokenFrozen);
            Ok(())
        }

        #[pallet::call_index(7)]
        #[pallet::weight(T::WeightInfo::unfreeze_token())]
        pub fn unfreeze_token(origin: OriginFor<T>) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            TokenFrozen::<T>::kill();
            log::info!(target: LOG_TARGET, "Token unfrozen");
            Self::deposit_event(Event::TokenUnfrozen);
            Ok(())
        }

        #[pallet::call_index(8)]
        #[pallet::weight(T::WeightInfo::freeze())]
        pub fn freeze(origin: OriginFor<T>, account: T::AccountId) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            Frozen::<T>::insert(&account, true);
            log::info!(target: LOG_TARGET, "Account {:?} frozen", account);
            Self::deposit_event(Event::Frozen { account });
            Ok(())
        }

        #[pallet::call_index(9)]
        #[pallet::weight(T::WeightInfo::unfreeze())]
        pub fn unfreeze(origin: OriginFor<T>, account: T::AccountId) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            Frozen::<T>::remove(&account);
            log::info!(target: LOG_TARGET, "Account {:?} unfrozen", account);
            Self::deposit_event(Event::Unfrozen { account });
            Ok(())
        }

        /// Permit or block a country and set its minimum rating and investor
        /// limit (0 for unlimited).
        #[pallet::call_index(10)]
        #[pallet::weight(T::WeightInfo::set_country_rule())]
        pub fn set_country_rule(
            origin: OriginFor<T>,
            country: u16,
            permitted: bool,
            min_rating: u8,
            investor_limit: u32,
        ) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            let rule = CountryRule { permitted, min_rating, investor_limit };
            CountryRules::<T>::insert(country, rule);
            log::info!(target: LOG_TARGET, "Country {} rule set to {:?}", country, rule);
            Self::deposit_event(Event::CountryRuleSet { country, rule });
            Ok(())
        }

        #[pallet::call_index(11)]
        #[pallet::weight(T::WeightInfo::remove_country_rule())]
        pub fn remove_country_rule(origin: OriginFor<T>, country: u16) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            CountryRules::<T>::remove(country);
            log::info!(target: LOG_TARGET, "Country {} rule removed", country);
            Self::deposit_event(Event::CountryRuleRemoved { country });
            Ok(())
        }

        /// Cap the number of investors holding the token, 0 for unlimited.
        /// Existing holders above a lowered limit are not affected.
        #[pallet::call_index(12)]
        #[pallet::weight(T::WeightInfo::set_investor_limit())]
        pub fn set_investor_limit(origin: OriginFor<T>, limit: u32) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            InvestorLimit::<T>::put(limit);
            log::info!(target: LOG_TARGET, "Investor limit set to {}", limit);
            Self::deposit_event(Event::InvestorLimitSet { limit });
            Ok(())
        }
    }

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        /// Issuing entity address (exempt from registry checks)
        pub issuer: Option<T::AccountId>,
        /// Token name
        pub token_name: Vec<u8>,
        /// Token symbol
        pub token_symbol: Vec<u8>,
        /// Token decimals
        pub decimals: u8,
        /// Supply credited to the issuer at genesis, 0 to mint later
        pub initial_supply: u128,
        /// Investor limit, 0 for unlimited
        pub investor_limit: u32,
        /// Country rules: (country, permitted, min_rating, investor_limit)
        pub country_rules: Vec<(u16, bool, u8, u32)>,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            // Set token metadata
            let name: BoundedVec<u8, ConstU32<64>> =
                self.token_name.clone().try_into().expect("Token name too long (max 64 bytes)");
            TokenName::<T>::put(name);

            let symbol: BoundedVec<u8, ConstU32<16>> =
                self.token_symbol.clone().try_into().expect("Token symbol too long (max 16 bytes)");
            TokenSymbol::<T>::put(symbol);

            Decimals::<T>::put(self.decimals);

            if let Some(ref issuer) = self.issuer {
                Issuer::<T>::put(issuer);
            }

            if self.initial_supply > 0 {
                let issuer = self.issuer.as_ref().expect("Initial supply requires an issuer");
                Balances::<T>::insert(issuer, self.initial_supply);
                TotalSupply::<T>::put(self.initial_supply);
                SupplyMinted::<T>::put(true);
            }

            InvestorLimit::<T>::put(self.investor_limit);
            for &(country, permitted, min_rating, investor_limit) in &self.country_rules {
                CountryRules::<T>::insert(
                    country,
                    CountryRule { permitted, min_rating, investor_limit },
                );
            }
        }
    }
}

impl<T: Config> Pallet<T> {
    pub fn is_issuer(who: &T::AccountId) -> bool {
        Issuer::<T>::get().as_ref() == Some(who)
    }

    /// Current unix time in seconds.
    pub fn now() -> u64 {
        T::Time::now().as_secs()
    }

    pub fn do_transfer(from: &T::AccountId, to: &T::AccountId, amount: u128) -> DispatchResult {
        ensure!(Balances::<T>::get(from) >= amount, Error::<T>::InsufficientBalance);
        let assessment = Self::restrict(from, to, amount)?;
        Self::settle(from, to, amount, assessment)
    }

    /// Allowance, then balance, then restrictions; the first failing check
    /// is reported. The allowance is consumed only when the transfer settles.
    pub fn do_transfer_from(
        spender: &T::AccountId,
        owner: &T::AccountId,
        to: &T::AccountId,
        amount: u128,
    ) -> DispatchResult {
        let needs_allowance = !Self::is_trusted_spender(spender, owner);
        let allowance = Allowances::<T>::get(owner, spender);
        if needs_allowance {
            ensure!(allowance >= amount, Error::<T>::InsufficientAllowance);
        }
        ensure!(Balances::<T>::get(owner) >= amount, Error::<T>::InsufficientBalance);
        let assessment = Self::restrict(owner, to, amount)?;

        Self::settle(owner, to, amount, assessment)?;
        if needs_allowance {
            Allowances::<T>::insert(owner, spender, allowance.saturating_sub(amount));
        }
        Ok(())
    }

    /// The issuer, the owner itself and other addresses of the owner's
    /// identity may move the owner's tokens without an allowance.
    fn is_trusted_spender(spender: &T::AccountId, owner: &T::AccountId) -> bool {
        if spender == owner || Self::is_issuer(spender) {
            return true;
        }
        match (T::Registry::resolve(spender), T::Registry::resolve(owner)) {
            (Some(a), Some(b)) => a.id == b.id,
            _ => false,
        }
    }

    fn restrict(
        from: &T::AccountId,
        to: &T::AccountId,
        amount: u128,
    ) -> Result<Assessment, DispatchError> {
        Self::assess_transfer(from, to, amount, Self::now()).map_err(|reason| {
            log::debug!(
                target: LOG_TARGET,
                "Transfer of {} from {:?} to {:?} rejected: {:?}",
                amount,
                from,
                to,
                reason
            );
            Error::<T>::Restricted(reason).into()
        })
    }

    /// Apply an approved transfer. All arithmetic is checked before the
    /// first write.
    fn settle(
        from: &T::AccountId,
        to: &T::AccountId,
        amount: u128,
        assessment: Assessment,
    ) -> DispatchResult {
        if from != to {
            let from_balance = Balances::<T>::get(from)
                .checked_sub(amount)
                .ok_or(Error::<T>::InsufficientBalance)?;
            let to_balance =
                Balances::<T>::get(to).checked_add(amount).ok_or(Error::<T>::Overflow)?;
            Balances::<T>::insert(from, from_balance);
            Balances::<T>::insert(to, to_balance);
        }

        if !assessment.is_internal() {
            Self::move_holdings(assessment.sender, assessment.receiver, amount);
        }

        Self::deposit_event(Event::Transferred { from: from.clone(), to: to.clone(), amount });
        Ok(())
    }

    fn move_holdings(sender: Option<Investor>, receiver: Option<Investor>, amount: u128) {
        if amount == 0 {
            return;
        }

        if let Some(sender) = sender {
            let remaining = InvestorHoldings::<T>::get(sender.id).saturating_sub(amount);
            if remaining == 0 {
                InvestorHoldings::<T>::remove(sender.id);
                InvestorCount::<T>::mutate(|count| *count = count.saturating_sub(1));
                let country = CountedCountry::<T>::take(sender.id).unwrap_or(sender.info.country);
                CountryInvestorCount::<T>::mutate(country, |count| {
                    *count = count.saturating_sub(1)
                });
            } else {
                InvestorHoldings::<T>::insert(sender.id, remaining);
                Self::recount_country(&sender);
            }
        }

        if let Some(receiver) = receiver {
            let held = InvestorHoldings::<T>::get(receiver.id);
            if held == 0 {
                InvestorCount::<T>::mutate(|count| *count = count.saturating_add(1));
                CountryInvestorCount::<T>::mutate(receiver.info.country, |count| {
                    *count = count.saturating_add(1)
                });
                CountedCountry::<T>::insert(receiver.id, receiver.info.country);
            } else {
                Self::recount_country(&receiver);
            }
            InvestorHoldings::<T>::insert(receiver.id, held.saturating_add(amount));
        }
    }

    /// Move a holding identity to its current country once the registrar
    /// has changed it.
    fn recount_country(investor: &Investor) {
        let current = investor.info.country;
        match CountedCountry::<T>::get(investor.id) {
            Some(counted) if counted != current => {
                CountryInvestorCount::<T>::mutate(counted, |count| {
                    *count = count.saturating_sub(1)
                });
                CountryInvestorCount::<T>::mutate(current, |count| {
                    *count = count.saturating_add(1)
                });
                CountedCountry::<T>::insert(investor.id, current);
            }
            _ => {}
        }
    }

    /// Balances sum to the total supply, each identity's holdings equal the
    /// balances of its bound addresses, and the investor counts match the
    /// identities holding tokens under the country they were counted in.
    #[cfg(any(feature = "try-runtime", test))]
    pub fn do_try_state() -> Result<(), DispatchError> {
        use sp_std::collections::btree_map::BTreeMap;

        let sum = Balances::<T>::iter_values()
            .try_fold(0u128, |acc, balance| acc.checked_add(balance))
            .ok_or(DispatchError::Other("Sum of balances overflows"))?;
        ensure!(sum == TotalSupply::<T>::get(), "Sum of balances differs from total supply");

        let mut per_identity: BTreeMap<InvestorId, u128> = BTreeMap::new();
        for (who, balance) in Balances::<T>::iter() {
            if balance == 0 || Self::is_issuer(&who) {
                continue;
            }
            if let Some(investor) = T::Registry::resolve(&who) {
                let held = per_identity.entry(investor.id).or_default();
                *held = held.saturating_add(balance);
            }
        }
        let holdings: BTreeMap<InvestorId, u128> =
            InvestorHoldings::<T>::iter().filter(|(_, held)| *held > 0).collect();
        ensure!(
            per_identity == holdings,
            "Investor holdings differ from balances of bound addresses"
        );
        ensure!(
            holdings.len() as u32 == InvestorCount::<T>::get(),
            "Investor count differs from identities holding tokens"
        );

        ensure!(
            CountedCountry::<T>::iter_keys().count() == holdings.len(),
            "Counted countries differ from identities holding tokens"
        );
        let mut per_country: BTreeMap<u16, u32> = BTreeMap::new();
        for id in holdings.keys() {
            let country = CountedCountry::<T>::get(id)
                .ok_or(DispatchError::Other("Holding identity has no counted country"))?;
            let count = per_country.entry(country).or_default();
            *count = count.saturating_add(1);
        }
        let country_counts: BTreeMap<u16, u32> =
            CountryInvestorCount::<T>::iter().filter(|(_, count)| *count > 0).collect();
        ensure!(
            per_country == country_counts,
            "Country investor counts differ from identities holding tokens"
        );
        Ok(())
    }

    fn do_mint(issuer: T::AccountId, amount: u128) -> DispatchResult {
        let supply = TotalSupply::<T>::get().checked_add(amount).ok_or(Error::<T>::Overflow)?;
        let balance = Balances::<T>::get(&issuer).checked_add(amount).ok_or(Error::<T>::Overflow)?;

        TotalSupply::<T>::put(supply);
        Balances::<T>::insert(&issuer, balance);
        Self::deposit_event(Event::Minted { to: issuer, amount });
        Ok(())
    }
}
