//! # KYC Registrar Pallet
//!
//! Keeps the investor identities a permissioned token consults before any
//! transfer settles. An identity groups one or more addresses under a single
//! investor record (country, region, rating, expiry) so that compliance is
//! evaluated per investor while balances stay per address.
//!
//! The registrar never moves value. Other pallets read it through the
//! [`IdentityRegistry`] trait.

#![cfg_attr(not(feature = "std"), no_std)]
// Storage getters and the explicit `RuntimeEvent` bound are deprecated upstream
#![allow(deprecated)]

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame_support::{dispatch::DispatchResult, ensure, pallet_prelude::*, traits::EnsureOrigin};
use frame_system::pallet_prelude::*;
use scale_info::TypeInfo;
use sp_std::prelude::*;

pub use pallet::*;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;

const LOG_TARGET: &str = "runtime::kyc-registrar";

/// Identifier of an investor (a bytes32, usually a right-padded name).
pub type InvestorId = [u8; 32];

/// Compliance record of one investor.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Encode,
    Decode,
    DecodeWithMemTracking,
    MaxEncodedLen,
    TypeInfo,
    RuntimeDebug,
)]
pub struct InvestorInfo {
    /// Numeric country code
    pub country: u16,
    /// Three byte region code within the country
    pub region: [u8; 3],
    /// Investor rating (accreditation tier)
    pub rating: u8,
    /// Unix timestamp (seconds) after which the KYC check is stale
    pub expiry: u64,
    /// Set by the registrar to block the investor regardless of expiry
    pub restricted: bool,
}

impl InvestorInfo {
    /// An identity is valid strictly before its expiry.
    pub fn is_valid_at(&self, now: u64) -> bool {
        self.expiry > now
    }
}

/// An address resolved to the identity it is bound to.
#[derive(Clone, Copy, PartialEq, Eq, Encode, Decode, MaxEncodedLen, TypeInfo, RuntimeDebug)]
pub struct Investor {
    pub id: InvestorId,
    pub info: InvestorInfo,
}

/// Read access to investor identities.
pub trait IdentityRegistry<AccountId> {
    /// Resolve `who` to its identity, `None` when unregistered.
    fn resolve(who: &AccountId) -> Option<Investor>;

    /// `true` iff `who` is registered and its identity has not expired at `now`.
    fn is_valid(who: &AccountId, now: u64) -> bool {
        Self::resolve(who).is_some_and(|investor| investor.info.is_valid_at(now))
    }
}

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Origin allowed to register and update investors (the issuer).
        type RegistrarOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Maximum number of addresses bound to one identity.
        #[pallet::constant]
        type MaxAddresses: Get<u32>;

        type WeightInfo: WeightInfo;
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// Investor records by identity
    #[pallet::storage]
    #[pallet::getter(fn investor)]
    pub type Investors<T> = StorageMap<_, Blake2_128Concat, InvestorId, InvestorInfo, OptionQuery>;

    /// Addresses owned by each identity
    #[pallet::storage]
    #[pallet::getter(fn addresses_of)]
    pub type InvestorAddresses<T: Config> = StorageMap<
        _,
        Blake2_128Concat,
        InvestorId,
        BoundedVec<T::AccountId, T::MaxAddresses>,
        ValueQuery,
    >;

    /// Reverse index: address -> identity it is bound to
    #[pallet::storage]
    #[pallet::getter(fn investor_of)]
    pub type AddressToInvestor<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AccountId, InvestorId, OptionQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// New investor identity registered
        InvestorAdded { id: InvestorId },
        /// Address bound to an identity
        AddressBound { id: InvestorId, account: T::AccountId },
        /// Investor record rewritten
        InvestorUpdated { id: InvestorId },
        /// Investor blocked by the registrar
        InvestorRestricted { id: InvestorId },
        /// Investor block lifted
        InvestorUnrestricted { id: InvestorId },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// An identity with this id is already registered
        DuplicateIdentity,
        /// An address is already bound or listed twice
        InvalidAddressSet,
        /// No identity with this id
        UnknownInvestor,
        /// Identity would exceed `MaxAddresses`
        TooManyAddresses,
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
        /// Register a new investor with its initial address set.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::add_investor(addresses.len() as u32))]
        pub fn add_investor(
            origin: OriginFor<T>,
            id: InvestorId,
            rating: u8,
            country: u16,
            region: [u8; 3],
            expiry: u64,
            addresses: Vec<T::AccountId>,
        ) -> DispatchResult {
            T::RegistrarOrigin::ensure_origin(origin)?;
            let info = InvestorInfo { country, region, rating, expiry, restricted: false };
            Self::register(id, info, &addresses)?;

            log::info!(
                target: LOG_TARGET,
                "Registered investor {:?} with {} address(es)",
                id,
                addresses.len()
            );
            Self::deposit_event(Event::InvestorAdded { id });
            for account in addresses {
                Self::deposit_event(Event::AddressBound { id, account });
            }
            Ok(())
        }

        /// Bind more addresses to an existing investor.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::add_addresses(addresses.len() as u32))]
        pub fn add_addresses(
            origin: OriginFor<T>,
            id: InvestorId,
            addresses: Vec<T::AccountId>,
        ) -> DispatchResult {
            T::RegistrarOrigin::ensure_origin(origin)?;
            ensure!(Investors::<T>::contains_key(id), Error::<T>::UnknownInvestor);
            Self::bind_addresses(&id, &addresses)?;

            for account in addresses {
                Self::deposit_event(Event::AddressBound { id, account });
            }
            Ok(())
        }

        /// Rewrite an investor's record. Addresses and the restriction flag
        /// are left untouched.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::update_investor())]
        pub fn update_investor(
            origin: OriginFor<T>,
            id: InvestorId,
            rating: u8,
            country: u16,
            region: [u8; 3],
            expiry: u64,
        ) -> DispatchResult {
            T::RegistrarOrigin::ensure_origin(origin)?;
            Investors::<T>::try_mutate(id, |maybe_info| -> DispatchResult {
                let info = maybe_info.as_mut().ok_or(Error::<T>::UnknownInvestor)?;
                info.rating = rating;
                info.country = country;
                info.region = region;
                info.expiry = expiry;
                Ok(())
            })?;

            Self::deposit_event(Event::InvestorUpdated { id });
            Ok(())
        }

        /// Block or unblock an investor across all of its addresses.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::set_investor_restriction())]
        pub fn set_investor_restriction(
            origin: OriginFor<T>,
            id: InvestorId,
            restricted: bool,
        ) -> DispatchResult {
            T::RegistrarOrigin::ensure_origin(origin)?;
            Investors::<T>::try_mutate(id, |maybe_info| -> DispatchResult {
                let info = maybe_info.as_mut().ok_or(Error::<T>::UnknownInvestor)?;
                info.restricted = restricted;
                Ok(())
            })?;

            log::info!(target: LOG_TARGET, "Investor {:?} restricted: {}", id, restricted);
            if restricted {
                Self::deposit_event(Event::InvestorRestricted { id });
            } else {
                Self::deposit_event(Event::InvestorUnrestricted { id });
            }
            Ok(())
        }
    }

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        /// Investors registered at genesis: (id, rating, country, region, expiry, addresses)
        pub investors: Vec<(InvestorId, u8, u16, [u8; 3], u64, Vec<T::AccountId>)>,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            for (id, rating, country, region, expiry, addresses) in &self.investors {
                let info = InvestorInfo {
                    country: *country,
                    region: *region,
                    rating: *rating,
                    expiry: *expiry,
                    restricted: false,
                };
                Pallet::<T>::register(*id, info, addresses).expect("Invalid genesis investor");
            }
        }
    }
}

impl<T: Config> Pallet<T> {
    /// Insert a new identity and bind its initial addresses. Performs no
    /// origin check; callers are trusted.
    pub fn register(
        id: InvestorId,
        info: InvestorInfo,
        addresses: &[T::AccountId],
    ) -> DispatchResult {
        ensure!(!Investors::<T>::contains_key(id), Error::<T>::DuplicateIdentity);
        Self::bind_addresses(&id, addresses)?;
        Investors::<T>::insert(id, info);
        Ok(())
    }

    /// The only writer of `InvestorAddresses` and `AddressToInvestor`, so the
    /// forward and reverse indexes cannot drift apart. Nothing is written
    /// unless every address can be bound.
    fn bind_addresses(id: &InvestorId, addresses: &[T::AccountId]) -> DispatchResult {
        ensure!(
            addresses.len() <= T::MaxAddresses::get() as usize,
            Error::<T>::TooManyAddresses
        );
        for (index, who) in addresses.iter().enumerate() {
            ensure!(!AddressToInvestor::<T>::contains_key(who), Error::<T>::InvalidAddressSet);
            ensure!(!addresses[..index].contains(who), Error::<T>::InvalidAddressSet);
        }

        InvestorAddresses::<T>::try_mutate(id, |bound| -> DispatchResult {
            for who in addresses {
                bound.try_push(who.clone()).map_err(|_| Error::<T>::TooManyAddresses)?;
            }
            Ok(())
        })?;

        for who in addresses {
            AddressToInvestor::<T>::insert(who, id);
        }
        Ok(())
    }
}

impl<T: Config> Pallet<T> {
    /// Every bound address points back at the identity that owns it, and
    /// every owning identity has a record.
    #[cfg(any(feature = "try-runtime", test))]
    pub fn do_try_state() -> Result<(), DispatchError> {
        for (id, addresses) in InvestorAddresses::<T>::iter() {
            ensure!(Investors::<T>::contains_key(id), "Addresses bound to a missing investor");
            for who in addresses.iter() {
                ensure!(
                    AddressToInvestor::<T>::get(who) == Some(id),
                    "Bound address does not resolve to its identity"
                );
            }
        }
        for (who, id) in AddressToInvestor::<T>::iter() {
            ensure!(
                InvestorAddresses::<T>::get(id).contains(&who),
                "Reverse index entry missing from identity"
            );
        }
        Ok(())
    }
}

impl<T: Config> IdentityRegistry<T::AccountId> for Pallet<T> {
    fn resolve(who: &T::AccountId) -> Option<Investor> {
        let id = AddressToInvestor::<T>::get(who)?;
        Investors::<T>::get(id).map(|info| Investor { id, info })
    }
}
