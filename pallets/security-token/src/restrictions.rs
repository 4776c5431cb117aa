//! Transfer restriction engine.
//!
//! Decides whether `(sender, receiver, amount)` may settle at a given time,
//! from registrar state and the issuer's rules alone. Evaluation reads
//! storage but never writes it, so it can be called speculatively.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame_support::{ensure, pallet_prelude::*, PalletError};
use pallet_kyc_registrar::{IdentityRegistry, Investor};
use scale_info::TypeInfo;

use crate::{
    Config, CountedCountry, CountryInvestorCount, CountryRules, Frozen, InvestorCount,
    InvestorHoldings, InvestorLimit, Pallet, TokenFrozen,
};

/// Why a transfer was refused.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    DecodeWithMemTracking,
    PalletError,
    TypeInfo,
    RuntimeDebug,
)]
pub enum RestrictionReason {
    /// The issuer has halted all transfers
    TokenFrozen,
    /// The sending address is frozen
    AccountFrozen,
    SenderUnregistered,
    ReceiverUnregistered,
    SenderExpired,
    ReceiverExpired,
    SenderRestricted,
    ReceiverRestricted,
    /// Investor's country is not permitted by the issuer
    CountryNotPermitted,
    /// Investor's rating is below the country minimum
    RatingTooLow,
    /// Receiver would exceed the issuer-wide investor limit
    InvestorLimitReached,
    /// Receiver would exceed the investor limit of its country
    CountryLimitReached,
}

/// Issuer rule for investors of one country. A country without a rule is
/// permitted with no minimum rating and no investor limit.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    DecodeWithMemTracking,
    MaxEncodedLen,
    TypeInfo,
    RuntimeDebug,
)]
pub struct CountryRule {
    pub permitted: bool,
    pub min_rating: u8,
    /// Maximum number of investors from this country, 0 for unlimited
    pub investor_limit: u32,
}

/// Identities of both parties of an approved transfer. `None` marks the issuer.
#[derive(Clone, Copy, RuntimeDebug)]
pub struct Assessment {
    pub sender: Option<Investor>,
    pub receiver: Option<Investor>,
}

impl Assessment {
    /// Both sides are addresses of the same investor.
    pub fn is_internal(&self) -> bool {
        matches!((self.sender, self.receiver), (Some(s), Some(r)) if s.id == r.id)
    }
}

#[derive(Clone, Copy)]
enum Party {
    Sender,
    Receiver,
}

impl Party {
    fn unregistered(self) -> RestrictionReason {
        match self {
            Party::Sender => RestrictionReason::SenderUnregistered,
            Party::Receiver => RestrictionReason::ReceiverUnregistered,
        }
    }

    fn expired(self) -> RestrictionReason {
        match self {
            Party::Sender => RestrictionReason::SenderExpired,
            Party::Receiver => RestrictionReason::ReceiverExpired,
        }
    }

    fn restricted(self) -> RestrictionReason {
        match self {
            Party::Sender => RestrictionReason::SenderRestricted,
            Party::Receiver => RestrictionReason::ReceiverRestricted,
        }
    }
}

impl<T: Config> Pallet<T> {
    /// Approve or reject a prospective transfer, ignoring balances.
    pub fn check_transfer(
        from: &T::AccountId,
        to: &T::AccountId,
        amount: u128,
        now: u64,
    ) -> Result<(), RestrictionReason> {
        Self::assess_transfer(from, to, amount, now).map(|_| ())
    }

    pub(crate) fn assess_transfer(
        from: &T::AccountId,
        to: &T::AccountId,
        amount: u128,
        now: u64,
    ) -> Result<Assessment, RestrictionReason> {
        ensure!(!TokenFrozen::<T>::get(), RestrictionReason::TokenFrozen);
        ensure!(!Frozen::<T>::get(from), RestrictionReason::AccountFrozen);

        // Supply originates at the issuer, which is never registered
        let sender =
            if Self::is_issuer(from) { None } else { Some(Self::eligible(from, now, Party::Sender)?) };
        let receiver =
            if Self::is_issuer(to) { None } else { Some(Self::eligible(to, now, Party::Receiver)?) };

        let assessment = Assessment { sender, receiver };
        if assessment.is_internal() {
            return Ok(assessment);
        }

        if let Some(receiver) = receiver.as_ref() {
            Self::check_investor_limits(receiver, sender.as_ref(), amount)?;
        }
        Ok(assessment)
    }

    fn eligible(
        who: &T::AccountId,
        now: u64,
        party: Party,
    ) -> Result<Investor, RestrictionReason> {
        let investor = T::Registry::resolve(who).ok_or(party.unregistered())?;
        ensure!(investor.info.is_valid_at(now), party.expired());
        ensure!(!investor.info.restricted, party.restricted());

        if let Some(rule) = CountryRules::<T>::get(investor.info.country) {
            ensure!(rule.permitted, RestrictionReason::CountryNotPermitted);
            ensure!(investor.info.rating >= rule.min_rating, RestrictionReason::RatingTooLow);
        }
        Ok(investor)
    }

    /// Counts are per identity, so only a receiver holding nothing yet can
    /// push them over a limit. A sender handing over its whole holding
    /// leaves the count in the same step.
    fn check_investor_limits(
        receiver: &Investor,
        sender: Option<&Investor>,
        amount: u128,
    ) -> Result<(), RestrictionReason> {
        if amount == 0 || InvestorHoldings::<T>::get(receiver.id) > 0 {
            return Ok(());
        }
        let exiting = sender.filter(|s| InvestorHoldings::<T>::get(s.id) == amount);

        let limit = InvestorLimit::<T>::get();
        if limit > 0 {
            let projected = InvestorCount::<T>::get()
                .saturating_add(1)
                .saturating_sub(exiting.is_some() as u32);
            ensure!(projected <= limit, RestrictionReason::InvestorLimitReached);
        }

        let country = receiver.info.country;
        if let Some(rule) = CountryRules::<T>::get(country) {
            if rule.investor_limit > 0 {
                // An exiting sender frees a slot in the country it was counted in
                let leaving = exiting.is_some_and(|s| {
                    CountedCountry::<T>::get(s.id).unwrap_or(s.info.country) == country
                });
                let projected = CountryInvestorCount::<T>::get(country)
                    .saturating_add(1)
                    .saturating_sub(leaving as u32);
                ensure!(projected <= rule.investor_limit, RestrictionReason::CountryLimitReached);
            }
        }
        Ok(())
    }
}
