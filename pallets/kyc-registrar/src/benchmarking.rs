//! Benchmarking setup for pallet-kyc-registrar

use super::*;

#[allow(unused)]
use crate::Pallet as KycRegistrar;
use frame_benchmarking::v2::*;

fn addresses<T: Config>(seed: u32, count: u32) -> Vec<T::AccountId> {
    (0..count).map(|index| account("investor", index, seed)).collect()
}

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn add_investor(a: Linear<1, { T::MaxAddresses::get() }>) {
        let id: InvestorId = [1u8; 32];
        let accounts = addresses::<T>(0, a);
        let origin = T::RegistrarOrigin::try_successful_origin().expect("Registrar origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, id, 1, 1, *b"abc", u64::MAX, accounts);

        assert_eq!(InvestorAddresses::<T>::get(id).len() as u32, a);
    }

    #[benchmark]
    fn add_addresses(a: Linear<1, { T::MaxAddresses::get() - 1 }>) {
        let id: InvestorId = [1u8; 32];
        let info = InvestorInfo { expiry: u64::MAX, ..Default::default() };
        Pallet::<T>::register(id, info, &addresses::<T>(0, 1)).expect("Register investor");
        let extra = addresses::<T>(1, a);
        let origin = T::RegistrarOrigin::try_successful_origin().expect("Registrar origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, id, extra);

        assert_eq!(InvestorAddresses::<T>::get(id).len() as u32, a + 1);
    }

    #[benchmark]
    fn update_investor() {
        let id: InvestorId = [1u8; 32];
        Pallet::<T>::register(id, InvestorInfo::default(), &addresses::<T>(0, 1))
            .expect("Register investor");
        let origin = T::RegistrarOrigin::try_successful_origin().expect("Registrar origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, id, 2, 44, *b"xyz", u64::MAX);

        assert_eq!(Investors::<T>::get(id).map(|info| info.rating), Some(2));
    }

    #[benchmark]
    fn set_investor_restriction() {
        let id: InvestorId = [1u8; 32];
        Pallet::<T>::register(id, InvestorInfo::default(), &addresses::<T>(0, 1))
            .expect("Register investor");
        let origin = T::RegistrarOrigin::try_successful_origin().expect("Registrar origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, id, true);

        assert_eq!(Investors::<T>::get(id).map(|info| info.restricted), Some(true));
    }

    impl_benchmark_test_suite!(KycRegistrar, crate::mock::new_test_ext(), crate::mock::Test);
}
