use crate as pallet_kyc_registrar;
use crate::InvestorId;
use frame_support::{
    derive_impl, parameter_types,
    traits::{ConstU32, ConstU64},
};
use sp_core::H256;
use sp_runtime::{
    traits::{BlakeTwo256, IdentityLookup},
    BuildStorage,
};

type Block = frame_system::mocking::MockBlock<Test>;

// Configure a mock runtime to test the pallet.
frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        KycRegistrar: pallet_kyc_registrar,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type BaseCallFilter = frame_support::traits::Everything;
    type BlockWeights = ();
    type BlockLength = ();
    type DbWeight = ();
    type RuntimeOrigin = RuntimeOrigin;
    type RuntimeCall = RuntimeCall;
    type Nonce = u64;
    type Hash = H256;
    type Hashing = BlakeTwo256;
    type AccountId = u64;
    type Lookup = IdentityLookup<Self::AccountId>;
    type Block = Block;
    type RuntimeEvent = RuntimeEvent;
    type BlockHashCount = ConstU64<250>;
    type Version = ();
    type PalletInfo = PalletInfo;
    type AccountData = ();
    type OnNewAccount = ();
    type OnKilledAccount = ();
    type SystemWeightInfo = ();
    type SS58Prefix = ();
    type OnSetCode = ();
    type MaxConsumers = ConstU32<16>;
}

parameter_types! {
    pub const IssuerAccount: u64 = 1;
}

/// Far enough in the future that genesis investors never expire in tests.
pub const FAR_FUTURE: u64 = 9_999_999_999;

pub struct EnsureIssuer;
impl frame_support::traits::EnsureOrigin<RuntimeOrigin> for EnsureIssuer {
    type Success = u64;

    fn try_origin(o: RuntimeOrigin) -> Result<Self::Success, RuntimeOrigin> {
        match o.clone().into() {
            Ok(frame_system::RawOrigin::Signed(account)) if account == IssuerAccount::get() => {
                Ok(account)
            }
            _ => Err(o),
        }
    }

    #[cfg(feature = "runtime-benchmarks")]
    fn try_successful_origin() -> Result<RuntimeOrigin, ()> {
        Ok(RuntimeOrigin::signed(IssuerAccount::get()))
    }
}

impl pallet_kyc_registrar::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type RegistrarOrigin = EnsureIssuer;
    type MaxAddresses = ConstU32<4>;
    type WeightInfo = ();
}

/// Right-pad a short name into an investor id.
pub fn investor_id(name: &[u8]) -> InvestorId {
    let mut id = [0u8; 32];
    id[..name.len()].copy_from_slice(name);
    id
}

// Build genesis storage according to the mock runtime.
// Accounts 2 and 3 are registered investors; 4 and 5 share one identity.
pub fn new_test_ext() -> sp_io::TestExternalities {
    let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();

    pallet_kyc_registrar::GenesisConfig::<Test> {
        investors: vec![
            (investor_id(b"investor2"), 1, 1, *b"abc", FAR_FUTURE, vec![2]),
            (investor_id(b"investor3"), 2, 44, *b"lon", FAR_FUTURE, vec![3]),
            (investor_id(b"investor45"), 1, 1, *b"abc", 1_000, vec![4, 5]),
        ],
    }
    .assimilate_storage(&mut t)
    .unwrap();

    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}
