use crate as pallet_security_token;
use core::time::Duration;
use frame_support::{
    derive_impl, parameter_types,
    traits::{ConstU32, ConstU64, UnixTime},
};
use pallet_kyc_registrar::InvestorId;
use sp_core::H256;
use sp_runtime::{
    traits::{BlakeTwo256, IdentityLookup},
    BuildStorage,
};

type Block = frame_system::mocking::MockBlock<Test>;

// Configure a mock runtime with the registrar the token consults.
frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        KycRegistrar: pallet_kyc_registrar,
        SecurityToken: pallet_security_token,
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

pub const ISSUER: u64 = 1;
pub const INITIAL_SUPPLY: u128 = 1_000_000;
pub const GENESIS_TIME: u64 = 1_700_000_000;
/// Expiry used for investors that must stay valid through every test.
pub const FAR_FUTURE: u64 = 9_999_999_999;
/// Expiry shortly after genesis, for tests that move the clock past it.
pub const SOON: u64 = GENESIS_TIME + 1_000;

/// Never registered with the registrar.
pub const UNREGISTERED: u64 = 10;
/// Registered, but its KYC expired before genesis.
pub const EXPIRED: u64 = 11;
/// Registered under country 44 with rating 1.
pub const FOREIGN: u64 = 12;
/// Registered, valid until `SOON`.
pub const SHORT_LIVED: u64 = 13;

parameter_types! {
    pub const IssuerAccount: u64 = ISSUER;
    pub storage Now: u64 = GENESIS_TIME;
}

/// Clock driven by the `Now` parameter, adjustable with [`set_now`].
pub struct MockTime;
impl UnixTime for MockTime {
    fn now() -> Duration {
        Duration::from_secs(Now::get())
    }
}

pub fn set_now(secs: u64) {
    Now::set(&secs);
}

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

#[cfg(feature = "runtime-benchmarks")]
pub struct RegistrarHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<u64> for RegistrarHelper {
    fn register_investor(who: &u64, id: InvestorId) {
        let info = pallet_kyc_registrar::InvestorInfo { expiry: u64::MAX, ..Default::default() };
        KycRegistrar::register(id, info, &[*who]).expect("Register benchmark investor");
    }
}

impl pallet_security_token::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type IssuerOrigin = EnsureIssuer;
    type Registry = KycRegistrar;
    type Time = MockTime;
    type WeightInfo = ();
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper = RegistrarHelper;
}

/// Right-pad a short name into an investor id.
pub fn investor_id(name: &[u8]) -> InvestorId {
    let mut id = [0u8; 32];
    id[..name.len()].copy_from_slice(name);
    id
}

fn investor(name: &[u8], country: u16, expiry: u64, addresses: Vec<u64>) -> GenesisInvestor {
    (investor_id(name), 1, country, *b"abc", expiry, addresses)
}

type GenesisInvestor = (InvestorId, u8, u16, [u8; 3], u64, Vec<u64>);

/// Accounts 2..=7 are single-address investors of country 1. Accounts 8 and 9
/// are left free for tests that register a multi-address investor.
pub fn new_test_ext() -> sp_io::TestExternalities {
    build_ext(INITIAL_SUPPLY)
}

/// Same registry as [`new_test_ext`] but with nothing minted yet.
pub fn new_unminted_ext() -> sp_io::TestExternalities {
    build_ext(0)
}

fn build_ext(initial_supply: u128) -> sp_io::TestExternalities {
    let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();

    let mut investors: Vec<GenesisInvestor> = (2..=7u64)
        .map(|account| {
            let name = format!("investor{account}");
            investor(name.as_bytes(), 1, FAR_FUTURE, vec![account])
        })
        .collect();
    investors.push(investor(b"expired", 1, 1_000, vec![EXPIRED]));
    investors.push(investor(b"foreign", 44, FAR_FUTURE, vec![FOREIGN]));
    investors.push(investor(b"short-lived", 1, SOON, vec![SHORT_LIVED]));

    pallet_kyc_registrar::GenesisConfig::<Test> { investors }
        .assimilate_storage(&mut t)
        .unwrap();

    pallet_security_token::GenesisConfig::<Test> {
        issuer: Some(ISSUER),
        token_name: b"Test Security Token".to_vec(),
        token_symbol: b"TST".to_vec(),
        decimals: 0,
        initial_supply,
        investor_limit: 0,
        country_rules: vec![],
    }
    .assimilate_storage(&mut t)
    .unwrap();

    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}
