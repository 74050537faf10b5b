pub mod mfapi_provider;
pub mod morningstar_provider;
pub mod util;

pub use mfapi_provider::MfApiProvider;
pub use morningstar_provider::MorningstarProvider;
