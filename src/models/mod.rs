pub mod data;

pub use data::{
    AddressParts, DateFormat, DriverLicenseRecord, IdentityRecord, NormalizedDate, Sex,
    UniqueIdentifier,
};
