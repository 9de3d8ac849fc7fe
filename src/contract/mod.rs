//! Contract interaction through externally supplied interface
//! descriptions.

pub mod binding;

pub use binding::{ContractBinding, DecodedEventData};
