//! Addresses Domain
//!
//! Address books owned by a user or a company. Each (owner, type) pair has at
//! most one default address; setting a new default clears the previous one in
//! the same write.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{AddressError, AddressResult};
pub use models::{
    Address, AddressOwner, AddressPage, AddressRequest, AddressSummary, AddressType,
    DeletedResponse, HasDefaultResponse, PageRequest,
};
pub use postgres::PgAddressRepository;
pub use repository::{AddressRepository, InMemoryAddressRepository};
pub use service::AddressService;
