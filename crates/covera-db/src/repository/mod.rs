//! SurrealDB repository implementations.

mod catalog;
mod requests;
mod roles;
mod warranties;

pub use catalog::SurrealCatalogRepository;
pub use requests::SurrealServiceRequestRepository;
pub use roles::SurrealRoleDirectory;
pub use warranties::SurrealWarrantyRepository;
