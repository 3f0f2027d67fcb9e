//! Domain records, filters and the DTOs used on the HTTP surface.

pub mod filter;
pub mod mapper;
pub mod policy;
pub mod requests;
pub mod responses;
pub mod user;

// Re-export commonly used types
pub use filter::{PolicyFilter, PolicyFilterParams};
pub use policy::{AutoPolicy, AutoPolicyType, PolicyCore, PolicyStatus};
pub use requests::{PolicyDto, UserRequest};
pub use responses::{
    CacheStatsResponse, ErrorResponse, HealthResponse, MessageResponse, RegionStatsResponse,
    UserResponse,
};
pub use user::{Role, User};
