//! Gateway types module
//!
//! ## Input Types
//! - [`DepositRequest`], [`WithdrawRequest`], [`TransferRequest`]: validated money-movement bodies
//! - [`ValidJson`]: extractor that turns malformed or invalid bodies into validation errors
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//!
//! ## Submodules
//! - [`payments`]: Request and response DTOs for the payments API
//! - [`response`]: Response types and error codes

pub mod payments;
pub mod response;

// Re-export commonly used types at module root
pub use payments::{
    BalanceChangeData, DepositRequest, HealthData, TransferData, TransferRequest, ValidJson,
    WithdrawRequest,
};
pub use response::{ApiResponse, error_codes};
