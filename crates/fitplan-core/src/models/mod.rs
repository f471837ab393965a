//! Data models for the diet-fitness API.
//!
//! This module contains the request and response bodies exchanged with the
//! server:
//!
//! - `Credentials`, `LoginResponse`, `MessageResponse`: authentication calls
//! - `DashboardData`: the personalized dashboard summary
//! - `FitnessPlan`, `PlanKind`: diet and workout plans
//! - `ImageUpload`, `UploadReceipt`: progress photo uploads

pub mod account;
pub mod dashboard;
pub mod plan;
pub mod upload;

pub use account::{Credentials, LoginResponse, MessageResponse};
pub use dashboard::DashboardData;
pub use plan::{FitnessPlan, PlanGenerationRequest, PlanKind, PlansResponse};
pub use upload::{ImageUpload, UploadReceipt};
