pub mod adapters;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod documents;
pub mod eligibility;
pub mod lookup;
pub mod media;
pub mod models;
pub mod notify;
pub mod preferences;
pub mod service;
pub mod tasks;
pub mod telemetry;
pub mod workflow;

pub use config::AppConfig;
pub use service::{AppDependencies, AppState, build_router, create_app};
pub use workflow::{build_loan_wizard, create_flow_runner, create_loan_session};
