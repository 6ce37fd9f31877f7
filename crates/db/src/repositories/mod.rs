//! Database repositories.

mod report;
mod reward;
mod session;
mod user;
mod user_profile;

pub use report::{ReportFilter, ReportPage, ReportRepository};
pub use reward::RewardRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
