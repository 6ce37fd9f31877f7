//! Core services.

pub mod account;
pub mod leaderboard;
pub mod report;
pub mod reward;
pub mod session;

pub use account::AccountService;
pub use leaderboard::LeaderboardService;
pub use report::ReportService;
pub use reward::RewardService;
pub use session::SessionService;
