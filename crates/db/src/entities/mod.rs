//! Database entities.

pub mod report;
pub mod reward;
pub mod session;
pub mod user;
pub mod user_profile;
pub mod user_reward;

pub use report::Entity as Report;
pub use reward::Entity as Reward;
pub use session::Entity as Session;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
pub use user_reward::Entity as UserReward;
