//! Domain models returned by repositories and serialized by routes.
//!
//! All models serialize with `camelCase` field names.

pub mod feedback;
pub mod order;
pub mod product;
pub mod reward;
pub mod session;
pub mod shop;
pub mod user;

pub use feedback::{Feedback, FeedbackDetails};
pub use order::{Order, OrderDetails, OrderLine};
pub use product::{Product, ProductWithShop, ShopSummary};
pub use reward::{Reward, RewardWithCustomer, RewardWithShop};
pub use session::{CurrentUser, keys as session_keys};
pub use shop::{Shop, ShopListing};
pub use user::User;
