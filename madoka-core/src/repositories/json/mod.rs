pub mod store;
pub mod bind;
pub mod steam_info;
pub mod parent;
pub mod disable;

pub use store::JsonStore;
pub use bind::BindStore;
pub use steam_info::SteamInfoStore;
pub use parent::ParentStore;
pub use disable::DisableStore;
