pub mod repository_traits;
pub mod host_traits;
pub mod render_traits;

pub use repository_traits::RewardRepository;
pub use host_traits::ChatHost;
pub use render_traits::Renderer;
