pub mod feed_assembler;
pub mod interactions;
pub mod personalization;
pub mod scoring;
pub mod visibility;

pub use feed_assembler::{FeedAssembler, FeedRequest};
pub use interactions::InteractionService;
pub use personalization::PersonalizationView;
pub use visibility::VisibilityFilter;
