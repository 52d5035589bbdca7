//! Data-access services, one per audited record family.
//!
//! Each service borrows a [`DataContext`](crate::store::DataContext) and
//! speaks DTOs at its boundary. Reads only ever return active rows.

pub mod citations;
pub mod conversation_types;
pub mod conversations;
pub mod feedback;
pub mod messages;
pub mod models;
pub mod prompt_overrides;

pub use citations::CitationService;
pub use conversation_types::ConversationTypeService;
pub use conversations::ConversationService;
pub use feedback::FeedbackService;
pub use messages::MessageService;
pub use models::ModelService;
pub use prompt_overrides::PromptOverrideService;
