pub use module_name::{ModuleName, InvalidIdentifier, InvalidIdentifierReason};
pub use tag::{Tag, TagError};
pub use template_id::{TemplateId, TemplateIdError};

mod module_name;
mod tag;
mod template_id;
