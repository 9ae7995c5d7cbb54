pub mod external_item;
pub mod media;
pub mod media_ids;
pub mod rule;
pub mod tag_set;

pub use external_item::ExternalItem;
pub use media::{Group, ItemId, ItemKind, LocalItem, LocationType};
pub use media_ids::ProviderIds;
pub use rule::{ActivationInterval, ManagedRule};
pub use tag_set::TagSet;
