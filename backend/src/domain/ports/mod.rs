//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod catalogue_command;
mod catalogue_query;
mod catalogue_store;
mod sync_channel;

pub use catalogue_command::CatalogueCommand;
#[cfg(test)]
pub use catalogue_command::MockCatalogueCommand;
pub use catalogue_query::CatalogueQuery;
#[cfg(test)]
pub use catalogue_query::MockCatalogueQuery;
pub use catalogue_store::{
    AssociationStore, CatalogueStore, CatalogueTransactions, EntityStore, StoreError,
};
#[cfg(test)]
pub use sync_channel::MockSyncChannel;
pub use sync_channel::{OutboundMessage, SyncChannel, SyncChannelError};
