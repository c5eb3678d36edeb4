pub mod districts;
pub mod memory;
pub mod mongo;
pub mod trip_store;

pub use districts::{DistrictDirectory, MongoDistrictDirectory};
pub use memory::{MemoryDistrictDirectory, MemoryTripStore};
pub use trip_store::{MongoTripStore, PromptOutcome, StoreError, TripStore};
