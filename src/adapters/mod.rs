// Adapters layer: file-backed implementations of the domain ports.

pub mod agency_directory;
pub mod country_list;
pub mod storage;
pub mod trip_store;

pub use agency_directory::FileAgencyDirectory;
pub use country_list::FileCountryList;
pub use storage::{FileManager, FileOperation, LocalStorage};
pub use trip_store::InMemoryTripStore;
