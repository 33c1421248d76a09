//! Device registry implementations
//!
//! `device_record` defines the registry contract; the other modules provide
//! the in-memory and SQL backends.

pub mod device_record;
pub mod device_record_memory;
pub mod device_record_sql;

pub use device_record::{DeviceRecord, DeviceRegistry, DeviceUpdate};
pub use device_record_memory::InMemoryDeviceRegistry;
pub use device_record_sql::SqlDeviceRegistry;
