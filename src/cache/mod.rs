pub mod ttl_slot;

pub use ttl_slot::TtlSlot;
