pub mod builder;
pub mod checksum;
pub mod error;
pub mod frame;
pub mod icmpv6;
pub mod ndp;
pub mod template;
