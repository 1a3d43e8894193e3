//! Discovery strategies and the capability traits the engine drives them through.

mod plugin;
pub mod registry;
pub mod strategies;
mod support;

pub use plugin::{
    InjectorId, InjectorMessage, InjectorPlugin, ListenerPacket, ListenerPlugin, LiveInjector, Plugin, PluginSet,
    PluginSlot, call_guarded,
};
