//! # Plugin capabilities
//!
//! A plugin has a name and an `initialize` hook. On top of that it may be a
//! listener (fed every captured frame), an injector (supplies frames to send),
//! or both. Capabilities are exposed through `as_listener` / `as_injector` and
//! queried once when a [`PluginSet`] is assembled.
//!
//! Plugin code runs on the engine's worker threads. Errors and panics raised by
//! a plugin are contained by [`call_guarded`] and never reach the engine.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use sixscout_common::network::interface::InterfaceContext;
use sixscout_common::network::node::SharedNode;
use sixscout_protocols::frame::Frame;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

pub type InjectorId = u64;

/// Items travelling through the injector's live queue.
#[derive(Debug)]
pub enum InjectorMessage {
    Packet(Vec<u8>),
    /// Wakes the injector so it can observe cancellation.
    Shutdown,
}

/// Handle a plugin keeps to enqueue frames after the static phase.
#[derive(Debug, Clone)]
pub struct LiveInjector {
    id: InjectorId,
    queue: UnboundedSender<InjectorMessage>,
}

impl LiveInjector {
    pub fn new(id: InjectorId, queue: UnboundedSender<InjectorMessage>) -> Self {
        Self { id, queue }
    }

    pub fn id(&self) -> InjectorId {
        self.id
    }

    /// Queues a frame. Returns `false` once the injector has gone away.
    pub fn inject(&self, packet: Vec<u8>) -> bool {
        self.queue.send(InjectorMessage::Packet(packet)).is_ok()
    }
}

/// A captured frame plus the nodes it was resolved to.
pub struct ListenerPacket {
    pub frame: Frame,
    pub src: SharedNode,
    pub dst: SharedNode,
}

pub trait Plugin: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self, iface: &InterfaceContext) -> anyhow::Result<()>;

    fn as_listener(&mut self) -> Option<&mut dyn ListenerPlugin> {
        None
    }

    fn as_injector(&mut self) -> Option<&mut dyn InjectorPlugin> {
        None
    }
}

pub trait ListenerPlugin {
    fn process_packet(&mut self, packet: &ListenerPacket) -> anyhow::Result<()>;
}

pub trait InjectorPlugin {
    /// Frames sent once, before any live frame.
    fn injection_packets(&mut self) -> anyhow::Result<Vec<Vec<u8>>>;

    fn register_live_injector(&mut self, _injector: LiveInjector) {}

    fn unregister_live_injector(&mut self, _id: InjectorId) {}
}

/// Runs plugin code, logging a returned error or a panic against the plugin's name.
pub fn call_guarded<R>(plugin: &str, operation: &str, f: impl FnOnce() -> anyhow::Result<R>) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!(plugin, operation, "Plugin failed: {e:#}");
            None
        }
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!(plugin, operation, "Plugin panicked: {msg}");
            None
        }
    }
}

/// One plugin with its capabilities resolved up front.
#[derive(Clone)]
pub struct PluginSlot {
    name: String,
    listener: bool,
    injector: bool,
    plugin: Arc<Mutex<Box<dyn Plugin>>>,
}

impl PluginSlot {
    fn new(mut plugin: Box<dyn Plugin>) -> Self {
        let listener = plugin.as_listener().is_some();
        let injector = plugin.as_injector().is_some();
        Self {
            name: plugin.name().to_string(),
            listener,
            injector,
            plugin: Arc::new(Mutex::new(plugin)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_listener(&self) -> bool {
        self.listener
    }

    pub fn is_injector(&self) -> bool {
        self.injector
    }

    /// Runs `f` against the listener capability, guarded.
    pub fn with_listener<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut dyn ListenerPlugin) -> anyhow::Result<R>,
    ) -> Option<R> {
        call_guarded(&self.name, operation, || {
            let mut plugin = self.plugin.lock();
            match plugin.as_listener() {
                Some(listener) => f(listener),
                None => anyhow::bail!("not a listener"),
            }
        })
    }

    /// Runs `f` against the injector capability, guarded.
    pub fn with_injector<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut dyn InjectorPlugin) -> anyhow::Result<R>,
    ) -> Option<R> {
        call_guarded(&self.name, operation, || {
            let mut plugin = self.plugin.lock();
            match plugin.as_injector() {
                Some(injector) => f(injector),
                None => anyhow::bail!("not an injector"),
            }
        })
    }

    fn initialize(&self, iface: &InterfaceContext) -> bool {
        call_guarded(&self.name, "initialize", || self.plugin.lock().initialize(iface)).is_some()
    }
}

/// The plugins taking part in one discovery run.
#[derive(Clone, Default)]
pub struct PluginSet {
    slots: Vec<PluginSlot>,
}

impl PluginSet {
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self {
            slots: plugins.into_iter().map(PluginSlot::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(PluginSlot::name).collect()
    }

    /// Initializes every plugin against `iface`. Returns how many succeeded.
    pub fn initialize(&self, iface: &InterfaceContext) -> usize {
        let ok = self.slots.iter().filter(|slot| slot.initialize(iface)).count();
        info!(interface = %iface.name, "Initialized {ok}/{} plugins", self.slots.len());
        ok
    }

    pub fn listeners(&self) -> Vec<PluginSlot> {
        self.slots.iter().filter(|s| s.listener).cloned().collect()
    }

    pub fn injectors(&self) -> Vec<PluginSlot> {
        self.slots.iter().filter(|s| s.injector).cloned().collect()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
