use crate::{
    hw::RegisterView,
    variant::{self, Derivation},
};
use core::fmt;
use heapless::Vec;
use spin::RwLock;

/// Maximum number of clocks a [`Registry`] can hold.
pub const MAX_CLOCKS: usize = 8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("clock `{clock}` has an invalid hardware configuration: {source}")]
    InvalidHardwareConfiguration {
        clock: &'static str,
        source: variant::Error,
    },

    #[error("parent `{parent}` of clock `{clock}` has not been derived")]
    ParentNotDerived {
        clock: &'static str,
        parent: &'static str,
    },

    #[error("clock `{0}` needs a parent to derive its rate from")]
    MissingParent(&'static str),

    #[error("clock `{0}` is already registered")]
    AlreadyRegistered(&'static str),

    #[error("clock registry is full")]
    RegistryFull,
}

/// Identity of the device requesting a clock.
///
/// Accepted by [`lookup_clock`] for interface compatibility; lookups are by name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(pub u32);

/// Index of a clock within its [`Registry`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockId(usize);

impl ClockId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A request to register a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockNode {
    pub name: &'static str,
    /// Name of an already-registered clock; `None` only for the root.
    pub parent: Option<&'static str>,
    pub derivation: Derivation,
}

/// A handle to a registered clock.
///
/// The rate is fixed once the clock is registered, so the handle carries a copy of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    id: ClockId,
    name: &'static str,
    rate: u64,
}

impl Clock {
    pub const fn id(&self) -> ClockId {
        self.id
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The clock's frequency, in Hz.
    pub const fn rate(&self) -> u64 {
        self.rate
    }

    /// Clocks can't be gated; this always succeeds without touching hardware.
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    pub fn enable(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Clocks can't be gated; this does nothing.
    #[allow(clippy::unused_self)]
    pub fn disable(&self) {}

    /// Gives up the handle. Clocks are never deregistered, so this does nothing else.
    pub fn release(self) {}
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} Hz", self.name, self.rate)
    }
}

#[derive(Debug)]
struct Entry {
    name: &'static str,
    parent: Option<ClockId>,
    rate: u64,
}

/// The set of registered clocks.
///
/// Writes happen only while the clock tree is registered at boot; every entry is
/// inserted already derived, so readers never see a clock without a rate.
pub struct Registry {
    clocks: RwLock<Vec<Entry, MAX_CLOCKS>>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            clocks: RwLock::new(Vec::new()),
        }
    }

    /// Registers `node`, deriving its rate from its parent's rate and `registers`.
    ///
    /// The parent must already be registered. Nothing is inserted on error.
    pub fn register(
        &self,
        node: ClockNode,
        registers: &dyn RegisterView,
    ) -> Result<Clock, Error> {
        let mut clocks = self.clocks.write();

        if clocks.iter().any(|entry| entry.name == node.name) {
            return Err(Error::AlreadyRegistered(node.name));
        }

        if clocks.is_full() {
            return Err(Error::RegistryFull);
        }

        let parent = node
            .parent
            .map(|parent| {
                clocks
                    .iter()
                    .position(|entry| entry.name == parent)
                    .map(ClockId)
                    .ok_or(Error::ParentNotDerived {
                        clock: node.name,
                        parent,
                    })
            })
            .transpose()?;
        let parent_rate = parent.map(|parent| clocks[parent.0].rate);

        let rate = node
            .derivation
            .derive(parent_rate, registers)
            .map_err(|error| match error {
                variant::Error::MissingParentRate => Error::MissingParent(node.name),
                source => Error::InvalidHardwareConfiguration {
                    clock: node.name,
                    source,
                },
            })?;

        let id = ClockId(clocks.len());
        clocks
            .push(Entry {
                name: node.name,
                parent,
                rate,
            })
            .map_err(|_| Error::RegistryFull)?;

        debug!("Registered clock `{}`: {rate} Hz", node.name);

        Ok(Clock {
            id,
            name: node.name,
            rate,
        })
    }

    /// Finds the clock registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Clock> {
        let clocks = self.clocks.read();

        clocks
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.name == name)
            .map(|(index, entry)| Self::handle(index, entry))
    }

    /// The clock `clock` derives its rate from, if any.
    pub fn parent_of(&self, clock: &Clock) -> Option<Clock> {
        let clocks = self.clocks.read();
        let parent = clocks.get(clock.id.0)?.parent?;

        clocks
            .get(parent.0)
            .map(|entry| Self::handle(parent.0, entry))
    }

    /// Every registered clock, in registration order.
    pub fn clocks(&self) -> Vec<Clock, MAX_CLOCKS> {
        self.clocks
            .read()
            .iter()
            .enumerate()
            .map(|(index, entry)| Self::handle(index, entry))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.read().is_empty()
    }

    fn handle(index: usize, entry: &Entry) -> Clock {
        Clock {
            id: ClockId(index),
            name: entry.name,
            rate: entry.rate,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Looks up a clock by `name`. `device` is ignored.
pub fn lookup_clock(registry: &Registry, _device: Option<DeviceId>, name: &str) -> Option<Clock> {
    registry.lookup(name)
}

/// The frequency of `clock`, in Hz.
pub fn get_rate(clock: &Clock) -> u64 {
    clock.rate()
}
