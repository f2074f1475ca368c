//! Device container
//!
//! A [`Device`] owns the top-level param and command values of one slot,
//! together with their descriptors. All access to the values goes through a
//! [`DeviceGuard`] obtained from [`Device::lock`], which holds the device
//! mutex for its lifetime.
//!
//! Set requests are processed in two phases:
//!
//! 1. `try_multi_set_value` resolves every oid and dry-runs the new value
//!    against one shared [`SetValueTransaction`], so appends to the same
//!    array within a request count against its length budget together
//! 2. `commit_multi_set_value` applies the values in order and notifies the
//!    value-set listeners
//!
//! A request that fails phase 1 leaves every value untouched.

use crate::config::{DetailLevel, DeviceConfig};
use crate::message::{DeviceHeader, DeviceMessage, SetValuePayload};
use catena_core::{
    wire, Authorizer, DeviceDefaults, Error, Index, ParamDescriptor, Path, Result, Segment,
    Value,
};
use catena_params::{EmptyValue, Param, ParamValue, ParamWithValue, SetValueTransaction};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

type Listener = Box<dyn Fn(&str, &dyn Param) + Send + Sync>;

struct Entry {
    value: Box<dyn ParamValue>,
    descriptor: Arc<ParamDescriptor>,
}

impl Entry {
    fn node(&mut self, oid: String) -> ParamWithValue<'_, dyn ParamValue> {
        ParamWithValue::new(oid, self.value.as_mut(), Arc::clone(&self.descriptor))
    }
}

#[derive(Default)]
struct Registry {
    params: BTreeMap<String, Entry>,
    commands: BTreeMap<String, Entry>,
}

/// One slot's parameter tree
pub struct Device {
    slot: u32,
    detail_level: RwLock<DetailLevel>,
    multi_set_enabled: bool,
    subscriptions_enabled: bool,
    defaults: Arc<DeviceDefaults>,
    registry: Mutex<Registry>,
    subscriptions: RwLock<BTreeSet<String>>,
    listeners: RwLock<Vec<Listener>>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("slot", &self.slot)
            .field("detail_level", &self.detail_level())
            .field("multi_set_enabled", &self.multi_set_enabled)
            .field("subscriptions", &self.subscriptions_enabled)
            .finish()
    }
}

impl Device {
    /// Empty device with default settings
    pub fn new(slot: u32) -> Self {
        Device {
            slot,
            detail_level: RwLock::new(DetailLevel::Full),
            multi_set_enabled: true,
            subscriptions_enabled: true,
            defaults: Arc::new(DeviceDefaults::default()),
            registry: Mutex::new(Registry::default()),
            subscriptions: RwLock::new(BTreeSet::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Empty device configured from `config`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the config names an unknown detail level.
    pub fn with_config(config: &DeviceConfig) -> Result<Self> {
        let mut device = Device::new(config.slot);
        *device.detail_level.get_mut() = config.detail_level()?;
        device.multi_set_enabled = config.multi_set_enabled;
        device.subscriptions_enabled = config.subscriptions;
        device.defaults = Arc::new(DeviceDefaults::new(
            config.default_max_length,
            config.default_total_length,
            config.default_scope.clone(),
        ));
        Ok(device)
    }

    /// Slot number
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Current detail level
    pub fn detail_level(&self) -> DetailLevel {
        *self.detail_level.read()
    }

    /// Change the detail level
    pub fn set_detail_level(&self, level: DetailLevel) {
        *self.detail_level.write() = level;
    }

    /// True if set requests may carry more than one value
    pub fn multi_set_enabled(&self) -> bool {
        self.multi_set_enabled
    }

    /// True if subscriptions are accepted
    pub fn subscriptions(&self) -> bool {
        self.subscriptions_enabled
    }

    /// Default scope of params that declare none
    pub fn default_scope(&self) -> String {
        self.defaults.scope()
    }

    /// Default element count / string length limit
    pub fn default_max_length(&self) -> u32 {
        self.defaults.max_length()
    }

    /// Change the default element count / string length limit
    pub fn set_default_max_length(&self, max_length: u32) {
        self.defaults.set_max_length(max_length);
    }

    /// Default cumulative string length limit
    pub fn default_total_length(&self) -> u32 {
        self.defaults.total_length()
    }

    /// Change the default cumulative string length limit
    pub fn set_default_total_length(&self, total_length: u32) {
        self.defaults.set_total_length(total_length);
    }

    /// Defaults to build this device's descriptors with
    pub fn defaults(&self) -> Arc<DeviceDefaults> {
        Arc::clone(&self.defaults)
    }

    /// Header item of a serialized device
    pub fn header(&self) -> DeviceHeader {
        DeviceHeader {
            slot: self.slot,
            detail_level: self.detail_level(),
            default_scope: self.default_scope(),
            multi_set_enabled: self.multi_set_enabled,
            subscriptions: self.subscriptions_enabled,
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a top-level param
    ///
    /// Must not be called while this thread holds a [`DeviceGuard`].
    ///
    /// # Errors
    ///
    /// - `Internal` if `descriptor` does not match the shape of `value`
    /// - `InvalidArgument` if `oid` is not a plain name or is already taken
    pub fn add_param<T: ParamValue + 'static>(
        &self,
        oid: impl Into<String>,
        value: T,
        descriptor: Arc<ParamDescriptor>,
    ) -> Result<()> {
        let oid = oid.into();
        value.check_descriptor(&descriptor)?;
        let mut registry = self.registry.lock();
        check_new_oid(&registry, &oid)?;
        info!(
            target: "catena::device",
            slot = self.slot,
            oid = %oid,
            param_type = %descriptor.param_type(),
            "Param registered"
        );
        registry.params.insert(
            oid,
            Entry {
                value: Box::new(value),
                descriptor,
            },
        );
        Ok(())
    }

    /// Register a command
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `descriptor` is not a command or `oid`
    /// is already taken.
    pub fn add_command(&self, oid: impl Into<String>, descriptor: Arc<ParamDescriptor>) -> Result<()> {
        let oid = oid.into();
        if !descriptor.is_command() {
            return Err(Error::invalid_argument(format!(
                "descriptor '{}' is not a command",
                descriptor.oid()
            )));
        }
        let mut registry = self.registry.lock();
        check_new_oid(&registry, &oid)?;
        info!(target: "catena::device", slot = self.slot, oid = %oid, "Command registered");
        registry.commands.insert(
            oid,
            Entry {
                value: Box::new(EmptyValue),
                descriptor,
            },
        );
        Ok(())
    }

    /// Lock the device for param access
    pub fn lock(&self) -> DeviceGuard<'_> {
        DeviceGuard {
            device: self,
            registry: self.registry.lock(),
        }
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Subscribe to `oid`; a trailing `*` subscribes to every oid with
    /// that prefix. Returns false if it was already subscribed.
    ///
    /// # Errors
    ///
    /// Returns `Unimplemented` if the device does not accept subscriptions.
    pub fn add_subscription(&self, oid: impl Into<String>) -> Result<bool> {
        self.require_subscriptions()?;
        Ok(self.subscriptions.write().insert(oid.into()))
    }

    /// Remove a subscription. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `Unimplemented` if the device does not accept subscriptions.
    pub fn remove_subscription(&self, oid: &str) -> Result<bool> {
        self.require_subscriptions()?;
        Ok(self.subscriptions.write().remove(oid))
    }

    /// True if `oid` matches a subscription exactly or by wildcard prefix
    pub fn is_subscribed(&self, oid: &str) -> bool {
        self.subscriptions.read().iter().any(|s| match s.strip_suffix('*') {
            Some(prefix) => oid.starts_with(prefix),
            None => s == oid,
        })
    }

    /// Every subscription, in order
    pub fn subscribed_oids(&self) -> Vec<String> {
        self.subscriptions.read().iter().cloned().collect()
    }

    fn require_subscriptions(&self) -> Result<()> {
        if self.subscriptions_enabled {
            Ok(())
        } else {
            Err(Error::unimplemented(format!(
                "Subscriptions are disabled for the device in slot {}",
                self.slot
            )))
        }
    }

    // ========================================================================
    // Signals
    // ========================================================================

    /// Call `listener` with the oid and node of every value a client sets
    ///
    /// Listeners run while the device lock is held and must not lock the
    /// device again.
    pub fn on_value_set_by_client<F>(&self, listener: F)
    where
        F: Fn(&str, &dyn Param) + Send + Sync + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    fn emit_value_set(&self, oid: &str, param: &dyn Param) {
        for listener in self.listeners.read().iter() {
            listener(oid, param);
        }
    }

    /// True if `param` belongs in a serialized device at the current
    /// detail level and the caller may read it
    pub fn should_send_param(&self, param: &dyn Param, authz: &dyn Authorizer) -> bool {
        let desc = param.descriptor();
        if !authz.read_authz(desc) {
            return false;
        }
        match self.detail_level() {
            DetailLevel::Full => true,
            DetailLevel::Minimal => desc.minimal_set(),
            DetailLevel::Subscriptions => desc.minimal_set() || self.is_subscribed(param.oid()),
            DetailLevel::Commands => desc.is_command(),
            DetailLevel::None => false,
        }
    }
}

/// Exclusive access to a device's values
pub struct DeviceGuard<'a> {
    device: &'a Device,
    registry: MutexGuard<'a, Registry>,
}

impl<'a> DeviceGuard<'a> {
    /// The locked device
    pub fn device(&self) -> &'a Device {
        self.device
    }

    /// Resolve `fqoid` to a node
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty or malformed oid, or one that does
    ///   not start with a name
    /// - `NotFound` for an unknown top-level param
    /// - `PermissionDenied` if the caller cannot read the top-level param
    /// - anything the param's own path walk reports
    pub fn get_param(&mut self, fqoid: &str, authz: &dyn Authorizer) -> Result<Box<dyn Param + '_>> {
        let mut path = Path::parse_str(fqoid)?;
        resolve(&mut self.registry, &mut path, authz)
    }

    /// Every top-level param the caller may read, in oid order
    pub fn get_top_level_params(&mut self, authz: &dyn Authorizer) -> Vec<Box<dyn Param + '_>> {
        self.registry
            .params
            .iter_mut()
            .filter(|(_, entry)| authz.read_authz(&entry.descriptor))
            .map(|(name, entry)| Box::new(entry.node(top_level_oid(name))) as Box<dyn Param + '_>)
            .collect()
    }

    /// Resolve a command
    ///
    /// # Errors
    ///
    /// - `Unimplemented` for an oid below a command
    /// - otherwise as [`get_param`](Self::get_param)
    pub fn get_command(&mut self, fqoid: &str, authz: &dyn Authorizer) -> Result<Box<dyn Param + '_>> {
        let path = Path::parse_str(fqoid)?;
        let name = top_level_name(&path)?;
        if path.len() > 1 {
            return Err(Error::unimplemented(format!(
                "Sub-commands are not supported: '{}'",
                fqoid
            )));
        }
        let entry = self
            .registry
            .commands
            .get_mut(&name)
            .ok_or_else(|| Error::not_found(format!("Command '{}' does not exist", fqoid)))?;
        if !authz.read_authz(&entry.descriptor) {
            return Err(Error::permission_denied(format!(
                "Not authorized to read the command '{}'",
                fqoid
            )));
        }
        Ok(Box::new(entry.node(top_level_oid(&name))))
    }

    /// Serialize the value at `fqoid`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an oid ending in `-`, otherwise as
    /// [`get_param`](Self::get_param) and [`Param::to_value`].
    pub fn get_value(&mut self, fqoid: &str, authz: &dyn Authorizer) -> Result<Value> {
        let mut path = Path::parse_str(fqoid)?;
        if path.back_as_index() == Some(Index::End) {
            return Err(Error::out_of_range(format!(
                "Index out of bounds in path '{}'",
                fqoid
            )));
        }
        let param = resolve(&mut self.registry, &mut path, authz)?;
        param.to_value(authz)
    }

    /// Validate a set request without applying it
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` for more than one value when multi-set is off
    /// - `InvalidArgument` if one oid lies below another
    /// - the first resolution or validation failure
    pub fn try_multi_set_value(
        &mut self,
        values: &[SetValuePayload],
        authz: &dyn Authorizer,
    ) -> Result<()> {
        if values.len() > 1 && !self.device.multi_set_enabled {
            return Err(Error::permission_denied(format!(
                "Multi-set is disabled for the device in slot {}",
                self.device.slot
            )));
        }
        let mut txn = SetValueTransaction::new();
        for (i, payload) in values.iter().enumerate() {
            if let Some(earlier) = values[..i].iter().find(|p| overlaps(&p.oid, &payload.oid)) {
                return Err(Error::invalid_argument(format!(
                    "Overlapping actions for '{}' and '{}'",
                    earlier.oid, payload.oid
                )));
            }
            let (mut path, index) = split_index(&payload.oid)?;
            let param = resolve(&mut self.registry, &mut path, authz)?;
            param.check_set_value(&payload.value, index, authz, &mut txn)?;
        }
        Ok(())
    }

    /// Apply a set request in order, notifying listeners after each value
    ///
    /// Meant to follow a successful [`try_multi_set_value`](Self::try_multi_set_value).
    /// Stops at the first failure; values before it stay applied.
    pub fn commit_multi_set_value(
        &mut self,
        values: &[SetValuePayload],
        authz: &dyn Authorizer,
    ) -> Result<()> {
        let device = self.device;
        let mut txn = SetValueTransaction::new();
        for payload in values {
            let (mut path, index) = split_index(&payload.oid)?;
            let mut param = resolve(&mut self.registry, &mut path, authz)?;
            let before = param.size();
            param.validate_set_value(&payload.value, index, authz, &mut txn)?;
            param.reset_validate(&mut txn);
            info!(target: "catena::device", slot = device.slot, oid = %payload.oid, "Value set by client");

            let position = match index {
                None => {
                    device.emit_value_set(&payload.oid, param.as_ref());
                    continue;
                }
                Some(Index::At(i)) => i,
                // the constraint dropped the element
                Some(Index::End) if param.size() == before => continue,
                Some(Index::End) => before,
            };
            let mut element_path = Path::from_segments([Segment::Index(Index::At(position))]);
            let element = param.get_param(&mut element_path, authz)?;
            device.emit_value_set(&payload.oid, element.as_ref());
        }
        Ok(())
    }

    /// Validate and apply a set request; nothing is applied if any value
    /// fails validation
    pub fn multi_set_value(&mut self, values: &[SetValuePayload], authz: &dyn Authorizer) -> Result<()> {
        if let Err(e) = self.try_multi_set_value(values, authz) {
            warn!(
                target: "catena::device",
                slot = self.device.slot,
                values = values.len(),
                code = %e.code(),
                error = %e,
                "Set request rejected"
            );
            return Err(e);
        }
        self.commit_multi_set_value(values, authz)
    }

    /// Validate and apply a single value
    pub fn set_value(&mut self, fqoid: &str, value: Value, authz: &dyn Authorizer) -> Result<()> {
        self.multi_set_value(&[SetValuePayload::new(fqoid, value)], authz)
    }

    /// Serialize the device
    ///
    /// The header always comes first. Unless `shallow`, it is followed by
    /// every param and command that passes [`should_send_param`](Self::should_send_param).
    pub fn to_proto(&mut self, authz: &dyn Authorizer, shallow: bool) -> Vec<DeviceMessage> {
        let device = self.device;
        let mut out = vec![DeviceMessage::Header(device.header())];
        if shallow {
            return out;
        }
        for (name, entry) in self.registry.params.iter_mut() {
            if let Some(param) = serialize(device, entry, name, authz) {
                out.push(DeviceMessage::Param {
                    oid: name.clone(),
                    param,
                });
            }
        }
        for (name, entry) in self.registry.commands.iter_mut() {
            if let Some(param) = serialize(device, entry, name, authz) {
                out.push(DeviceMessage::Command {
                    oid: name.clone(),
                    param,
                });
            }
        }
        out
    }

    /// See [`Device::should_send_param`]
    pub fn should_send_param(&self, param: &dyn Param, authz: &dyn Authorizer) -> bool {
        self.device.should_send_param(param, authz)
    }
}

fn serialize(
    device: &Device,
    entry: &mut Entry,
    name: &str,
    authz: &dyn Authorizer,
) -> Option<wire::Param> {
    let node = entry.node(top_level_oid(name));
    if !device.should_send_param(&node, authz) {
        return None;
    }
    let mut dst = wire::Param::default();
    node.to_proto(&mut dst, authz).ok()?;
    Some(dst)
}

fn resolve<'r>(
    registry: &'r mut Registry,
    path: &mut Path,
    authz: &dyn Authorizer,
) -> Result<Box<dyn Param + 'r>> {
    let name = top_level_name(path)?;
    let entry = registry
        .params
        .get_mut(&name)
        .ok_or_else(|| Error::not_found(format!("Param '{}' does not exist", path)))?;
    if !authz.read_authz(&entry.descriptor) {
        return Err(Error::permission_denied(format!(
            "Not authorized to read the param '{}'",
            name
        )));
    }
    path.pop();
    let oid = top_level_oid(&name);
    if path.is_empty() {
        return Ok(Box::new(entry.node(oid)));
    }
    let mark = path.walked();
    let node = entry.value.get_param(path, &entry.descriptor, authz)?;
    let oid = format!("{}{}", oid, path.walked_since(mark));
    Ok(Box::new(ParamWithValue::new(oid, node.value, node.descriptor)))
}

fn top_level_name(path: &Path) -> Result<String> {
    match path.front() {
        Some(Segment::Name(name)) => Ok(name.clone()),
        Some(Segment::Index(idx)) => Err(Error::invalid_argument(format!(
            "Expected a param name but found index {} in '{}'",
            idx, path
        ))),
        None => Err(Error::invalid_argument("Empty oid")),
    }
}

fn top_level_oid(name: &str) -> String {
    Segment::Name(name.to_string()).to_string()
}

fn check_new_oid(registry: &Registry, oid: &str) -> Result<()> {
    if oid.is_empty() || oid.contains('/') {
        return Err(Error::invalid_argument(format!(
            "'{}' is not a valid top-level oid",
            oid
        )));
    }
    if registry.params.contains_key(oid) || registry.commands.contains_key(oid) {
        return Err(Error::invalid_argument(format!(
            "'{}' is already registered",
            oid
        )));
    }
    Ok(())
}

/// Split a trailing array index off `oid`
fn split_index(oid: &str) -> Result<(Path, Option<Index>)> {
    let mut path = Path::parse_str(oid)?;
    let index = path.back_as_index();
    if index.is_some() {
        path.pop_back();
    }
    Ok((path, index))
}

/// True if one oid is the other or lies below it; two appends never overlap
fn overlaps(a: &str, b: &str) -> bool {
    if a.ends_with("/-") && b.ends_with("/-") {
        return false;
    }
    is_prefix(a, b) || is_prefix(b, a)
}

fn is_prefix(prefix: &str, oid: &str) -> bool {
    match oid.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
